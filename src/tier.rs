use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

const ICON_BASE: &str = "https://static.solved.ac/tier_small";

const MAX_LEVEL: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum TierFamily {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Ruby,
}

// Sub-ranks run from the lowest ("V") to the highest ("I") within a family.
const SUB_RANKS: [&str; 5] = ["V", "IV", "III", "II", "I"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierInfo {
    pub name: String,
    /// Empty when the tier is unknown.
    pub icon: String,
}

impl TierInfo {
    pub fn from_level(level: u8) -> Self {
        if level == 0 {
            return Self {
                name: "Unrated".into(),
                icon: icon_url(0),
            };
        }
        if level > MAX_LEVEL {
            return Self::unknown();
        }

        let index = level - 1;
        let family = TierFamily::from_repr(index / 5).unwrap_or(TierFamily::Ruby);
        Self {
            name: format!("{} {}", family, SUB_RANKS[(index % 5) as usize]),
            icon: icon_url(level),
        }
    }

    pub fn unknown() -> Self {
        Self {
            name: "Unknown".into(),
            icon: String::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        !self.icon.is_empty()
    }

    /// Table cell shown in the rendered problem header.
    pub fn cell(&self) -> String {
        if self.is_known() {
            format!(
                r#"<img src="{}" width="20px" height="20px" style="vertical-align: middle;"> {}"#,
                self.icon, self.name
            )
        } else {
            self.name.clone()
        }
    }
}

fn icon_url(level: u8) -> String {
    format!("{ICON_BASE}/{level}.svg")
}
