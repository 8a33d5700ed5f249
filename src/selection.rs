use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::problem::SearchHit;
use crate::tier::TierInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedProblem {
    pub id: u32,
    pub title: String,
    pub tier: TierInfo,
}

impl SelectedProblem {
    /// A selection known only by its number.
    pub fn untitled(id: u32) -> Self {
        Self {
            id,
            title: String::new(),
            tier: TierInfo::unknown(),
        }
    }
}

impl From<SearchHit> for SelectedProblem {
    fn from(hit: SearchHit) -> Self {
        Self {
            id: hit.id,
            title: hit.title,
            tier: hit.tier,
        }
    }
}

/// Vertical extent of a rendered list row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBox {
    pub top: f64,
    pub height: f64,
}

impl RowBox {
    fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Default)]
pub struct Selection {
    items: Vec<SelectedProblem>,
    ids: HashSet<u32>,
}

impl Selection {
    pub fn add(&mut self, problem: SelectedProblem) -> Result<()> {
        if !self.ids.insert(problem.id) {
            return Err(Error::DuplicateSelection(problem.id));
        }
        self.items.push(problem);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> bool {
        if !self.ids.remove(&id) {
            return false;
        }
        self.items.retain(|p| p.id != id);
        true
    }

    pub fn ids(&self) -> Vec<u32> {
        self.items.iter().map(|p| p.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedProblem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.ids.clear();
    }

    /// Unit-height rows laid out top to bottom, for callers without real
    /// geometry.
    pub fn rows(&self) -> Vec<RowBox> {
        (0..self.items.len())
            .map(|i| RowBox {
                top: i as f64,
                height: 1.0,
            })
            .collect()
    }

    /// Reinserts `dragged` where the pointer was released. `rows` holds the
    /// geometry of the current items, in order. The item lands before the
    /// nearest other row whose midpoint lies below `pointer_y` (the first one
    /// on ties), or at the end when there is none.
    pub fn drop_at(&mut self, dragged: u32, pointer_y: f64, rows: &[RowBox]) -> bool {
        let Some(from) = self.items.iter().position(|p| p.id == dragged) else {
            return false;
        };

        let mut closest: Option<(f64, u32)> = None;
        for (item, row) in self.items.iter().zip(rows) {
            if item.id == dragged {
                continue;
            }
            let offset = pointer_y - row.midpoint();
            if offset < 0.0 && closest.map_or(true, |(best, _)| offset > best) {
                closest = Some((offset, item.id));
            }
        }

        let item = self.items.remove(from);
        match closest.and_then(|(_, id)| self.items.iter().position(|p| p.id == id)) {
            Some(before) => self.items.insert(before, item),
            None => self.items.push(item),
        }
        true
    }
}
