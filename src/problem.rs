use serde::{Deserialize, Serialize};

use crate::tier::TierInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: u32,
    pub title: String,
    /// Problem page on the archive.
    pub url: String,
    pub description: String,
    pub input: String,
    pub output: String,
    pub examples: Vec<Example>,
    pub tier: TierInfo,
}

/// One sample, paired by its number on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
}

/// A hit returned by the metadata search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u32,
    pub title: String,
    pub tier: TierInfo,
}
