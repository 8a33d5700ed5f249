use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::markdown::PROBLEM_SEPARATOR;

const NBFORMAT: u32 = 4;
const NBFORMAT_MINOR: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown {
        metadata: Map<String, Value>,
        source: Vec<String>,
    },
    Code {
        execution_count: Option<u32>,
        metadata: Map<String, Value>,
        outputs: Vec<Value>,
        source: Vec<String>,
    },
}

impl Cell {
    pub fn markdown(text: &str) -> Self {
        Self::Markdown {
            metadata: Map::new(),
            source: text.split_inclusive('\n').map(String::from).collect(),
        }
    }

    pub fn empty_code() -> Self {
        Self::Code {
            execution_count: None,
            metadata: Map::new(),
            outputs: vec![],
            source: vec![],
        }
    }

    pub fn source(&self) -> &[String] {
        match self {
            Self::Markdown { source, .. } | Self::Code { source, .. } => source,
        }
    }
}

impl Notebook {
    /// One Markdown cell per problem, each followed by an empty code cell.
    pub fn from_markdown(markdown: &str) -> Self {
        let cells = markdown
            .split(PROBLEM_SEPARATOR)
            .flat_map(|chunk| [Cell::markdown(chunk), Cell::empty_code()])
            .collect();

        Self {
            cells,
            metadata: Map::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    pub fn markdown_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, Cell::Markdown { .. }))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| Error::io(path, e))
    }
}
