pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod markdown;
pub mod markup;
pub mod notebook;
pub mod problem;
pub mod relay;
pub mod selection;
pub mod shell;
pub mod tier;

pub use config::Config;
pub use error::{Error, Result};
