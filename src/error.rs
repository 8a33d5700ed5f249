use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-success HTTP status from the relay or the target.
    #[error("fetching {url} failed with status {status}")]
    FetchFailure { url: String, status: u16 },

    /// The page loaded but carries no problem.
    #[error("problem {0} does not exist")]
    NotFound(u32),

    /// Difficulty metadata could not be obtained. The fetcher degrades this to
    /// the unknown tier instead of failing the problem.
    #[error("difficulty metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("problem {0} is already selected")]
    DuplicateSelection(u32),

    #[error("no problems selected")]
    EmptySelection,

    #[error("nothing to generate, crawl some problems first")]
    NothingToGenerate,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
