/// Errors from fanout request operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("expected a current-thread multiplexing context, got {flavor}")]
    InvalidContext { flavor: String },

    #[error("unknown transfer field: {name}")]
    UnknownField { name: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
