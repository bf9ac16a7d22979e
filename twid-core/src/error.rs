use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed video variants at offset {offset}: {source}")]
    MalformedVariants {
        offset: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("server returned HTML instead of media for {0}")]
    HtmlBody(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no data received for {0} seconds")]
    Stalled(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("an auth token is required (--token, TWID_TOKEN or the config file)")]
    MissingToken,

    #[error("no users given")]
    NoUsers,

    #[error("browser product `{0}` cannot be driven over CDP, use chrome or chromium")]
    UnsupportedProduct(String),
}
