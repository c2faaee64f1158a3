use thiserror::Error;

/// Errors raised while fetching metadata or documents.
///
/// Capability absence is not an error: sites declare what they support through
/// [`crate::downloader::Capabilities`] and the orchestrator skips the rest.
#[derive(Debug, Error)]
pub enum Error {
    /// A site declared a capability but did not provide the method behind it
    #[error("{0} is not implemented for this downloader")]
    NotImplemented(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse bibtex: {0}")]
    Bibtex(String),

    #[error("invalid proxy {url}: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("unrecognised identifier: {0}")]
    UnrecognisedUri(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
