use thiserror::Error;

/// type alias for all operations in this crate that could fail with a [`KvError`]
pub type Result<T> = std::result::Result<T, KvError>;

/// The error variants used throughout bytekv.
///
/// Lower level errors from std or third party crates are wrapped here so that
/// callers only ever deal with one error type.
#[derive(Debug, Error)]
pub enum KvError {
    /// errors caused by file or socket IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// a request or reply rejected at the protocol level (malformed lines,
    /// unknown verbs, payloads over the record size limit); the message is
    /// the exact reply text
    #[error("protocol error: {0}")]
    Protocol(String),

    /// invalid command line arguments or other unparseable input
    #[error("parsing error: {0}")]
    Parsing(String),

    /// the on-disk log contains a record that cannot be decoded
    #[error("log corruption: {0}")]
    Corruption(String),

    /// an error string returned by the server over the wire
    #[error("server error: {0}")]
    Server(String),
}
