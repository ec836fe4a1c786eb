use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Cryptographic primitive unavailable: {0}")]
    CryptoUnavailable(String),

    #[error("Malformed code: {0}")]
    MalformedEncoding(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
