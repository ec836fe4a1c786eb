use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Insufficient Silver Coins: requested {requested}, available {available}")]
    InsufficientBalance { requested: i32, available: u32 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(i32),

    #[error("Code generation failed: {0}")]
    Codec(#[from] silvercode::CodecError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
