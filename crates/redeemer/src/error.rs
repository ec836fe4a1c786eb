use silvercode::CodecError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedeemError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedeemError {
    #[error("Not a valid code: {0}")]
    Malformed(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Code expired: issued at {issued_at}, now {now}")]
    Expired { issued_at: i64, now: i64 },

    #[error("Code issued in the future: issued at {issued_at}, now {now}")]
    FromFuture { issued_at: i64, now: i64 },

    #[error("Non-positive amount: {0}")]
    NonPositiveAmount(i32),

    #[error("Code already redeemed")]
    AlreadyRedeemed,

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RedeemError {
    /// Short label for audit logs.
    pub fn reason(&self) -> &'static str {
        match self {
            RedeemError::Malformed(_) => "malformed",
            RedeemError::InvalidSignature => "forged",
            RedeemError::Expired { .. } => "expired",
            RedeemError::FromFuture { .. } => "future",
            RedeemError::NonPositiveAmount(_) => "non_positive",
            RedeemError::AlreadyRedeemed => "replay",
            RedeemError::Crypto(_) => "crypto",
            RedeemError::Ledger(_) => "ledger",
            RedeemError::Config(_) => "config",
        }
    }
}

impl From<CodecError> for RedeemError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MalformedEncoding(msg) => RedeemError::Malformed(msg),
            CodecError::InvalidSignature => RedeemError::InvalidSignature,
            CodecError::CryptoUnavailable(msg) | CodecError::InvalidKey(msg) => {
                RedeemError::Crypto(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_errors_keep_their_class() {
        let malformed: RedeemError = CodecError::MalformedEncoding("short".into()).into();
        assert_eq!(malformed.reason(), "malformed");

        let forged: RedeemError = CodecError::InvalidSignature.into();
        assert_eq!(forged, RedeemError::InvalidSignature);
        assert_eq!(forged.reason(), "forged");
    }
}
