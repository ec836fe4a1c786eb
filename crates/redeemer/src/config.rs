use silvercode::SharedKey;
use std::path::PathBuf;

use crate::error::{RedeemError, Result};

pub const DEFAULT_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_CLOCK_SKEW_SECS: i64 = 300;
pub const DEFAULT_LEDGER_PATH: &str = "redeemed_codes.dat";

#[derive(Clone, Debug)]
pub struct RedeemerConfig {
    pub key: SharedKey,
    /// Codes older than this are rejected
    pub max_age_secs: i64,
    /// Tolerated issuer clock drift into the future
    pub clock_skew_secs: i64,
    /// None keeps the ledger in memory only
    pub ledger_path: Option<PathBuf>,
}

impl RedeemerConfig {
    pub fn new(key: SharedKey) -> Self {
        Self {
            key,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
            ledger_path: None,
        }
    }

    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.max_age_secs = secs;
        self
    }

    pub fn with_clock_skew(mut self, secs: i64) -> Self {
        self.clock_skew_secs = secs;
        self
    }

    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = Some(path.into());
        self
    }

    /// Reject limits that would make every code fail.
    pub fn validate(&self) -> Result<()> {
        if self.max_age_secs <= 0 {
            return Err(RedeemError::Config(format!(
                "max_age_secs must be positive, got {}",
                self.max_age_secs
            )));
        }
        if self.clock_skew_secs < 0 {
            return Err(RedeemError::Config(format!(
                "clock_skew_secs must not be negative, got {}",
                self.clock_skew_secs
            )));
        }
        Ok(())
    }
}
