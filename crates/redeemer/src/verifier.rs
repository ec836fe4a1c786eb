//! Server-side redemption of codes.
//!
//! Checks, in order:
//! 1. Code parses and its tag matches the shared key
//! 2. Amount is positive
//! 3. Code is not older than `max_age_secs`
//! 4. Code is not from further in the future than `clock_skew_secs`
//! 5. Code has not been redeemed before, checked and recorded under one lock
//!    (the ledger adds a file lock when several processes share it)

use serde::{Deserialize, Serialize};
use silvercode::{Codec, Token};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::config::RedeemerConfig;
use crate::error::{RedeemError, Result};
use crate::ledger::{fingerprint, Fingerprint, Ledger};

/// Outcome of an accepted code. Crediting the account is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub amount: i32,
    pub issued_at: i64,
    pub nonce: String,
    pub fingerprint: String,
}

impl Redemption {
    fn new(token: &Token, fp: &Fingerprint) -> Self {
        Self {
            amount: token.amount,
            issued_at: token.issued_at,
            nonce: token.nonce_hex(),
            fingerprint: hex::encode(fp),
        }
    }
}

pub struct Redeemer {
    codec: Codec,
    max_age_secs: i64,
    clock_skew_secs: i64,
    ledger: Mutex<Ledger>,
}

impl Redeemer {
    pub fn new(config: RedeemerConfig) -> Result<Self> {
        config.validate()?;
        let ledger = match &config.ledger_path {
            Some(path) => Ledger::open(path.clone())?,
            None => Ledger::in_memory(),
        };
        Self::with_ledger(config, ledger)
    }

    pub fn with_ledger(config: RedeemerConfig, ledger: Ledger) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            codec: Codec::new(config.key),
            max_age_secs: config.max_age_secs,
            clock_skew_secs: config.clock_skew_secs,
            ledger: Mutex::new(ledger),
        })
    }

    /// Run every check without spending the code.
    pub fn check(&self, code: &str, now: i64) -> Result<Redemption> {
        let result = self.validate(code, now).and_then(|(token, fp)| {
            let mut ledger = self.lock_ledger()?;
            ledger.refresh()?;
            if ledger.contains(&fp) {
                return Err(RedeemError::AlreadyRedeemed);
            }
            Ok(Redemption::new(&token, &fp))
        });

        if let Err(e) = &result {
            warn!(reason = e.reason(), "Code failed check: {}", e);
        }
        result
    }

    /// Verify and spend a code.
    pub fn redeem(&self, code: &str, now: i64) -> Result<Redemption> {
        let result = self.validate(code, now).and_then(|(token, fp)| {
            let mut ledger = self.lock_ledger()?;
            if !ledger.mark_spent(fp)? {
                return Err(RedeemError::AlreadyRedeemed);
            }
            Ok(Redemption::new(&token, &fp))
        });

        match &result {
            Ok(redemption) => info!(
                amount = redemption.amount,
                nonce = %redemption.nonce,
                "Redeemed code"
            ),
            Err(e) => warn!(reason = e.reason(), "Rejected code: {}", e),
        }
        result
    }

    pub fn redeem_now(&self, code: &str) -> Result<Redemption> {
        self.redeem(code, chrono::Utc::now().timestamp())
    }

    pub fn redeemed_count(&self) -> Result<usize> {
        let mut ledger = self.lock_ledger()?;
        ledger.refresh()?;
        Ok(ledger.len())
    }

    fn lock_ledger(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.ledger
            .lock()
            .map_err(|_| RedeemError::Ledger("ledger lock poisoned".into()))
    }

    fn validate(&self, code: &str, now: i64) -> Result<(Token, Fingerprint)> {
        let raw = silvercode::parse(code)?;
        let token = silvercode::verify(&raw, self.codec.key().as_ref())?;

        if token.amount <= 0 {
            return Err(RedeemError::NonPositiveAmount(token.amount));
        }

        if now.saturating_sub(token.issued_at) > self.max_age_secs {
            return Err(RedeemError::Expired {
                issued_at: token.issued_at,
                now,
            });
        }

        if token.issued_at.saturating_sub(now) > self.clock_skew_secs {
            return Err(RedeemError::FromFuture {
                issued_at: token.issued_at,
                now,
            });
        }

        Ok((token, fingerprint(&raw)))
    }
}
