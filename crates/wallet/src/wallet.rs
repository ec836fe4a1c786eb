use serde::{Deserialize, Serialize};
use silvercode::Codec;
use tracing::info;

use crate::accrual::{Progress, XpTracker};
use crate::error::{Result, WalletError};
use crate::skill::{Skill, WorldKind};

/// Anything that can turn an amount into a redemption code.
pub trait CodeIssuer {
    fn issue(&self, amount: i32) -> silvercode::Result<String>;
}

impl CodeIssuer for Codec {
    fn issue(&self, amount: i32) -> silvercode::Result<String> {
        self.encode(amount)
    }
}

/// A successful cash-out, ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issued {
    pub code: String,
    pub amount: i32,
    /// Balance left after the deduction
    pub remaining: u32,
}

/// Per-character balance. Only `progress` is persisted by the host.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub progress: Progress,
    #[serde(skip)]
    tracker: XpTracker,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_progress(progress: Progress) -> Self {
        Self {
            progress,
            tracker: XpTracker::new(),
        }
    }

    pub fn balance(&self) -> u32 {
        self.progress.coins
    }

    /// Login or world hop. On event worlds nothing accrues until
    /// [`Wallet::confirm_event_world`] is called.
    pub fn enter_world(&mut self, kind: WorldKind) {
        self.tracker.enter_world(kind);
    }

    pub fn confirm_event_world(&mut self) {
        self.tracker.confirm_event_world();
    }

    pub fn leave_world(&mut self) {
        self.tracker.leave_world();
    }

    pub fn is_accruing(&self) -> bool {
        !self.tracker.is_paused()
    }

    /// Feed a stat update. Returns the coins earned by it.
    pub fn record_xp(&mut self, skill: Skill, total_xp: u32) -> u32 {
        match self.tracker.observe(skill, total_xp) {
            Some(gained) => self.progress.credit_xp(gained),
            None => 0,
        }
    }

    /// Redeem `amount` coins as a code.
    ///
    /// The balance is only deducted once the code exists, a failed issue leaves it untouched.
    pub fn cash_out<I: CodeIssuer>(&mut self, amount: i32, issuer: &I) -> Result<Issued> {
        let requested = u32::try_from(amount)
            .ok()
            .filter(|&a| a > 0)
            .ok_or(WalletError::InvalidAmount(amount))?;

        let available = self.balance();
        if requested > available {
            return Err(WalletError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let code = issuer.issue(amount)?;

        self.progress.coins = available - requested;
        info!(
            "Cashed out {} Silver Coins ({} remaining)",
            amount, self.progress.coins
        );

        Ok(Issued {
            code,
            amount,
            remaining: self.progress.coins,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| WalletError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WalletError::Serialization(e.to_string()))
    }
}
