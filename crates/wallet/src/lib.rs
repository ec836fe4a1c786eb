pub mod accrual;
pub mod error;
pub mod skill;
pub mod wallet;

pub use accrual::{Progress, XpTracker, XP_PER_COIN};
pub use error::{Result, WalletError};
pub use skill::{Skill, WorldKind};
pub use wallet::{CodeIssuer, Issued, Wallet};
