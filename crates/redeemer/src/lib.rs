//! Verifier contract for silvercode redemption codes.
//!
//! The codec only proves a code was issued by a key holder. Accepting it also
//! requires an age limit and a record of codes already spent, both kept here.

pub mod config;
pub mod error;
pub mod ledger;
pub mod verifier;

pub use config::RedeemerConfig;
pub use error::{RedeemError, Result};
pub use ledger::{fingerprint, Fingerprint, Ledger};
pub use verifier::{Redeemer, Redemption};
