//! Compact, offline-verifiable redemption codes for Silver Coins.
//!
//! A code carries an amount, its issuance time and a random nonce, authenticated
//! with a truncated HMAC-SHA256 tag under a key shared by issuer and verifier.
//!
//! ```rust,no_run
//! use silvercode::{Codec, SharedKey};
//!
//! fn main() -> silvercode::Result<()> {
//!     let codec = Codec::new(SharedKey::generate()?);
//!
//!     let code = codec.encode(500)?;
//!     let token = codec.decode(&code)?;
//!     println!("{} coins issued at {}", token.amount, token.issued_at);
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod key;
pub mod token;

pub use codec::{compute_tag, decode, encode, parse, seal, verify, Codec};
pub use error::{CodecError, Result};
pub use key::{SharedKey, RECOMMENDED_KEY_LEN};
pub use token::{RawCode, Token, CODE_LEN, ENCODED_LEN, NONCE_LEN, PAYLOAD_LEN, TAG_LEN};
