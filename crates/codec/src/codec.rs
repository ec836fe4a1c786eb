use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{CodecError, Result};
use crate::key::SharedKey;
use crate::token::{RawCode, Token, ENCODED_LEN, NONCE_LEN, PAYLOAD_LEN, TAG_LEN};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over the payload, truncated to the first 16 bytes.
///
/// The truncation is part of the wire format, verifiers expect exactly 16 bytes.
pub fn compute_tag(payload: &[u8; PAYLOAD_LEN], key: &[u8]) -> Result<[u8; TAG_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CodecError::CryptoUnavailable(format!("HMAC init failed: {}", e)))?;
    mac.update(payload);
    let digest = mac.finalize().into_bytes();

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&digest[..TAG_LEN]);
    Ok(tag)
}

/// Serialize and authenticate a token with caller-chosen nonce and timestamp.
pub fn seal(token: &Token, key: &[u8]) -> Result<String> {
    let payload = token.to_payload();
    let tag = compute_tag(&payload, key)?;

    Ok(STANDARD.encode(RawCode { payload, tag }.to_bytes()))
}

/// Issue a fresh code for `amount`. Positivity is the caller's concern.
pub fn encode(amount: i32, key: &[u8]) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CodecError::CryptoUnavailable(format!("OS randomness failed: {}", e)))?;

    let issued_at = chrono::Utc::now().timestamp();

    seal(&Token::new(nonce, issued_at, amount), key)
}

/// Parse the text form into raw bytes without checking the tag.
pub fn parse(code: &str) -> Result<RawCode> {
    // Copy/paste commonly drags along a trailing newline.
    let code = code.trim();
    if code.len() != ENCODED_LEN {
        return Err(CodecError::MalformedEncoding(format!(
            "expected {} characters, got {}",
            ENCODED_LEN,
            code.len()
        )));
    }

    let bytes = STANDARD
        .decode(code)
        .map_err(|e| CodecError::MalformedEncoding(format!("invalid base64: {}", e)))?;

    RawCode::from_bytes(&bytes)
}

/// Verify a code and return its contents.
///
/// Safe on untrusted input. Expiry and replay are not checked here.
pub fn decode(code: &str, key: &[u8]) -> Result<Token> {
    let raw = parse(code)?;
    verify(&raw, key)
}

pub fn verify(raw: &RawCode, key: &[u8]) -> Result<Token> {
    let expected = compute_tag(&raw.payload, key)?;

    if !bool::from(raw.tag[..].ct_eq(&expected[..])) {
        return Err(CodecError::InvalidSignature);
    }

    Ok(Token::from_payload(&raw.payload))
}

/// A codec bound to one shared key.
#[derive(Clone, Debug)]
pub struct Codec {
    key: SharedKey,
}

impl Codec {
    pub fn new(key: SharedKey) -> Self {
        Self { key }
    }

    pub fn encode(&self, amount: i32) -> Result<String> {
        encode(amount, self.key.as_ref())
    }

    pub fn decode(&self, code: &str) -> Result<Token> {
        decode(code, self.key.as_ref())
    }

    pub fn seal(&self, token: &Token) -> Result<String> {
        seal(token, self.key.as_ref())
    }

    pub fn key(&self) -> &SharedKey {
        &self.key
    }
}
