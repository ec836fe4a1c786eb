/// Wire layout of a redemption code:
/// nonce (8) || issued_at (8, BE i64) || amount (4, BE i32) || tag (16)
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

pub const NONCE_LEN: usize = 8;
pub const PAYLOAD_LEN: usize = 20;
pub const TAG_LEN: usize = 16;
pub const CODE_LEN: usize = PAYLOAD_LEN + TAG_LEN;
/// Length of the base64 text form (36 bytes, padded).
pub const ENCODED_LEN: usize = 48;

const ISSUED_AT_OFFSET: usize = NONCE_LEN;
const AMOUNT_OFFSET: usize = ISSUED_AT_OFFSET + 8;

/// The authenticated contents of a redemption code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Random per-code value, makes otherwise identical codes distinct
    pub nonce: [u8; NONCE_LEN],
    /// Unix seconds at issuance
    pub issued_at: i64,
    /// Silver Coins carried by the code
    pub amount: i32,
}

impl Token {
    pub fn new(nonce: [u8; NONCE_LEN], issued_at: i64, amount: i32) -> Self {
        Self {
            nonce,
            issued_at,
            amount,
        }
    }

    pub fn to_payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..ISSUED_AT_OFFSET].copy_from_slice(&self.nonce);
        payload[ISSUED_AT_OFFSET..AMOUNT_OFFSET].copy_from_slice(&self.issued_at.to_be_bytes());
        payload[AMOUNT_OFFSET..].copy_from_slice(&self.amount.to_be_bytes());
        payload
    }

    pub fn from_payload(payload: &[u8; PAYLOAD_LEN]) -> Self {
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&payload[..ISSUED_AT_OFFSET]);

        let mut issued_at = [0u8; 8];
        issued_at.copy_from_slice(&payload[ISSUED_AT_OFFSET..AMOUNT_OFFSET]);

        let mut amount = [0u8; 4];
        amount.copy_from_slice(&payload[AMOUNT_OFFSET..]);

        Self {
            nonce,
            issued_at: i64::from_be_bytes(issued_at),
            amount: i32::from_be_bytes(amount),
        }
    }

    pub fn nonce_hex(&self) -> String {
        hex::encode(self.nonce)
    }
}

/// Raw 36-byte code split into its authenticated payload and tag.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawCode {
    pub payload: [u8; PAYLOAD_LEN],
    pub tag: [u8; TAG_LEN],
}

impl RawCode {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CODE_LEN {
            return Err(CodecError::MalformedEncoding(format!(
                "expected {} bytes, got {}",
                CODE_LEN,
                bytes.len()
            )));
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&bytes[..PAYLOAD_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[PAYLOAD_LEN..]);

        Ok(Self { payload, tag })
    }

    pub fn to_bytes(&self) -> [u8; CODE_LEN] {
        let mut bytes = [0u8; CODE_LEN];
        bytes[..PAYLOAD_LEN].copy_from_slice(&self.payload);
        bytes[PAYLOAD_LEN..].copy_from_slice(&self.tag);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_layout_is_big_endian() {
        let token = Token::new([1, 2, 3, 4, 5, 6, 7, 8], 1_767_225_600, 500);
        let payload = token.to_payload();

        assert_eq!(
            hex::encode(payload),
            "0102030405060708000000006955b900000001f4"
        );
        assert_eq!(Token::from_payload(&payload), token);
    }

    #[test]
    fn test_negative_fields_use_twos_complement() {
        let token = Token::new([0u8; 8], -1, -42);
        let payload = token.to_payload();

        assert_eq!(&payload[8..16], &[0xff; 8]);
        assert_eq!(&payload[16..], &[0xff, 0xff, 0xff, 0xd6]);
        assert_eq!(Token::from_payload(&payload), token);
    }

    #[test]
    fn test_raw_code_length_check() {
        assert!(RawCode::from_bytes(&[0u8; 35]).is_err());
        assert!(RawCode::from_bytes(&[0u8; 37]).is_err());

        let mut bytes = [0u8; CODE_LEN];
        bytes[PAYLOAD_LEN] = 0xaa;
        let raw = RawCode::from_bytes(&bytes).unwrap();
        assert_eq!(raw.tag[0], 0xaa);
        assert_eq!(raw.to_bytes(), bytes);
    }
}
