//! Legacy ledger transaction holding a single system-program transfer.

use crate::error::TransferError;

/// The system program's address is the all-zero key.
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0; 32];

const TRANSFER_INSTRUCTION: u32 = 2;

/// Decode a base58 account address or blockhash.
pub fn decode_key(value: &str, what: &str) -> Result<[u8; 32], TransferError> {
    let bytes = bs58::decode(value)
        .into_vec()
        .map_err(|e| TransferError::rejected(format!("Invalid {} '{}': {}", what, value, e)))?;

    bytes.try_into().map_err(|bytes: Vec<u8>| {
        TransferError::rejected(format!(
            "Invalid {} '{}': expected 32 bytes, got {}",
            what,
            value,
            bytes.len()
        ))
    })
}

pub fn encode_key(key: &[u8]) -> String {
    bs58::encode(key).into_string()
}

fn push_compact_u16(out: &mut Vec<u8>, mut value: u16) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Serialized message moving `lamports` from `from` to `to`, paid and signed by `from`.
pub fn transfer_message(
    from: &[u8; 32],
    to: &[u8; 32],
    lamports: u64,
    recent_blockhash: &[u8; 32],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(160);

    // one required signature, no read-only signers, the program is read-only
    out.extend_from_slice(&[1, 0, 1]);

    push_compact_u16(&mut out, 3);
    out.extend_from_slice(from);
    out.extend_from_slice(to);
    out.extend_from_slice(&SYSTEM_PROGRAM_ID);

    out.extend_from_slice(recent_blockhash);

    push_compact_u16(&mut out, 1);
    out.push(2);
    push_compact_u16(&mut out, 2);
    out.extend_from_slice(&[0, 1]);

    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_INSTRUCTION.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    push_compact_u16(&mut out, data.len() as u16);
    out.extend_from_slice(&data);

    out
}

/// Full wire transaction: the payer's signature followed by the message.
pub fn signed_transaction(signature: &[u8; 64], message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + signature.len() + message.len());
    push_compact_u16(&mut out, 1);
    out.extend_from_slice(signature);
    out.extend_from_slice(message);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_u16() {
        let mut out = Vec::new();
        push_compact_u16(&mut out, 0x7f);
        push_compact_u16(&mut out, 0x80);
        push_compact_u16(&mut out, 0x3fff);
        assert_eq!(out, vec![0x7f, 0x80, 0x01, 0xff, 0x7f]);
    }

    #[test]
    fn test_transfer_message_layout() {
        let from = [1u8; 32];
        let to = [2u8; 32];
        let blockhash = [3u8; 32];

        let message = transfer_message(&from, &to, 100_000_000, &blockhash);

        assert_eq!(&message[..4], &[1, 0, 1, 3]);
        assert_eq!(&message[4..36], &from);
        assert_eq!(&message[36..68], &to);
        assert_eq!(&message[68..100], &SYSTEM_PROGRAM_ID);
        assert_eq!(&message[100..132], &blockhash);
        // one instruction: program index 2, accounts [0, 1], 12 bytes of data
        assert_eq!(&message[132..138], &[1, 2, 2, 0, 1, 12]);
        assert_eq!(&message[138..142], &2u32.to_le_bytes());
        assert_eq!(&message[142..150], &100_000_000u64.to_le_bytes());
        assert_eq!(message.len(), 150);
    }

    #[test]
    fn test_decode_key() {
        let key = [7u8; 32];
        assert_eq!(decode_key(&encode_key(&key), "account"), Ok(key));
        assert!(matches!(
            decode_key("not-base58!", "account"),
            Err(TransferError::Rejected(_))
        ));
        assert!(matches!(
            decode_key("abc", "account"),
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(
            encode_key(&SYSTEM_PROGRAM_ID),
            "11111111111111111111111111111111"
        );
    }
}
