use crate::error::{CoreError, Result};
use bip39::rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};

const SALT_SIZE: usize = 32;
const PBKDF2_ROUNDS: u32 = 100_000;

/// Password-sealed secret as kept on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedSecret {
    pub version: u32,
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub checksum: String,
}

/// Encrypt data with password using ChaCha20Poly1305
pub fn seal(data: &[u8], password: &str) -> Result<SealedSecret> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let key = derive_key(password, &salt);
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let cipher = ChaCha20Poly1305::new(&key);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| CoreError::encryption(format!("Encryption failed: {}", e)))?;

    let checksum = calculate_checksum(&ciphertext);

    Ok(SealedSecret {
        version: 1,
        salt: salt.to_vec(),
        nonce: nonce.to_vec(),
        ciphertext,
        checksum,
    })
}

/// Decrypt data with password
pub fn open(sealed: &SealedSecret, password: &str) -> Result<Vec<u8>> {
    if calculate_checksum(&sealed.ciphertext) != sealed.checksum {
        return Err(CoreError::encryption("Checksum verification failed"));
    }

    let key = derive_key(password, &sealed.salt);
    let cipher = ChaCha20Poly1305::new(&key);
    let nonce = Nonce::from_slice(&sealed.nonce);

    cipher
        .decrypt(nonce, sealed.ciphertext.as_ref())
        .map_err(|_| CoreError::encryption("Decryption failed (wrong password?)"))
}

fn derive_key(password: &str, salt: &[u8]) -> Key {
    use pbkdf2::pbkdf2_hmac;

    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    *Key::from_slice(&key)
}

fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let sealed = seal(b"abandon abandon about", "hunter2").unwrap();
        assert_eq!(open(&sealed, "hunter2").unwrap(), b"abandon abandon about");
    }

    #[test]
    fn test_wrong_password() {
        let sealed = seal(b"abandon abandon about", "hunter2").unwrap();
        assert!(open(&sealed, "hunter3").is_err());
    }

    #[test]
    fn test_tampered_ciphertext() {
        let mut sealed = seal(b"abandon abandon about", "hunter2").unwrap();
        sealed.ciphertext[0] ^= 0xff;
        assert!(open(&sealed, "hunter2").is_err());
    }
}
