//! Authenticated encryption for stored broker passwords.
//!
//! Ciphertexts are self-describing strings. The current scheme is
//! `v1:` followed by hex(nonce ‖ ciphertext ‖ tag) under AES-256-GCM with a
//! 12-byte nonce. Unprefixed values are the legacy layout
//! hex(iv ‖ tag ‖ ciphertext) with a 16-byte IV; they can still be read so
//! existing rows keep working, but new values are always written as `v1:`.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{Aes256Gcm, AesGcm, Key, Nonce};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SCHEME_V1: &str = "v1:";
const V1_NONCE_LEN: usize = 12;
const LEGACY_IV_LEN: usize = 16;
const TAG_LEN: usize = 16;

type LegacyAesGcm = AesGcm<Aes256, U16>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("Encryption failed")]
    Encrypt,
    #[error("Malformed ciphertext: {0}")]
    Malformed(String),
    #[error("Ciphertext failed integrity check")]
    Integrity,
    #[error("Decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// AES-256-GCM keyed by SHA-256 of a shared secret of any length.
#[derive(Clone)]
pub struct PasswordCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCipher").finish_non_exhaustive()
    }
}

impl PasswordCipher {
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypts with a fresh random nonce, so equal inputs give different outputs.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut payload = nonce.to_vec();
        payload.extend(ciphertext);
        Ok(format!("{}{}", SCHEME_V1, hex::encode(payload)))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        let plaintext = match encoded.strip_prefix(SCHEME_V1) {
            Some(body) => self.decrypt_v1(body)?,
            None => self.decrypt_legacy(encoded)?,
        };
        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }

    fn decrypt_v1(&self, body: &str) -> Result<Vec<u8>, CipherError> {
        let payload = decode_hex(body)?;
        if payload.len() < V1_NONCE_LEN + TAG_LEN {
            return Err(CipherError::Malformed("too short".to_string()));
        }

        let (nonce, ciphertext) = payload.split_at(V1_NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Integrity)
    }

    fn decrypt_legacy(&self, encoded: &str) -> Result<Vec<u8>, CipherError> {
        let payload = decode_hex(encoded)?;
        if payload.len() < LEGACY_IV_LEN + TAG_LEN {
            return Err(CipherError::Malformed("too short".to_string()));
        }

        let (iv, rest) = payload.split_at(LEGACY_IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);
        let cipher = LegacyAesGcm::new(GenericArray::from_slice(&self.key));

        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(iv),
                b"",
                &mut buffer,
                GenericArray::from_slice(tag),
            )
            .map_err(|_| CipherError::Integrity)?;
        Ok(buffer)
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>, CipherError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CipherError::Malformed("empty".to_string()));
    }
    hex::decode(trimmed).map_err(|e| CipherError::Malformed(e.to_string()))
}
