//! AES-256-GCM encryption for saved bearer tokens
//!
//! Each ciphertext is bound to the backend URL it was issued by (passed as
//! associated data), so a row copied onto another backend fails to decrypt.
//! The key is derived per machine via Argon2id.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::Argon2;
use hostcredits_core::{Error, Result};
use rand::RngCore;

const MACHINE_SALT: &[u8] = b"hostcredits-v1-machine-salt";
const PASSWORD_SALT: &[u8] = b"hostcredits-salt-v1";

/// Encrypted token with IV for decryption
#[derive(Debug, Clone)]
pub struct EncryptedToken {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; 12],
}

/// Encrypts and decrypts bearer tokens for the saved-session store
pub struct TokenEncryptor {
    cipher: Aes256Gcm,
}

impl TokenEncryptor {
    /// Create a new encryptor from a 32-byte key
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(Error::EncryptionError(format!(
                "key must be 32 bytes, got {}",
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::EncryptionError(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Create encryptor from a passphrase (derives 32-byte key via Argon2id)
    pub fn from_password(password: &str) -> Result<Self> {
        let key = derive_key(password, PASSWORD_SALT)?;
        Self::new(&key)
    }

    /// Encrypt a token for the given backend with a fresh random IV
    pub fn encrypt_for(&self, base_url: &str, token: &str) -> Result<EncryptedToken> {
        let mut iv = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: token.as_bytes(),
                    aad: base_url.as_bytes(),
                },
            )
            .map_err(|e| Error::EncryptionError(e.to_string()))?;

        Ok(EncryptedToken { ciphertext, iv })
    }

    /// Decrypt a token previously encrypted for the same backend
    pub fn decrypt_for(&self, base_url: &str, encrypted: &EncryptedToken) -> Result<String> {
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(&encrypted.iv),
                Payload {
                    msg: encrypted.ciphertext.as_ref(),
                    aad: base_url.as_bytes(),
                },
            )
            .map_err(|_| {
                Error::EncryptionError("saved token could not be decrypted on this machine".into())
            })?;

        String::from_utf8(plaintext).map_err(|e| Error::EncryptionError(e.to_string()))
    }
}

fn derive_key(secret: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(secret.as_bytes(), salt, &mut key)
        .map_err(|e| Error::EncryptionError(format!("Argon2 key derivation failed: {}", e)))?;
    Ok(key)
}

/// Machine fingerprint: machine-uid plus host name
pub fn machine_fingerprint() -> String {
    let machine_id = machine_uid::get().unwrap_or_else(|_| "no-machine-id".to_string());
    let hostname = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string());

    format!("hostcredits-{}-{}", machine_id, hostname)
}

/// Derive the 32-byte key that protects saved sessions on this machine.
///
/// Stable across runs on one machine; a database copied elsewhere is unreadable.
pub fn derive_machine_key() -> Result<[u8; 32]> {
    derive_key(&machine_fingerprint(), MACHINE_SALT)
}
