//! AES-256-GCM encryption of stored secrets.
//!
//! The key is the SHA-256 digest of the configured password. Each value gets
//! a fresh random 96-bit nonce; the stored form is `encode(nonce || ciphertext)`
//! in base64 or hex.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::service::config::{CipherEncoding, CryptoConfig};
use crate::traits::Cipher;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors from encrypting or decrypting a stored secret.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("unsupported cipher algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("invalid key material")]
    InvalidKey,
    #[error("ciphertext is not valid {0}")]
    Encoding(&'static str),
    #[error("ciphertext is truncated")]
    Truncated,
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed: wrong key or corrupted data")]
    Decrypt,
    #[error("decrypted value is not valid UTF-8")]
    Utf8,
}

/// [`Cipher`] using AES-256-GCM with a password-derived key.
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
    encoding: CipherEncoding,
}

impl AesGcmCipher {
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedAlgorithm`] for any algorithm label
    /// other than `aes-256-gcm`.
    pub fn new(config: &CryptoConfig) -> Result<Self, CryptoError> {
        if !config.algorithm.eq_ignore_ascii_case("aes-256-gcm") {
            return Err(CryptoError::UnsupportedAlgorithm(config.algorithm.clone()));
        }
        let key = Sha256::digest(config.password.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self {
            cipher,
            encoding: config.encoding,
        })
    }

    fn encode(&self, bytes: &[u8]) -> String {
        match self.encoding {
            CipherEncoding::Base64 => STANDARD.encode(bytes),
            CipherEncoding::Hex => hex::encode(bytes),
        }
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, CryptoError> {
        match self.encoding {
            CipherEncoding::Base64 => STANDARD
                .decode(text.trim())
                .map_err(|_| CryptoError::Encoding("base64")),
            CipherEncoding::Hex => {
                hex::decode(text.trim()).map_err(|_| CryptoError::Encoding("hex"))
            }
        }
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce);
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(self.encode(&out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = self.decode(ciphertext)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plain).map_err(|_| CryptoError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(password: &str, encoding: CipherEncoding) -> AesGcmCipher {
        AesGcmCipher::new(&CryptoConfig {
            password: password.to_string(),
            encoding,
            ..CryptoConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn decrypts_what_it_encrypts() {
        for encoding in [CipherEncoding::Base64, CipherEncoding::Hex] {
            let c = cipher("catalystPass", encoding);
            let sealed = c.encrypt("s3cr3t!").unwrap();
            assert_ne!(sealed, "s3cr3t!");
            assert_eq!(c.decrypt(&sealed).unwrap(), "s3cr3t!");
        }
    }

    #[test]
    fn nonces_make_ciphertexts_differ() {
        let c = cipher("catalystPass", CipherEncoding::Base64);
        assert_ne!(c.encrypt("same").unwrap(), c.encrypt("same").unwrap());
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let sealed = cipher("one", CipherEncoding::Hex).encrypt("value").unwrap();
        let err = cipher("two", CipherEncoding::Hex).decrypt(&sealed).unwrap_err();
        assert!(matches!(err, CryptoError::Decrypt));
    }

    #[test]
    fn malformed_input_is_reported() {
        let c = cipher("catalystPass", CipherEncoding::Hex);
        assert!(matches!(c.decrypt("zz"), Err(CryptoError::Encoding("hex"))));
        assert!(matches!(c.decrypt("00ff"), Err(CryptoError::Truncated)));
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let result = AesGcmCipher::new(&CryptoConfig {
            algorithm: "aes-256-ctr".to_string(),
            ..CryptoConfig::default()
        });
        assert!(matches!(result, Err(CryptoError::UnsupportedAlgorithm(_))));
    }
}
