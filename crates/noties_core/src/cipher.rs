//! Passphrase-keyed content cipher.
//!
//! # Responsibility
//! - Seal plaintext note bodies into a self-contained textual envelope.
//! - Open envelopes back into plaintext given the sealing passphrase.
//!
//! # Invariants
//! - Envelope layout is `base64("Salted__" || salt[8] || ciphertext)`, the
//!   OpenSSL / CryptoJS passphrase format.
//! - Key and IV come from `EVP_BytesToKey` (MD5, one round) over passphrase
//!   and salt. The cipher is AES-256-CBC with PKCS#7 padding.
//! - Stateless: no key caching, no key-strength checks, no re-use detection.
//!
//! # Known weakness
//! Envelopes carry no authentication tag. A wrong passphrase and corrupted
//! bytes both surface as `WrongKeyOrCorruptData`, and a wrong passphrase can
//! occasionally pass the padding and UTF-8 checks and return garbage instead
//! of an error. Callers must treat a successful `open` as "decrypted", not as
//! "verified".

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};
use rand::RngCore;
use std::error::Error;
use std::fmt::{Display, Formatter};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const SALT_HEADER: &[u8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

pub type CipherResult<T> = Result<T, CipherError>;

/// Failure modes of the content cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    /// Seal/open was called with an empty passphrase.
    EmptyPassphrase,
    /// Passphrase mismatch or malformed envelope; the two are
    /// indistinguishable.
    WrongKeyOrCorruptData,
}

impl Display for CipherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPassphrase => write!(f, "passphrase must not be empty"),
            Self::WrongKeyOrCorruptData => {
                write!(f, "wrong passphrase or corrupted envelope")
            }
        }
    }
}

impl Error for CipherError {}

/// Encrypts `plaintext` under `passphrase` with a fresh random salt.
///
/// # Errors
/// - `EmptyPassphrase` when `passphrase` is empty.
pub fn seal(plaintext: &str, passphrase: &str) -> CipherResult<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    seal_with_salt(plaintext, passphrase, salt)
}

/// Decrypts an envelope produced by [`seal`] (or by OpenSSL/CryptoJS
/// passphrase mode).
///
/// # Errors
/// - `EmptyPassphrase` when `passphrase` is empty.
/// - `WrongKeyOrCorruptData` for bad base64, missing salt header, truncated or
///   misaligned ciphertext, bad padding, or non-UTF-8 plaintext.
pub fn open(envelope: &str, passphrase: &str) -> CipherResult<String> {
    ensure_passphrase(passphrase)?;

    let raw = STANDARD
        .decode(envelope.trim())
        .map_err(|_| CipherError::WrongKeyOrCorruptData)?;
    let (salt, ciphertext) = split_envelope(&raw)?;
    let (key, iv) = derive_key_iv(passphrase.as_bytes(), salt);

    let plaintext = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::WrongKeyOrCorruptData)?;
    String::from_utf8(plaintext).map_err(|_| CipherError::WrongKeyOrCorruptData)
}

fn seal_with_salt(plaintext: &str, passphrase: &str, salt: [u8; SALT_LEN]) -> CipherResult<String> {
    ensure_passphrase(passphrase)?;

    let (key, iv) = derive_key_iv(passphrase.as_bytes(), &salt);
    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut raw = Vec::with_capacity(SALT_HEADER.len() + SALT_LEN + ciphertext.len());
    raw.extend_from_slice(SALT_HEADER);
    raw.extend_from_slice(&salt);
    raw.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(raw))
}

fn ensure_passphrase(passphrase: &str) -> CipherResult<()> {
    if passphrase.is_empty() {
        return Err(CipherError::EmptyPassphrase);
    }
    Ok(())
}

fn split_envelope(raw: &[u8]) -> CipherResult<(&[u8], &[u8])> {
    let body = raw
        .strip_prefix(SALT_HEADER)
        .ok_or(CipherError::WrongKeyOrCorruptData)?;
    if body.len() < SALT_LEN + BLOCK_LEN {
        return Err(CipherError::WrongKeyOrCorruptData);
    }

    let (salt, ciphertext) = body.split_at(SALT_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CipherError::WrongKeyOrCorruptData);
    }
    Ok((salt, ciphertext))
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration.
fn derive_key_iv(passphrase: &[u8], salt: &[u8]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut material: Vec<u8> = Vec::with_capacity(KEY_LEN + IV_LEN + 16);
    let mut previous: Vec<u8> = Vec::new();
    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Md5::new();
        hasher.update(&previous);
        hasher.update(passphrase);
        hasher.update(salt);
        previous = hasher.finalize().to_vec();
        material.extend_from_slice(&previous);
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}

#[cfg(test)]
mod tests {
    use super::{open, seal, seal_with_salt, CipherError};

    const FIXED_SALT: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    #[test]
    fn seal_with_fixed_salt_matches_openssl_output() {
        // openssl enc -aes-256-cbc -md md5 -S 0102030405060708 -k k1
        let envelope = seal_with_salt("milk eggs bread", "k1", FIXED_SALT).unwrap();
        assert_eq!(envelope, "U2FsdGVkX18BAgMEBQYHCOhlU5xdxL7K7hCskr6uqmM=");
    }

    #[test]
    fn open_accepts_openssl_envelope_with_multibyte_text() {
        let plaintext = open(
            "U2FsdGVkX18BAgMEBQYHCBJL1y78Qb8MCU7S1sLwdKNMm/7wFK2f4A710Vh7RTqh",
            "k1",
        )
        .unwrap();
        assert_eq!(plaintext, "Contenido secreto: ñandú 🦀");
    }

    #[test]
    fn seal_uses_fresh_salt_per_call() {
        let first = seal("same body", "k1").unwrap();
        let second = seal("same body", "k1").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("U2FsdGVkX1"));
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let envelope = seal("", "k1").unwrap();
        assert_eq!(open(&envelope, "k1").unwrap(), "");
    }

    #[test]
    fn empty_passphrase_is_rejected_both_ways() {
        assert_eq!(seal("body", "").unwrap_err(), CipherError::EmptyPassphrase);
        let envelope = seal("body", "k1").unwrap();
        assert_eq!(open(&envelope, "").unwrap_err(), CipherError::EmptyPassphrase);
    }

    #[test]
    fn malformed_envelopes_fail_as_wrong_key_or_corrupt() {
        for envelope in [
            "not base64 at all!",
            "bWlsayBlZ2dzIGJyZWFk",
            "U2FsdGVkX18BAgMEBQYHCA==",
            "U2FsdGVkX18BAgMEBQYHCOhlU5xdxL7K7hCskr6u",
        ] {
            assert_eq!(
                open(envelope, "k1").unwrap_err(),
                CipherError::WrongKeyOrCorruptData,
                "envelope {envelope} should be rejected"
            );
        }
    }
}
