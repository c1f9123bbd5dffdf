//! HMAC signing key derived from the configured `JWT_SECRET`.
//!
//! Derivation:
//! - まず標準 base64 として decode を試み、成功すればその bytes を鍵にする
//! - decode に失敗した場合は secret の UTF-8 bytes をそのまま鍵にする
//!
//! 鍵は起動時に一度だけ作り、以降は read-only で共有する（リクエスト毎に再計算しない）。
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Which derivation path produced the key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Base64,
    RawUtf8,
}

/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Vec<u8>,
    source: KeySource,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKey")
            .field("source", &self.source)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SigningKey {
    pub fn derive(secret: &str) -> Self {
        match STANDARD.decode(secret) {
            Ok(bytes) => Self {
                bytes,
                source: KeySource::Base64,
            },
            Err(_) => Self::from_raw(secret),
        }
    }

    /// Skip base64 interpretation and use the UTF-8 bytes as-is.
    pub fn from_raw(secret: &str) -> Self {
        Self {
            bytes: secret.as_bytes().to_vec(),
            source: KeySource::RawUtf8,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    /// HS256 keys shorter than the hash output (32 bytes) are accepted but weak.
    pub fn is_weak(&self) -> bool {
        self.bytes.len() < 32
    }
}
