use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 of a normalised document URL, used to spot concurrent runs for the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrlFingerprint(String);

impl UrlFingerprint {
    pub fn new(hash: String) -> Result<Self, String> {
        if hash.len() != 64 {
            return Err("Fingerprint must be 64 characters long (SHA-256)".to_string());
        }

        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("Fingerprint must contain only hexadecimal characters".to_string());
        }

        Ok(Self(hash.to_lowercase()))
    }

    /// Fingerprints the URL after trimming and dropping any fragment.
    pub fn of_url(url: &str) -> Self {
        let trimmed = url.trim();
        let normalized = trimmed.split('#').next().unwrap_or(trimmed);

        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UrlFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
