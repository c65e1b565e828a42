use serde::{Deserialize, Serialize};

/// SHA-256 hex fingerprint of a snapshot's table/column structure.
///
/// Computed by `schemadiff::fingerprint(&snapshot)`. Two snapshots with the
/// same fingerprint compare as identical; different fingerprints only mean
/// the full comparison has something to look at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Returns the raw hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for terminal output.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
