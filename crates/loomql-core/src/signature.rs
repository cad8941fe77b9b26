//! Content signatures used for change detection.

use sha2::{Digest, Sha256};

/// Incremental SHA-256 signature over labelled components.
///
/// Each component is written as `label`, its byte length and the bytes, so
/// `("ab", "c")` and `("a", "bc")` never collide.
#[derive(Clone, Default)]
pub struct SignatureBuilder {
    hasher: Sha256,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a labelled component.
    pub fn component(mut self, label: &str, value: &str) -> Self {
        self.write(label);
        self.write(value);
        self
    }

    /// Adds an optional component; `None` hashes differently from `""`.
    pub fn optional(self, label: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.component(label, value),
            None => self.component(label, "\u{0}none"),
        }
    }

    /// Adds a list of components after sorting them.
    pub fn sorted<I, S>(self, label: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        values.sort();
        let mut builder = self.component(label, &values.len().to_string());
        for value in &values {
            builder = builder.component(label, value);
        }
        builder
    }

    /// Returns the hex-encoded digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    fn write(&mut self, value: &str) {
        self.hasher.update((value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
    }
}

/// Hex SHA-256 over raw bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
