//! Reference corpus configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Where the reference documents come from
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RetrievalConfig {
    /// YAML corpus loaded into the in-memory retriever
    pub corpus_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_corpus_by_default() {
        assert!(RetrievalConfig::default().corpus_path.is_none());
    }
}
