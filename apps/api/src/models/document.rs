use std::fmt;

use serde::{Deserialize, Serialize};

/// The two document kinds the pipeline ingests. Cache keys and vector ids are
/// namespaced by this value, so the string forms are part of the persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Resume,
    Job,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Resume => "resume",
            DocKind::Job => "job",
        }
    }

    /// Minimum extracted-text length accepted at ingest. Anything shorter is a
    /// validation error, not a processing failure.
    pub fn min_text_len(&self) -> usize {
        match self {
            DocKind::Resume => 50,
            DocKind::Job => 20,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocKind::Resume => "Resume",
            DocKind::Job => "Job description",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
