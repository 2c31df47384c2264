//! Batching parameter types
//!
//! This module defines the record the engine uses to batch result delivery and
//! a declarative partial override of it. Values are never validated or clamped
//! here: whatever a hook writes is what the engine receives.

use serde::{Deserialize, Serialize};

/// Batching parameters for a single query
///
/// Mirrors the engine's record field-for-field. Each phase (initial results,
/// progress while gathering, live updates afterwards) is batched by a maximum
/// result count and a maximum delay in milliseconds, whichever comes first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchingParams {
    /// Maximum results in the first batch
    #[serde(default)]
    pub first_max_num: i64,
    /// Maximum delay before the first batch (ms)
    #[serde(default)]
    pub first_max_ms: i64,
    /// Maximum results per progress batch
    #[serde(default)]
    pub progress_max_num: i64,
    /// Maximum delay between progress batches (ms)
    #[serde(default)]
    pub progress_max_ms: i64,
    /// Maximum results per update batch
    #[serde(default)]
    pub update_max_num: i64,
    /// Maximum delay between update batches (ms)
    #[serde(default)]
    pub update_max_ms: i64,
}

impl BatchingParams {
    /// Create an all-zero parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set first batch limits
    pub fn with_first_batch(mut self, max_num: i64, max_ms: i64) -> Self {
        self.first_max_num = max_num;
        self.first_max_ms = max_ms;
        self
    }

    /// Builder method: set progress batch limits
    pub fn with_progress_batch(mut self, max_num: i64, max_ms: i64) -> Self {
        self.progress_max_num = max_num;
        self.progress_max_ms = max_ms;
        self
    }

    /// Builder method: set update batch limits
    pub fn with_update_batch(mut self, max_num: i64, max_ms: i64) -> Self {
        self.update_max_num = max_num;
        self.update_max_ms = max_ms;
        self
    }
}

/// A partial batching override
///
/// Every `Some` field replaces the corresponding default; `None` fields leave
/// the default untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchingPatch {
    #[serde(default)]
    pub first_max_num: Option<i64>,
    #[serde(default)]
    pub first_max_ms: Option<i64>,
    #[serde(default)]
    pub progress_max_num: Option<i64>,
    #[serde(default)]
    pub progress_max_ms: Option<i64>,
    #[serde(default)]
    pub update_max_num: Option<i64>,
    #[serde(default)]
    pub update_max_ms: Option<i64>,
}

impl BatchingPatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: override the first batch size
    pub fn with_first_max_num(mut self, value: i64) -> Self {
        self.first_max_num = Some(value);
        self
    }

    /// Builder method: override the first batch delay
    pub fn with_first_max_ms(mut self, value: i64) -> Self {
        self.first_max_ms = Some(value);
        self
    }

    /// Builder method: override the progress batch size
    pub fn with_progress_max_num(mut self, value: i64) -> Self {
        self.progress_max_num = Some(value);
        self
    }

    /// Builder method: override the progress batch delay
    pub fn with_progress_max_ms(mut self, value: i64) -> Self {
        self.progress_max_ms = Some(value);
        self
    }

    /// Builder method: override the update batch size
    pub fn with_update_max_num(mut self, value: i64) -> Self {
        self.update_max_num = Some(value);
        self
    }

    /// Builder method: override the update batch delay
    pub fn with_update_max_ms(mut self, value: i64) -> Self {
        self.update_max_ms = Some(value);
        self
    }

    /// True if the patch would leave every field unchanged
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch on top of `params`
    pub fn apply(&self, mut params: BatchingParams) -> BatchingParams {
        if let Some(value) = self.first_max_num {
            params.first_max_num = value;
        }
        if let Some(value) = self.first_max_ms {
            params.first_max_ms = value;
        }
        if let Some(value) = self.progress_max_num {
            params.progress_max_num = value;
        }
        if let Some(value) = self.progress_max_ms {
            params.progress_max_ms = value;
        }
        if let Some(value) = self.update_max_num {
            params.update_max_num = value;
        }
        if let Some(value) = self.update_max_ms {
            params.update_max_ms = value;
        }
        params
    }
}
