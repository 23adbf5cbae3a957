//! Dataset port for importing training data.

use async_trait::async_trait;

use crate::domain::dataset::Dataset;
use crate::error::Result;

/// Source of training datasets.
///
/// Loading is an I/O suspension point; implementations must not block the
/// runtime.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Load a fresh dataset.
    async fn load(&self) -> Result<Dataset>;

    /// Human-readable description of where data comes from.
    fn describe(&self) -> String;
}

/// A source that always yields the same in-memory dataset.
pub struct StaticDatasetSource {
    dataset: Dataset,
}

impl StaticDatasetSource {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl DatasetSource for StaticDatasetSource {
    async fn load(&self) -> Result<Dataset> {
        Ok(self.dataset.clone())
    }

    fn describe(&self) -> String {
        self.dataset.source.clone()
    }
}
