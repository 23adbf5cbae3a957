//! Mock [`DatasetSource`] implementations for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::dataset::Dataset;
use crate::error::{DatasetError, Result};
use crate::port::outbound::dataset::DatasetSource;

/// A source whose `load` never completes. For cancellation tests.
#[derive(Default)]
pub struct PendingSource {
    loads: Arc<AtomicU32>,
}

impl PendingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loads(&self) -> Arc<AtomicU32> {
        self.loads.clone()
    }
}

#[async_trait]
impl DatasetSource for PendingSource {
    async fn load(&self) -> Result<Dataset> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    fn describe(&self) -> String {
        "pending".into()
    }
}

/// A source that sleeps for `delay` before returning its dataset.
pub struct SlowSource {
    dataset: Dataset,
    delay: Duration,
    loads: Arc<AtomicU32>,
}

impl SlowSource {
    pub fn new(dataset: Dataset, delay: Duration) -> Self {
        Self {
            dataset,
            delay,
            loads: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn loads(&self) -> Arc<AtomicU32> {
        self.loads.clone()
    }
}

#[async_trait]
impl DatasetSource for SlowSource {
    async fn load(&self) -> Result<Dataset> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.dataset.clone())
    }

    fn describe(&self) -> String {
        format!("slow({})", self.dataset.source)
    }
}

/// A source that always fails with [`DatasetError::Empty`].
pub struct FailingSource;

#[async_trait]
impl DatasetSource for FailingSource {
    async fn load(&self) -> Result<Dataset> {
        Err(DatasetError::Empty("broken.csv".into()).into())
    }

    fn describe(&self) -> String {
        "broken.csv".into()
    }
}
