//! Sequential batch queue over the image service.
//!
//! Items are processed strictly one at a time in array order, never
//! concurrently, so the queue stays deterministic and inspectable. One
//! item's failure is recorded on that item alone and processing continues.

use std::sync::Arc;

use crate::artifact::EncodedImage;
use crate::service::{ImageService, ServiceResult, UpscaleTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Processing,
    Done,
    Error,
}

impl BatchStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

/// Operation applied uniformly to every queued item in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Edit { instruction: String },
    Upscale { tier: UpscaleTier },
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: u64,
    pub source: Arc<EncodedImage>,
    pub status: BatchStatus,
    pub result: Option<Arc<EncodedImage>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchRunReport {
    pub processed: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct BatchQueue {
    items: Vec<BatchItem>,
    next_id: u64,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    pub fn enqueue(&mut self, source: Arc<EncodedImage>) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id.saturating_add(1);
        self.items.push(BatchItem {
            id,
            source,
            status: BatchStatus::Idle,
            result: None,
            error: None,
        });
        id
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn item(&self, id: u64) -> Option<&BatchItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == BatchStatus::Idle)
            .count()
    }

    /// Runs `operation` over every idle item in array order. Items that
    /// already finished (done or error) are left as they are.
    pub fn process<S: ImageService>(
        &mut self,
        service: &S,
        operation: &BatchOperation,
    ) -> BatchRunReport {
        let mut report = BatchRunReport::default();
        for item in &mut self.items {
            if item.status != BatchStatus::Idle {
                continue;
            }

            item.status = BatchStatus::Processing;
            let outcome = apply_operation(service, &item.source, operation);
            match outcome {
                Ok(result) => {
                    item.result = Some(Arc::new(result));
                    item.error = None;
                    item.status = BatchStatus::Done;
                    report.processed += 1;
                    tracing::debug!(item_id = item.id, "batch item finished");
                }
                Err(err) => {
                    let message = err.to_string();
                    tracing::warn!(item_id = item.id, error = %message, "batch item failed");
                    item.error = Some(message);
                    item.status = BatchStatus::Error;
                    report.failed += 1;
                }
            }
        }
        report
    }
}

fn apply_operation<S: ImageService>(
    service: &S,
    source: &EncodedImage,
    operation: &BatchOperation,
) -> ServiceResult<EncodedImage> {
    match operation {
        BatchOperation::Edit { instruction } => service.edit(source, instruction),
        BatchOperation::Upscale { tier } => service.upscale(source, *tier),
    }
}
