use std::sync::Arc;

use contactscan_core::{ContactExtractor, ContactPair, PhonePattern, ServiceConfig};
use thiserror::Error;
use tracing::info;

use crate::batch::{BatchError, BatchOptions, BatchRunner};
use crate::recognizer::OcrBackend;
use crate::temp::TempImage;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request itself is unusable (no images, too many images).
    #[error("{0}")]
    InvalidInput(String),
    #[error("Contact extraction failed: {0}")]
    Failure(String),
}

impl From<BatchError> for PipelineError {
    fn from(e: BatchError) -> Self {
        match e {
            BatchError::Empty | BatchError::TooMany { .. } => PipelineError::InvalidInput(e.to_string()),
            BatchError::Task(_) => PipelineError::Failure(e.to_string()),
        }
    }
}

/// Orchestrates: OCR every image → split lines → extract pairs → drop empties.
pub struct ContactPipeline {
    runner: BatchRunner,
    extractor: ContactExtractor,
}

impl ContactPipeline {
    pub fn new(runner: BatchRunner, extractor: ContactExtractor) -> Self {
        Self { runner, extractor }
    }

    pub fn from_config(recognizer: Arc<dyn OcrBackend>, config: &ServiceConfig) -> Self {
        Self::new(
            BatchRunner::new(recognizer, BatchOptions::from_config(config)),
            ContactExtractor::new(config.extract.phone_pattern),
        )
    }

    pub fn phone_pattern(&self) -> PhonePattern {
        self.extractor.pattern()
    }

    pub fn max_images(&self) -> usize {
        self.runner.options().max_images
    }

    pub async fn process(&self, images: Vec<TempImage>) -> Result<Vec<ContactPair>, PipelineError> {
        let image_count = images.len();
        let recognitions = self.runner.run(images).await?;
        let failed = recognitions.iter().filter(|r| !r.succeeded).count();

        let pairs = self.extractor.extract_contacts(recognitions.iter().map(|r| r.text.as_str()));

        info!(images = image_count, failed, pairs = pairs.len(), "Batch extracted");
        Ok(pairs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
