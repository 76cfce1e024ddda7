use std::sync::Arc;

use contactscan_core::{ServiceConfig, MAX_BATCH_IMAGES};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::temp::TempImage;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No files uploaded")]
    Empty,
    #[error("Too many files: at most {max} per request")]
    TooMany { max: usize, got: usize },
    #[error("OCR task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Text recognized for one image. `text` is empty when OCR failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub file_name: String,
    pub text: String,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub language: String,
    pub preprocess: bool,
    pub max_concurrency: usize,
    pub max_images: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            language: "eng".into(),
            preprocess: true,
            max_concurrency: 4,
            max_images: MAX_BATCH_IMAGES,
        }
    }
}

impl BatchOptions {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            language: config.ocr.language.clone(),
            preprocess: config.ocr.preprocess,
            max_concurrency: config.ocr.max_concurrency,
            max_images: config.upload.max_files,
        }
    }
}

/// Runs OCR over a batch of staged images.
///
/// Every image gets its own blocking task; at most `max_concurrency` run at
/// once. Results come back in submission order. A failure on one image is
/// logged and recorded as empty text, and never fails the batch.
pub struct BatchRunner {
    recognizer: Arc<dyn OcrBackend>,
    options: Arc<BatchOptions>,
    permits: Arc<Semaphore>,
}

impl BatchRunner {
    pub fn new(recognizer: Arc<dyn OcrBackend>, options: BatchOptions) -> Self {
        let permits = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        Self { recognizer, options: Arc::new(options), permits }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub async fn run(&self, images: Vec<TempImage>) -> Result<Vec<Recognition>, BatchError> {
        if images.is_empty() {
            return Err(BatchError::Empty);
        }
        if images.len() > self.options.max_images {
            // Dropping `images` deletes every staged file.
            return Err(BatchError::TooMany { max: self.options.max_images, got: images.len() });
        }

        debug!(images = images.len(), "Starting OCR batch");

        let handles: Vec<_> = images
            .into_iter()
            .map(|image| {
                tokio::spawn(recognize_one(
                    Arc::clone(&self.recognizer),
                    Arc::clone(&self.options),
                    Arc::clone(&self.permits),
                    image,
                ))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await?);
        }
        Ok(results)
    }
}

async fn recognize_one(
    recognizer: Arc<dyn OcrBackend>,
    options: Arc<BatchOptions>,
    permits: Arc<Semaphore>,
    image: TempImage,
) -> Recognition {
    let outcome = {
        // The semaphore is never closed, so a permit always arrives.
        let _permit = permits.acquire_owned().await.ok();
        attempt(recognizer, &options, &image).await
    };

    let file_name = image.original_name().to_string();
    if let Err(e) = image.release().await {
        warn!(file = %file_name, "Failed to delete staged image: {e}");
    }

    match outcome {
        Ok(text) => Recognition { file_name, text: text.trim().to_string(), succeeded: true },
        Err(e) => {
            warn!(file = %file_name, "OCR failed, recording empty text: {e}");
            Recognition { file_name, text: String::new(), succeeded: false }
        }
    }
}

async fn attempt(
    recognizer: Arc<dyn OcrBackend>,
    options: &BatchOptions,
    image: &TempImage,
) -> Result<String, OcrError> {
    let bytes = image.read().await?;
    let language = options.language.clone();
    let preprocess = options.preprocess;

    tokio::task::spawn_blocking(move || {
        let bytes = if preprocess { preprocess::prepare_for_ocr_from_bytes(&bytes)? } else { bytes };
        recognizer.recognize(&bytes, &language)
    })
    .await
    .map_err(|e| OcrError::Engine(format!("recognition task failed: {e}")))?
}

// ── Tests ─────────────────────────────────────────────────────────────────────
