use std::path::PathBuf;
use std::sync::Arc;

use contactscan_core::ServiceConfig;
use contactscan_ocr::ContactPipeline;

/// Shared, read-only state handed to every request. Batches never share
/// mutable data; the upload directory is the only common resource.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ContactPipeline>,
    pub upload_dir: PathBuf,
    pub field_name: String,
    pub max_request_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: ContactPipeline, config: &ServiceConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            upload_dir: config.upload.dir.clone(),
            field_name: config.upload.field_name.clone(),
            max_request_bytes: config.upload.max_request_bytes,
        }
    }

    pub fn max_files(&self) -> usize {
        self.pipeline.max_images()
    }
}
