pub mod batch;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod temp;

pub use batch::{BatchError, BatchOptions, BatchRunner, Recognition};
pub use pipeline::{ContactPipeline, PipelineError};
pub use preprocess::{prepare_for_ocr_from_bytes, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, TesseractCli};
pub use temp::TempImage;

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
