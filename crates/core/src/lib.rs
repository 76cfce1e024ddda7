pub mod config;
pub mod contact;
pub mod extract;

pub use config::{
    ConfigError, ExtractConfig, LogConfig, LogFormat, OcrConfig, ServerConfig, ServiceConfig,
    UploadConfig, MAX_BATCH_IMAGES,
};
pub use contact::{format_contact_list, split_lines, ContactPair};
pub use extract::{ContactExtractor, PhonePattern};
