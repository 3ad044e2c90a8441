pub mod config;
pub mod photo;
pub mod storage;

pub use config::StorageConfig;
pub use photo::{Photo, PhotoId, PhotoValidationError};
pub use storage::{FilesystemPhotoStore, PhotoStore, StorageError};
