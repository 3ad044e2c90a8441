mod error;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemPhotoStore;
pub use traits::PhotoStore;
