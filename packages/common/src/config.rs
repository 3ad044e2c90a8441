use std::path::PathBuf;

use serde::Deserialize;

use crate::photo::MAX_PHOTO_SIZE;

/// Photo storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded photos. Default: "./media/photos".
    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,
    /// Maximum accepted upload size in bytes. Default: 10 MiB.
    #[serde(default = "default_max_photo_size")]
    pub max_photo_size: u64,
}

fn default_photos_dir() -> PathBuf {
    PathBuf::from("./media/photos")
}
fn default_max_photo_size() -> u64 {
    MAX_PHOTO_SIZE
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            photos_dir: default_photos_dir(),
            max_photo_size: default_max_photo_size(),
        }
    }
}
