//! Types for storage operations

use serde::{Deserialize, Serialize};

/// Answer of the storage service to an upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// `<bucket>/<path>` of the stored object
    #[serde(rename = "Key")]
    pub key: String,

    /// Object ID, when the service reports one
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
}

/// Options for uploading a file
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Cache control header, in seconds
    pub cache_control: String,

    /// Content type of the part
    pub content_type: Option<String>,

    /// Whether to overwrite an existing object at the same path
    pub upsert: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            cache_control: "3600".to_string(),
            content_type: None,
            upsert: false,
        }
    }
}

impl FileOptions {
    /// Set the content type
    pub fn with_content_type(mut self, value: &str) -> Self {
        self.content_type = Some(value.to_string());
        self
    }
}
