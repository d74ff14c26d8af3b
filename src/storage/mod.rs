//! Object storage for uploaded report files

mod types;

use reqwest::{multipart, Client};

use crate::error::Error;
use crate::fetch::CLIENT_INFO;

pub use types::*;

/// Client for Supabase Storage
pub struct StorageClient {
    /// The base URL for the Supabase project
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// User access token sent as bearer
    token: Option<String>,

    /// HTTP client used for requests
    client: Client,
}

/// Client for a specific storage bucket
pub struct BucketClient<'a> {
    /// Reference to the storage client
    storage: &'a StorageClient,

    /// The bucket ID
    bucket_id: String,
}

impl StorageClient {
    /// Create a new StorageClient
    pub(crate) fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            token: None,
            client,
        }
    }

    /// Run requests as the user owning this access token
    pub fn with_auth(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    /// Get the base URL for storage operations
    fn get_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    /// Get a client for a specific bucket
    pub fn from(&self, bucket_id: &str) -> BucketClient {
        BucketClient {
            storage: self,
            bucket_id: bucket_id.to_string(),
        }
    }
}

impl<'a> BucketClient<'a> {
    /// Upload a file to the bucket
    pub async fn upload(&self, path: &str, file_data: Vec<u8>, options: FileOptions) -> Result<UploadResponse, Error> {
        let url = self
            .storage
            .get_url(&format!("/object/{}/{}", self.bucket_id, encode_path(path)));

        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let mut part = multipart::Part::bytes(file_data).file_name(file_name);
        if let Some(content_type) = &options.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new().part("file", part);

        let token = self.storage.token.as_deref().unwrap_or(&self.storage.key);
        let response = self
            .storage
            .client
            .post(&url)
            .header("apikey", &self.storage.key)
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(token)
            .header("Cache-Control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            log::warn!("Upload to {} failed with status {}", self.bucket_id, status);
            return Err(Error::api(status.as_u16(), &text));
        }

        let uploaded = response.json::<UploadResponse>().await?;
        log::debug!("Stored object {}", uploaded.key);
        Ok(uploaded)
    }

    /// Get the public URL for a file
    pub fn get_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.storage.url,
            self.bucket_id,
            encode_path(path)
        )
    }
}

/// Percent-encode each segment of an object path, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_encodes_segments() {
        let storage = StorageClient::new("https://example.supabase.co", "key", Client::new());
        let url = storage
            .from("reports")
            .get_public_url("9876543210/abc-CBC report (final).pdf");
        assert_eq!(
            url,
            "https://example.supabase.co/storage/v1/object/public/reports/9876543210/abc-CBC%20report%20%28final%29.pdf"
        );
    }
}
