//! Report upload for lab staff

use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::error::Error;
use crate::postgrest::TableClient;
use crate::reports::Report;
use crate::storage::{FileOptions, StorageClient};

/// Content type the upload picker offers; advisory only
pub const ACCEPTED_CONTENT_TYPE: &str = "application/pdf";

/// Shown when the phone or the file is missing
pub const MSG_UPLOAD_FIELDS: &str = "Enter phone and choose a file.";

/// Shown after a successful upload
pub const MSG_UPLOADED: &str = "Report uploaded!";

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ReportFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            bytes,
            content_type: ACCEPTED_CONTENT_TYPE.to_string(),
        }
    }

    /// Read a file from disk, keeping its base name
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.pdf".to_string());

        Ok(Self::new(&file_name, bytes))
    }
}

/// Object path for an upload: `<phone>/<uuid>-<file name>`.
///
/// The random ID keeps two uploads of the same file for the same phone apart.
pub fn storage_path(phone: &str, file_name: &str) -> String {
    format!("{}/{}-{}", phone, Uuid::new_v4(), file_name.replace('/', "_"))
}

#[derive(Debug, Serialize)]
struct NewReport<'a> {
    phone: &'a str,
    file_name: &'a str,
    url: &'a str,
}

/// Stores report files and links them to a phone number
pub struct AdminPanel {
    storage: StorageClient,
    bucket: String,
    table: TableClient,
}

impl AdminPanel {
    pub fn new(storage: StorageClient, bucket: &str, table: TableClient) -> Self {
        Self {
            storage,
            bucket: bucket.to_string(),
            table,
        }
    }

    /// Upload `file` and record it against `phone`.
    ///
    /// Nothing is sent unless both a phone and a file are given.
    pub async fn upload(&self, phone: &str, file: Option<&ReportFile>) -> Result<Report, Error> {
        let file = match file {
            Some(file) if !phone.trim().is_empty() => file,
            _ => return Err(Error::validation(MSG_UPLOAD_FIELDS)),
        };

        let path = storage_path(phone, &file.file_name);
        let bucket = self.storage.from(&self.bucket);

        bucket
            .upload(
                &path,
                file.bytes.clone(),
                FileOptions::default().with_content_type(&file.content_type),
            )
            .await?;
        let url = bucket.get_public_url(&path);

        let row = NewReport {
            phone,
            file_name: &file.file_name,
            url: &url,
        };
        let stored = self.table.insert(&row).execute::<Report>().await?;

        log::info!("Uploaded {} to {}", file.file_name, path);

        Ok(stored.into_iter().next().unwrap_or(Report {
            id: None,
            phone: phone.to_string(),
            file_name: file.file_name.clone(),
            url,
            created_at: None,
        }))
    }
}
