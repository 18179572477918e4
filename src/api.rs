// ABOUTME: Blocking HTTP client for the Drive v3 API
// ABOUTME: Handles auth headers, multipart uploads, and chunked downloads

use crate::{
    model::{DriveFile, FileList},
    Error, Result,
};
use reqwest::blocking::{Client, Response};
use std::io::Read;
use std::time::Duration;

/// Multipart boundary for `multipart/related` upload bodies.
const UPLOAD_BOUNDARY: &str = "nbsync_boundary";

/// Buffer size for chunked downloads.
const DOWNLOAD_CHUNK_SIZE: usize = 256 * 1024;

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    if boundary == 0 {
        return String::new();
    }
    format!("{}...", &s[..boundary])
}

pub struct DriveClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DriveClient {
    pub fn new(token: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(DriveClient {
            client,
            base_url: base_url.unwrap_or_else(|| "https://www.googleapis.com".into()),
            token,
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn check_status(&self, endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_str(&message, 200),
            });
        }
        Ok(response)
    }

    /// List every file visible to the credential, following pagination.
    /// Listing order is preserved so that name lookups stay deterministic.
    pub fn list_files(&self) -> Result<Vec<DriveFile>> {
        let endpoint = "/drive/v3/files";
        let url = format!("{}{}", self.base_url, endpoint);

        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("Authorization", self.bearer())
                .query(&[
                    ("fields", "files(id,name,mimeType,size,modifiedTime,trashed),nextPageToken"),
                    ("pageSize", "1000"),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self.check_status(endpoint, request.send()?)?;
            let page: FileList = response.json()?;
            all_files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_files)
    }

    /// Fetch the raw metadata object for a file. Returned as a JSON map so
    /// the update path can strip fields before sending it back.
    pub fn get_file(&self, file_id: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
        let endpoint = format!("/drive/v3/files/{}", file_id);
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()?;
        let response = self.check_status(&endpoint, response)?;

        let value: serde_json::Value = response.json()?;
        match value {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::Api {
                endpoint,
                status: 200,
                message: format!("expected metadata object, got {}", other),
            }),
        }
    }

    /// Create a new remote file with the given metadata and content.
    pub fn create_file(
        &self,
        metadata: &serde_json::Value,
        content: &[u8],
        content_type: &str,
    ) -> Result<DriveFile> {
        let endpoint = "/upload/drive/v3/files";
        let url = format!("{}{}?uploadType=multipart", self.base_url, endpoint);

        let body = multipart_related(metadata, content, content_type)?;
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", UPLOAD_BOUNDARY),
            )
            .body(body)
            .send()?;
        let response = self.check_status(endpoint, response)?;
        Ok(response.json()?)
    }

    /// Replace the content and metadata of an existing file.
    pub fn update_file(
        &self,
        file_id: &str,
        metadata: &serde_json::Value,
        content: &[u8],
        content_type: &str,
    ) -> Result<DriveFile> {
        let endpoint = format!("/upload/drive/v3/files/{}", file_id);
        let url = format!("{}{}?uploadType=multipart", self.base_url, endpoint);

        let body = multipart_related(metadata, content, content_type)?;
        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.bearer())
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", UPLOAD_BOUNDARY),
            )
            .body(body)
            .send()?;
        let response = self.check_status(&endpoint, response)?;
        Ok(response.json()?)
    }

    /// Change only the display name of a file.
    pub fn rename_file(&self, file_id: &str, new_name: &str) -> Result<DriveFile> {
        let endpoint = format!("/drive/v3/files/{}", file_id);
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.bearer())
            .json(&serde_json::json!({ "name": new_name }))
            .send()?;
        let response = self.check_status(&endpoint, response)?;
        Ok(response.json()?)
    }

    pub fn delete_file(&self, file_id: &str) -> Result<()> {
        let endpoint = format!("/drive/v3/files/{}", file_id);
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.bearer())
            .send()?;
        self.check_status(&endpoint, response)?;
        Ok(())
    }

    /// Download file content in fixed-size chunks. The callback receives
    /// (bytes so far, total if known) after every chunk.
    pub fn download_file<F>(&self, file_id: &str, mut on_chunk: F) -> Result<Vec<u8>>
    where
        F: FnMut(u64, Option<u64>),
    {
        let endpoint = format!("/drive/v3/files/{}", file_id);
        let url = format!("{}{}?alt=media", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()?;
        let mut response = self.check_status(&endpoint, response)?;

        let total = response.content_length();
        let mut content = Vec::new();
        let mut buffer = vec![0u8; DOWNLOAD_CHUNK_SIZE];

        loop {
            let read = response.read(&mut buffer).map_err(Error::Filesystem)?;
            if read == 0 {
                break;
            }
            content.extend_from_slice(&buffer[..read]);
            on_chunk(content.len() as u64, total);
        }

        Ok(content)
    }
}

/// Build a `multipart/related` body: one JSON metadata part, one media part.
fn multipart_related(
    metadata: &serde_json::Value,
    content: &[u8],
    content_type: &str,
) -> Result<Vec<u8>> {
    let metadata_json = serde_json::to_string(metadata)?;

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", UPLOAD_BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}\r\n", UPLOAD_BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}--", UPLOAD_BOUNDARY).as_bytes());

    Ok(body)
}
