// ABOUTME: Serde data models for Drive API responses and token files
// ABOUTME: Tolerant parsing with optional fields and camelCase renames

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file record as returned by the Drive `files` collection.
///
/// The remote store guarantees unique ids but NOT unique names; multiple
/// files may share a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trashed: bool,
}

/// One page of a file listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Persisted credential in Google's "authorized user" serialization, the
/// same shape the provider writes to token.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Whether the access token needs refreshing. A small safety margin
    /// avoids handing out a token that expires mid-request. A token with
    /// no recorded expiry is treated as expired.
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry < Utc::now() + chrono::Duration::minutes(1),
            None => true,
        }
    }
}

/// Installed-app client secrets (credentials.json, `{"installed": {...}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretsFile {
    pub installed: InstalledClientSecrets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// Reply from the OAuth token endpoint for both the refresh and the
/// authorization-code grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// One entry of the batch upload config file, processed in listing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub collab_notebook_name: String,
    pub file_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_file_deserialize_minimal() {
        let json = r#"{"id": "abc123", "name": "My Notebook"}"#;
        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "abc123");
        assert_eq!(file.name, "My Notebook");
        assert!(file.mime_type.is_none());
        assert!(!file.trashed);
    }

    #[test]
    fn test_drive_file_deserialize_full() {
        let json = r#"{
            "id": "abc123",
            "name": "My Notebook",
            "mimeType": "application/vnd.google.colaboratory",
            "size": "2048",
            "modifiedTime": "2025-10-28T15:04:05Z",
            "trashed": false,
            "kind": "drive#file"
        }"#;
        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(
            file.mime_type.as_deref(),
            Some("application/vnd.google.colaboratory")
        );
        assert!(file.modified_time.is_some());
    }

    #[test]
    fn test_file_list_empty() {
        let list: FileList = serde_json::from_str(r#"{"files": []}"#).unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_stored_token_roundtrip() {
        let json = r#"{
            "token": "ya29.abc",
            "refresh_token": "1//refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/drive"],
            "expiry": "2025-10-28T15:04:05Z"
        }"#;
        let token: StoredToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.token, "ya29.abc");
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));

        let back = serde_json::to_string(&token).unwrap();
        let again: StoredToken = serde_json::from_str(&back).unwrap();
        assert_eq!(again.client_id, token.client_id);
    }

    #[test]
    fn test_stored_token_expiry() {
        let mut token: StoredToken = serde_json::from_str(
            r#"{
                "token": "t",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_id": "c",
                "client_secret": "s"
            }"#,
        )
        .unwrap();
        // No expiry recorded counts as expired
        assert!(token.is_expired());

        token.expiry = Some(Utc::now() + chrono::Duration::hours(1));
        assert!(!token.is_expired());

        token.expiry = Some(Utc::now() - chrono::Duration::hours(1));
        assert!(token.is_expired());
    }

    #[test]
    fn test_client_secrets_deserialize() {
        let json = r#"{
            "installed": {
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;
        let secrets: ClientSecretsFile = serde_json::from_str(json).unwrap();
        assert_eq!(secrets.installed.client_id, "id.apps.googleusercontent.com");
    }

    #[test]
    fn test_batch_entry_list() {
        let json = r#"[
            {"collab_notebook_name": "Test Book", "file_path": "notebooks/a.ipynb"},
            {"collab_notebook_name": "Other", "file_path": "notebooks/b.ipynb"}
        ]"#;
        let entries: Vec<BatchEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].collab_notebook_name, "Test Book");
    }
}
