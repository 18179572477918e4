// ABOUTME: Runtime configuration for Drive access and notebook handling
// ABOUTME: Replaces scattered constants with one struct built from the CLI

use std::path::PathBuf;

/// OAuth scopes requested for notebook synchronization.
pub const DRIVE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive.metadata",
];

/// MIME type Drive assigns to Colab notebooks.
pub const NOTEBOOK_MIME_TYPE: &str = "application/vnd.google.colaboratory";

/// Required extension for local notebook files.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Environment variable holding the serialized credential in deployment
/// (non-interactive) mode.
pub const SECRET_TOKEN_VAR: &str = "SECRET_TOKEN";

#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Base URL covering both `/drive/v3` and `/upload/drive/v3` roots.
    pub api_base: String,
    /// Where the persisted credential lives.
    pub token_path: PathBuf,
    /// Installed-app client secrets for the interactive consent flow.
    pub credentials_path: PathBuf,
    /// Deployment mode: credential comes from the environment and the
    /// interactive consent flow is never launched.
    pub non_interactive: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            api_base: "https://www.googleapis.com".into(),
            token_path: PathBuf::from("token.json"),
            credentials_path: PathBuf::from("credentials.json"),
            non_interactive: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = DriveConfig::default();
        assert_eq!(cfg.api_base, "https://www.googleapis.com");
        assert_eq!(cfg.token_path, PathBuf::from("token.json"));
        assert!(!cfg.non_interactive);
    }

    #[test]
    fn test_scopes_cover_drive() {
        assert!(DRIVE_SCOPES
            .iter()
            .any(|s| s.ends_with("/auth/drive")));
    }
}
