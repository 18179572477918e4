// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines download and upload subcommands plus global flags

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variables consumed by the upload env-var mode.
pub const UPLOAD_FILE_PATH_VAR: &str = "UPLOAD_FILE_PATH";
pub const COLLAB_NOTEBOOK_NAME_VAR: &str = "COLLAB_NOTEBOOK_NAME";

#[derive(Parser, Debug)]
#[command(name = "nbsync")]
#[command(about = "Sync Colab notebooks between local disk and Google Drive", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Drive API base URL
    #[arg(long, global = true, default_value = "https://www.googleapis.com")]
    pub api_base: String,

    /// Path of the persisted credential
    #[arg(long, global = true, default_value = "token.json")]
    pub token_file: PathBuf,

    /// Path of the installed-app client secrets
    #[arg(long, global = true, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Deployment mode: credential comes from SECRET_TOKEN, never prompts
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Log file path (rotates at 1 MiB with one backup)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Download the latest notebook version from Drive
    Download {
        /// Name of the notebook in Drive to download
        #[arg(long = "collab_notebook_name", required = true)]
        collab_notebook_name: String,

        /// Path to save the file to (.ipynb appended if absent)
        #[arg(long = "save_path", required = true)]
        save_path: PathBuf,
    },

    /// Upload/update one or many notebooks in Drive
    Upload {
        /// Single-file mode: take name and path from the flags below
        #[arg(long = "use_single_file")]
        use_single_file: bool,

        /// Name of the notebook in Drive
        #[arg(long = "collab_notebook_name")]
        collab_notebook_name: Option<String>,

        /// Path of the local notebook to upload
        #[arg(long = "save_path")]
        save_path: Option<PathBuf>,

        /// JSON config listing notebooks to upload in order
        #[arg(long = "notebook_config")]
        notebook_config: Option<PathBuf>,
    },
}

/// Resolved upload invocation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadMode {
    Single { name: String, path: PathBuf },
    Batch { config: PathBuf },
    /// Name and path read from UPLOAD_FILE_PATH / COLLAB_NOTEBOOK_NAME.
    Env,
}

/// Decide the upload mode from the flags: explicit single mode needs both
/// name and path, a config path selects batch mode, neither falls back to
/// the environment-variable mode.
pub fn resolve_upload_mode(
    use_single_file: bool,
    collab_notebook_name: Option<String>,
    save_path: Option<PathBuf>,
    notebook_config: Option<PathBuf>,
) -> Result<UploadMode, String> {
    if use_single_file {
        match (collab_notebook_name, save_path) {
            (Some(name), Some(path)) => Ok(UploadMode::Single { name, path }),
            _ => Err("--use_single_file requires --collab_notebook_name and --save_path".into()),
        }
    } else if let Some(config) = notebook_config {
        Ok(UploadMode::Batch { config })
    } else {
        Ok(UploadMode::Env)
    }
}
