// ABOUTME: CLI entrypoint for nbsync command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use nbsync::{
    api::DriveClient,
    auth::obtain_credential,
    cli::{resolve_upload_mode, Cli, Commands, UploadMode, COLLAB_NOTEBOOK_NAME_VAR, UPLOAD_FILE_PATH_VAR},
    config::DriveConfig,
    logging, sync, Error, Result,
};
use std::path::{Path, PathBuf};

fn main() {
    if let Err(e) = run() {
        eprintln!("nbsync: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Per-command default log file names
    let log_file = cli.log_file.clone().unwrap_or_else(|| match cli.command {
        Commands::Download { .. } => PathBuf::from("download_job.out"),
        Commands::Upload { .. } => PathBuf::from("run_job.out"),
    });
    logging::init(Some(&log_file))?;

    let config = DriveConfig {
        api_base: cli.api_base.clone(),
        token_path: cli.token_file.clone(),
        credentials_path: cli.credentials.clone(),
        non_interactive: cli.non_interactive,
    };

    let credential = obtain_credential(&config)?;
    let client = DriveClient::new(credential.token, Some(config.api_base.clone()))?;

    match cli.command {
        Commands::Download {
            collab_notebook_name,
            save_path,
        } => {
            let written = sync::download(&client, &collab_notebook_name, &save_path)?;
            println!("Saved {:?} to {}", collab_notebook_name, written.display());
        }
        Commands::Upload {
            use_single_file,
            collab_notebook_name,
            save_path,
            notebook_config,
        } => {
            let mode = resolve_upload_mode(
                use_single_file,
                collab_notebook_name,
                save_path,
                notebook_config,
            )
            .map_err(Error::Validation)?;

            match mode {
                UploadMode::Single { name, path } => upload_one(&client, &path, &name)?,
                UploadMode::Env => {
                    let path = require_env(UPLOAD_FILE_PATH_VAR)?;
                    let name = require_env(COLLAB_NOTEBOOK_NAME_VAR)?;
                    upload_one(&client, Path::new(&path), &name)?;
                }
                UploadMode::Batch { config: batch } => {
                    let report = sync::upload_batch(&client, &batch)?;
                    println!(
                        "Batch complete: {} uploaded, {} failed",
                        report.uploaded, report.failed
                    );
                }
            }
        }
    }

    Ok(())
}

/// Upload a single notebook. Remote-call failures are logged and do not
/// fail the process; validation and lookup failures propagate.
fn upload_one(client: &DriveClient, path: &Path, name: &str) -> Result<()> {
    match sync::upload(client, path, name) {
        Ok(outcome) => {
            println!("Uploaded {:?} as file id {}", name, outcome.file_id());
            Ok(())
        }
        Err(e) if e.is_remote() => {
            tracing::error!(name, error = %e, "upload failed");
            eprintln!("An error occurred: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn require_env(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| Error::Validation(format!("{} not set", var)))
}
