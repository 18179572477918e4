// ABOUTME: Core sync logic: name resolution, upload/update, download, batch
// ABOUTME: Validates locally before any network call and reports progress

use crate::{
    api::DriveClient,
    config::{NOTEBOOK_EXTENSION, NOTEBOOK_MIME_TYPE},
    model::BatchEntry,
    Error, Result,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of an upload: the remote id, and whether the object was freshly
/// created or an existing one was updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Created(String),
    Updated(String),
}

impl UploadOutcome {
    pub fn file_id(&self) -> &str {
        match self {
            UploadOutcome::Created(id) | UploadOutcome::Updated(id) => id,
        }
    }
}

/// Totals for a batch upload run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub uploaded: usize,
    pub failed: usize,
}

pub fn has_notebook_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == NOTEBOOK_EXTENSION)
        .unwrap_or(false)
}

/// Append the notebook extension to a save path unless it already carries
/// it: "notes" becomes "notes.ipynb", "notes.ipynb" is unchanged.
pub fn ensure_notebook_extension(path: &Path) -> PathBuf {
    if has_notebook_extension(path) {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(format!(".{}", NOTEBOOK_EXTENSION));
        PathBuf::from(name)
    }
}

/// Resolve a display name to a remote id by scanning the full listing.
///
/// Names are not unique in the remote store; the first exact match in
/// listing order wins. O(total remote files) per call.
pub fn resolve_file_id(client: &DriveClient, name: &str) -> Result<Option<String>> {
    let files = client.list_files()?;
    Ok(files
        .into_iter()
        .find(|file| file.name == name)
        .map(|file| file.id))
}

/// Upload a local notebook under a display name: create when absent,
/// update in place when present.
///
/// The update path refetches the existing metadata and strips the id
/// before patching, so unrelated metadata fields survive the update.
pub fn upload(client: &DriveClient, local_path: &Path, remote_name: &str) -> Result<UploadOutcome> {
    if !has_notebook_extension(local_path) {
        return Err(Error::Validation(format!(
            "{} does not have the required .{} extension",
            local_path.display(),
            NOTEBOOK_EXTENSION
        )));
    }

    let content = fs::read(local_path)?;

    match resolve_file_id(client, remote_name)? {
        None => {
            let metadata = serde_json::json!({
                "name": remote_name,
                "mimeType": NOTEBOOK_MIME_TYPE,
            });
            let created = client.create_file(&metadata, &content, NOTEBOOK_MIME_TYPE)?;
            tracing::info!(id = %created.id, name = remote_name, "uploaded new notebook");
            Ok(UploadOutcome::Created(created.id))
        }
        Some(file_id) => {
            let mut metadata = client.get_file(&file_id)?;
            // The update endpoint rejects a body that carries the id
            metadata.remove("id");
            let updated = client.update_file(
                &file_id,
                &serde_json::Value::Object(metadata),
                &content,
                NOTEBOOK_MIME_TYPE,
            )?;
            tracing::info!(id = %updated.id, name = remote_name, "updated existing notebook");
            Ok(UploadOutcome::Updated(updated.id))
        }
    }
}

/// Download the latest remote version of a notebook to disk, overwriting
/// any existing file at the normalized save path.
pub fn download(client: &DriveClient, remote_name: &str, save_path: &Path) -> Result<PathBuf> {
    let file_id = resolve_file_id(client, remote_name)?
        .ok_or_else(|| Error::NotFound(format!("no remote file named {:?}", remote_name)))?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {bytes}/{total_bytes}")
            .unwrap()
            .progress_chars("##-"),
    );

    let content = client.download_file(&file_id, |done, total| {
        if let Some(total) = total {
            pb.set_length(total);
            pb.set_position(done);
            let percent = (done as f64 / total as f64 * 100.0) as u64;
            tracing::info!("download {}%", percent.min(100));
        } else {
            tracing::info!("download {} bytes", done);
        }
    })?;
    pb.finish_and_clear();

    let save_path = ensure_notebook_extension(save_path);
    fs::write(&save_path, &content)?;
    tracing::info!(path = %save_path.display(), bytes = content.len(), "download complete");

    Ok(save_path)
}

/// Pass-through rename, errors surfaced not retried.
pub fn rename(client: &DriveClient, file_id: &str, new_name: &str) -> Result<()> {
    client.rename_file(file_id, new_name)?;
    tracing::info!(id = file_id, new_name, "renamed remote file");
    Ok(())
}

/// Pass-through delete, errors surfaced not retried.
pub fn delete(client: &DriveClient, file_id: &str) -> Result<()> {
    client.delete_file(file_id)?;
    tracing::info!(id = file_id, "deleted remote file");
    Ok(())
}

/// Upload every entry of an ordered batch config. Remote-call failures are
/// logged and the batch moves on; local validation failures stop the run.
/// An empty list performs zero remote calls.
pub fn upload_batch(client: &DriveClient, config_path: &Path) -> Result<BatchReport> {
    let content = fs::read_to_string(config_path)?;
    let entries: Vec<BatchEntry> = serde_json::from_str(&content)?;

    let mut report = BatchReport::default();
    for entry in &entries {
        match upload(
            client,
            Path::new(&entry.file_path),
            &entry.collab_notebook_name,
        ) {
            Ok(outcome) => {
                tracing::info!(
                    name = %entry.collab_notebook_name,
                    id = outcome.file_id(),
                    "batch entry uploaded"
                );
                report.uploaded += 1;
            }
            Err(e) if e.is_remote() => {
                tracing::error!(name = %entry.collab_notebook_name, error = %e, "batch entry failed");
                report.failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
