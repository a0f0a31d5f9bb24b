// crates/server/src/routes/upload.rs
//! Receiving the multipart `file` field into the work directory.

use std::path::PathBuf;

use axum::extract::Multipart;
use docbridge_core::files::{remove_with_retry, unique_path};
use docbridge_core::{validate_upload, ConversionKind, UploadName, ValidationError};
use tokio::io::AsyncWriteExt;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// An accepted upload, stored under a fresh name in the work directory.
#[derive(Debug)]
pub struct SavedUpload {
    pub name: UploadName,
    pub path: PathBuf,
}

/// Find the `file` field, validate its name for `kind`, and stream it to
/// disk. Nothing is written unless validation passes; a partially written
/// file is removed on error.
pub async fn receive_upload(
    state: &AppState,
    multipart: &mut Multipart,
    kind: ConversionKind,
) -> ApiResult<SavedUpload> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_owned);
        let name = validate_upload(filename.as_deref(), kind)?;
        if kind == ConversionKind::WordToPdf && !state.worker.renderer().accepts(name.extension()) {
            return Err(ValidationError::UnsupportedExtension {
                filename: name.original().to_string(),
            }
            .into());
        }

        let path = unique_path(&state.work_dir, name.extension());
        let written = async {
            let mut file = tokio::fs::File::create(&path)
                .await
                .map_err(|source| ApiError::Storage {
                    path: path.clone(),
                    source,
                })?;
            let mut size = 0usize;
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len();
                file.write_all(&chunk)
                    .await
                    .map_err(|source| ApiError::Storage {
                        path: path.clone(),
                        source,
                    })?;
            }
            file.flush().await.map_err(|source| ApiError::Storage {
                path: path.clone(),
                source,
            })?;
            Ok::<usize, ApiError>(size)
        }
        .await;

        return match written {
            Ok(size) => {
                tracing::info!(
                    file = %name.original(),
                    path = %path.display(),
                    bytes = size,
                    "Upload stored"
                );
                Ok(SavedUpload { name, path })
            }
            Err(err) => {
                remove_with_retry(&path, state.remove_policy).await;
                Err(err)
            }
        };
    }

    Err(ValidationError::MissingFile.into())
}
