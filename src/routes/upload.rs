use std::path::Path;

use axum::{
    Router, routing::post, Json,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::error::AppError;
use crate::routes::common::{ApiResult, require_admin};
use crate::state::AppState;

const FILE_FIELD: &str = "file";
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "avif"];

#[derive(Serialize)]
struct UploadResponse {
    urls: Vec<String>,
}

fn image_extension(file_name: Option<&str>) -> Result<String, AppError>{
    let ext = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| AppError::Upload("uploaded file has no extension".to_string()))?;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::Upload(format!("unsupported image type `.{ext}`")))
    }
}

fn multipart_error(e: MultipartError) -> AppError{
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::TooLarge(e.body_text())
    } else {
        AppError::Upload(e.body_text())
    }
}

/// Writes every file or none of them.
async fn store_all(dir: &Path, files: &[(String, Bytes)]) -> Result<(), AppError>{
    fs::create_dir_all(dir).await?;
    for (index, (name, bytes)) in files.iter().enumerate() {
        if let Err(e) = fs::write(dir.join(name), bytes).await {
            for (written, _) in &files[..index] {
                if let Err(cleanup) = fs::remove_file(dir.join(written)).await {
                    warn!("Failed to remove partial upload {written}: {cleanup}");
                }
            }
            return Err(e.into());
        }
    }
    Ok(())
}

// POST /api/productUpload
async fn upload_images(State(state): State<AppState>, headers: HeaderMap, mut multipart: Multipart) -> ApiResult<Json<UploadResponse>>{
    require_admin(&headers, &state.config)?;

    let mut files: Vec<(String, Bytes)> = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let ext = image_extension(field.file_name())?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(AppError::Upload("uploaded file is empty".to_string()));
        }
        files.push((format!("{}.{ext}", ObjectId::new().to_hex()), bytes));
    }

    if files.is_empty() {
        return Err(AppError::Upload("no files were uploaded".to_string()));
    }

    store_all(&state.config.upload_dir, &files).await?;
    let urls = files
        .iter()
        .map(|(name, bytes)| {
            info!("Stored upload {name} ({} bytes)", bytes.len());
            format!("{}/uploads/{name}", state.config.public_base_url)
        })
        .collect();
    Ok(Json(UploadResponse { urls }))
}

pub fn upload_router(state: AppState) -> Router{
    let limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", post(upload_images))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_extensions_pass() {
        assert_eq!(image_extension(Some("Photo.JPG")).unwrap(), "jpg");
        assert_eq!(image_extension(Some("banner.webp")).unwrap(), "webp");
        assert!(image_extension(Some("notes.txt")).is_err());
        assert!(image_extension(Some("README")).is_err());
        assert!(image_extension(None).is_err());
    }

    #[tokio::test]
    async fn store_all_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            ("a.png".to_string(), Bytes::from_static(b"a")),
            ("b.png".to_string(), Bytes::from_static(b"b")),
        ];
        store_all(dir.path(), &files).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("b.png")).unwrap(), b"b");
    }
}
