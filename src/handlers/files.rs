use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio_util::io::ReaderStream;

use crate::api::ValidPath;
use crate::error::{ApiError, ApiResult};
use crate::files::{upload_name, FileStore, StoredFile};
use crate::state::AppState;

/// Form field carrying the upload for the single-file endpoint
const FILE_FIELD: &str = "file";

/// POST /files - Upload one file from the `file` multipart field
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<StoredFile>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let stored = store_field(&state.files, field).await?;
            return Ok(Json(stored));
        }
    }

    Err(ApiError::bad_request(format!("missing multipart field '{}'", FILE_FIELD)))
}

/// POST /files/batch - Upload every file field of the form
pub async fn upload_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Vec<StoredFile>>> {
    let mut stored = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_some() {
            stored.push(store_field(&state.files, field).await?);
        }
    }

    if stored.is_empty() {
        return Err(ApiError::bad_request("no files in request"));
    }
    Ok(Json(stored))
}

/// GET /files/:name - Download a whole file
pub async fn download(
    State(state): State<AppState>,
    ValidPath(name): ValidPath<String>,
) -> ApiResult<Response> {
    let bytes = state.files.read(&name).await?;
    Ok(attachment(&name, Some(bytes.len() as u64), Body::from(bytes)))
}

/// GET /files/:name/stream - Stream a file in fixed-size chunks
pub async fn stream(
    State(state): State<AppState>,
    ValidPath(name): ValidPath<String>,
) -> ApiResult<Response> {
    let (file, len) = state.files.open(&name).await?;
    let chunks = ReaderStream::with_capacity(file, state.files.chunk_bytes());
    Ok(attachment(&name, Some(len), Body::from_stream(chunks)))
}

async fn store_field(files: &FileStore, mut field: Field<'_>) -> ApiResult<StoredFile> {
    let raw_name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("multipart field has no file name"))?;
    let name = upload_name(&raw_name)?;

    let mut writer = files.create(name).await?;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = writer.write(&chunk).await {
                    writer.abort().await;
                    return Err(e.into());
                }
            }
            Ok(None) => break,
            Err(e) => {
                writer.abort().await;
                return Err(e.into());
            }
        }
    }

    Ok(writer.finish().await?)
}

fn attachment(name: &str, len: Option<u64>, body: Body) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", name.replace('"', ""));
    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response();

    if let Some(len) = len {
        response.headers_mut().insert(header::CONTENT_LENGTH, len.into());
    }
    response
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::bad_request(err.body_text())
        }
    }
}
