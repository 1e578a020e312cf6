use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use common::storage::image_format;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppPath;
use crate::models::upload::UploadedImage;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;

/// Read one multipart image field into memory, enforcing the per-file limit
/// while streaming. Returns the bytes and the declared content type.
async fn read_image_field(
    mut field: Field<'_>,
    max_size: usize,
) -> Result<(Vec<u8>, String), AppError> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_default();
    image_format(&content_type)?;

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if data.len() + chunk.len() > max_size {
            return Err(AppError::Validation(format!(
                "Image exceeds the {max_size} byte limit"
            )));
        }
        data.extend_from_slice(&chunk);
    }
    if data.is_empty() {
        return Err(AppError::Validation("Image file is empty".into()));
    }
    Ok((data, content_type))
}

#[utoipa::path(
    post,
    path = "/single",
    tag = "Upload",
    operation_id = "uploadImage",
    summary = "Upload one image",
    description = "Stores the `image` multipart field on the configured image host. Only JPEG, PNG, GIF, WebP, AVIF and BMP images up to the configured size are accepted. Requires the writer role.",
    request_body(content_type = "multipart/form-data", description = "Multipart form with an `image` file field"),
    responses(
        (status = 200, description = "Image uploaded", body = ApiResponse<UploadedImage>),
        (status = 400, description = "Missing, oversized or non-image file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
        (status = 502, description = "Image host failed (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_single(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<UploadedImage>, AppError> {
    auth_user.require_writer()?;
    let upload = &state.config.upload;

    let mut image: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("image") && image.is_none() {
            image = Some(read_image_field(field, upload.max_file_size).await?);
        }
        // Other fields are ignored.
    }

    let (data, content_type) =
        image.ok_or_else(|| AppError::Validation("No image file provided".into()))?;

    let stored = state
        .images
        .upload(&upload.folder, &data, &content_type)
        .await?;

    tracing::info!(public_id = %stored.public_id, size = data.len(), "Image uploaded");

    Ok(ApiResponse::ok(
        "Image uploaded successfully",
        UploadedImage::from(stored),
    ))
}

#[utoipa::path(
    post,
    path = "/multiple",
    tag = "Upload",
    operation_id = "uploadImages",
    summary = "Upload several images",
    description = "Stores every `images` multipart field, up to the configured maximum per request. Requires the writer role.",
    request_body(content_type = "multipart/form-data", description = "Multipart form with one or more `images` file fields"),
    responses(
        (status = 200, description = "Images uploaded", body = ApiResponse<Vec<UploadedImage>>),
        (status = 400, description = "Missing, too many, oversized or non-image files (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
        (status = 502, description = "Image host failed (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_multiple(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<Vec<UploadedImage>>, AppError> {
    auth_user.require_writer()?;
    let upload = &state.config.upload;

    let mut images: Vec<(Vec<u8>, String)> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("images") {
            continue;
        }
        if images.len() == upload.max_files {
            return Err(AppError::Validation(format!(
                "At most {} images can be uploaded at once",
                upload.max_files
            )));
        }
        images.push(read_image_field(field, upload.max_file_size).await?);
    }

    if images.is_empty() {
        return Err(AppError::Validation("No image files provided".into()));
    }

    let stored = state.images.upload_many(&upload.folder, &images).await?;

    tracing::info!(count = stored.len(), "Images uploaded");

    Ok(ApiResponse::ok(
        "Images uploaded successfully",
        stored.into_iter().map(UploadedImage::from).collect(),
    ))
}

#[utoipa::path(
    delete,
    path = "/{public_id}",
    tag = "Upload",
    operation_id = "deleteImage",
    summary = "Delete an uploaded image",
    description = "Removes an image from the image host. Public ids containing `/` must be URL-encoded (`blog-images%2Fabc`). Requires the writer role.",
    params(("public_id" = String, Path, description = "URL-encoded public id returned by an upload")),
    responses(
        (status = 200, description = "Image deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Malformed public id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Image host failed (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(public_id): AppPath<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    auth_user.require_writer()?;

    if !state.images.delete(&public_id).await? {
        return Err(AppError::NotFound("Image not found".into()));
    }

    Ok(ApiResponse::message("Image deleted successfully"))
}
