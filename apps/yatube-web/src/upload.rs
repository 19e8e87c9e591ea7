//! Multipart post form parsing and image checks.

use actix_multipart::{Field, Multipart, MultipartError};
use futures::TryStreamExt;
use image::ImageFormat;

use yatube_shared::forms::{FormErrors, INVALID_IMAGE, PostForm};

use crate::middleware::error::{AppError, AppResult};

/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Largest accepted text field.
const MAX_TEXT_BYTES: usize = 256 * 1024;

/// A decoded, verified image ready to be stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// A submitted post form. `errors` holds upload problems found while
/// reading; the text and group rules are checked separately.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub form: PostForm,
    pub image: Option<ImageUpload>,
    pub errors: FormErrors,
}

fn bad_payload(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed form data: {}", err))
}

/// Read a field into memory. Returns `None` once it grows past `limit`;
/// the rest of the field is still drained.
async fn read_field(field: &mut Field, limit: usize) -> AppResult<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    let mut too_large = false;

    while let Some(chunk) = field.try_next().await.map_err(bad_payload)? {
        if too_large || buf.len() + chunk.len() > limit {
            too_large = true;
            continue;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok((!too_large).then_some(buf))
}

async fn read_text(field: &mut Field) -> AppResult<String> {
    let bytes = read_field(field, MAX_TEXT_BYTES)
        .await?
        .ok_or_else(|| AppError::BadRequest("Form field too large".to_string()))?;

    String::from_utf8(bytes)
        .map_err(|_| AppError::BadRequest("Form field is not UTF-8".to_string()))
}

/// Check that `bytes` decode as an image, returning its canonical extension.
pub fn verify_image(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    image::load_from_memory_with_format(bytes, format).ok()?;
    extension_of(format)
}

fn extension_of(format: ImageFormat) -> Option<&'static str> {
    format.extensions_str().first().copied()
}

/// Parse the multipart post form.
///
/// An image field without a file name or without content counts as absent.
pub async fn read_post_form(mut payload: Multipart) -> AppResult<PostSubmission> {
    let mut submission = PostSubmission::default();

    while let Some(mut field) = payload.try_next().await.map_err(bad_payload)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "text" => submission.form.text = read_text(&mut field).await?,
            "group" => submission.form.group = Some(read_text(&mut field).await?),
            "image" => {
                let has_filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .is_some_and(|f| !f.is_empty());

                match read_field(&mut field, MAX_IMAGE_BYTES).await? {
                    None => submission.errors.add(
                        "image",
                        format!(
                            "The file is too large. Uploads are limited to {} MB.",
                            MAX_IMAGE_BYTES / (1024 * 1024)
                        ),
                    ),
                    Some(bytes) if bytes.is_empty() || !has_filename => {}
                    Some(bytes) => match verify_image(&bytes) {
                        Some(extension) => {
                            submission.image = Some(ImageUpload {
                                extension: extension.to_string(),
                                bytes,
                            })
                        }
                        None => submission.errors.add("image", INVALID_IMAGE),
                    },
                }
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
                read_field(&mut field, 0).await?;
            }
        }
    }

    submission.form = submission.form.normalized();
    Ok(submission)
}
