//! Uploaded media files.

use actix_web::{HttpResponse, http::header, web};

use yatube_core::DomainError;

use crate::middleware::error::AppResult;
use crate::state::AppState;

fn content_type(key: &str) -> &'static str {
    let extension = key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// GET /media/{key}
pub async fn serve(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let key = path.into_inner();
    let bytes = state
        .media
        .load(&key)
        .await?
        .ok_or_else(|| DomainError::not_found("Media", &key))?;

    Ok(HttpResponse::Ok()
        .content_type(content_type(&key))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type("posts/a.PNG"), "image/png");
        assert_eq!(content_type("posts/a.jpeg"), "image/jpeg");
        assert_eq!(content_type("posts/noext"), "application/octet-stream");
    }
}
