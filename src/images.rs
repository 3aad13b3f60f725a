//! Image intake for the analyze endpoint: body-shape handling for the
//! current and legacy payloads, plus data-URL validation.

use serde_json::Value;

use crate::error::ApiError;

pub const MAX_IMAGES: usize = 4;
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

// Accepts {"images": [...]} or the legacy single-image {"image": "..."}.
// Field shape problems are client errors, reported as 400.
pub fn collect_images(body: &Value) -> Result<Vec<String>, ApiError> {
    match body.get("images") {
        Some(images) if !images.is_null() => {
            let list = images.as_array().ok_or_else(|| {
                ApiError::BadRequest("images must be an array of data URL strings".to_string())
            })?;
            let mut urls = Vec::with_capacity(list.len());
            for item in list {
                let url = item.as_str().ok_or_else(|| {
                    ApiError::BadRequest("each image must be a data URL string".to_string())
                })?;
                urls.push(url.to_string());
            }
            if urls.is_empty() {
                return Err(no_images());
            }
            Ok(urls)
        }
        _ => match body.get("image") {
            Some(single) if !single.is_null() => {
                let url = single.as_str().ok_or_else(|| {
                    ApiError::BadRequest("image must be a data URL string".to_string())
                })?;
                Ok(vec![url.to_string()])
            }
            _ => Err(no_images()),
        },
    }
}

// Count cap first, then per-image checks. Runs before any upstream call.
pub fn validate_images(images: &[String]) -> Result<(), ApiError> {
    if images.is_empty() {
        return Err(no_images());
    }
    if images.len() > MAX_IMAGES {
        return Err(ApiError::BadRequest(format!(
            "A maximum of {MAX_IMAGES} images per request is supported"
        )));
    }
    for image in images {
        validate_data_url(image)?;
    }
    Ok(())
}

// Expects `data:<mime>;base64,<payload>` with an allow-listed mime. The
// size bound is checked on the base64 text (which inflates by 4/3); the
// payload is never decoded here and is forwarded to the model verbatim.
fn validate_data_url(image: &str) -> Result<(), ApiError> {
    let rest = image.strip_prefix("data:").ok_or_else(malformed)?;
    let (mime, payload) = rest.split_once(";base64,").ok_or_else(malformed)?;

    if !ALLOWED_TYPES.contains(&mime) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported image type: {mime}. Use JPEG, PNG, GIF, or WebP"
        )));
    }
    if payload.is_empty() {
        return Err(malformed());
    }
    if payload.len() / 4 * 3 > MAX_IMAGE_BYTES {
        return Err(ApiError::BadRequest(
            "Image exceeds the 10MB size limit".to_string(),
        ));
    }
    Ok(())
}

fn malformed() -> ApiError {
    ApiError::BadRequest("Image must be a base64 data URL".to_string())
}

fn no_images() -> ApiError {
    ApiError::BadRequest("No images provided".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_url(mime: &str, payload: &str) -> String {
        format!("data:{mime};base64,{payload}")
    }

    #[test]
    fn collects_the_images_array() {
        let body = json!({ "images": [data_url("image/png", "aGVsbG8=")] });
        assert_eq!(collect_images(&body).unwrap().len(), 1);
    }

    #[test]
    fn falls_back_to_the_legacy_single_image_field() {
        let body = json!({ "image": data_url("image/jpeg", "aGVsbG8=") });
        let urls = collect_images(&body).unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("data:image/jpeg"));
    }

    #[test]
    fn rejects_a_body_with_no_images() {
        assert!(matches!(
            collect_images(&json!({})),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            collect_images(&json!({ "images": [] })),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_non_string_entries() {
        let body = json!({ "images": [42] });
        assert!(matches!(
            collect_images(&body),
            Err(ApiError::BadRequest(_))
        ));

        let body = json!({ "image": 42 });
        assert!(matches!(
            collect_images(&body),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_more_than_four_images() {
        let images: Vec<String> = (0..5).map(|_| data_url("image/png", "aGVsbG8=")).collect();
        assert!(matches!(
            validate_images(&images),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_a_disallowed_mime_type_regardless_of_size() {
        let images = vec![data_url("image/bmp", "aGVsbG8=")];
        let err = validate_images(&images).unwrap_err();
        match err {
            ApiError::BadRequest(message) => assert!(message.contains("image/bmp")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn rejects_a_payload_that_is_not_a_data_url() {
        let images = vec!["https://example.com/pic.png".to_string()];
        assert!(matches!(
            validate_images(&images),
            Err(ApiError::BadRequest(_))
        ));

        let images = vec!["data:image/png,plain".to_string()];
        assert!(matches!(
            validate_images(&images),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_an_oversized_image_without_decoding() {
        // base64 text just past the size that decodes to 10MB
        let oversized = "A".repeat(MAX_IMAGE_BYTES / 3 * 4 + 8);
        let images = vec![data_url("image/png", &oversized)];
        assert!(matches!(
            validate_images(&images),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn accepts_up_to_four_well_formed_images() {
        let images: Vec<String> = vec![
            data_url("image/jpeg", "aGVsbG8="),
            data_url("image/png", "aGVsbG8="),
            data_url("image/gif", "aGVsbG8="),
            data_url("image/webp", "aGVsbG8="),
        ];
        assert!(validate_images(&images).is_ok());
    }
}
