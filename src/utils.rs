use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::warn;

use crate::error::{ModelLeverError, Result};

/// Content type assumed for every image sent to a model.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Reads an image file and returns its bytes as standard base64.
pub async fn encode_image_base64(path: &Path) -> Result<String> {
    let guessed = mime_guess::from_path(path).first_or_octet_stream();
    if guessed.essence_str() != IMAGE_MIME_TYPE {
        warn!(
            "{} looks like {}, it will be sent as {}",
            path.display(),
            guessed,
            IMAGE_MIME_TYPE
        );
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ModelLeverError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(STANDARD.encode(bytes))
}

pub fn image_data_uri(image_base64: &str) -> String {
    format!("data:{};base64,{}", IMAGE_MIME_TYPE, image_base64)
}

/// Splits a `data:<mime>;base64,<data>` URI into its mime type and payload.
pub fn parse_data_uri(uri: &str) -> Result<(&str, &str)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ModelLeverError::InvalidImageData(format!("not a data URI: {}", truncate(uri))))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| ModelLeverError::InvalidImageData("data URI has no payload".to_string()))?;
    let mime = header.strip_suffix(";base64").ok_or_else(|| {
        ModelLeverError::InvalidImageData(format!("data URI is not base64 encoded: {}", header))
    })?;
    Ok((mime, data))
}

fn truncate(value: &str) -> &str {
    match value.char_indices().nth(32) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
