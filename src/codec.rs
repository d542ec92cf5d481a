use crate::error::ClientError;
use crate::models::UploadedImage;
use base64::Engine;
use image::{imageops::FilterType, GenericImageView};
use std::path::Path;
use uuid::Uuid;

/// Largest reference image accepted for upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extension-based MIME lookup. Unknown extensions fall back to JPEG, which
/// is what the upstream API tolerates best.
pub fn detect_mime_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Base64-encode raw bytes with the standard alphabet.
pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode a standard-alphabet base64 payload back into raw bytes.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, ClientError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| ClientError::Codec(format!("invalid base64 payload: {e}")))
}

/// Build a `data:{mime};base64,{payload}` URL from raw bytes.
pub fn encode_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, encode_base64(data))
}

/// Split a data URL into its MIME type and base64 payload.
pub fn split_data_url(url: &str) -> Result<(&str, &str), ClientError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ClientError::Codec("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ClientError::Codec("data URL has no payload".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ClientError::Codec("data URL is not base64-encoded".into()))?;
    Ok((mime, payload))
}

/// Read a file and return it as a data URL. The read is asynchronous and a
/// failure surfaces as a descriptive `Codec` error without touching any
/// caller state.
pub async fn to_data_url(path: impl AsRef<Path>) -> Result<String, ClientError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Codec(format!("failed to read {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(encode_data_url(detect_mime_type(&name), &bytes))
}

/// Read a file into the transient shape the generator holds for one request.
/// Rejects non-image extensions and files over [`MAX_UPLOAD_BYTES`].
pub async fn read_uploaded_image(path: impl AsRef<Path>) -> Result<UploadedImage, ClientError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Codec(format!("failed to read \"{name}\": {e}")))?;
    let size_bytes = bytes.len() as u64;
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(ClientError::Codec(format!(
            "image \"{name}\" exceeds the 10MB upload limit"
        )));
    }
    let mime_type = detect_mime_type(&name).to_string();
    let base64 = encode_base64(&bytes);
    let data_url = format!("data:{};base64,{}", mime_type, base64);
    Ok(UploadedImage {
        id: Uuid::new_v4(),
        name,
        base64,
        mime_type,
        data_url,
        size_bytes,
    })
}

/// Downscale an image so its longest edge is at most `max_edge` pixels,
/// preserving aspect ratio. Images already within bounds pass through
/// untouched; this never enlarges. `quality` is a lossy JPEG encode
/// parameter in `[0, 1]`.
pub fn downscale(data: &[u8], max_edge: u32, quality: f32) -> Result<Vec<u8>, ClientError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ClientError::Codec(format!("failed to decode image: {e}")))?;
    let (width, height) = img.dimensions();

    if width <= max_edge && height <= max_edge {
        return Ok(data.to_vec());
    }

    let ratio = (max_edge as f32 / width.max(height) as f32).min(1.0);
    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);
    let resized = img.resize(new_width, new_height, FilterType::Lanczos3);

    let jpeg_quality = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    let mut output = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, jpeg_quality.max(1));
    resized
        .write_with_encoder(encoder)
        .map_err(|e| ClientError::Codec(format!("failed to encode resized image: {e}")))?;
    Ok(output)
}
