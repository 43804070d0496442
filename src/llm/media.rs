use base64::{engine::general_purpose, Engine as _};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("failed to decode base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Decoded bytes of a data URL together with the MIME type it declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn encode_data_url(mime_type: &str, base64_payload: &str) -> String {
    format!("data:{};base64,{}", mime_type.trim(), base64_payload.trim())
}

pub fn bytes_to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    encode_data_url(mime_type, &general_purpose::STANDARD.encode(bytes))
}

/// Splits `data:<mime>;base64,<payload>` by hand and base64-decodes the
/// payload. A missing MIME type falls back to the sniffed one, then
/// `application/octet-stream`.
pub fn decode_data_url(data_url: &str) -> Result<Blob, MediaError> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or(MediaError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(MediaError::NotDataUrl)?;

    let mut params = header.split(';');
    let declared_mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !params.any(|param| param.trim().eq_ignore_ascii_case("base64")) {
        return Err(MediaError::NotBase64);
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD.decode(cleaned.as_bytes())?;
    let mime_type = if declared_mime.is_empty() {
        detect_mime_type(&bytes).unwrap_or_else(|| "application/octet-stream".to_string())
    } else {
        declared_mime
    };

    Ok(Blob { mime_type, bytes })
}
