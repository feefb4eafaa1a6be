use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use thiserror::Error;

// Clients are sloppy about trailing `=`, so padding is accepted either way.
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageDataError {
    #[error("image payload is empty")]
    Empty,
    #[error("image payload is not valid base64")]
    Base64,
}

/// Strip all whitespace and any leading `data:image/...;base64,` prefix so
/// the payload can be fed to a base64 decoder or a job submission as-is.
pub fn clean_base64(raw: &str) -> String {
    let compact: String = raw.split_whitespace().collect();
    match compact.split_once(";base64,") {
        Some((head, payload)) if head.starts_with("data:image/") => payload.to_string(),
        _ => compact,
    }
}

/// Decode a cleaned base64 payload into non-empty image bytes.
pub fn decode(cleaned: &str) -> Result<Vec<u8>, ImageDataError> {
    if cleaned.is_empty() {
        return Err(ImageDataError::Empty);
    }
    let bytes = ENGINE.decode(cleaned).map_err(|_| ImageDataError::Base64)?;
    if bytes.is_empty() {
        return Err(ImageDataError::Empty);
    }
    Ok(bytes)
}
