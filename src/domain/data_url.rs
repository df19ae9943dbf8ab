use base64::Engine;

#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    #[error("value does not start with `data:`")]
    MissingScheme,
    #[error("only base64 encoded data URLs are supported")]
    NotBase64,
    #[error("data URL payload is not valid base64")]
    InvalidPayload(#[source] base64::DecodeError),
    #[error("data URL payload is empty")]
    Empty,
}

/// An inline `data:<media type>;base64,<payload>` image sent by the admin UI.
#[derive(Debug, PartialEq, Eq)]
pub struct DataUrl {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(value: &str) -> Result<Self, DataUrlError> {
        let rest = value
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUrlError::MissingScheme)?;
        let (meta, payload) = rest.split_once("base64,").ok_or(DataUrlError::NotBase64)?;

        // `image/png;` or `image/svg+xml;charset=utf-8;`, only the media type is kept
        let content_type = match meta.split(';').next().map(str::trim) {
            Some(media_type) if !media_type.is_empty() => media_type.to_string(),
            _ => "application/octet-stream".to_string(),
        };

        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(DataUrlError::InvalidPayload)?;
        if bytes.is_empty() {
            return Err(DataUrlError::Empty);
        }

        Ok(Self {
            content_type,
            bytes,
        })
    }
}

pub fn is_remote_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
