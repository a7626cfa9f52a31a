//! Request input validation

use url::Url;

use crate::error::{Error, Result};

/// Maximum stream id length
pub const STREAM_ID_MAX: usize = 128;

/// Validate a caller-supplied stream id and return it trimmed.
///
/// The id ends up inside an RTSP URL path, so only unreserved URL
/// characters are accepted.
pub fn validate_stream_id(stream_id: &str) -> Result<&str> {
    let stream_id = stream_id.trim();

    if stream_id.is_empty() {
        return Err(Error::InvalidArgument("stream_id is required".to_string()));
    }
    if stream_id.chars().count() > STREAM_ID_MAX {
        return Err(Error::InvalidArgument(format!(
            "stream_id exceeds {STREAM_ID_MAX} characters"
        )));
    }
    if let Some(c) = stream_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')))
    {
        return Err(Error::InvalidArgument(format!(
            "stream_id contains invalid character {c:?}"
        )));
    }

    Ok(stream_id)
}

/// Extract the session token from a published stream URL (`http://host:port/{uuid}`).
pub fn uuid_from_stream_url(stream_url: &str) -> Result<String> {
    let url = Url::parse(stream_url.trim())
        .map_err(|e| Error::InvalidArgument(format!("stream_url is not a valid URL: {e}")))?;

    let uuid = url.path().trim_matches('/');
    if uuid.is_empty() {
        return Err(Error::InvalidArgument(
            "stream_url does not name a stream".to_string(),
        ));
    }

    Ok(uuid.to_string())
}
