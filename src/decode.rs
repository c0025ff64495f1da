use reqwest::{header::HeaderMap, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use crate::{ApiError, MewsError};

/// Decodes a success body into `T`.
///
/// In strict mode any key that the destination does not declare is
/// rejected, at any depth.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8], strict: bool) -> Result<T, MewsError> {
    let invalid = |err: serde_json::Error| {
        MewsError::Decode(format!(
            "invalid response JSON: {err}; body: {}",
            String::from_utf8_lossy(body)
        ))
    };

    if !strict {
        return serde_json::from_slice(body).map_err(invalid);
    }

    let mut unknown = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let value: T = serde_ignored::deserialize(&mut deserializer, |path| {
        unknown.push(path.to_string());
    })
    .map_err(invalid)?;
    deserializer.end().map_err(invalid)?;

    if !unknown.is_empty() {
        return Err(MewsError::Decode(format!(
            "unknown field `{}` in response",
            unknown.join("`, `")
        )));
    }
    Ok(value)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    #[serde(rename = "Details")]
    details: Option<serde_json::Value>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

/// Builds the error for a non-2xx response.
///
/// `Details`/`Message` come from a JSON body when present; otherwise the
/// message falls back to the status line.
pub(crate) fn classify_error(
    status: StatusCode,
    url: &Url,
    headers: &HeaderMap,
    body: &[u8],
) -> ApiError {
    let status_line = match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    };

    let parsed = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<ErrorBody>(body).ok()
    };

    let (details, message) = match parsed {
        Some(error) => (
            error.details.map(details_text).unwrap_or_default(),
            error.message.filter(|message| !message.is_empty()),
        ),
        None => (String::new(), None),
    };

    ApiError {
        status,
        details,
        message: message.unwrap_or(status_line),
        url: url.clone(),
        headers: headers.clone(),
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

// `Details` is usually a string but some faults send an object.
fn details_text(details: serde_json::Value) -> String {
    match details {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
