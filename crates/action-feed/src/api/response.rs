use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::ApiError;

/// The three list shapes the backend is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Envelope {
        success: bool,
        #[serde(default = "Vec::new")]
        data: Vec<T>,
        #[serde(default)]
        message: Option<String>,
    },
    Data {
        data: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_items(self) -> Result<Vec<T>, ApiError> {
        match self {
            ListResponse::Envelope {
                success: false,
                message,
                ..
            } => Err(ApiError::Rejected(
                message.unwrap_or_else(|| "success flag was false".to_string()),
            )),
            ListResponse::Envelope { data, .. } => Ok(data),
            ListResponse::Data { data } => Ok(data),
            ListResponse::Bare(items) => Ok(items),
        }
    }
}

/// Decode a list response body, skipping individual items that do not fit `T`.
pub fn decode_list<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, ApiError> {
    let envelope: ListResponse<Value> =
        serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))?;

    let items = envelope.into_items()?;
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(index, error = %err, "skipping malformed list item");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(
            kept = decoded.len(),
            total, "list response contained malformed items"
        );
    }

    Ok(decoded)
}
