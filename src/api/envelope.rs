use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::session::Principal;

/// Backend response envelope: `{ success, data?, message? }`.
/// Session endpoints return the principal under `user` instead of `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub user: Option<Principal>,
}

impl<T> Envelope<T>
where
    T: for<'de> Deserialize<'de>,
{
    /// Parse a response body into an envelope
    pub fn from_value(body: Value) -> Result<Self, ClientError> {
        serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl<T> Envelope<T> {
    /// `success: false` becomes `ClientError::Rejected` carrying the backend message
    pub fn into_result(self) -> Result<Self, ClientError> {
        if self.success {
            Ok(self)
        } else {
            Err(ClientError::Rejected(
                self.message.unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }

    /// Data of a successful envelope; missing data is a decode failure
    pub fn into_data(self) -> Result<T, ClientError> {
        self.into_result()?
            .data
            .ok_or_else(|| ClientError::Decode("envelope has no data".to_string()))
    }
}
