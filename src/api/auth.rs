// Authentication endpoints used by the session service

use serde::Serialize;
use serde_json::Value;

use crate::api::client::ApiClient;
use crate::api::envelope::Envelope;
use crate::api::transport::HttpRequest;
use crate::config::SessionConfig;
use crate::error::ClientError;
use crate::session::{Credentials, PasswordChange, Principal, Registration};

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
    paths: SessionConfig,
}

impl AuthApi {
    pub fn new(client: ApiClient, paths: SessionConfig) -> Self {
        Self { client, paths }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// POST login; the backend sets the session cookie and returns the user
    pub async fn login(&self, credentials: &Credentials) -> Result<Principal, ClientError> {
        let envelope: Envelope<Value> = self
            .client
            .post(&self.paths.login_path, Some(to_body(credentials)?))
            .await?;
        envelope
            .user
            .ok_or_else(|| ClientError::Decode("login response has no user".to_string()))
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        self.client
            .post::<Value>(&self.paths.register_path, Some(to_body(registration)?))
            .await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.client.post::<Value>(&self.paths.logout_path, None).await?;
        Ok(())
    }

    /// Current principal according to the backend; `None` when the backend
    /// answers without a successful user payload
    pub async fn me(&self) -> Result<Option<Principal>, ClientError> {
        let response = self.client.send(HttpRequest::get(self.paths.check_path.as_str())).await?;
        let envelope: Envelope<Value> = Envelope::from_value(response.body)?;
        Ok(if envelope.success { envelope.user } else { None })
    }

    pub async fn update_profile(&self, changes: &Value) -> Result<Principal, ClientError> {
        let envelope: Envelope<Value> = self.client.put(&self.paths.profile_path, changes.clone()).await?;
        Ok(envelope.user.unwrap_or_default())
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        self.client
            .put::<Value>(&self.paths.password_path, to_body(change)?)
            .await?;
        Ok(())
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}
