use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mm_core::ports::{RemoteAccountError, RemoteAccountPort};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP gateway to the cloud account API.
pub struct HttpAccountGateway {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
    full_name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateAccountResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpdateCredentialRequest<'a> {
    email: &'a str,
    old_password: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertProfileRequest<'a> {
    full_name: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpAccountGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteAccountError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteAccountError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_err(e: reqwest::Error) -> RemoteAccountError {
    RemoteAccountError::Network(e.to_string())
}

fn status_err(status: StatusCode, body: String) -> RemoteAccountError {
    // The API wraps errors as {"message": "..."}; fall back to the raw body.
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    match status {
        StatusCode::CONFLICT => RemoteAccountError::EmailTaken,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteAccountError::AuthRejected,
        s if s.is_server_error() => {
            RemoteAccountError::RemoteUnavailable(format!("{status}: {message}"))
        }
        _ => RemoteAccountError::Remote(format!("{status}: {message}")),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteAccountError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_err(status, body))
}

#[async_trait]
impl RemoteAccountPort for HttpAccountGateway {
    async fn create_account(
        &self,
        email: &str,
        full_name: &str,
        plain_password: &str,
    ) -> Result<String, RemoteAccountError> {
        debug!(email, "creating remote account");
        let response = self
            .http
            .post(self.url("/v1/accounts"))
            .json(&CreateAccountRequest {
                email,
                full_name,
                password: plain_password,
            })
            .send()
            .await
            .map_err(transport_err)?;

        let created: CreateAccountResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteAccountError::Remote(e.to_string()))?;
        Ok(created.id)
    }

    async fn update_credential(
        &self,
        email: &str,
        old_plain: &str,
        new_plain: &str,
    ) -> Result<(), RemoteAccountError> {
        debug!(email, "updating remote credential");
        let response = self
            .http
            .post(self.url("/v1/accounts/credential"))
            .json(&UpdateCredentialRequest {
                email,
                old_password: old_plain,
                new_password: new_plain,
            })
            .send()
            .await
            .map_err(transport_err)?;

        check_status(response).await?;
        Ok(())
    }

    async fn upsert_profile(
        &self,
        remote_id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<(), RemoteAccountError> {
        debug!(remote_id, "upserting remote profile");
        let response = self
            .http
            .put(self.url(&format!("/v1/profiles/{remote_id}")))
            .json(&UpsertProfileRequest { full_name, email })
            .send()
            .await
            .map_err(transport_err)?;

        check_status(response).await?;
        Ok(())
    }
}
