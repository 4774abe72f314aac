use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppResult};
use crate::session::{AuthErrorHandler, SessionStore};

/// Bearer-token client for the Deskline REST backend.
///
/// Every request checks the session first, carries `Authorization: Bearer`,
/// and keeps a cookie store. Auth failures (no session, expired session, 401)
/// are passed to the shared handler before being returned.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    sessions: Arc<SessionStore>,
    auth_errors: Arc<dyn AuthErrorHandler>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        sessions: Arc<SessionStore>,
        auth_errors: Arc<dyn AuthErrorHandler>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(concat!("deskline/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sessions,
            auth_errors,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.send(Method::GET, path).await?;
        Ok(response.json::<T>().await?)
    }

    /// GET that tolerates "nothing here": 204, 404 and a `null` body all map to `None`.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> AppResult<Option<T>> {
        let response = match self.send(Method::GET, path).await {
            Ok(response) => response,
            Err(e) if e.code() == crate::errors::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str::<Option<T>>(&body)?)
    }

    /// PATCH without a request body; the response body is ignored.
    pub async fn patch(&self, path: &str) -> AppResult<()> {
        self.send(Method::PATCH, path).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        self.send(Method::DELETE, path).await?;
        Ok(())
    }

    async fn send(&self, method: Method, path: &str) -> AppResult<Response> {
        let session = self.sessions.require().map_err(|e| self.auth_failure(e))?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(method = %method, path, error = %e, "request failed");
                AppError::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(method = %method, path, status = status.as_u16(), "request ok");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = AppError::from_response(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            return Err(self.auth_failure(err));
        }

        tracing::debug!(method = %method, path, status = status.as_u16(), error = %err, "backend error");
        Err(err)
    }

    fn auth_failure(&self, err: AppError) -> AppError {
        self.auth_errors.handle_auth_error(&err);
        err
    }
}
