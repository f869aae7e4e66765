// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{info, warn};
use crate::backend::traits::{BackendError, ProfileBackend};
use crate::session::models::{BackendProfile, NewUser};

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("verge-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn build_request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.client.request(method, &url);

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        request
    }

    async fn get_user(&self, query: (&str, &str)) -> Result<Option<BackendProfile>, BackendError> {
        let response = self
            .build_request(Method::GET, "api/users/get")
            .query(&[query])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: Envelope<BackendProfile> = read_envelope(response).await?;
        if !envelope.status {
            return Ok(None);
        }

        Ok(envelope.data)
    }
}

/// Response wrapper used by every backend route
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ConfirmRequest<'a> {
    email: &'a str,
    code: &'a str,
}

/// Turn a non-2xx response into `BackendError::Status`, preferring the
/// envelope's `message` over the raw body.
async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Envelope<Value>>(&text)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or(text);

    warn!(status = %status, message = %message, "Backend request failed");
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, BackendError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| BackendError::Malformed(e.to_string()))
}

#[async_trait]
impl ProfileBackend for BackendClient {
    async fn create_user(&self, user: &NewUser) -> Result<BackendProfile, BackendError> {
        info!(email = %user.email, "Creating backend user");

        let response = self
            .build_request(Method::POST, "api/users/create")
            .json(user)
            .send()
            .await?;

        let envelope: Envelope<BackendProfile> = read_envelope(response).await?;
        envelope
            .data
            .ok_or_else(|| BackendError::Malformed("create response carried no data".to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<BackendProfile>, BackendError> {
        self.get_user(("email", email)).await
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<BackendProfile>, BackendError> {
        self.get_user(("id", id)).await
    }

    async fn update_user(
        &self,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<Map<String, Value>, BackendError> {
        info!(user_id = %id, fields = changes.len(), "Updating backend user");

        let response = self
            .build_request(Method::PUT, "api/users/update")
            .query(&[("id", id)])
            .json(changes)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        // The update route may answer with an empty body
        let text = response.text().await?;
        let data = serde_json::from_str::<Envelope<Map<String, Value>>>(&text)
            .ok()
            .and_then(|envelope| envelope.data)
            .unwrap_or_default();

        Ok(data)
    }

    async fn send_verification_code(&self, email: &str) -> Result<(), BackendError> {
        info!(email = %email, "Requesting verification code");

        let response = self
            .build_request(Method::POST, "api/email")
            .json(&EmailRequest { email })
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn confirm_verification_code(&self, email: &str, code: &str) -> Result<(), BackendError> {
        info!(email = %email, "Confirming verification code");

        let response = self
            .build_request(Method::POST, "api/email/confirm")
            .json(&ConfirmRequest { email, code })
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, ServerGuard};
    use serde_json::json;

    async fn setup_mock_server() -> (ServerGuard, BackendClient) {
        let server = mockito::Server::new_async().await;
        let client = BackendClient::new(server.url(), None, Duration::from_secs(5)).unwrap();
        (server, client)
    }

    fn new_user() -> NewUser {
        NewUser {
            name: "Asha".to_string(),
            email: "asha@example.edu".to_string(),
            profile_pic: None,
            email_verified: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let (mut server, client) = setup_mock_server().await;

        let mock = server.mock("POST", "/api/users/create")
            .match_body(Matcher::PartialJson(json!({ "name": "Asha", "email": "asha@example.edu" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":true,"data":{"_id":"u1","email":"asha@example.edu","name":"Asha"}}"#)
            .create_async()
            .await;

        let profile = client.create_user(&new_user()).await.unwrap();
        assert_eq!(profile.id.as_deref(), Some("u1"));
        assert_eq!(profile.name, "Asha");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_user_error_status_uses_message() {
        let (mut server, client) = setup_mock_server().await;

        let mock = server.mock("POST", "/api/users/create")
            .with_status(500)
            .with_body(r#"{"status":false,"message":"database unavailable"}"#)
            .create_async()
            .await;

        let err = client.create_user(&new_user()).await.unwrap_err();
        match err {
            BackendError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_user_without_data_is_malformed() {
        let (mut server, client) = setup_mock_server().await;

        let _mock = server.mock("POST", "/api/users/create")
            .with_status(200)
            .with_body(r#"{"status":true}"#)
            .create_async()
            .await;

        let err = client.create_user(&new_user()).await.unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_create_user_garbage_body_is_malformed() {
        let (mut server, client) = setup_mock_server().await;

        let _mock = server.mock("POST", "/api/users/create")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = client.create_user(&new_user()).await.unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let (mut server, client) = setup_mock_server().await;

        let mock = server.mock("GET", "/api/users/get")
            .match_query(Matcher::UrlEncoded("email".into(), "asha@example.edu".into()))
            .with_status(200)
            .with_body(r#"{"status":true,"data":{"_id":"u1","email":"asha@example.edu","emailVerified":true}}"#)
            .create_async()
            .await;

        let profile = client.get_user_by_email("asha@example.edu").await.unwrap().unwrap();
        assert!(profile.email_verified);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let (mut server, client) = setup_mock_server().await;

        let _missing = server.mock("GET", "/api/users/get")
            .match_query(Matcher::UrlEncoded("id".into(), "nobody".into()))
            .with_status(404)
            .create_async()
            .await;
        let _negative = server.mock("GET", "/api/users/get")
            .match_query(Matcher::UrlEncoded("email".into(), "ghost@example.edu".into()))
            .with_status(200)
            .with_body(r#"{"status":false,"message":"User not found"}"#)
            .create_async()
            .await;

        assert!(client.get_user_by_id("nobody").await.unwrap().is_none());
        assert!(client.get_user_by_email("ghost@example.edu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_returns_server_fields() {
        let (mut server, client) = setup_mock_server().await;

        let mock = server.mock("PUT", "/api/users/update")
            .match_query(Matcher::UrlEncoded("id".into(), "u1".into()))
            .match_body(Matcher::Json(json!({ "phone": "9876543210" })))
            .with_status(200)
            .with_body(r#"{"status":true,"data":{"_id":"u1","phone":9876543210}}"#)
            .create_async()
            .await;

        let mut changes = Map::new();
        changes.insert("phone".to_string(), json!("9876543210"));

        let data = client.update_user("u1", &changes).await.unwrap();
        assert_eq!(data.get("phone"), Some(&json!(9876543210u64)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_user_empty_body() {
        let (mut server, client) = setup_mock_server().await;

        let _mock = server.mock("PUT", "/api/users/update")
            .match_query(Matcher::Any)
            .with_status(200)
            .create_async()
            .await;

        let data = client.update_user("u1", &Map::new()).await.unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_verification_code_routes() {
        let (mut server, client) = setup_mock_server().await;

        let send = server.mock("POST", "/api/email")
            .match_body(Matcher::Json(json!({ "email": "asha@example.edu" })))
            .with_status(200)
            .create_async()
            .await;
        let confirm = server.mock("POST", "/api/email/confirm")
            .match_body(Matcher::Json(json!({ "email": "asha@example.edu", "code": "000000" })))
            .with_status(400)
            .with_body(r#"{"message":"Invalid code"}"#)
            .create_async()
            .await;

        client.send_verification_code("asha@example.edu").await.unwrap();
        let err = client
            .confirm_verification_code("asha@example.edu", "000000")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid code"));

        send.assert_async().await;
        confirm.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer() {
        let mut server = mockito::Server::new_async().await;
        let client = BackendClient::new(
            format!("{}/", server.url()),
            Some("secret-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let mock = server.mock("POST", "/api/email")
            .match_header("authorization", "Bearer secret-key")
            .with_status(200)
            .create_async()
            .await;

        client.send_verification_code("asha@example.edu").await.unwrap();
        mock.assert_async().await;
    }
}
