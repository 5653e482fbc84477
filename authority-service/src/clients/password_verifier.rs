//! C7 — Password Verifier Client (§6): thin typed client to the external
//! password-verification service, grounded on `original_source`'s
//! `internal/jwtserver/jwt_server.go` (`jwtServer.Login`'s
//! `OrgCheckRequest`/`OrgCheckResponse`).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::config::OrgApiConfig;
use shared::errors::ApiError;

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    username: &'a str,
    password: &'a str,
    types: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyResponse {
    #[serde(default, rename = "userID")]
    user_id: String,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

pub struct PasswordVerifierClient {
    http: Client,
    host: String,
    login_uri: String,
}

impl PasswordVerifierClient {
    pub fn new(http: Client, config: &OrgApiConfig) -> Self {
        Self {
            http,
            host: config.host.clone(),
            login_uri: config.login_uri.clone(),
        }
    }

    /// Verifies `(username, password, login_type)` against the external
    /// service. On success returns the resolved `user_id`; on a
    /// verifier-reported failure, surfaces its code/message verbatim (§7).
    pub async fn verify(&self, username: &str, password: &str, login_type: &str) -> Result<String, ApiError> {
        let url = format!("{}{}", self.host, self.login_uri);
        let body = VerifyRequest { username, password, types: login_type };

        let response: VerifyResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("password verifier request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::internal(format!("password verifier response decode failed: {e}")))?;

        if response.user_id.is_empty() {
            return Err(ApiError::Directory { code: response.code, message: response.msg });
        }
        Ok(response.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(host: String) -> OrgApiConfig {
        OrgApiConfig {
            host,
            exp: 30,
            login_uri: "/o/login".to_string(),
            update_user_status_uri: String::new(),
            update_users_status_uri: String::new(),
            admin_reset_password_uri: String::new(),
            user_reset_password_uri: String::new(),
            user_forget_reset_password_uri: String::new(),
        }
    }

    #[tokio::test]
    async fn verify_returns_user_id_on_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/o/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "userID": "u-42",
                "code": 0,
                "msg": "",
            })))
            .mount(&mock_server)
            .await;

        let client = PasswordVerifierClient::new(reqwest::Client::new(), &config(mock_server.uri()));
        let user_id = client.verify("alice", "secret", "passwd").await.unwrap();
        assert_eq!(user_id, "u-42");
    }

    #[tokio::test]
    async fn verify_surfaces_verifier_code_and_message_on_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/o/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "userID": "",
                "code": 1001,
                "msg": "invalid credentials",
            })))
            .mount(&mock_server)
            .await;

        let client = PasswordVerifierClient::new(reqwest::Client::new(), &config(mock_server.uri()));
        let err = client.verify("alice", "wrong", "passwd").await.unwrap_err();
        match err {
            ApiError::Directory { code, message } => {
                assert_eq!(code, 1001);
                assert_eq!(message, "invalid credentials");
            }
            other => panic!("expected Directory error, got {other:?}"),
        }
    }
}
