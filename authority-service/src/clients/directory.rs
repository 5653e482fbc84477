//! C6 — Directory Client (§6): thin typed client to the external
//! organization directory service, grounded on `original_source`'s
//! `pkg/org/user.go` (`User.GetUserInfo`).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::config::OrgApiConfig;
use shared::errors::ApiError;

/// User-info lookup is not a configurable endpoint in `orgAPI.*` (§6 only
/// lists login/status/reset URIs) — `original_source` hardcodes it as a
/// package-level constant, so this does the same relative to the configured
/// host.
const USER_INFO_URI: &str = "/o/user/info";

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentNode {
    #[serde(default)]
    pub id: String,
}

/// Directory's raw response shape for one user (`org.OneUserResponse`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "useStatus")]
    pub use_status: i32,
    #[serde(default, rename = "tenantID")]
    pub tenant_id: String,
    #[serde(default)]
    pub position: String,
    #[serde(default, rename = "deps")]
    pub department: Vec<Vec<DepartmentNode>>,
}

#[derive(Debug, Serialize)]
struct OneUserRequest<'a> {
    id: &'a str,
}

/// Flattens the directory's department matrix to the `Department-Id` header
/// encoding (§4.4): within-row ids joined by `,`, rows joined by `|`.
pub fn flatten_department_path(department: &[Vec<DepartmentNode>]) -> String {
    department
        .iter()
        .map(|row| row.iter().map(|d| d.id.as_str()).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("|")
}

pub struct DirectoryClient {
    http: Client,
    host: String,
}

impl DirectoryClient {
    pub fn new(http: Client, config: &OrgApiConfig) -> Self {
        Self { http, host: config.host.clone() }
    }

    pub async fn get_user_info(&self, user_id: &str) -> Result<DirectoryUser, ApiError> {
        let url = format!("{}{}", self.host, USER_INFO_URI);
        let request = OneUserRequest { id: user_id };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("directory request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::internal(format!(
                "directory returned status {}",
                response.status()
            )));
        }

        response
            .json::<DirectoryUser>()
            .await
            .map_err(|e| ApiError::internal(format!("directory response decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn flattens_empty_matrix_to_empty_string() {
        assert_eq!(flatten_department_path(&[]), "");
    }

    #[test]
    fn flattens_rows_with_comma_and_pipe() {
        let deps = vec![
            vec![DepartmentNode { id: "1".into() }, DepartmentNode { id: "2".into() }],
            vec![DepartmentNode { id: "3".into() }],
        ];
        assert_eq!(flatten_department_path(&deps), "1,2|3");
    }

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
    async fn get_user_info_deserializes_directory_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(USER_INFO_URI))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u-1",
                "name": "Alice",
                "phone": "555-0100",
                "email": "alice@example.com",
                "useStatus": 1,
                "tenantID": "tenant-a",
                "position": "engineer",
                "deps": [[{"id": "1"}, {"id": "2"}], [{"id": "3"}]],
            })))
            .mount(&mock_server)
            .await;

        let client = DirectoryClient::new(reqwest::Client::new(), &config(mock_server.uri()));
        let user = client.get_user_info("u-1").await.unwrap();

        assert_eq!(user.name, "Alice");
        assert_eq!(user.tenant_id, "tenant-a");
        assert_eq!(flatten_department_path(&user.department), "1,2|3");
    }

    #[tokio::test]
    async fn get_user_info_surfaces_internal_error_on_non_success_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(USER_INFO_URI))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = DirectoryClient::new(reqwest::Client::new(), &config(mock_server.uri()));
        assert!(matches!(
            client.get_user_info("u-1").await,
            Err(ApiError::Internal(_))
        ));
    }
}
