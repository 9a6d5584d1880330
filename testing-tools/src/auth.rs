use log::*;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{decode_error, status_error, Error};

#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Bearer token returned by the sign-in endpoint.
#[derive(Debug, Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    pub fn new(token: String) -> Self {
        Self(SecretString::from(token))
    }

    /// Adds `Authorization: Bearer <token>` to the request.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.0.expose_secret())
    }

    /// The first `len` characters of the token, for console output.
    pub fn preview(&self, len: usize) -> String {
        self.0.expose_secret().chars().take(len).collect()
    }
}

#[derive(Debug, Serialize)]
struct SigninRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigninResponse {
    access_token: Option<String>,
}

pub async fn login(
    client: &Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<SessionToken, Error> {
    let url = format!("{}/api/auth/signin", base_url);
    debug!("POST {} as {}", url, credentials.username);

    let response = client
        .post(&url)
        .json(&SigninRequest {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        })
        .send()
        .await?;

    // Only a plain 200 carries a token.
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        warn!("Sign-in rejected with {}", status);
        return Err(status_error(status.as_u16(), body));
    }

    let signin: SigninResponse = response.json().await?;
    match signin.access_token {
        Some(token) => Ok(SessionToken::new(token)),
        None => Err(decode_error("No accessToken in sign-in response")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_login_returns_access_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/signin")
            .match_body(Matcher::Json(json!({
                "username": "admlucas",
                "password": "123456"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"accessToken":"T","tokenType":"Bearer"}"#)
            .create_async()
            .await;

        let token = login(
            &Client::new(),
            &server.url(),
            &Credentials::new("admlucas", "123456"),
        )
        .await
        .unwrap();

        assert_eq!(token.preview(20), "T");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected_reports_status_and_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/auth/signin")
            .with_status(401)
            .with_body("Bad credentials")
            .create_async()
            .await;

        let err = login(
            &Client::new(),
            &server.url(),
            &Credentials::new("admlucas", "wrong"),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Status {
                status: 401,
                body: "Bad credentials".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_login_without_token_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/auth/signin")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"welcome"}"#)
            .create_async()
            .await;

        let err = login(
            &Client::new(),
            &server.url(),
            &Credentials::new("admlucas", "123456"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::Decode);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("admlucas", "123456");

        assert!(!format!("{:?}", credentials).contains("123456"));
    }

    #[test]
    fn test_token_preview_truncates() {
        let token = SessionToken::new("abcdefghijklmnopqrstuvwxyz".to_string());

        assert_eq!(token.preview(20), "abcdefghijklmnopqrst");
        assert!(!format!("{:?}", token).contains("abcdef"));
    }
}
