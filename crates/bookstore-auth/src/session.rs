//! Login and logout
//!
//! Neither call goes through the retry core. Login is what creates the
//! credential that later expires; logout is issued by sign-out handling after
//! the core has reported the session invalid.

use common::Password;
use tracing::{info, warn};
use transport::{Request, Transport};

use crate::constants::{LOGIN_PATH, LOGOUT_PATH};
use crate::error::{Error, Result};

/// Sign in with email and password.
///
/// On success the backend sets the credential cookie on the transport. Returns
/// the response body as opaque JSON (the profile schema belongs to the
/// application, not to this crate).
pub async fn login(
    transport: &dyn Transport,
    email: &str,
    password: &Password,
) -> Result<serde_json::Value> {
    let request = Request::post(
        LOGIN_PATH,
        serde_json::json!({
            "email": email,
            "password": password.expose(),
        }),
    );
    let response = transport.execute(&request).await?;

    if !response.is_success() {
        let message = response.error_message();
        warn!(status = response.status, error = %message, "login rejected");
        return Err(Error::Rejected {
            status: response.status,
            message,
        });
    }

    info!(email, "signed in");
    if response.body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&response.body)
        .map_err(|e| Error::Decode(format!("parsing login response: {e}")))
}

/// End the session server-side.
pub async fn logout(transport: &dyn Transport) -> Result<()> {
    let response = transport.execute(&Request::delete(LOGOUT_PATH)).await?;
    if !response.is_success() {
        return Err(Error::Rejected {
            status: response.status,
            message: response.error_message(),
        });
    }
    info!("signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::{delete, get, post};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use transport::HttpTransport;

    async fn start_server(app: axum::Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Backend that accepts one account and echoes the credential cookie.
    fn account_backend() -> axum::Router {
        axum::Router::new()
            .route(
                LOGIN_PATH,
                post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                    if body["email"] == "reader@example.com" && body["password"] == "open-sesame" {
                        (
                            StatusCode::OK,
                            [(header::SET_COOKIE, "accessToken=at-1; Path=/")],
                            r#"{"user":{"name":"Reader"}}"#,
                        )
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            [(header::SET_COOKIE, "ignored=1; Path=/")],
                            r#"{"message":"Incorrect email or password"}"#,
                        )
                    }
                }),
            )
            .route(
                "/v1/users/me",
                get(|headers: HeaderMap| async move {
                    headers
                        .get(header::COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string()
                }),
            )
            .route(LOGOUT_PATH, delete(|| async { StatusCode::NO_CONTENT }))
    }

    #[tokio::test]
    async fn login_stores_credential_cookie_and_returns_profile() {
        let base = start_server(account_backend()).await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();

        let profile = login(
            &transport,
            "reader@example.com",
            &Password::new("open-sesame").unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(profile["user"]["name"], "Reader");

        let me = transport.execute(&Request::get("/v1/users/me")).await.unwrap();
        assert!(me.body.contains("accessToken=at-1"), "got: {}", me.body);
    }

    #[tokio::test]
    async fn login_rejection_surfaces_server_message() {
        let base = start_server(account_backend()).await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();

        let err = login(
            &transport,
            "reader@example.com",
            &Password::new("wrong").unwrap(),
        )
        .await
        .unwrap_err();
        match err {
            Error::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Incorrect email or password");
            }
            other => panic!("expected Rejected, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn logout_accepts_no_content() {
        let base = start_server(account_backend()).await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
        logout(&transport).await.unwrap();
    }

    #[tokio::test]
    async fn logout_failure_is_an_error() {
        let app = axum::Router::new().route(
            LOGOUT_PATH,
            delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "") }),
        );
        let base = start_server(app).await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();

        let err = logout(&transport).await.unwrap_err();
        assert!(matches!(err, Error::Rejected { status: 500, .. }), "got: {err:?}");
    }
}
