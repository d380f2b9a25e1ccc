//! Bookstore API client
//!
//! Command-line front end for the session layer:
//! 1. Loads config and signs in (when a password is configured)
//! 2. Sends one request through the refresh-and-retry dispatcher
//! 3. Prints the response body, or exits non-zero with the failure message
//! 4. Signs out, server-side, on exit or after the session was invalidated

mod config;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bookstore_session::{
    CredentialRefresher, Outcome, RefreshCoordinator, RequestDispatcher, SignOutLatch,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::{HttpTransport, Method, Request};

use crate::config::Config;

const USAGE: &str = "usage: bookstore-client [--config PATH] <METHOD> <PATH> [JSON_BODY]";

/// The request named on the command line.
#[derive(Debug, PartialEq)]
struct Invocation {
    method: Method,
    target: String,
    body: Option<serde_json::Value>,
}

impl Invocation {
    fn to_request(&self) -> Request {
        let request = Request::new(self.method.clone(), self.target.clone());
        match &self.body {
            Some(body) => request.with_body(body.clone()),
            None => request,
        }
    }
}

/// Split CLI args (without the program name) into the config path and the request.
fn parse_args(args: &[String]) -> Result<(Option<String>, Invocation)> {
    let mut config_path = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config requires a path")?;
            config_path = Some(path.clone());
        } else {
            positional.push(arg.as_str());
        }
    }

    let (method, target, body) = match positional.as_slice() {
        [method, target] => (*method, *target, None),
        [method, target, body] => (*method, *target, Some(*body)),
        _ => bail!(USAGE),
    };

    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method: {method}"))?;
    let body = body
        .map(serde_json::from_str)
        .transpose()
        .context("request body must be valid JSON")?;

    Ok((
        config_path,
        Invocation {
            method,
            target: target.to_string(),
            body,
        },
    ))
}

/// Everything needed to send requests for one signed-in session.
struct Session {
    transport: Arc<HttpTransport>,
    dispatcher: RequestDispatcher,
    latch: Arc<SignOutLatch>,
    signed_in: bool,
}

/// Build the transport and dispatcher, signing in when a password is known.
///
/// The refresher and dispatcher share one transport so the credential cookie
/// set by login and refresh is seen by every request.
async fn open_session(config: &Config) -> Result<Session> {
    let transport = Arc::new(
        HttpTransport::new(&config.api.base_url, config.api.timeout())
            .context("failed to build HTTP transport")?,
    );

    let mut signed_in = false;
    match &config.account {
        Some(account) => match &account.password {
            Some(password) => {
                bookstore_auth::login(transport.as_ref(), &account.email, password)
                    .await
                    .with_context(|| format!("failed to sign in as {}", account.email))?;
                signed_in = true;
            }
            None => warn!(email = %account.email, "no password configured, sending anonymously"),
        },
        None => info!("no account configured, sending anonymously"),
    }

    let refresher: Arc<dyn CredentialRefresher> = Arc::new(
        bookstore_auth::HttpCredentialRefresher::new(transport.clone()),
    );
    let coordinator = Arc::new(RefreshCoordinator::new(refresher));
    let latch = Arc::new(SignOutLatch::new());
    let dispatcher = RequestDispatcher::new(transport.clone(), coordinator, latch.clone());

    Ok(Session {
        transport,
        dispatcher,
        latch,
        signed_in,
    })
}

/// End the session server-side. Logout failures are logged, not fatal.
async fn close_session(session: &Session) {
    let invalidated = session.latch.is_signed_out();
    if invalidated {
        info!("session was invalidated, clearing server-side session");
    }
    if session.signed_in || invalidated {
        if let Err(e) = bookstore_auth::logout(session.transport.as_ref()).await {
            warn!(error = %e, "logout failed");
        }
    }
}

/// Open a session, send one request, close the session.
async fn execute(config: &Config, invocation: &Invocation) -> Result<Outcome> {
    let session = open_session(config).await?;
    let outcome = session.dispatcher.send(&invocation.to_request()).await;
    close_session(&session).await;
    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (cli_config_path, invocation) = parse_args(&args)?;

    let config_path = Config::resolve_path(cli_config_path.as_deref());
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        method = %invocation.method,
        target = %invocation.target,
        "configuration loaded"
    );

    match execute(&config, &invocation).await? {
        Outcome::Success(body) => {
            println!("{body}");
            Ok(())
        }
        Outcome::Failure { kind, message } => {
            error!(kind = kind.label(), error = %message, "request failed");
            bail!("{} error: {message}", kind.label())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountConfig, ApiConfig};
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::{delete, get, post};
    use bookstore_session::FailureKind;
    use common::Password;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_method_and_path() {
        let (config, invocation) = parse_args(&args(&["get", "/v1/products"])).unwrap();
        assert!(config.is_none());
        assert_eq!(
            invocation,
            Invocation {
                method: Method::GET,
                target: "/v1/products".into(),
                body: None,
            }
        );
    }

    #[test]
    fn parse_config_flag_anywhere_and_json_body() {
        let (config, invocation) = parse_args(&args(&[
            "POST",
            "--config",
            "/etc/bookstore.toml",
            "/v1/reviews",
            r#"{"rating":5}"#,
        ]))
        .unwrap();
        assert_eq!(config.as_deref(), Some("/etc/bookstore.toml"));
        assert_eq!(invocation.method, Method::POST);
        assert_eq!(invocation.body, Some(serde_json::json!({"rating": 5})));

        let request = invocation.to_request();
        assert_eq!(request.target, "/v1/reviews");
        assert_eq!(request.body, Some(serde_json::json!({"rating": 5})));
    }

    #[test]
    fn parse_rejects_missing_path_and_bad_body() {
        assert!(parse_args(&args(&["GET"])).is_err());
        assert!(parse_args(&args(&["GET", "/v1/products", "{not json"])).is_err());
        assert!(parse_args(&args(&["GET", "/v1/products", "--config"])).is_err());
    }

    /// Call counters for the fake backend.
    #[derive(Default)]
    struct BackendHits {
        refresh: AtomicUsize,
        logout: AtomicUsize,
    }

    /// Fake bookstore backend.
    ///
    /// Login hands out a stale credential, so the first catalog request gets
    /// 410; refresh swaps in a fresh one. Requests with no credential get 401.
    async fn start_backend(hits: Arc<BackendHits>) -> String {
        let refresh_hits = hits.clone();
        let logout_hits = hits.clone();
        let app = axum::Router::new()
            .route(
                "/v1/users/login",
                post(|| async {
                    (
                        [(header::SET_COOKIE, "accessToken=stale; Path=/")],
                        r#"{"user":{"name":"Reader"}}"#,
                    )
                }),
            )
            .route(
                "/v1/users/refresh-token",
                get(move || {
                    let hits = refresh_hits.clone();
                    async move {
                        hits.refresh.fetch_add(1, Ordering::SeqCst);
                        ([(header::SET_COOKIE, "accessToken=fresh; Path=/")], "{}")
                    }
                }),
            )
            .route(
                "/v1/users/logout",
                delete(move || {
                    let hits = logout_hits.clone();
                    async move {
                        hits.logout.fetch_add(1, Ordering::SeqCst);
                        StatusCode::NO_CONTENT
                    }
                }),
            )
            .route(
                "/v1/products",
                get(|headers: HeaderMap| async move {
                    let cookie = headers
                        .get(header::COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("");
                    if cookie.contains("accessToken=fresh") {
                        (StatusCode::OK, r#"{"books":["Dune"]}"#)
                    } else if cookie.contains("accessToken=stale") {
                        (StatusCode::GONE, r#"{"message":"Access token expired"}"#)
                    } else {
                        (StatusCode::UNAUTHORIZED, r#"{"message":"Please sign in"}"#)
                    }
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn test_config(base_url: &str, with_account: bool) -> Config {
        Config {
            api: ApiConfig {
                base_url: base_url.to_string(),
                timeout_secs: 5,
            },
            account: with_account.then(|| AccountConfig {
                email: "reader@example.com".into(),
                password: Password::new("open-sesame"),
                password_file: None,
            }),
        }
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed_and_request_replayed() {
        let hits = Arc::new(BackendHits::default());
        let base = start_backend(hits.clone()).await;
        let (_, invocation) = parse_args(&args(&["GET", "/v1/products"])).unwrap();

        let outcome = execute(&test_config(&base, true), &invocation).await.unwrap();
        assert_eq!(outcome, Outcome::Success(r#"{"books":["Dune"]}"#.into()));
        assert_eq!(hits.refresh.load(Ordering::SeqCst), 1);
        assert_eq!(hits.logout.load(Ordering::SeqCst), 1, "signed-in session is closed");
    }

    #[tokio::test]
    async fn missing_credential_signs_out_without_refresh() {
        let hits = Arc::new(BackendHits::default());
        let base = start_backend(hits.clone()).await;
        let (_, invocation) = parse_args(&args(&["GET", "/v1/products"])).unwrap();

        let outcome = execute(&test_config(&base, false), &invocation).await.unwrap();
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Unauthorized));
        assert_eq!(hits.refresh.load(Ordering::SeqCst), 0);
        assert_eq!(
            hits.logout.load(Ordering::SeqCst),
            1,
            "invalidated session is cleared server-side"
        );
    }

    #[tokio::test]
    async fn concurrent_requests_in_one_session_share_the_refresh() {
        let hits = Arc::new(BackendHits::default());
        let base = start_backend(hits.clone()).await;
        let session = Arc::new(open_session(&test_config(&base, true)).await.unwrap());

        let mut handles = vec![];
        for _ in 0..5 {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                session.dispatcher.send(&Request::get("/v1/products")).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }
        // A 410 that lands after a refresh settled starts its own refresh, so
        // only the lower bound is fixed here
        let refreshes = hits.refresh.load(Ordering::SeqCst);
        assert!((1..=5).contains(&refreshes), "got {refreshes} refreshes");
        assert!(!session.latch.is_signed_out());
    }
}
