use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};

use votegate::config::{Config, TokenConfig};
use votegate::db::MemoryUserStore;
use votegate::email::{Mailer, OutgoingEmail};
use votegate::state::SharedState;

pub const PUBLIC_URL: &str = "http://localhost:8000";
pub const RESET_REDIRECT_URL: &str = "http://localhost:5173/reset-password";

/// Mailer that keeps every message instead of sending it.
#[derive(Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl OutboxMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// The plaintext token at the end of the link in the most recent message.
    pub fn last_token(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let email = sent.last().expect("no email was sent");
        link_token(email)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn link_token(email: &OutgoingEmail) -> String {
    let link = email
        .text
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("http"))
        .expect("email has no link");
    link.rsplit('/').next().unwrap().to_string()
}

/// A running test server backed by the in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    pub outbox: Arc<OutboxMailer>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, username: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "username": username, "password": password }))
            .send()
            .await
            .expect("register request failed");
        into_parts(resp).await
    }

    pub async fn login_response(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        into_parts(self.login_response(email, password).await).await
    }

    /// Register alice and log her in. Returns (access token, refresh token).
    pub async fn alice_session(&self) -> (String, String) {
        let (body, status) = self.register("a@x.com", "alice", "secret1").await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        let (body, status) = self.login("a@x.com", "secret1").await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (
            body["data"]["accessToken"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    /// Rotate using the refresh token cookie.
    pub async fn refresh(&self, refresh_token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url("/api/v1/auth/refresh-token"))
            .header("cookie", format!("refreshToken={refresh_token}"))
            .send()
            .await
            .expect("refresh request failed");
        into_parts(resp).await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        into_parts(resp).await
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        into_parts(resp).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        into_parts(resp).await
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        into_parts(resp).await
    }
}

pub async fn into_parts(resp: Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

/// name -> raw Set-Cookie header for every cookie the response sets.
pub fn set_cookies(resp: &Response) -> HashMap<String, String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| {
            let (name, _) = raw.split(';').next()?.split_once('=')?;
            Some((name.trim().to_string(), raw.to_string()))
        })
        .collect()
}

/// Value of a cookie from its raw Set-Cookie header.
pub fn cookie_value(raw: &str) -> String {
    raw.split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        public_url: PUBLIC_URL.to_string(),
        tokens: TokenConfig {
            access_secret: "test-access-secret-that-is-long-enough".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_secret: "test-refresh-secret-that-is-long-enough".to_string(),
            refresh_ttl: Duration::from_secs(10 * 24 * 60 * 60),
        },
        cors_origins: vec!["http://localhost:5173".to_string()],
        forgot_password_redirect_url: RESET_REDIRECT_URL.to_string(),
        max_body_size: 16 * 1024,
        log_level: "warn".to_string(),
        smtp: None,
    }
}

pub async fn spawn_app() -> TestApp {
    let outbox = Arc::new(OutboxMailer::default());
    let mailer: Arc<dyn Mailer> = outbox.clone();

    let (app, state) = votegate::build_app(
        Arc::new(MemoryUserStore::new()),
        Some(mailer),
        test_config(),
    );

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        state,
        outbox,
    }
}
