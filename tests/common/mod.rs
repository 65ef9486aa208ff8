//! Shared helpers for the integration tests: a server on an ephemeral
//! port and small HTTP wrappers.

#![allow(dead_code)]

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use tokio_test::assert_ok;

use tixly::app_state::AppState;
use tixly::config::TixlyConfig;
use tixly::persistence::Stores;
use tixly::server::build_app;

/// A running server and a client pointed at it.
#[derive(Debug)]
pub struct TestApp {
    /// `http://127.0.0.1:<port>`.
    pub base: String,
    /// Host and port only.
    pub addr: String,
    /// HTTP client.
    pub client: Client,
}

impl TestApp {
    /// Starts the app with in-memory stores.
    pub async fn spawn() -> Self {
        Self::spawn_with(TixlyConfig::default(), Stores::in_memory()).await
    }

    /// Starts the app over the given configuration and stores.
    pub async fn spawn_with(config: TixlyConfig, stores: Stores) -> Self {
        let state = AppState::new(config, stores).await;
        let app = build_app(state);
        let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
        let addr = assert_ok!(listener.local_addr()).to_string();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base: format!("http://{addr}"),
            addr,
            client: Client::new(),
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Signs up and returns the bearer token.
    pub async fn sign_up(&self, email: &str, name: &str, role: &str) -> String {
        let res = assert_ok!(
            self.client
                .post(self.url("/api/v1/auth/sign-up"))
                .json(&json!({
                    "email": email,
                    "password": "rahasia123",
                    "display_name": name,
                    "role": role,
                }))
                .send()
                .await
        );
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        let Some(token) = body["token"].as_str() else {
            panic!("sign-up returned no token: {body}");
        };
        token.to_string()
    }

    /// Creates a draft event and returns its id.
    pub async fn create_event(&self, token: &str, name: &str) -> String {
        let res = assert_ok!(
            self.client
                .post(self.url("/api/v1/events"))
                .bearer_auth(token)
                .json(&json!({
                    "name": name,
                    "date": "2026-12-05",
                    "location": "Jakarta",
                    "price": 50000,
                    "description": "Live music",
                }))
                .send()
                .await
        );
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        let Some(id) = body["id"].as_str() else {
            panic!("create returned no id: {body}");
        };
        id.to_string()
    }

    /// `GET` with an optional bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        assert_ok!(req.send().await)
    }

    /// `POST` without a body.
    pub async fn post(&self, path: &str, token: &str) -> Response {
        assert_ok!(
            self.client
                .post(self.url(path))
                .bearer_auth(token)
                .send()
                .await
        )
    }
}

/// Reads a JSON body.
pub async fn json_body(res: Response) -> Value {
    assert_ok!(res.json::<Value>().await)
}
