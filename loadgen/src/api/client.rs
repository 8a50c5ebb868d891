//! HTTP/WebSocket client adapter
//!
//! One `ApiClient` per actor: each carries its own cookie jar so web-path
//! sessions never leak between actors. Every request is recorded under a
//! caller-provided normalized label; latency is measured to response headers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::SinkExt;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use crate::config::Account;
use crate::harness::Recorder;
use crate::session::UserSession;

use super::models::{TokenStringData, WebLoginForm};

/// Errors from the client adapter
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{label}: transport error: {source}")]
    Transport {
        label: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{label}: unexpected status {status}")]
    Status { label: String, status: StatusCode },
    #[error("{label}: could not decode response: {source}")]
    Decode {
        label: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("websocket error: {0}")]
    Socket(#[from] tungstenite::Error),
}

/// Labeled HTTP/WS client bound to one target and one metrics recorder
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
    recorder: Recorder,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, recorder: Recorder) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .user_agent(concat!("shipload/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            jar,
            base,
            recorder,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(format!("{path}: {err}")))
    }

    fn with_auth(&self, req: RequestBuilder, auth: Option<&UserSession>) -> RequestBuilder {
        match auth {
            Some(session) => req.bearer_auth(&session.token),
            None => req,
        }
    }

    /// Send, record under `label`, and enforce a success status
    async fn execute(&self, req: RequestBuilder, label: &str) -> Result<Response, ApiError> {
        let started = Instant::now();
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(source) => {
                self.recorder.request(label, false, started.elapsed());
                return Err(ApiError::Transport {
                    label: label.to_string(),
                    source,
                });
            }
        };
        let latency = started.elapsed();
        let status = resp.status();
        let ok = status.is_success();
        self.recorder.request(label, ok, latency);
        if ok {
            Ok(resp)
        } else {
            Err(ApiError::Status {
                label: label.to_string(),
                status,
            })
        }
    }

    async fn decode<T: DeserializeOwned>(&self, resp: Response, label: &str) -> Result<T, ApiError> {
        resp.json().await.map_err(|source| ApiError::Decode {
            label: label.to_string(),
            source,
        })
    }

    /// GET expecting a JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        label: &str,
        auth: Option<&UserSession>,
    ) -> Result<T, ApiError> {
        let req = self.with_auth(self.http.get(self.url(path)?), auth);
        let resp = self.execute(req, label).await?;
        self.decode(resp, label).await
    }

    /// GET where only the status matters (web pages)
    pub async fn get_ok(
        &self,
        path: &str,
        label: &str,
        auth: Option<&UserSession>,
    ) -> Result<(), ApiError> {
        let req = self.with_auth(self.http.get(self.url(path)?), auth);
        self.execute(req, label).await?;
        Ok(())
    }

    /// POST a JSON body expecting a JSON response
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        label: &str,
        auth: Option<&UserSession>,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.with_auth(self.http.post(self.url(path)?).json(body), auth);
        let resp = self.execute(req, label).await?;
        self.decode(resp, label).await
    }

    /// POST a JSON body where only the status matters
    pub async fn post_ok<B>(
        &self,
        path: &str,
        label: &str,
        auth: Option<&UserSession>,
        body: &B,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let req = self.with_auth(self.http.post(self.url(path)?).json(body), auth);
        self.execute(req, label).await?;
        Ok(())
    }

    /// Bodyless POST (reactions, favorites, deletes-by-POST)
    pub async fn post_empty(
        &self,
        path: &str,
        label: &str,
        auth: Option<&UserSession>,
    ) -> Result<(), ApiError> {
        let req = self.with_auth(self.http.post(self.url(path)?), auth);
        self.execute(req, label).await?;
        Ok(())
    }

    pub async fn delete_ok(
        &self,
        path: &str,
        label: &str,
        auth: Option<&UserSession>,
    ) -> Result<(), ApiError> {
        let req = self.with_auth(self.http.delete(self.url(path)?), auth);
        self.execute(req, label).await?;
        Ok(())
    }

    /// Token login: `POST /api/v3/auth/login` with Basic credentials
    pub async fn login_token(&self, account: &Account) -> Result<UserSession, ApiError> {
        let label = "/api/v3/auth/login";
        let req = self
            .http
            .post(self.url(label)?)
            .basic_auth(&account.username, Some(&account.password));
        let resp = self.execute(req, label).await?;
        let data: TokenStringData = self.decode(resp, label).await?;
        Ok(UserSession {
            username: account.username.clone(),
            user_id: data.user_id,
            token: data.token,
        })
    }

    /// Web login: `POST /login`, stores the session cookie in this client's jar
    pub async fn login_web(&self, account: &Account) -> Result<(), ApiError> {
        let body = WebLoginForm {
            username: account.username.clone(),
            password: account.password.clone(),
        };
        self.post_ok("/login", "/login", None, &body).await
    }

    /// The cookie header for the target origin, once a web login happened
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Open the given path as a WebSocket, send one probe frame, close.
    ///
    /// The session cookie (if any) rides along on the upgrade request, the
    /// way a browser would send it.
    pub async fn socket_probe(&self, path: &str, label: &str) -> Result<(), ApiError> {
        let mut url = self.url(path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        if url.set_scheme(scheme).is_err() {
            return Err(ApiError::InvalidUrl(format!("{url} is not upgradable")));
        }

        let mut request = url.as_str().into_client_request()?;
        if let Some(cookie) = self.session_cookie()
            && let Ok(value) = tungstenite::http::HeaderValue::from_str(&cookie)
        {
            request
                .headers_mut()
                .insert(tungstenite::http::header::COOKIE, value);
        }

        let started = Instant::now();
        match connect_async(request).await {
            Ok((mut socket, _response)) => {
                self.recorder.request(label, true, started.elapsed());
                socket.send(tungstenite::Message::Text("ping".into())).await?;
                socket.close(None).await?;
                Ok(())
            }
            Err(source) => {
                self.recorder.request(label, false, started.elapsed());
                Err(ApiError::Socket(source))
            }
        }
    }
}
