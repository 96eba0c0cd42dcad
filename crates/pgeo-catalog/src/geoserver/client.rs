//! HTTP plumbing for the GeoServer REST API.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use pgeo_core::config::CatalogConfig;
use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;

/// Body of a REST call.
#[derive(Debug, Clone)]
pub(crate) enum Body {
    Empty,
    Json(serde_json::Value),
    Text(&'static str, String),
}

/// Authenticated GeoServer REST client.
#[derive(Debug, Clone)]
pub struct GeoServerClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) config: CatalogConfig,
}

impl GeoServerClient {
    /// Create a client from configuration.
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to create HTTP client", e)
            })?;

        info!(url = %config.url, "GeoServer client configured");
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            config: config.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/rest{path}", self.base_url);
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Send a request and return the raw response, whatever its status.
    pub(crate) async fn send(&self, method: Method, path: &str, body: Body) -> AppResult<Response> {
        debug!(%method, path, "GeoServer request");
        let builder = self.request(method.clone(), path);
        let builder = match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Text(content_type, text) => builder.header(CONTENT_TYPE, content_type).body(text),
        };
        builder.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::CatalogUnreachable,
                format!("GeoServer unreachable on {method} {path}"),
                e,
            )
        })
    }

    /// Send a request and fail unless the answer is a success.
    pub(crate) async fn execute(&self, method: Method, path: &str, body: Body) -> AppResult<Response> {
        let response = self.send(method.clone(), path, body).await?;
        ensure_success(&method, path, response).await
    }

    /// GET a JSON document; `None` when the resource does not exist.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<Option<T>> {
        let response = self.send(Method::GET, path, Body::Empty).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(&Method::GET, path, response).await?;
        let parsed = response.json::<T>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Unexpected GeoServer payload from {path}"),
                e,
            )
        })?;
        Ok(Some(parsed))
    }

    /// GET a text document; `None` when the resource does not exist.
    pub(crate) async fn get_text(&self, path: &str) -> AppResult<Option<String>> {
        let response = self.send(Method::GET, path, Body::Empty).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(&Method::GET, path, response).await?;
        let text = response.text().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::CatalogUnreachable,
                format!("Failed to read GeoServer response from {path}"),
                e,
            )
        })?;
        Ok(Some(text))
    }

    /// Whether a resource exists.
    pub(crate) async fn exists(&self, path: &str) -> AppResult<bool> {
        let response = self.send(Method::GET, path, Body::Empty).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(&Method::GET, path, response).await?;
        Ok(true)
    }

    /// DELETE a resource; `false` when it did not exist.
    pub(crate) async fn delete(&self, path: &str) -> AppResult<bool> {
        let response = self.send(Method::DELETE, path, Body::Empty).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(&Method::DELETE, path, response).await?;
        Ok(true)
    }
}

async fn ensure_success(method: &Method, path: &str, response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::catalog_rejected(format!(
        "GeoServer rejected {method} {path}: {status} {}",
        body.chars().take(200).collect::<String>()
    )))
}

/// Bytes escaped in path segments and query values. Unreserved characters
/// stay, and so does `:` of qualified `workspace:name` references.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':');

/// Percent-encode a value used as a path segment or query parameter.
pub(crate) fn encode(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}
