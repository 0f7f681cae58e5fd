//! Console API client utilities.
//!
//! This crate provides a lightweight client for the recipe console REST API.
//! It focuses on:
//!
//! - Constructing an HTTP client with JSON defaults and a cookie jar
//! - Attaching the server-issued anti-forgery token to every request
//! - Validating the configured base URL for safety
//! - Decoding error bodies into the [`Error`] taxonomy
//!
//! The primary entry point is [`ConsoleClient`]. Create an instance via
//! [`ConsoleClient::new`], and then either call the typed endpoint methods
//! (see `endpoints`) or build raw requests with [`ConsoleClient::request`].

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde_json::{Map as JsonMap, Value};
use tracing::{debug, warn};

mod endpoints;
mod error;

pub use error::Error;

/// Header carrying the server-issued anti-forgery token.
const CSRF_HEADER: &str = "X-CSRFToken";
/// Hostnames allowed without HTTPS for local development.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Thin wrapper around a configured `reqwest::Client` for console API access.
///
/// The client pre-configures JSON `Accept`/`Content-Type` headers, keeps a
/// cookie jar so session cookies travel with every request (the same-origin
/// credential model of the browser console), and stamps the anti-forgery
/// token on each request it builds.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    base_url: String,
    http: Client,
    csrf_token: String,
}

impl ConsoleClient {
    /// Construct a client against a validated base URL.
    ///
    /// Non-localhost hosts must use HTTPS. The `csrf_token` is the value the
    /// server embedded in the page that loaded the console.
    pub fn new(base_url: impl Into<String>, csrf_token: impl Into<String>) -> Result<Self, Error> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        default_headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|error| Error::Transport(format!("build http client: {error}")))?;

        Ok(Self {
            base_url,
            http,
            csrf_token: csrf_token.into(),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    ///
    /// The resulting request carries the anti-forgery token and the JSON
    /// default headers, resolved relative to the configured base URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building request");

        self.http.request(method, url).header(CSRF_HEADER, &self.csrf_token)
    }

    /// `GET` an arbitrary API-relative path with query parameters, returning
    /// the raw JSON body. This is the fetch-engine transport entry point;
    /// typed reads go through the endpoint methods.
    pub async fn get_raw(&self, path: &str, params: &JsonMap<String, Value>) -> Result<Value, Error> {
        let mut builder = self.request(Method::GET, path);
        if !params.is_empty() {
            builder = builder.query(&query_pairs(params));
        }
        self.execute(builder).await
    }

    /// Send a built request and decode the response body.
    ///
    /// Success bodies parse to JSON (empty bodies become `Value::Null`);
    /// non-2xx responses decode through [`Error::from_response`].
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Value, Error> {
        let response = builder.send().await.map_err(|error| Error::Transport(error.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|error| Error::Transport(error.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "api request failed");
            return Err(Error::from_response(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|error| Error::Transport(format!("invalid JSON in response body: {error}")))
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
fn validate_base_url(base: &str) -> Result<(), Error> {
    let parsed = Url::parse(base).map_err(|error| Error::Configuration(format!("invalid base URL '{base}': {error}")))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| Error::Configuration(format!("base URL '{base}' must include a host")))?;

    if LOCALHOST_DOMAINS.iter().any(|&allowed| host.eq_ignore_ascii_case(allowed)) {
        return Ok(());
    }

    if parsed.scheme() != "https" {
        return Err(Error::Configuration(format!(
            "base URL must use https for non-localhost hosts; got '{}://'",
            parsed.scheme()
        )));
    }

    Ok(())
}

/// Flatten a JSON parameter map into query pairs, stringifying scalars.
pub(crate) fn query_pairs(params: &JsonMap<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}
