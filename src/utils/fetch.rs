//! Browser HTTP client for a pubky gateway.
//!
//! Listings are `GET <base>/<dir>?limit=..&cursor=..&shallow=..`, answered
//! with one URI per line. File content is `GET <base>/<path>`.

use js_sys::{Array, Promise, Uint8Array};
use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::config::{FETCH_TIMEOUT_MS, URI_SCHEME};
use crate::core::client::{Content, ContentClient, ListRequest, ListingClient};
use crate::core::error::ClientError;

// =============================================================================
// Promise Racing Utilities
// =============================================================================

/// Result of a promise race with timeout.
#[derive(Debug)]
pub enum RaceResult {
    /// The promise completed before timeout.
    Completed(JsValue),
    /// Timeout occurred before promise completed.
    TimedOut,
    /// Promise rejected with an error.
    Error(String),
}

/// Race a promise against a timeout using `Promise.race`.
pub async fn race_with_timeout(promise: Promise, timeout_ms: i32) -> RaceResult {
    let Some(window) = web_sys::window() else {
        return RaceResult::Error("Window not available".to_string());
    };

    // resolves to undefined
    let timeout_promise = Promise::new(&mut |resolve, _| {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout_ms);
    });

    let race_array = Array::new();
    race_array.push(&promise);
    race_array.push(&timeout_promise);

    match JsFuture::from(Promise::race(&race_array)).await {
        Ok(result) if result.is_undefined() => RaceResult::TimedOut,
        Ok(result) => RaceResult::Completed(result),
        Err(e) => RaceResult::Error(e.as_string().unwrap_or_else(|| "failed to fetch".to_string())),
    }
}

// =============================================================================
// GatewayClient
// =============================================================================

/// [`ListingClient`] and [`ContentClient`] over the Fetch API.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    base: Url,
}

impl GatewayClient {
    /// Client for the gateway at `base` (e.g. `https://gateway.example/`).
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base).map_err(|e| ClientError::Other(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    fn url_for(&self, uri: &str) -> Result<Url, ClientError> {
        let path = uri.strip_prefix(URI_SCHEME).unwrap_or(uri);
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Other(e.to_string()))
    }

    fn listing_url(&self, request: &ListRequest) -> Result<Url, ClientError> {
        let mut url = self.url_for(&request.directory_uri)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &request.limit.to_string());
            if !request.cursor.is_empty() {
                query.append_pair("cursor", &request.cursor);
            }
            if request.shallow {
                query.append_pair("shallow", "true");
            }
            if request.recursive {
                query.append_pair("recursive", "true");
            }
        }
        Ok(url)
    }
}

impl ListingClient for GatewayClient {
    async fn list(&self, request: ListRequest) -> Result<Vec<String>, ClientError> {
        let url = self.listing_url(&request)?;
        let response = send(url.as_str()).await?;

        let text = JsFuture::from(
            response
                .text()
                .map_err(|_| ClientError::InvalidResponse("body unavailable".to_string()))?,
        )
        .await
        .map_err(|_| ClientError::InvalidResponse("body read failed".to_string()))?;
        let text = text
            .as_string()
            .ok_or_else(|| ClientError::InvalidResponse("body is not text".to_string()))?;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl ContentClient for GatewayClient {
    async fn fetch(&self, uri: &str) -> Result<Content, ClientError> {
        let url = self.url_for(uri)?;
        let response = send(url.as_str()).await?;

        let content_type = response.headers().get("content-type").ok().flatten();
        let buffer = JsFuture::from(
            response
                .array_buffer()
                .map_err(|_| ClientError::InvalidResponse("body unavailable".to_string()))?,
        )
        .await
        .map_err(|_| ClientError::InvalidResponse("body read failed".to_string()))?;

        Ok(Content {
            bytes: Uint8Array::new(&buffer).to_vec(),
            content_type,
        })
    }
}

/// GET `url`, racing the request against [`FETCH_TIMEOUT_MS`].
async fn send(url: &str) -> Result<Response, ClientError> {
    let window = web_sys::window()
        .ok_or_else(|| ClientError::Unreachable("window not available".to_string()))?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|_| ClientError::Other(format!("invalid request URL: {}", url)))?;

    match race_with_timeout(window.fetch_with_request(&request), FETCH_TIMEOUT_MS).await {
        RaceResult::TimedOut => Err(ClientError::Timeout),
        RaceResult::Error(msg) => Err(ClientError::Unreachable(msg)),
        RaceResult::Completed(result) => {
            let response: Response = result
                .dyn_into()
                .map_err(|_| ClientError::InvalidResponse("not a Response".to_string()))?;
            if !response.ok() {
                return Err(ClientError::Status(response.status()));
            }
            Ok(response)
        }
    }
}
