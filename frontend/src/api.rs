//! Client for the backend REST API.
//!
//! Every call goes through [`ApiClient::request`], which joins the base URL
//! with the endpoint, applies default JSON headers and folds the response
//! into one contract: `Ok(Some(value))` for a JSON success, `Ok(None)` for
//! 204 No Content, and `Err` for non-2xx statuses and network failures. The
//! HTTP-free parts of that contract ([`interpret`], [`error_message`],
//! [`merge_headers`]) are plain functions so they can be tested natively.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared::{CreateTaskRequest, MonthlyAnalytics, Task, TaskStatus, UpdateTaskRequest};
use thiserror::Error;
use uuid::Uuid;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, Request, RequestInit, RequestMode, Response};

pub const DEFAULT_BASE_URL: &str = "/api";

const NO_CONTENT: u16 = 204;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered outside 2xx. `message` comes from the body's
    /// `message`/`error` field when there is one.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    /// Added to (and overriding) the default headers.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn json<B: Serialize>(method: Method, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Self {
            method,
            headers: Vec::new(),
            body: Some(body),
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    base_url: String,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(option_env!("API_BASE_URL").unwrap_or(DEFAULT_BASE_URL))
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    /// Base URL and endpoint joined by exactly one `/`.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let result = self.fetch(endpoint, options).await;
        if let Err(err) = &result {
            console::error_1(&format!("Fetch API Error: {err}").into());
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let init = RequestInit::new();
        init.set_method(options.method.as_str());
        init.set_mode(RequestMode::Cors);
        if let Some(body) = &options.body {
            init.set_body(&JsValue::from_str(body));
        }

        let request =
            Request::new_with_str_and_init(&self.url(endpoint), &init).map_err(network)?;
        for (name, value) in merge_headers(&options.headers) {
            request.headers().set(&name, &value).map_err(network)?;
        }

        let window =
            web_sys::window().ok_or_else(|| ApiError::Network("no window".to_string()))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network)?
            .dyn_into()
            .map_err(network)?;

        let status = response.status();
        let body = if status == NO_CONTENT {
            String::new()
        } else {
            JsFuture::from(response.text().map_err(network)?)
                .await
                .map_err(network)?
                .as_string()
                .unwrap_or_default()
        };
        interpret(status, &response.status_text(), &body)
    }

    pub async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, ApiError> {
        let endpoint = match status {
            Some(status) => format!("/exercises/tasks?status={status}"),
            None => "/exercises/tasks".to_string(),
        };
        Ok(self
            .request(&endpoint, RequestOptions::default())
            .await?
            .unwrap_or_default())
    }

    pub async fn create_task(&self, input: &CreateTaskRequest) -> Result<Task, ApiError> {
        let options = RequestOptions::json(Method::Post, input)?;
        required(self.request("/exercises/tasks", options).await?)
    }

    pub async fn update_task(
        &self,
        id: Uuid,
        input: &UpdateTaskRequest,
    ) -> Result<Task, ApiError> {
        let options = RequestOptions::json(Method::Put, input)?;
        required(self.request(&format!("/exercises/tasks/{id}"), options).await?)
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<(), ApiError> {
        self.request::<Value>(
            &format!("/exercises/tasks/{id}"),
            RequestOptions::method(Method::Delete),
        )
        .await
        .map(|_| ())
    }

    pub async fn monthly_analytics(&self) -> Result<Vec<MonthlyAnalytics>, ApiError> {
        Ok(self
            .request("/analytics/monthly", RequestOptions::default())
            .await?
            .unwrap_or_default())
    }
}

fn required<T>(value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Decode("expected a response body".to_string()))
}

fn network(value: JsValue) -> ApiError {
    ApiError::Network(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// Default JSON headers with `overrides` applied; names compare
/// case-insensitively.
pub fn merge_headers(overrides: &[(String, String)]) -> Vec<(String, String)> {
    let mut headers = vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ];
    for (name, value) in overrides {
        match headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value.clone(),
            None => headers.push((name.clone(), value.clone())),
        }
    }
    headers
}

/// Folds a finished HTTP exchange into the client contract.
pub fn interpret<T: DeserializeOwned>(
    status: u16,
    status_text: &str,
    body: &str,
) -> Result<Option<T>, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Http {
            status,
            message: error_message(status, status_text, body),
        });
    }
    if status == NO_CONTENT {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// `message`, else `error`, from a JSON error body; a generic status line
/// otherwise.
pub fn error_message(status: u16, status_text: &str, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].into_iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| format!("API Error: {status} {status_text}"))
}
