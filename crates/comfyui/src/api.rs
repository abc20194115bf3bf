//! Thin REST client for the handful of ComfyUI endpoints a txt2img run needs.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Reply of `POST /prompt`.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Key for `GET /history/{prompt_id}`.
    pub prompt_id: String,
    /// Queue position at submission time.
    #[serde(default)]
    pub number: i64,
}

/// Failure talking to the ComfyUI REST API.
#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    /// Transport failure: connect, DNS, timeout, or an undecodable body.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ComfyUI answered with a non-2xx status.
    #[error("ComfyUI API error ({status}): {body}")]
    ApiError {
        /// HTTP status code of the reply.
        status: u16,
        /// Raw reply body, usually ComfyUI's JSON error report.
        body: String,
    },
}

/// HTTP client bound to one ComfyUI base URL.
pub struct ComfyUIApi {
    client: reqwest::Client,
    /// No trailing slash.
    base_url: String,
}

impl ComfyUIApi {
    /// `base_url` like `http://127.0.0.1:8188`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `POST /prompt`
    pub async fn submit_workflow(
        &self,
        workflow: &Value,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let body = json!({ "prompt": workflow, "client_id": client_id });
        self.fetch_json(self.request(Method::POST, "prompt").json(&body))
            .await
    }

    /// `GET /history/{prompt_id}`; `{}` while the prompt is still queued or running.
    pub async fn get_history(&self, prompt_id: &str) -> Result<Value, ComfyUIApiError> {
        self.fetch_json(self.request(Method::GET, &format!("history/{prompt_id}")))
            .await
    }

    /// `GET /view` for one output file.
    pub async fn view_image(
        &self,
        filename: &str,
        subfolder: &str,
        folder_type: &str,
    ) -> Result<Vec<u8>, ComfyUIApiError> {
        let query = [
            ("filename", filename),
            ("subfolder", subfolder),
            ("type", folder_type),
        ];
        let response = self
            .send(self.request(Method::GET, "view").query(&query))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST /interrupt`: stop the prompt currently executing.
    pub async fn interrupt(&self) -> Result<(), ComfyUIApiError> {
        self.send(self.request(Method::POST, "interrupt")).await?;
        Ok(())
    }

    /// `POST /free`: drop cached intermediates, keep models loaded.
    pub async fn free_memory(&self) -> Result<(), ComfyUIApiError> {
        let body = json!({ "unload_models": false, "free_memory": true });
        self.send(self.request(Method::POST, "free").json(&body))
            .await?;
        Ok(())
    }

    /// `GET /system_stats`
    pub async fn system_stats(&self) -> Result<Value, ComfyUIApiError> {
        self.fetch_json(self.request(Method::GET, "system_stats"))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{path}", self.base_url))
    }

    /// Send and turn any non-2xx reply into [`ComfyUIApiError::ApiError`].
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ComfyUIApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ComfyUIApiError::ApiError {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ComfyUIApiError> {
        Ok(self.send(builder).await?.json::<T>().await?)
    }
}
