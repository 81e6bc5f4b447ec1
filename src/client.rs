//! HTTP client for the receptor API.
//!
//! Error bodies are decoded back into [`ApiError`], so callers can branch on
//! [`ErrorKind`] exactly as the server classified the failure.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::types::{CreateTaskRequest, ListTasksQuery, TaskResponse};
use crate::error::{classify_http_status, ApiError, ErrorKind};
use crate::task::{validate_task_guid, TaskState};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an API error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never got a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered 2xx with a body we could not read.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// API error kind, if the server produced one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api(err) => Some(err.kind),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ReceptorClient {
    base_url: String,
    client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl ReceptorClient {
    /// Empty username and password means no `Authorization` header is sent.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            base_url = format!("http://{}", base_url);
        }

        let username = username.into();
        let password = password.into();
        let credentials = if username.is_empty() && password.is_empty() {
            None
        } else {
            Some((username, password))
        };

        Self {
            base_url,
            client: reqwest::Client::new(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<(), ClientError> {
        let url = format!("{}/tasks", self.base_url);
        let resp = self.authorize(self.client.post(&url)).json(request).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn tasks(&self) -> Result<Vec<TaskResponse>, ClientError> {
        self.list(&ListTasksQuery::default()).await
    }

    pub async fn tasks_by_domain(&self, domain: &str) -> Result<Vec<TaskResponse>, ClientError> {
        self.list(&ListTasksQuery {
            domain: Some(domain.to_string()),
            state: None,
        })
        .await
    }

    pub async fn pending_tasks(&self) -> Result<Vec<TaskResponse>, ClientError> {
        self.list(&ListTasksQuery {
            domain: None,
            state: Some(TaskState::Pending),
        })
        .await
    }

    pub async fn list(&self, query: &ListTasksQuery) -> Result<Vec<TaskResponse>, ClientError> {
        let url = format!("{}/tasks", self.base_url);
        let resp = self.authorize(self.client.get(&url)).query(query).send().await?;
        decode(check_status(resp).await?).await
    }

    pub async fn get_task(&self, task_guid: &str) -> Result<TaskResponse, ClientError> {
        validate_task_guid(task_guid).map_err(ApiError::from)?;
        let url = format!("{}/tasks/{}", self.base_url, task_guid);
        let resp = self.authorize(self.client.get(&url)).send().await?;
        decode(check_status(resp).await?).await
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((username, password)) => builder.basic_auth(username, Some(password)),
            None => builder,
        }
    }
}

/// Pass 2xx responses through; turn anything else into an [`ApiError`].
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let err = serde_json::from_str::<ApiError>(&text).unwrap_or_else(|_| {
        ApiError::new(
            classify_http_status(status.as_u16()),
            format!("HTTP {}: {}", status, text),
        )
    });
    Err(ClientError::Api(err))
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
}
