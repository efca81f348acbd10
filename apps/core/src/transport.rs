use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::contract::{CoreRequest, CoreResponse};
use crate::core_service::{CoreService, ServiceError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
    UnknownRequest,
    ItemNotFound,
    Launch,
    Store,
    Config,
    Provider,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CoreResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl TransportResponse {
    pub fn ok(data: CoreResponse) -> Self {
        Self {
            id: None,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            id: None,
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn with_id(mut self, id: Option<Value>) -> Self {
        self.id = id;
        self
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|error| error.code)
    }
}

pub async fn handle_request(service: &CoreService, request: CoreRequest) -> TransportResponse {
    match service.handle_command(request).await {
        Ok(response) => TransportResponse::ok(response),
        Err(error) => {
            log::warn!("request failed: {error}");
            map_service_error(error)
        }
    }
}

/// Never panics; every failure becomes a `success: false` response. An `id`
/// field on the request is echoed back so replies can be matched when they
/// arrive out of order.
pub async fn handle_json(service: &CoreService, payload: &str) -> String {
    let response = match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            let id = value.get("id").cloned();
            let response = match decode_request(value) {
                Ok(request) => handle_request(service, request).await,
                Err(response) => response,
            };
            response.with_id(id)
        }
        Err(error) => TransportResponse::err(ErrorCode::InvalidJson, error.to_string()),
    };

    serde_json::to_string(&response).unwrap_or_else(|error| {
        format!(
            r#"{{"success":false,"error":{{"code":"invalid_request","message":"{}"}}}}"#,
            error.to_string().replace('"', "'")
        )
    })
}

/// Answers one request per line. Each request runs on its own task, so a
/// slow sync never holds up a search; replies are written as they complete.
/// Returns the writer once the input is exhausted and every reply is flushed.
pub async fn serve_lines<R, W>(
    service: Arc<CoreService>,
    reader: R,
    mut writer: W,
) -> std::io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (replies, mut outbox) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(async move {
        while let Some(reply) = outbox.recv().await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<W, std::io::Error>(writer)
    });

    let mut in_flight = JoinSet::new();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let service = Arc::clone(&service);
        let replies = replies.clone();
        in_flight.spawn(async move {
            let reply = handle_json(&service, &line).await;
            if replies.send(reply).is_err() {
                log::warn!("reply dropped; output writer has stopped");
            }
        });
        while let Some(finished) = in_flight.try_join_next() {
            log_task_failure(finished);
        }
    }

    while let Some(finished) = in_flight.join_next().await {
        log_task_failure(finished);
    }
    drop(replies);
    writer_task.await.map_err(std::io::Error::other)?
}

fn log_task_failure(finished: Result<(), tokio::task::JoinError>) {
    if let Err(error) = finished {
        log::error!("request task failed: {error}");
    }
}

fn decode_request(value: Value) -> Result<CoreRequest, TransportResponse> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| TransportResponse::err(ErrorCode::InvalidRequest, "missing request type"))?;
    if !CoreRequest::is_known_type(kind) {
        log::warn!("unknown request type: {kind}");
        return Err(TransportResponse::err(
            ErrorCode::UnknownRequest,
            format!("unknown request: {kind}"),
        ));
    }

    serde_json::from_value(value)
        .map_err(|error| TransportResponse::err(ErrorCode::InvalidRequest, error.to_string()))
}

fn map_service_error(error: ServiceError) -> TransportResponse {
    let code = match &error {
        ServiceError::InvalidRequest(_) => ErrorCode::InvalidRequest,
        ServiceError::ItemNotFound(_) => ErrorCode::ItemNotFound,
        ServiceError::Launch(_) => ErrorCode::Launch,
        ServiceError::Store(_) => ErrorCode::Store,
        ServiceError::Config(_) => ErrorCode::Config,
        ServiceError::Provider(_) => ErrorCode::Provider,
        ServiceError::Command(_) => ErrorCode::Command,
    };
    TransportResponse::err(code, error.to_string())
}
