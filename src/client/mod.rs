//! HTTP access to the Claims AI backend
//!
//! Two endpoints, both treated as external collaborators: `POST /chat`
//! (chunked stream of `data:` frames) and `POST /upload-claims` (multipart
//! bulk import). Transport failures never escape as panics; the chat path
//! substitutes a fixed notice into the transcript and returns the error.

use std::time::Duration;

use futures::StreamExt;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::conversation::Conversation;
use crate::stream::Assembler;

/// Transcript text substituted when a chat stream cannot complete.
pub const CHAT_FAILURE_NOTICE: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Conversation has no session id")]
    SessionNotStarted,

    #[error("Message is empty")]
    EmptyMessage,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    conversation_id: String,
}

/// Confirmation body from `POST /upload-claims`.
#[derive(Debug, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_records: Option<u64>,
}

pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send one user message and stream the reply into the transcript.
    ///
    /// The user entry and an empty assistant placeholder are appended before
    /// the request goes out, so observers have something to render
    /// immediately. Every decoded frame then replaces the placeholder text
    /// with the full snapshot so far; `on_update` runs after each
    /// replacement. On any transport failure the placeholder text becomes
    /// [`CHAT_FAILURE_NOTICE`] and the error is returned.
    ///
    /// One stream per conversation: the `&mut Conversation` borrow makes a
    /// second in-flight send on the same transcript inexpressible.
    pub async fn send_message(
        &self,
        conversation: &mut Conversation,
        message: &str,
        mut on_update: impl FnMut(&str),
    ) -> Result<String, ClientError> {
        if !conversation.is_started() {
            return Err(ClientError::SessionNotStarted);
        }
        let message = message.trim();
        if message.is_empty() {
            // backend enforces min_length=1; reject before any side effect
            return Err(ClientError::EmptyMessage);
        }

        conversation.push_user(message);
        conversation.begin_assistant();

        match self.stream_reply(conversation, message, &mut on_update).await {
            Ok(full_text) => {
                tracing::debug!(chars = full_text.len(), "assistant reply complete");
                Ok(full_text)
            }
            Err(err) => {
                tracing::warn!(%err, "chat stream failed");
                conversation.replace_last_text(CHAT_FAILURE_NOTICE);
                Err(err)
            }
        }
    }

    async fn stream_reply(
        &self,
        conversation: &mut Conversation,
        message: &str,
        on_update: &mut impl FnMut(&str),
    ) -> Result<String, ClientError> {
        let body = ChatRequest {
            message,
            conversation_id: conversation.id.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }

        let mut assembler = Assembler::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            assembler.push(&chunk, |snapshot| {
                conversation.replace_last_text(snapshot);
                on_update(snapshot);
            });
            if assembler.is_done() {
                break;
            }
        }

        Ok(assembler.full_text().to_string())
    }

    /// Send staged files as one multipart request, one `files` part per
    /// file with its name preserved.
    pub async fn upload_claims(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<UploadReceipt, ClientError> {
        let mut form = multipart::Form::new();
        for (name, bytes) in files {
            let part = multipart::Part::bytes(bytes)
                .file_name(name)
                .mime_str("text/csv")?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(format!("{}/upload-claims", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }

        let receipt: UploadReceipt = response.json().await?;
        tracing::debug!(success = receipt.success, "upload receipt received");
        if let Some(total) = receipt.total_records {
            tracing::info!(total_records = total, "claims import confirmed");
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::http::{header, StatusCode};
    use axum::response::Response;
    use axum::routing::post;
    use axum::Router;

    use crate::conversation::Sender;

    /// Bind the mock backend on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: &str) -> ChatClient {
        ChatClient::new(&Config {
            api_url: base_url.to_string(),
            timeout_secs: 5,
        })
    }

    async fn chat_stream_handler(axum::Json(body): axum::Json<serde_json::Value>) -> Response {
        // the client must always send the session id
        assert!(body["conversation_id"].as_str().is_some_and(|s| !s.is_empty()));
        assert_eq!(body["message"].as_str(), Some("how many claims are open?"));

        // one frame deliberately split across two transport chunks
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"chunk\": \"Claims in \"}\ndata: {\"chu")),
            Ok(Bytes::from_static(b"nk\": \"review: 12\"}\n")),
            Ok(Bytes::from_static(b"data: {\"done\": true}\n")),
        ];

        Response::builder()
            .header(header::CONTENT_TYPE, "text/event-stream")
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_message_assembles_stream() {
        let base = serve(Router::new().route("/chat", post(chat_stream_handler))).await;
        let client = client_for(&base);
        let mut conv = Conversation::new();

        let mut snapshots = Vec::new();
        let reply = client
            .send_message(&mut conv, "how many claims are open?", |s| {
                snapshots.push(s.to_string())
            })
            .await
            .unwrap();

        assert_eq!(reply, "Claims in review: 12");
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].sender, Sender::User);
        assert_eq!(conv.last_text(), Some("Claims in review: 12"));
        // every snapshot is a prefix of the final text
        assert!(snapshots
            .iter()
            .all(|s| "Claims in review: 12".starts_with(s.as_str())));
        assert_eq!(snapshots.last().map(String::as_str), Some("Claims in review: 12"));
    }

    #[tokio::test]
    async fn test_transport_failure_substitutes_notice() {
        let base = serve(Router::new().route(
            "/chat",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let client = client_for(&base);
        let mut conv = Conversation::new();

        let err = client
            .send_message(&mut conv, "hello", |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Api { status: 500, .. }));
        // user entry + placeholder remain, placeholder carries the notice
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.last_text(), Some(CHAT_FAILURE_NOTICE));
    }

    #[tokio::test]
    async fn test_send_rejected_without_session() {
        // port 9 (discard) is never contacted: the guard fires first
        let client = client_for("http://127.0.0.1:9");
        let mut conv = Conversation {
            id: uuid::Uuid::nil(),
            messages: Vec::new(),
        };

        let err = client.send_message(&mut conv, "hello", |_| {}).await.unwrap_err();

        assert!(matches!(err, ClientError::SessionNotStarted));
        assert!(conv.messages.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let client = client_for("http://127.0.0.1:9");
        let mut conv = Conversation::new();

        let err = client.send_message(&mut conv, "   ", |_| {}).await.unwrap_err();

        assert!(matches!(err, ClientError::EmptyMessage));
        assert!(conv.messages.is_empty());
    }

    #[tokio::test]
    async fn test_upload_claims_parses_receipt() {
        async fn upload_handler(mut multipart: axum::extract::Multipart) -> axum::Json<serde_json::Value> {
            let mut names = Vec::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                assert_eq!(field.name(), Some("files"));
                names.push(field.file_name().unwrap_or_default().to_string());
                let _ = field.bytes().await.unwrap();
            }
            axum::Json(serde_json::json!({
                "success": true,
                "message": format!("Successfully imported 3 records from {} files.", names.len()),
                "files_processed": [],
                "total_records": 3
            }))
        }

        let base = serve(Router::new().route("/upload-claims", post(upload_handler))).await;
        let client = client_for(&base);

        let receipt = client
            .upload_claims(vec![
                ("q1.csv".to_string(), b"claim_id\nCLM-001\n".to_vec()),
                ("q2.csv".to_string(), b"claim_id\nCLM-002\n".to_vec()),
            ])
            .await
            .unwrap();

        assert!(receipt.success);
        assert_eq!(
            receipt.message.as_deref(),
            Some("Successfully imported 3 records from 2 files.")
        );
        assert_eq!(receipt.total_records, Some(3));
    }
}
