//! reqwest-based chat backend

use super::error_body::{GENERIC_SEND_FAILURE, extract_error_message};
use crate::config::FileBackendConfig;
use async_trait::async_trait;
use chatstream_application::ports::chat_backend::{BackendError, ByteStream, ChatBackend};
use chatstream_domain::{ChatRecord, ChatRequest, ChatSummary, ModelCatalog};
use futures::StreamExt;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Chat backend speaking the service's JSON/HTTP API.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    base_url: Url,
}

impl HttpChatBackend {
    /// `read_timeout` bounds each wait for more response data, never the
    /// whole exchange, so a long reply survives while tokens keep coming.
    pub fn new(
        base_url: &str,
        read_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| {
            BackendError::Connection(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Connection(format!(
                "Invalid base URL '{}'",
                base_url
            )));
        }

        let client = Client::builder()
            .read_timeout(read_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        info!("Chat backend at {}", base_url);
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &FileBackendConfig) -> Result<Self, BackendError> {
        Self::new(
            &config.base_url,
            config.read_timeout(),
            config.connect_timeout(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base_url}/api/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Value, BackendError> {
        let url = self.endpoint(segments);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response, None).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Connection(e.to_string())
    }
}

/// Pass 2xx responses through; turn anything else into
/// [`BackendError::Status`] with the reason from the body.
async fn ensure_success(
    response: Response,
    fallback: Option<&str>,
) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| match fallback {
        Some(generic) => generic.to_string(),
        None => format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        ),
    });
    debug!("Backend returned {}: {}", status, message);

    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

fn parse_chat_list(body: Value) -> Result<Vec<ChatSummary>, BackendError> {
    let list = match body {
        Value::Object(mut map) => map.remove("chats").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

fn parse_created_chat_id(body: &Value) -> Result<String, BackendError> {
    body.get("chat_id")
        .or_else(|| body.get("id"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| BackendError::InvalidResponse(format!("no chat id in {}", body)))
}

fn parse_default_model(body: &Value) -> Option<String> {
    body.get("default_model")
        .or_else(|| body.get("model"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, BackendError> {
        let url = self.endpoint(&["chat"]);
        debug!("POST {} (model {})", url, request.model);

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response, Some(GENERIC_SEND_FAILURE)).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(map_reqwest_error))
            .boxed())
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, BackendError> {
        parse_chat_list(self.get_json(&["chats"]).await?)
    }

    async fn create_chat(&self) -> Result<String, BackendError> {
        let url = self.endpoint(&["chats"]);
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = ensure_success(response, None)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        parse_created_chat_id(&body)
    }

    async fn load_chat(&self, chat_id: &str) -> Result<ChatRecord, BackendError> {
        let body = self.get_json(&["chats", chat_id]).await?;
        serde_json::from_value(body).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["chats", chat_id]);
        debug!("DELETE {}", url);
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response, None).await?;
        Ok(())
    }

    async fn list_models(&self) -> Result<ModelCatalog, BackendError> {
        let body = self.get_json(&["models"]).await?;
        Ok(ModelCatalog::from_json(&body))
    }

    async fn default_model(&self) -> Result<Option<String>, BackendError> {
        let body = self.get_json(&["default-model"]).await?;
        Ok(parse_default_model(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatstream_domain::{ChatMessage, Role};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Request line and body as seen by the test server.
    struct Captured {
        request_line: String,
        body: String,
    }

    async fn serve_once(
        status_line: &'static str,
        body_parts: Vec<&'static str>,
    ) -> (String, oneshot::Receiver<Captured>) {
        serve_paced(status_line, body_parts, Duration::ZERO).await
    }

    /// Serve exactly one connection: capture the request, then write
    /// `status_line`, headers and each of `body_parts` in its own write,
    /// sleeping `gap` before every part.
    async fn serve_paced(
        status_line: &'static str,
        body_parts: Vec<&'static str>,
        gap: Duration,
    ) -> (String, oneshot::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            let header_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while raw.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
            }

            let _ = tx.send(Captured {
                request_line: head.lines().next().unwrap_or_default().to_string(),
                body: String::from_utf8_lossy(&raw[header_end..]).to_string(),
            });

            let header = format!(
                "{}\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
                status_line
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            for part in body_parts {
                if !gap.is_zero() {
                    tokio::time::sleep(gap).await;
                }
                socket.write_all(part.as_bytes()).await.unwrap();
                socket.flush().await.unwrap();
                tokio::task::yield_now().await;
            }
            let _ = socket.shutdown().await;
        });

        (base, rx)
    }

    fn backend(base: &str) -> HttpChatBackend {
        HttpChatBackend::new(base, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_joins_and_encodes_segments() {
        let local = backend("http://localhost:8000/");
        assert_eq!(
            local.endpoint(&["chat"]).as_str(),
            "http://localhost:8000/api/chat"
        );

        let prefixed = backend("http://host/prefix");
        assert_eq!(
            prefixed.endpoint(&["chats", "a b/c"]).as_str(),
            "http://host/prefix/api/chats/a%20b%2Fc"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpChatBackend::new("not a url", Duration::from_secs(1), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, BackendError::Connection(_)));
        assert!(
            HttpChatBackend::new("mailto:x@y", Duration::from_secs(1), Duration::from_secs(1))
                .is_err()
        );
    }

    #[test]
    fn chat_list_accepts_wrapped_and_bare_shapes() {
        let wrapped = serde_json::json!({"chats": [{"id": "a", "title": "T"}]});
        assert_eq!(parse_chat_list(wrapped).unwrap()[0].id, "a");

        let bare = serde_json::json!([{"id": "b"}]);
        assert_eq!(parse_chat_list(bare).unwrap()[0].display_title(), "New Chat");

        assert!(parse_chat_list(serde_json::json!({})).unwrap().is_empty());
    }

    #[test]
    fn default_model_field_names() {
        assert_eq!(
            parse_default_model(&serde_json::json!({"default_model": "llama2"})).as_deref(),
            Some("llama2")
        );
        assert_eq!(
            parse_default_model(&serde_json::json!({"model": "phi3"})).as_deref(),
            Some("phi3")
        );
        assert_eq!(parse_default_model(&serde_json::json!({"default_model": ""})), None);
    }

    #[tokio::test]
    async fn chat_stream_posts_request_and_yields_body() {
        let (base, captured) = serve_once(
            "HTTP/1.1 200 OK",
            vec!["data: {\"message\":\"Hel", "lo\"}\n", "data: {\"done\":true}\n"],
        )
        .await;

        let request = ChatRequest::streaming(
            "llama2",
            vec![ChatMessage::user("hi")],
            Some("c1".to_string()),
        );
        let mut stream = backend(&base).open_chat_stream(&request).await.unwrap();

        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend(chunk.unwrap());
        }
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "data: {\"message\":\"Hello\"}\ndata: {\"done\":true}\n"
        );

        let captured = captured.await.unwrap();
        assert!(captured.request_line.starts_with("POST /api/chat "));
        let sent: ChatRequest = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent.model, "llama2");
        assert!(sent.stream);
        assert_eq!(sent.chat_id(), Some("c1"));
        assert_eq!(sent.messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn slow_stream_outlives_read_timeout() {
        let mut parts = vec!["data: {\"message\":\"x\"}\n"; 8];
        parts.push("data: {\"done\":true}\n");
        let (base, _captured) =
            serve_paced("HTTP/1.1 200 OK", parts, Duration::from_millis(250)).await;

        // Two seconds of streaming in total, never more than 250ms of silence
        let backend =
            HttpChatBackend::new(&base, Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        let request = ChatRequest::streaming("llama2", vec![ChatMessage::user("hi")], None);
        let mut stream = backend.open_chat_stream(&request).await.unwrap();

        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend(chunk.unwrap());
        }
        let body = String::from_utf8(body).unwrap();
        assert_eq!(body.matches(r#"{"message":"x"}"#).count(), 8);
        assert!(body.ends_with("data: {\"done\":true}\n"));
    }

    #[tokio::test]
    async fn stalled_stream_times_out() {
        let (base, _captured) = serve_paced(
            "HTTP/1.1 200 OK",
            vec!["data: {\"message\":\"a\"}\n", "data: {\"done\":true}\n"],
            Duration::from_millis(600),
        )
        .await;

        let backend = HttpChatBackend::new(
            &base,
            Duration::from_millis(200),
            Duration::from_secs(1),
        )
        .unwrap();
        let request = ChatRequest::streaming("llama2", vec![ChatMessage::user("hi")], None);
        let result = match backend.open_chat_stream(&request).await {
            Ok(mut stream) => loop {
                match stream.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Err(e),
                    None => break Ok(()),
                }
            },
            Err(e) => Err(e),
        };
        assert_eq!(result, Err(BackendError::Timeout));
    }

    #[tokio::test]
    async fn chat_error_status_uses_body_reason() {
        let (base, _captured) = serve_once(
            "HTTP/1.1 500 Internal Server Error",
            vec![r#"{"error":{"message":"model 'x' not found"}}"#],
        )
        .await;

        let request = ChatRequest::streaming("x", vec![ChatMessage::user("hi")], None);
        let err = backend(&base)
            .open_chat_stream(&request)
            .await
            .err()
            .unwrap();
        assert_eq!(
            err,
            BackendError::Status {
                status: 500,
                message: "model 'x' not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn chat_error_without_reason_is_generic() {
        let (base, _captured) = serve_once("HTTP/1.1 502 Bad Gateway", vec!["upstream down"]).await;

        let request = ChatRequest::streaming("x", vec![ChatMessage::user("hi")], None);
        let err = backend(&base)
            .open_chat_stream(&request)
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), GENERIC_SEND_FAILURE);
    }

    #[tokio::test]
    async fn load_missing_chat_is_not_found() {
        let (base, captured) =
            serve_once("HTTP/1.1 404 Not Found", vec![r#"{"error":"Chat not found"}"#]).await;

        let err = backend(&base).load_chat("gone").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Chat not found");
        assert!(
            captured
                .await
                .unwrap()
                .request_line
                .starts_with("GET /api/chats/gone ")
        );
    }

    #[tokio::test]
    async fn list_models_parses_nested_catalog() {
        let (base, _captured) = serve_once(
            "HTTP/1.1 200 OK",
            vec![r#"{"models":{"models":[{"name":"llama2"},{"name":"mistral"}],"default_model":"mistral"}}"#],
        )
        .await;

        let catalog = backend(&base).list_models().await.unwrap();
        assert_eq!(catalog.models, vec!["llama2", "mistral"]);
        assert_eq!(catalog.default_model.as_deref(), Some("mistral"));
    }

    #[tokio::test]
    async fn create_chat_posts_and_returns_id() {
        let (base, captured) = serve_once(
            "HTTP/1.1 200 OK",
            vec![r#"{"chat_id":"5f0c0e1a-7d2b-4c1e-9a55-0b8f2d7e6c11"}"#],
        )
        .await;

        let chat_id = backend(&base).create_chat().await.unwrap();
        assert_eq!(chat_id, "5f0c0e1a-7d2b-4c1e-9a55-0b8f2d7e6c11");
        let captured = captured.await.unwrap();
        assert!(captured.request_line.starts_with("POST /api/chats "));
        assert_eq!(captured.body, "{}");
    }

    #[test]
    fn created_chat_id_must_be_present() {
        assert_eq!(
            parse_created_chat_id(&serde_json::json!({"id": "c1"})).unwrap(),
            "c1"
        );
        assert!(matches!(
            parse_created_chat_id(&serde_json::json!({"status": "ok"})),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn delete_chat_uses_delete_method() {
        let (base, captured) =
            serve_once("HTTP/1.1 200 OK", vec![r#"{"message":"Chat deleted"}"#]).await;

        backend(&base).delete_chat("c9").await.unwrap();
        assert!(
            captured
                .await
                .unwrap()
                .request_line
                .starts_with("DELETE /api/chats/c9 ")
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = backend(&base).list_chats().await.unwrap_err();
        assert!(matches!(err, BackendError::Connection(_)));
    }
}
