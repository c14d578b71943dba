//! OpenAI Responses API client.

use std::time::Duration;

use async_trait::async_trait;
use chalk_core::config::OpenAiConfig;
use chalk_core::SecretString;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{CompletionError, CompletionRequest, CompletionService, RequestMessage, RetrievalTool};

pub struct OpenAiResponsesClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a [RequestMessage],
    tools: &'a [RetrievalTool],
}

#[derive(Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesBody {
    /// The answer text: `output_text` when the server provides it, otherwise
    /// every `output_text` part of every `message` item, concatenated.
    fn answer_text(self) -> String {
        if let Some(text) = self.output_text {
            return text;
        }
        self.output
            .into_iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text)
            .collect()
    }
}

impl OpenAiResponsesClient {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Config(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/responses", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
        })
    }

    pub fn from_config(config: &OpenAiConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| CompletionError::Config("API key is not set".to_string()))?;
        Self::new(
            &config.base_url,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for OpenAiResponsesClient {
    fn name(&self) -> &str {
        "openai-responses"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let payload = ResponsesRequest {
            model: &self.model,
            input: &request.messages,
            tools: &request.tools,
        };

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Network(format!("request timed out: {}", e))
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Completion request failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CompletionError::Authentication(body)
                }
                StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited,
                _ => CompletionError::Service {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body: ResponsesBody = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;
        Ok(body.answer_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiResponsesClient {
        OpenAiResponsesClient::new(
            &server.uri(),
            SecretString::new("sk-test"),
            "gpt-5.1",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                RequestMessage {
                    role: Role::System,
                    content: "Sos un experto".into(),
                },
                RequestMessage {
                    role: Role::User,
                    content: "¿Cuál es la categoría mínima según el CCT?".into(),
                },
            ],
            tools: vec![RetrievalTool::file_search("vs_123")],
        }
    }

    #[tokio::test]
    async fn test_sends_model_input_and_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-5.1",
                "input": [
                    {"role": "system", "content": "Sos un experto"},
                    {"role": "user", "content": "¿Cuál es la categoría mínima según el CCT?"}
                ],
                "tools": [{"type": "file_search", "vector_store_ids": ["vs_123"]}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"output_text": "Según el artículo 5..."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server).complete(&request()).await.unwrap();
        assert_eq!(answer, "Según el artículo 5...");
    }

    #[tokio::test]
    async fn test_collects_output_text_parts() {
        let server = MockServer::start().await;
        let body = json!({
            "id": "resp_1",
            "output": [
                {"type": "file_search_call", "id": "fs_1", "status": "completed"},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "Según el artículo 5, ", "annotations": []},
                    {"type": "output_text", "text": "la categoría mínima es Operario C."}
                ]}
            ]
        });
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let answer = client_for(&server).complete(&request()).await.unwrap();
        assert_eq!(answer, "Según el artículo 5, la categoría mínima es Operario C.");
    }

    #[tokio::test]
    async fn test_no_text_yields_empty_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": []})))
            .mount(&server)
            .await;

        let answer = client_for(&server).complete(&request()).await.unwrap();
        assert!(answer.is_empty());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (401, "auth"),
            (403, "auth"),
            (429, "rate"),
            (500, "service"),
        ];
        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/responses"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .mount(&server)
                .await;

            let err = client_for(&server).complete(&request()).await.unwrap_err();
            match (expected, err) {
                ("auth", CompletionError::Authentication(body)) => assert_eq!(body, "nope"),
                ("rate", CompletionError::RateLimited) => {}
                ("service", CompletionError::Service { status: s, .. }) => assert_eq!(s, 500),
                (exp, other) => panic!("status {} expected {}, got {:?}", status, exp, other),
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Grab a free port, then close it so nothing is listening there.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = OpenAiResponsesClient::new(
            &uri,
            SecretString::new("sk-test"),
            "gpt-5.1",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Network(_)));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = OpenAiConfig::default();
        assert!(matches!(
            OpenAiResponsesClient::from_config(&config),
            Err(CompletionError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_builds_endpoint() {
        let mut config = OpenAiConfig::default();
        config.base_url = "http://localhost:9999/v1/".into();
        config.api_key = Some(SecretString::new("sk"));
        let client = OpenAiResponsesClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9999/v1/responses");
        assert_eq!(client.model(), "gpt-5.1");
    }
}
