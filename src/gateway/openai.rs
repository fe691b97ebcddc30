//! OpenAI-backed completion gateway.
//!
//! Maps the crate's request/response types onto the OpenAI chat-completions
//! API via `async-openai`. Credentials and model choice are explicit
//! configuration values; nothing here reads the environment.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    FinishReason as OpenAiFinishReason, ResponseFormat as OpenAiResponseFormat, Stop,
};
use async_trait::async_trait;
use tracing::debug;

use crate::conversation::Role;
use crate::error::{GatewayError, Result};
use crate::gateway::traits::{
    ChatMessage, CompletionGateway, CompletionRequest, CompletionResponse, FinishReason,
    ResponseFormat, TokenUsage,
};

/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for [`OpenAiGateway`].
///
/// The API key is handed in explicitly by whoever constructs the gateway.
///
/// # Examples
///
/// ```
/// use chatfold::gateway::GatewayConfig;
///
/// let config = GatewayConfig::new("sk-test").with_model("gpt-4o");
/// assert_eq!(config.model, "gpt-4o");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API key for the provider.
    pub api_key: String,

    /// Model used for requests that carry no override.
    pub model: String,

    /// Alternative API endpoint (proxies, compatible servers).
    pub api_base: Option<String>,
}

impl GatewayConfig {
    /// Creates a configuration with the default model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
        }
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the gateway at an alternative API endpoint.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

/// [`CompletionGateway`] backed by the OpenAI chat-completions API.
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    config: GatewayConfig,
}

impl OpenAiGateway {
    /// Creates a gateway from explicit configuration.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let mut provider_config = OpenAIConfig::new().with_api_key(config.api_key.clone());
        if let Some(api_base) = &config.api_base {
            provider_config = provider_config.with_api_base(api_base.clone());
        }
        Self {
            client: Client::with_config(provider_config),
            config,
        }
    }

    /// Translates a crate request into the provider request shape.
    fn build_request(&self, request: &CompletionRequest) -> Result<CreateChatCompletionRequest> {
        let messages = request
            .messages
            .iter()
            .map(provider_message)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(request.model.as_deref().unwrap_or(&self.config.model))
            .messages(messages);

        if let Some(temperature) = request.temperature {
            builder.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if !request.stop.is_empty() {
            builder.stop(Stop::StringArray(request.stop.clone()));
        }
        if let Some(format) = request.response_format {
            builder.response_format(match format {
                ResponseFormat::Text => OpenAiResponseFormat::Text,
                ResponseFormat::Json => OpenAiResponseFormat::JsonObject,
            });
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let provider_request = self.build_request(&request)?;
        debug!(
            model = %provider_request.model,
            messages = request.messages.len(),
            "dispatching completion request"
        );
        let response = self.client.chat().create(provider_request).await?;
        extract_response(response)
    }
}

/// Maps one chat message to the role-specific provider message type.
fn provider_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let mapped = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.as_str())
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.as_str())
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.as_str())
            .build()?
            .into(),
    };
    Ok(mapped)
}

/// Pulls the first choice out of a provider response.
fn extract_response(response: CreateChatCompletionResponse) -> Result<CompletionResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(GatewayError::EmptyCompletion)?;

    let content = choice
        .message
        .content
        .ok_or(GatewayError::EmptyCompletion)?;

    let finish_reason = choice
        .finish_reason
        .map_or(FinishReason::Other, FinishReason::from);

    let usage = response.usage.map_or_else(TokenUsage::default, |usage| TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    });

    Ok(CompletionResponse {
        content,
        model: response.model,
        finish_reason,
        usage,
    })
}

impl From<OpenAiFinishReason> for FinishReason {
    fn from(reason: OpenAiFinishReason) -> Self {
        match reason {
            OpenAiFinishReason::Stop => Self::Stop,
            OpenAiFinishReason::Length => Self::Length,
            OpenAiFinishReason::ContentFilter => Self::ContentFilter,
            OpenAiFinishReason::ToolCalls | OpenAiFinishReason::FunctionCall => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn gateway() -> OpenAiGateway {
        OpenAiGateway::new(GatewayConfig::new("sk-test"))
    }

    fn response_fixture(value: serde_json::Value) -> CreateChatCompletionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_gateway_config_defaults() {
        let config = GatewayConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_base.is_none());
    }

    #[test]
    fn test_gateway_config_builders() {
        let config = GatewayConfig::new("sk-test")
            .with_model("gpt-4o")
            .with_api_base("http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_build_request_uses_configured_model() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        let provider_request = gateway().build_request(&request).unwrap();
        assert_eq!(provider_request.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_build_request_honors_model_override() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]).with_model("gpt-4o");
        let provider_request = gateway().build_request(&request).unwrap();
        assert_eq!(provider_request.model, "gpt-4o");
    }

    #[test]
    fn test_build_request_maps_all_roles() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("context"),
            ChatMessage::user("question"),
            ChatMessage::assistant("answer"),
        ]);
        let provider_request = gateway().build_request(&request).unwrap();
        assert_eq!(provider_request.messages.len(), 3);
        assert!(matches!(
            provider_request.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            provider_request.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            provider_request.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    #[test]
    fn test_build_request_generation_parameters() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.3)
            .with_max_tokens(150)
            .with_stop(vec!["\n\n".to_string()]);
        let provider_request = gateway().build_request(&request).unwrap();
        assert_eq!(provider_request.temperature, Some(0.3));
        assert_eq!(provider_request.max_completion_tokens, Some(150));
        assert_eq!(
            provider_request.stop,
            Some(Stop::StringArray(vec!["\n\n".to_string()]))
        );
    }

    #[test]
    fn test_build_request_omits_unset_options() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        let provider_request = gateway().build_request(&request).unwrap();
        assert!(provider_request.temperature.is_none());
        assert!(provider_request.max_completion_tokens.is_none());
        assert!(provider_request.stop.is_none());
        assert!(provider_request.response_format.is_none());
    }

    #[test]
    fn test_build_request_response_format() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_response_format(ResponseFormat::Json);
        let provider_request = gateway().build_request(&request).unwrap();
        assert!(matches!(
            provider_request.response_format,
            Some(OpenAiResponseFormat::JsonObject)
        ));
    }

    #[test]
    fn test_extract_response() {
        let response = response_fixture(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Paris."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }));

        let completion = extract_response(response).unwrap();
        assert_eq!(completion.content, "Paris.");
        assert_eq!(completion.model, "gpt-4o-mini");
        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.usage.prompt_tokens, 12);
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[test]
    fn test_extract_response_zero_choices() {
        let response = response_fixture(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": []
        }));

        let err = extract_response(response).unwrap_err();
        assert!(matches!(
            err,
            Error::Gateway(GatewayError::EmptyCompletion)
        ));
    }

    #[test]
    fn test_extract_response_missing_content() {
        let response = response_fixture(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant"},
                "finish_reason": "stop"
            }]
        }));

        let err = extract_response(response).unwrap_err();
        assert!(matches!(
            err,
            Error::Gateway(GatewayError::EmptyCompletion)
        ));
    }

    #[test]
    fn test_extract_response_missing_usage_is_zeroed() {
        let response = response_fixture(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "ok"},
                "finish_reason": "length"
            }]
        }));

        let completion = extract_response(response).unwrap();
        assert_eq!(completion.usage, TokenUsage::default());
        assert_eq!(completion.finish_reason, FinishReason::Length);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(
            FinishReason::from(OpenAiFinishReason::Stop),
            FinishReason::Stop
        );
        assert_eq!(
            FinishReason::from(OpenAiFinishReason::Length),
            FinishReason::Length
        );
        assert_eq!(
            FinishReason::from(OpenAiFinishReason::ContentFilter),
            FinishReason::ContentFilter
        );
        assert_eq!(
            FinishReason::from(OpenAiFinishReason::ToolCalls),
            FinishReason::Other
        );
    }

    #[test]
    fn test_gateway_identity() {
        let gw = gateway();
        assert_eq!(gw.name(), "openai");
        assert_eq!(gw.model(), DEFAULT_MODEL);
    }
}
