//! Scripted completion gateway for tests.
//!
//! [`ScriptedGateway`] replays a fixed sequence of outcomes instead of
//! calling a provider, and records every request it receives. Tests use it
//! to drive compression and session flows deterministically, including
//! failure and cancellation paths.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{Error, GatewayError, Result};
use crate::gateway::traits::{
    CompletionGateway, CompletionRequest, CompletionResponse, FinishReason, TokenUsage,
};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Succeed with the given text and zeroed token usage.
    Reply(String),
    /// Succeed with the given text and explicit token usage.
    ReplyWithUsage(String, TokenUsage),
    /// Fail with a transport error carrying the given cause.
    Fail(String),
    /// Answer at the protocol level but yield no text.
    Empty,
}

impl ScriptStep {
    /// Shorthand for [`ScriptStep::Reply`].
    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    /// Shorthand for [`ScriptStep::Fail`].
    #[must_use]
    pub fn fail(cause: impl Into<String>) -> Self {
        Self::Fail(cause.into())
    }
}

/// A [`CompletionGateway`] that replays scripted outcomes.
///
/// Steps are consumed front to back; running past the end of the script
/// fails the request, which makes an unexpected extra call visible in tests.
/// [`Self::always`] installs a fallback step instead, replayed whenever the
/// script is empty.
#[derive(Debug)]
pub struct ScriptedGateway {
    model: String,
    delay: Option<Duration>,
    script: Mutex<VecDeque<ScriptStep>>,
    fallback: Option<ScriptStep>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    /// Creates a gateway that will replay `steps` in order.
    #[must_use]
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            model: "scripted-model".to_string(),
            delay: None,
            script: Mutex::new(steps.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a gateway that answers every request with the same text,
    /// no matter how many requests arrive.
    #[must_use]
    pub fn always(text: impl Into<String>) -> Self {
        let mut gateway = Self::new(Vec::new());
        gateway.fallback = Some(ScriptStep::Reply(text.into()));
        gateway
    }

    /// Sets the model name reported to callers.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleeps for `delay` before answering each request.
    ///
    /// Used by cancellation tests: a caller-side timeout fires while the
    /// gateway is "in flight".
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns how many requests have been received.
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Returns copies of all received requests, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().await.push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = self
            .script
            .lock()
            .await
            .pop_front()
            .or_else(|| self.fallback.clone());
        match step {
            Some(ScriptStep::Reply(text)) => Ok(CompletionResponse {
                content: text,
                model: self.model.clone(),
                finish_reason: FinishReason::Stop,
                usage: TokenUsage::default(),
            }),
            Some(ScriptStep::ReplyWithUsage(text, usage)) => Ok(CompletionResponse {
                content: text,
                model: self.model.clone(),
                finish_reason: FinishReason::Stop,
                usage,
            }),
            Some(ScriptStep::Fail(cause)) => Err(Error::Gateway(GatewayError::Request(cause))),
            Some(ScriptStep::Empty) => Err(Error::Gateway(GatewayError::EmptyCompletion)),
            None => Err(Error::Gateway(GatewayError::Request(
                "script exhausted".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::traits::ChatMessage;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new(vec![ChatMessage::user(text)])
    }

    #[tokio::test]
    async fn test_replays_steps_in_order() {
        let gateway = ScriptedGateway::new(vec![
            ScriptStep::reply("first"),
            ScriptStep::reply("second"),
        ]);

        let first = gateway.complete(request("a")).await.unwrap();
        let second = gateway.complete(request("b")).await.unwrap();
        assert_eq!(first.content, "first");
        assert_eq!(second.content, "second");
    }

    #[tokio::test]
    async fn test_records_requests() {
        let gateway = ScriptedGateway::always("ok");
        gateway.complete(request("one")).await.unwrap();
        gateway.complete(request("two")).await.unwrap();

        assert_eq!(gateway.request_count().await, 2);
        let requests = gateway.requests().await;
        assert_eq!(requests[0].messages[0].content, "one");
        assert_eq!(requests[1].messages[0].content, "two");
    }

    #[tokio::test]
    async fn test_fail_step() {
        let gateway = ScriptedGateway::new(vec![ScriptStep::fail("rate limited")]);
        let err = gateway.complete(request("q")).await.unwrap_err();
        assert!(matches!(err, Error::Gateway(GatewayError::Request(_))));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_empty_step() {
        let gateway = ScriptedGateway::new(vec![ScriptStep::Empty]);
        let err = gateway.complete(request("q")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Gateway(GatewayError::EmptyCompletion)
        ));
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let gateway = ScriptedGateway::new(vec![]);
        let err = gateway.complete(request("q")).await.unwrap_err();
        assert!(err.to_string().contains("script exhausted"));
    }

    #[tokio::test]
    async fn test_always_never_exhausts() {
        let gateway = ScriptedGateway::always("ok");
        for i in 0..65 {
            let response = gateway
                .complete(request(&format!("call {i}")))
                .await
                .unwrap();
            assert_eq!(response.content, "ok");
        }
        assert_eq!(gateway.request_count().await, 65);
    }

    #[tokio::test]
    async fn test_with_model_is_echoed() {
        let gateway = ScriptedGateway::always("ok").with_model("gpt-4");
        assert_eq!(gateway.model(), "gpt-4");

        let response = gateway.complete(request("q")).await.unwrap();
        assert_eq!(response.model, "gpt-4");
    }

    #[tokio::test]
    async fn test_reply_with_usage() {
        let usage = TokenUsage::new(100, 20);
        let gateway =
            ScriptedGateway::new(vec![ScriptStep::ReplyWithUsage("ok".to_string(), usage)]);
        let response = gateway.complete(request("q")).await.unwrap();
        assert_eq!(response.usage, usage);
    }
}
