//! Token and cost accounting.
//!
//! [`UsageTracker`] accumulates the token usage reported by the gateway and
//! derives cost and context-budget figures from it. Pure arithmetic: nothing
//! here influences compression or requests.

use serde::Serialize;

use crate::gateway::TokenUsage;

/// Context limit assumed for models not in the table.
pub const DEFAULT_CONTEXT_LIMIT: usize = 4096;

/// Context usage percentage above which [`UsageTracker::is_near_limit`]
/// reports true.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Per-million-token prices for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPricing {
    /// Price per one million prompt tokens, in USD.
    pub input_per_million: f64,
    /// Price per one million completion tokens, in USD.
    pub output_per_million: f64,
}

impl ModelPricing {
    /// Creates a pricing entry.
    #[must_use]
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

/// Pricing assumed for models not in the table.
pub const DEFAULT_PRICING: ModelPricing = ModelPricing::new(0.50, 1.50);

/// Returns the context-window limit (tokens) for a model.
#[must_use]
pub fn context_limit_for(model: &str) -> usize {
    match model {
        "gpt-4o-mini" | "gpt-4o" | "gpt-4-turbo-preview" => 128_000,
        "gpt-4" => 8192,
        "gpt-3.5-turbo" => 16_385,
        _ => DEFAULT_CONTEXT_LIMIT,
    }
}

/// Returns the per-million-token pricing for a model.
#[must_use]
pub fn pricing_for(model: &str) -> ModelPricing {
    match model {
        "gpt-4o-mini" => ModelPricing::new(0.150, 0.600),
        "gpt-4o" => ModelPricing::new(2.50, 10.00),
        "gpt-4-turbo-preview" => ModelPricing::new(10.00, 30.00),
        "gpt-4" => ModelPricing::new(30.00, 60.00),
        "gpt-3.5-turbo" => ModelPricing::new(0.50, 1.50),
        _ => DEFAULT_PRICING,
    }
}

/// Accumulates token usage and derives cost/limit statistics.
///
/// # Examples
///
/// ```
/// use chatfold::gateway::TokenUsage;
/// use chatfold::usage::UsageTracker;
///
/// let mut tracker = UsageTracker::new("gpt-4o-mini");
/// tracker.record(&TokenUsage::new(1200, 300));
/// assert_eq!(tracker.total_tokens(), 1500);
/// assert_eq!(tracker.request_count(), 1);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct UsageTracker {
    model: String,
    requests: usize,
    prompt_tokens: u64,
    completion_tokens: u64,
    total_cost: f64,
    context_tokens: usize,
    context_limit: usize,
    pricing: ModelPricing,
}

impl UsageTracker {
    /// Creates a tracker for the given model, looking up its context limit
    /// and pricing (table defaults apply to unknown models).
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let context_limit = context_limit_for(&model);
        let pricing = pricing_for(&model);
        Self {
            model,
            requests: 0,
            prompt_tokens: 0,
            completion_tokens: 0,
            total_cost: 0.0,
            context_tokens: 0,
            context_limit,
            pricing,
        }
    }

    /// Records the token usage of one completed request.
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&mut self, usage: &TokenUsage) {
        self.requests += 1;
        self.prompt_tokens += u64::from(usage.prompt_tokens);
        self.completion_tokens += u64::from(usage.completion_tokens);

        let cost = f64::from(usage.prompt_tokens) / 1_000_000.0 * self.pricing.input_per_million
            + f64::from(usage.completion_tokens) / 1_000_000.0 * self.pricing.output_per_million;
        self.total_cost += cost;
    }

    /// Updates the current estimated context size in tokens.
    pub const fn set_context_tokens(&mut self, tokens: usize) {
        self.context_tokens = tokens;
    }

    /// Returns the tracked model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns how many requests have been recorded.
    #[must_use]
    pub const fn request_count(&self) -> usize {
        self.requests
    }

    /// Returns accumulated prompt tokens.
    #[must_use]
    pub const fn prompt_tokens(&self) -> u64 {
        self.prompt_tokens
    }

    /// Returns accumulated completion tokens.
    #[must_use]
    pub const fn completion_tokens(&self) -> u64 {
        self.completion_tokens
    }

    /// Returns accumulated tokens across all requests.
    #[must_use]
    pub const fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Returns the accumulated cost in USD.
    #[must_use]
    pub const fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Returns the current estimated context size in tokens.
    #[must_use]
    pub const fn context_tokens(&self) -> usize {
        self.context_tokens
    }

    /// Returns the model's context-window limit in tokens.
    #[must_use]
    pub const fn context_limit(&self) -> usize {
        self.context_limit
    }

    /// Returns current context usage as a percentage of the limit.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn context_usage_percent(&self) -> f64 {
        if self.context_limit == 0 {
            return 0.0;
        }
        self.context_tokens as f64 / self.context_limit as f64 * 100.0
    }

    /// Checks whether context usage is above [`NEAR_LIMIT_PERCENT`].
    #[must_use]
    pub fn is_near_limit(&self) -> bool {
        self.context_usage_percent() > NEAR_LIMIT_PERCENT
    }

    /// Checks whether the context exceeds the model limit. A context of
    /// exactly the limit still fits.
    #[must_use]
    pub const fn is_over_limit(&self) -> bool {
        self.context_tokens > self.context_limit
    }

    /// Returns how many tokens remain before the context limit.
    #[must_use]
    pub const fn remaining_tokens(&self) -> usize {
        self.context_limit.saturating_sub(self.context_tokens)
    }

    /// Returns the mean token count per recorded request.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_tokens_per_request(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.total_tokens() as f64 / self.requests as f64
    }

    /// Returns the mean cost per recorded request, in USD.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_cost_per_request(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.total_cost / self.requests as f64
    }
}
