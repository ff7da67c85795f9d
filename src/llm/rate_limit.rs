//! Sliding-window rate limiting of model calls.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::ModelLimits;
use crate::error::{JournalError, Result};
use crate::llm::client::LanguageModel;
use crate::llm::types::GenerationRequest;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRule {
    pub key: String,
    pub window: Duration,
    pub max: u64,
    /// Units consumed by one call: 1 for request counts, a token estimate
    /// for token budgets.
    pub weight: u64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateUsage {
    pub total: u64,
    pub remaining: u64,
}

/// In-memory limiter keeping one timestamped log per bucket key.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Vec<(Instant, u64)>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks every rule and records the call only when all of them pass,
    /// so a rejected call consumes nothing.
    pub fn enforce_all(&self, rules: &[RateRule]) -> Result<Vec<RateUsage>> {
        self.enforce_all_at(rules, Instant::now())
    }

    fn enforce_all_at(&self, rules: &[RateRule], now: Instant) -> Result<Vec<RateUsage>> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let mut usages = Vec::with_capacity(rules.len());

        for rule in rules {
            if rule.max == 0 || rule.window.is_zero() {
                return Err(JournalError::RateLimited {
                    key: rule.key.clone(),
                    message: "invalid rate limit configuration".to_string(),
                });
            }

            let bucket = buckets.entry(rule.key.clone()).or_default();
            bucket.retain(|(at, _)| now.duration_since(*at) < rule.window);
            let current: u64 = bucket.iter().map(|(_, weight)| weight).sum();

            if current + rule.weight > rule.max {
                warn!(
                    "Rate limit {} exceeded ({}/{} used, call weighs {})",
                    rule.key, current, rule.max, rule.weight
                );
                return Err(JournalError::RateLimited {
                    key: rule.key.clone(),
                    message: format!("{} ({}/{} used)", rule.message, current, rule.max),
                });
            }
            usages.push(RateUsage {
                total: current + rule.weight,
                remaining: rule.max - current - rule.weight,
            });
        }

        for rule in rules {
            buckets
                .entry(rule.key.clone())
                .or_default()
                .push((now, rule.weight));
        }
        Ok(usages)
    }
}

/// Roughly four characters per token, schema included.
pub fn estimate_tokens(request: &GenerationRequest) -> u64 {
    let schema_chars = request
        .response_schema
        .as_ref()
        .map_or(0, |schema| schema.to_string().chars().count());
    (request.prompt.chars().count() + schema_chars).div_ceil(4) as u64
}

/// Requests per minute, requests per day and tokens per minute.
pub fn model_rules(limits: &ModelLimits, prefix: &str, tokens: u64) -> Vec<RateRule> {
    vec![
        RateRule {
            key: format!("{}:rpm", prefix),
            window: MINUTE,
            max: limits.requests_per_minute,
            weight: 1,
            message: format!(
                "Model limit reached: {} requests per minute",
                limits.requests_per_minute
            ),
        },
        RateRule {
            key: format!("{}:rpd", prefix),
            window: DAY,
            max: limits.requests_per_day,
            weight: 1,
            message: format!(
                "Model limit reached: {} requests per day",
                limits.requests_per_day
            ),
        },
        RateRule {
            key: format!("{}:tpm", prefix),
            window: MINUTE,
            max: limits.tokens_per_minute,
            weight: tokens,
            message: format!(
                "Model limit reached: {} tokens per minute",
                limits.tokens_per_minute
            ),
        },
    ]
}

/// Wraps a model and refuses calls once its budget is spent.
pub struct RateLimitedModel<M> {
    inner: M,
    limits: ModelLimits,
    key_prefix: String,
    limiter: RateLimiter,
}

impl<M: LanguageModel> RateLimitedModel<M> {
    pub fn new(inner: M, limits: ModelLimits) -> Self {
        Self {
            inner,
            limits,
            key_prefix: "model".to_string(),
            limiter: RateLimiter::new(),
        }
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: LanguageModel> LanguageModel for RateLimitedModel<M> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let tokens = estimate_tokens(request);
        let usages = self
            .limiter
            .enforce_all(&model_rules(&self.limits, &self.key_prefix, tokens))?;
        debug!(
            "Model call admitted under {}: ~{} tokens, usage {:?}",
            self.key_prefix, tokens, usages
        );
        self.inner.generate(request).await
    }
}
