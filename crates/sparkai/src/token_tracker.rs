//! Token usage tracking across calls and domains.

use std::collections::HashMap;

use crate::Usage;

/// Tracks cumulative token usage per model domain.
#[derive(Debug)]
pub struct TokenTracker {
    total: Usage,
    by_domain: HashMap<String, Usage>,
    call_count: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self {
            total: Usage::default(),
            by_domain: HashMap::new(),
            call_count: 0,
        }
    }

    /// Record token usage from one chat call.
    pub fn record(&mut self, domain: &str, usage: &Usage) {
        add(&mut self.total, usage);
        add(self.by_domain.entry(domain.to_string()).or_default(), usage);
        self.call_count += 1;
    }

    pub fn total(&self) -> &Usage {
        &self.total
    }

    pub fn for_domain(&self, domain: &str) -> Option<&Usage> {
        self.by_domain.get(domain)
    }

    /// Total tokens as reported by the service.
    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        self.total = Usage::default();
        self.by_domain.clear();
        self.call_count = 0;
    }
}

impl Default for TokenTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn add(into: &mut Usage, usage: &Usage) {
    into.prompt_tokens = into.prompt_tokens.saturating_add(usage.prompt_tokens);
    into.completion_tokens = into
        .completion_tokens
        .saturating_add(usage.completion_tokens);
    into.total_tokens = into.total_tokens.saturating_add(usage.total_tokens);
}
