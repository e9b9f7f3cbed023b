//! # Reference Service Selectors
//!
//! Ready-made [`ServiceSelector`] implementations for hosts without their own catalog.
//! [`StaticServiceSelector`] always returns the same candidates; [`KeywordServiceSelector`]
//! matches lowercase keywords in the task description against ordered rules.

use serde_json::Value;
use std::collections::HashMap;

use super::traits::{Recommendation, ServiceSelector};

/// Returns a fixed candidate list for every task
#[derive(Debug, Clone, Default)]
pub struct StaticServiceSelector {
    services: Vec<String>,
}

impl StaticServiceSelector {
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            services: services.into_iter().map(Into::into).collect(),
        }
    }
}

impl ServiceSelector for StaticServiceSelector {
    fn recommend(&self, _description: &str, _context: &HashMap<String, Value>) -> Recommendation {
        Recommendation::new(self.services.clone()).with_reasoning("static candidate list")
    }

    fn known_services(&self) -> Vec<String> {
        self.services.clone()
    }
}

#[derive(Debug, Clone)]
struct KeywordRule {
    keywords: Vec<String>,
    service_id: String,
    reason: String,
}

/// Keyword matching selector
///
/// Candidates are the `always` services, then each matching rule's service in rule order,
/// without duplicates. When nothing matches, the `fallback` services are appended instead.
#[derive(Debug, Clone, Default)]
pub struct KeywordServiceSelector {
    always: Vec<String>,
    rules: Vec<KeywordRule>,
    fallback: Vec<String>,
}

impl KeywordServiceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Services recommended for every task
    pub fn always_include(mut self, service_id: impl Into<String>) -> Self {
        self.always.push(service_id.into());
        self
    }

    pub fn rule<I, S>(
        mut self,
        keywords: I,
        service_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(KeywordRule {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.into().to_lowercase())
                .collect(),
            service_id: service_id.into(),
            reason: reason.into(),
        });
        self
    }

    /// Services recommended when no rule matches
    pub fn fallback<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback = services.into_iter().map(Into::into).collect();
        self
    }
}

impl ServiceSelector for KeywordServiceSelector {
    fn recommend(&self, description: &str, _context: &HashMap<String, Value>) -> Recommendation {
        let lower = description.to_lowercase();
        let mut services: Vec<String> = Vec::new();
        let mut reasoning = Vec::new();

        for service_id in &self.always {
            if !services.contains(service_id) {
                services.push(service_id.clone());
            }
        }

        let mut matched_any = false;
        for rule in &self.rules {
            if let Some(keyword) = rule.keywords.iter().find(|kw| lower.contains(kw.as_str())) {
                matched_any = true;
                if !services.contains(&rule.service_id) {
                    services.push(rule.service_id.clone());
                    reasoning.push(format!("{}: {} (matched '{}')", rule.service_id, rule.reason, keyword));
                }
            }
        }

        if !matched_any {
            for service_id in &self.fallback {
                if !services.contains(service_id) {
                    services.push(service_id.clone());
                }
            }
            if !self.fallback.is_empty() {
                reasoning.push("no keyword matched, using fallback services".to_string());
            }
        }

        Recommendation {
            services,
            reasoning,
            allocation: None,
        }
    }

    fn known_services(&self) -> Vec<String> {
        let mut known: Vec<String> = Vec::new();
        let all = self
            .always
            .iter()
            .chain(self.rules.iter().map(|rule| &rule.service_id))
            .chain(self.fallback.iter());
        for service_id in all {
            if !known.contains(service_id) {
                known.push(service_id.clone());
            }
        }
        known
    }
}
