use crate::config::RoutingConfig;
use crate::context::UserContext;
use crate::error::{Result, RouterError};
use crate::recommendation::RoutingRecommendation;
use crate::rules::{default_rules, RoutingRule};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// RoutingDecisionTree
// ---------------------------------------------------------------------------

/// Priority-ordered rule base. Rules are evaluated highest priority first;
/// the returned recommendations are ranked by confidence.
#[derive(Debug, Clone)]
pub struct RoutingDecisionTree {
    rules: Vec<RoutingRule>,
    config: RoutingConfig,
}

impl Default for RoutingDecisionTree {
    fn default() -> Self {
        Self::new(RoutingConfig::default())
    }
}

impl RoutingDecisionTree {
    /// Rule base holding [`default_rules`].
    pub fn new(config: RoutingConfig) -> Self {
        let mut rules = default_rules();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules, config }
    }

    pub fn empty(config: RoutingConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Register a rule. The list stays sorted by priority, highest first;
    /// equal priorities keep insertion order.
    pub fn add_rule(&mut self, rule: RoutingRule) -> Result<()> {
        rule.validate()?;
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(RouterError::DuplicateRule(rule.name));
        }
        self.rules.push(rule);
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(())
    }

    /// All recommendations for `ctx`, best first, at most `max_results`.
    /// Never fails; no match gives an empty list.
    pub fn evaluate(&self, ctx: &UserContext) -> Vec<RoutingRecommendation> {
        let outcomes: Vec<(&RoutingRule, f64)> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let m = rule.evaluate(ctx);
                tracing::debug!(
                    rule = %rule.name,
                    matched = m.matched,
                    confidence = m.confidence,
                    "rule evaluated"
                );
                m.matched.then_some((rule, m.confidence))
            })
            .collect();

        let factors = ctx.context_factors();
        let mut recommendations = Vec::new();

        for (rule, confidence) in &outcomes {
            if *confidence <= self.config.min_confidence {
                continue;
            }

            let mut alternatives: Vec<String> = Vec::new();
            for (other, other_confidence) in &outcomes {
                if alternatives.len() >= self.config.max_alternatives {
                    break;
                }
                if other.name == rule.name
                    || other.recommendation == rule.recommendation
                    || *other_confidence <= self.config.alternative_threshold
                    || alternatives.contains(&other.recommendation)
                {
                    continue;
                }
                alternatives.push(other.recommendation.clone());
            }

            let rec = match RoutingRecommendation::new(
                rule.recommendation.clone(),
                *confidence,
                rule.reasoning_template.clone(),
            ) {
                Ok(rec) => rec,
                Err(e) => {
                    // validated rules cannot get here; skip rather than fail the batch
                    tracing::warn!(rule = %rule.name, error = %e, "dropping invalid recommendation");
                    continue;
                }
            };

            recommendations.push(
                rec.with_context_factors(factors.clone())
                    .with_alternatives(alternatives)
                    .with_parameters(signal_parameters(ctx, &rule.name)),
            );
        }

        // stable: equal confidences keep rule-priority order
        recommendations.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));
        recommendations.truncate(self.config.max_results);
        recommendations
    }
}

fn signal_parameters(ctx: &UserContext, rule: &str) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    params.insert("user_input".to_string(), Value::from(ctx.user_input.clone()));
    params.insert("file_count".to_string(), Value::from(ctx.file_count));
    params.insert(
        "project_complexity".to_string(),
        Value::from(ctx.project_complexity.as_str()),
    );
    params.insert(
        "project_type".to_string(),
        Value::from(ctx.project_type.as_str()),
    );
    params.insert("rule".to_string(), Value::from(rule));
    params
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
