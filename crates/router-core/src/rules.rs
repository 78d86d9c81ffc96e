use crate::context::{KeywordPredicate, UserContext};
use crate::error::{Result, RouterError};
use crate::types::Complexity;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-category confidence factors
// ---------------------------------------------------------------------------

const FILE_COUNT_FACTOR: f64 = 0.8;
const COMPLEXITY_FACTOR: f64 = 0.7;
const COVERAGE_FACTOR: f64 = 0.6;

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileCountBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl FileCountBounds {
    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn contains(&self, count: usize) -> bool {
        self.min.map_or(true, |min| count >= min) && self.max.map_or(true, |max| count <= max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMin {
    pub min: u8,
}

/// Condition categories of a rule. Absent categories are not checked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<FileCountBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<KeywordPredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Vec<Complexity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_coverage: Option<CoverageMin>,
}

impl RuleConditions {
    pub fn is_empty(&self) -> bool {
        self.file_count.is_none()
            && self.keywords.is_none()
            && self.complexity.is_none()
            && self.test_coverage.is_none()
    }
}

// ---------------------------------------------------------------------------
// RuleMatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMatch {
    pub matched: bool,
    /// 0.0 when the rule did not match.
    pub confidence: f64,
}

impl RuleMatch {
    fn miss() -> Self {
        Self {
            matched: false,
            confidence: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// RoutingRule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub name: String,
    pub conditions: RuleConditions,
    pub recommendation: String,
    pub confidence_base: f64,
    pub reasoning_template: String,
    pub priority: i32,
}

impl RoutingRule {
    pub fn new(
        name: impl Into<String>,
        conditions: RuleConditions,
        recommendation: impl Into<String>,
        confidence_base: f64,
        reasoning_template: impl Into<String>,
        priority: i32,
    ) -> Result<Self> {
        let rule = Self {
            name: name.into(),
            conditions,
            recommendation: recommendation.into(),
            confidence_base,
            reasoning_template: reasoning_template.into(),
            priority,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| RouterError::InvalidRule {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty".to_string()));
        }
        if !self.recommendation.starts_with('/') {
            return Err(invalid(format!(
                "recommendation must start with '/', got '{}'",
                self.recommendation
            )));
        }
        if !self.confidence_base.is_finite() || !(0.0..=1.0).contains(&self.confidence_base) {
            return Err(invalid(format!(
                "confidence_base must be between 0 and 1, got {}",
                self.confidence_base
            )));
        }
        if self.reasoning_template.trim().is_empty() {
            return Err(invalid("reasoning_template cannot be empty".to_string()));
        }
        if let Some(kw) = &self.conditions.keywords {
            if kw.keywords.is_empty() {
                return Err(invalid("keyword condition has no keywords".to_string()));
            }
        }
        Ok(())
    }

    /// A rule matches when every present condition category passes. The
    /// confidence is `confidence_base` scaled by the mean factor of the
    /// categories checked; with no categories it is `confidence_base`.
    pub fn evaluate(&self, ctx: &UserContext) -> RuleMatch {
        let mut factors: Vec<f64> = Vec::with_capacity(4);

        if let Some(bounds) = &self.conditions.file_count {
            if !bounds.contains(ctx.file_count) {
                return RuleMatch::miss();
            }
            factors.push(FILE_COUNT_FACTOR);
        }

        if let Some(keywords) = &self.conditions.keywords {
            if !keywords.matches(&ctx.user_input) {
                return RuleMatch::miss();
            }
            factors.push(keywords.match_ratio(&ctx.user_input));
        }

        if let Some(allowed) = &self.conditions.complexity {
            if !allowed.contains(&ctx.project_complexity) {
                return RuleMatch::miss();
            }
            factors.push(COMPLEXITY_FACTOR);
        }

        if let Some(coverage) = &self.conditions.test_coverage {
            if ctx.test_coverage < coverage.min {
                return RuleMatch::miss();
            }
            factors.push(COVERAGE_FACTOR);
        }

        let confidence = if factors.is_empty() {
            self.confidence_base
        } else {
            let mean = factors.iter().sum::<f64>() / factors.len() as f64;
            self.confidence_base * mean
        };

        RuleMatch {
            matched: true,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Helper macro for concise rule definitions
// ---------------------------------------------------------------------------

macro_rules! rule {
    (
        name: $name:expr,
        priority: $priority:expr,
        $(file_count: $fc:expr,)?
        $(keywords: [$($kw:expr),* $(,)?],)?
        $(complexity: [$($cx:expr),* $(,)?],)?
        $(test_coverage: $cov:expr,)?
        recommendation: $cmd:expr,
        confidence_base: $base:expr,
        reasoning: $reason:expr $(,)?
    ) => {
        RoutingRule {
            name: $name.to_string(),
            conditions: RuleConditions {
                file_count: {
                    #[allow(unused_assignments, unused_mut)]
                    let mut v: Option<FileCountBounds> = None;
                    $(v = Some($fc);)?
                    v
                },
                keywords: {
                    #[allow(unused_assignments, unused_mut)]
                    let mut v: Option<KeywordPredicate> = None;
                    $(v = Some(KeywordPredicate::any(&[$($kw),*]));)?
                    v
                },
                complexity: {
                    #[allow(unused_assignments, unused_mut)]
                    let mut v: Option<Vec<Complexity>> = None;
                    $(v = Some(vec![$($cx),*]);)?
                    v
                },
                test_coverage: {
                    #[allow(unused_assignments, unused_mut)]
                    let mut v: Option<CoverageMin> = None;
                    $(v = Some(CoverageMin { min: $cov });)?
                    v
                },
            },
            recommendation: $cmd.to_string(),
            confidence_base: $base,
            reasoning_template: $reason.to_string(),
            priority: $priority,
        }
    };
}

// ---------------------------------------------------------------------------
// Default rules
// ---------------------------------------------------------------------------

pub fn default_rules() -> Vec<RoutingRule> {
    vec![
        rule! {
            name: "small_task_rule",
            priority: 8,
            file_count: FileCountBounds::at_most(10),
            keywords: ["fix", "bug", "update", "change", "modify"],
            complexity: [Complexity::Small, Complexity::Medium],
            recommendation: "/task",
            confidence_base: 0.85,
            reasoning: "Small focused task detected - single file changes in manageable project",
        },
        rule! {
            name: "new_feature_rule",
            priority: 7,
            keywords: ["create", "add", "new", "implement", "build", "feature"],
            complexity: [Complexity::Medium, Complexity::Large, Complexity::Enterprise],
            recommendation: "/feature",
            confidence_base: 0.80,
            reasoning: "New feature development detected - requires comprehensive planning",
        },
        rule! {
            name: "research_rule",
            priority: 6,
            keywords: ["understand", "analyze", "investigate", "explore", "how", "why", "what"],
            recommendation: "/query",
            confidence_base: 0.75,
            reasoning: "Research and analysis task detected - understanding required before changes",
        },
        rule! {
            name: "complex_swarm_rule",
            priority: 5,
            file_count: FileCountBounds::at_least(50),
            keywords: ["system", "architecture", "refactor", "migrate"],
            complexity: [Complexity::Large, Complexity::Enterprise],
            recommendation: "/swarm",
            confidence_base: 0.70,
            reasoning: "Complex multi-component work detected - requires coordinated development",
        },
        rule! {
            name: "auto_fallback_rule",
            priority: 1,
            recommendation: "/auto",
            confidence_base: 0.40,
            reasoning: "Uncertain routing context - let auto command determine best approach",
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
