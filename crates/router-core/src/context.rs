use crate::analyzer::ProjectSignals;
use crate::types::{Complexity, ProjectType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// KeywordPredicate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

/// Case-insensitive substring test of a keyword set against free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordPredicate {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub mode: MatchMode,
}

impl KeywordPredicate {
    pub fn any(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            mode: MatchMode::Any,
        }
    }

    pub fn all(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            mode: MatchMode::All,
        }
    }

    /// Number of keywords found in `text`.
    pub fn count_matches(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count()
    }

    pub fn matches(&self, text: &str) -> bool {
        let hits = self.count_matches(text);
        match self.mode {
            MatchMode::Any => hits > 0,
            MatchMode::All => !self.keywords.is_empty() && hits == self.keywords.len(),
        }
    }

    /// Fraction of keywords present, in `[0, 1]`. Empty sets score 0.
    pub fn match_ratio(&self, text: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }
        (self.count_matches(text) as f64 / self.keywords.len() as f64).min(1.0)
    }
}

fn new_feature_keywords() -> KeywordPredicate {
    KeywordPredicate::any(&[
        "create",
        "add",
        "new",
        "implement",
        "build",
        "develop",
        "feature",
        "functionality",
        "system",
        "module",
        "component",
    ])
}

fn bug_fix_keywords() -> KeywordPredicate {
    KeywordPredicate::any(&[
        "fix", "bug", "error", "issue", "problem", "broken", "repair", "correct", "resolve",
        "debug",
    ])
}

fn research_keywords() -> KeywordPredicate {
    KeywordPredicate::any(&[
        "understand",
        "analyze",
        "investigate",
        "explore",
        "research",
        "find",
        "look",
        "examine",
        "study",
        "how",
        "why",
        "what",
    ])
}

// ---------------------------------------------------------------------------
// UserContext
// ---------------------------------------------------------------------------

/// Input to rule evaluation: the request text plus project signals and
/// recent command history (most recent last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_input: String,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub file_count: usize,
    #[serde(default)]
    pub test_coverage: u8,
    #[serde(default)]
    pub recent_commands: Vec<String>,
    #[serde(default)]
    pub project_complexity: Complexity,
    #[serde(default)]
    pub framework_usage: BTreeMap<String, bool>,
    #[serde(default = "default_time_context")]
    pub time_context: String,
}

fn default_time_context() -> String {
    "normal".to_string()
}

impl UserContext {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            project_type: ProjectType::Unknown,
            file_count: 0,
            test_coverage: 0,
            recent_commands: Vec::new(),
            project_complexity: Complexity::Unknown,
            framework_usage: BTreeMap::new(),
            time_context: default_time_context(),
        }
    }

    pub fn from_signals(
        user_input: impl Into<String>,
        signals: &ProjectSignals,
        recent_commands: Vec<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            project_type: signals.project_type,
            file_count: signals.file_count,
            test_coverage: signals.test_coverage_estimate,
            recent_commands,
            project_complexity: signals.complexity,
            framework_usage: signals.frameworks.clone(),
            time_context: default_time_context(),
        }
    }

    pub fn with_file_count(mut self, file_count: usize) -> Self {
        self.file_count = file_count;
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.project_complexity = complexity;
        self
    }

    pub fn with_test_coverage(mut self, coverage: u8) -> Self {
        self.test_coverage = coverage.min(100);
        self
    }

    pub fn with_recent_commands(mut self, commands: Vec<String>) -> Self {
        self.recent_commands = commands;
        self
    }

    // -----------------------------------------------------------------------
    // Derived predicates (recomputed on every call)
    // -----------------------------------------------------------------------

    pub fn is_small_project(&self) -> bool {
        self.file_count <= 10 || self.project_complexity == Complexity::Small
    }

    pub fn has_high_test_coverage(&self) -> bool {
        self.test_coverage >= 80
    }

    pub fn indicates_new_feature(&self) -> bool {
        new_feature_keywords().matches(&self.user_input)
    }

    pub fn indicates_bug_fix(&self) -> bool {
        bug_fix_keywords().matches(&self.user_input)
    }

    pub fn indicates_research(&self) -> bool {
        research_keywords().matches(&self.user_input)
    }

    /// Most frequent recent command. Ties go to the command seen first.
    pub fn dominant_recent_command(&self) -> Option<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for cmd in &self.recent_commands {
            *counts.entry(cmd.as_str()).or_insert(0) += 1;
        }
        let mut best: Option<(&str, usize)> = None;
        for cmd in &self.recent_commands {
            let n = counts[cmd.as_str()];
            if best.map(|(_, b)| n > b).unwrap_or(true) {
                best = Some((cmd.as_str(), n));
            }
        }
        best.map(|(cmd, _)| cmd)
    }

    /// Tags describing this context, attached to every recommendation.
    pub fn context_factors(&self) -> Vec<String> {
        let mut factors = Vec::new();
        if self.is_small_project() {
            factors.push("small_project".to_string());
        }
        if self.has_high_test_coverage() {
            factors.push("high_test_coverage".to_string());
        }
        if self.indicates_new_feature() {
            factors.push("new_feature_detected".to_string());
        }
        if self.indicates_bug_fix() {
            factors.push("bug_fix_detected".to_string());
        }
        if self.indicates_research() {
            factors.push("research_detected".to_string());
        }
        factors
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_predicate_is_case_insensitive() {
        let p = KeywordPredicate::any(&["fix", "bug"]);
        assert!(p.matches("FIX the thing"));
        assert_eq!(p.count_matches("Fix the login Bug"), 2);
        assert_eq!(p.match_ratio("Fix the login Bug"), 1.0);
        assert!(!p.matches("polish the docs"));
    }

    #[test]
    fn keyword_predicate_all_mode() {
        let p = KeywordPredicate::all(&["migrate", "database"]);
        assert!(p.matches("migrate the database"));
        assert!(!p.matches("migrate the cache"));
        assert!(!KeywordPredicate::all(&[]).matches("anything"));
    }

    #[test]
    fn builds_from_signals() {
        let mut signals = ProjectSignals {
            file_count: 25,
            test_coverage_estimate: 85,
            project_type: ProjectType::WebApplication,
            complexity: Complexity::Medium,
            ..ProjectSignals::default()
        };
        signals.frameworks.insert("react".to_string(), true);
        let ctx = UserContext::from_signals(
            "Fix the login bug",
            &signals,
            vec!["/task".into(), "/query".into(), "/task".into()],
        );
        assert_eq!(ctx.file_count, 25);
        assert_eq!(ctx.test_coverage, 85);
        assert_eq!(ctx.project_type, ProjectType::WebApplication);
        assert_eq!(ctx.framework_usage.get("react"), Some(&true));
        assert_eq!(ctx.recent_commands.len(), 3);
        assert_eq!(ctx.time_context, "normal");
    }

    #[test]
    fn derived_predicates() {
        let ctx = UserContext::new("Add a new login component")
            .with_file_count(5)
            .with_test_coverage(85);
        assert!(ctx.is_small_project());
        assert!(ctx.has_high_test_coverage());
        assert!(ctx.indicates_new_feature());
        assert!(!ctx.indicates_bug_fix());

        let large = UserContext::new("why is this slow")
            .with_file_count(400)
            .with_complexity(Complexity::Enterprise);
        assert!(!large.is_small_project());
        assert!(large.indicates_research());
    }

    #[test]
    fn small_complexity_is_small_even_with_many_files() {
        let ctx = UserContext::new("x")
            .with_file_count(90)
            .with_complexity(Complexity::Small);
        assert!(ctx.is_small_project());
    }

    #[test]
    fn dominant_recent_command() {
        let ctx = UserContext::new("x").with_recent_commands(vec![
            "/query".into(),
            "/task".into(),
            "/task".into(),
        ]);
        assert_eq!(ctx.dominant_recent_command(), Some("/task"));

        let tie = UserContext::new("x").with_recent_commands(vec!["/feature".into(), "/task".into()]);
        assert_eq!(tie.dominant_recent_command(), Some("/feature"));

        assert_eq!(UserContext::new("x").dominant_recent_command(), None);
    }

    #[test]
    fn context_factors_follow_predicates() {
        let ctx = UserContext::new("Fix the bug and explain why")
            .with_file_count(3)
            .with_test_coverage(90);
        assert_eq!(
            ctx.context_factors(),
            vec![
                "small_project",
                "high_test_coverage",
                "bug_fix_detected",
                "research_detected"
            ]
        );
    }
}
