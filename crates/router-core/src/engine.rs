use crate::analyzer::{ProjectAnalyzer, ProjectSignals};
use crate::config::RoutingConfig;
use crate::context::UserContext;
use crate::decision::RoutingDecisionTree;
use crate::error::Result;
use crate::feedback::{
    Feedback, FeedbackContext, FeedbackRecord, FeedbackStore, InMemoryFeedbackStore,
};
use crate::{io, paths};
use crate::recommendation::{validate_command, RoutingRecommendation};
use crate::rules::RoutingRule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Confidence an explanation treats as the neutral starting point.
const EXPLAIN_BASE_CONFIDENCE: f64 = 0.7;
const FALLBACK_ALTERNATIVES: usize = 3;

// ---------------------------------------------------------------------------
// Persisted model / explanation types
// ---------------------------------------------------------------------------

/// Learning state written by [`RoutingEngine::save_model`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingModel {
    #[serde(default)]
    pub feedback_history: Vec<FeedbackRecord>,
    /// Request text -> commands the user actually ran for it.
    #[serde(default)]
    pub user_patterns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub decision_path: String,
    pub context_factors: ContextBreakdown,
    pub alternative_paths: Vec<AlternativePath>,
    pub confidence_breakdown: ConfidenceBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBreakdown {
    pub file_count: u64,
    pub project_type: String,
    pub project_complexity: String,
    pub detected_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativePath {
    pub command: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub base_confidence: f64,
    pub context_adjustments: f64,
    pub learning_adjustments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub feedback_entries: usize,
    pub user_patterns: usize,
    /// `None` until feedback has been recorded.
    pub average_rating: Option<f64>,
}

// ---------------------------------------------------------------------------
// RoutingEngine
// ---------------------------------------------------------------------------

/// Recommends a command for a request against one project, learning from
/// feedback as it goes. Owned by the caller; holds no global state.
#[derive(Debug)]
pub struct RoutingEngine<S: FeedbackStore = InMemoryFeedbackStore> {
    framework_path: PathBuf,
    analyzer: ProjectAnalyzer,
    tree: RoutingDecisionTree,
    config: RoutingConfig,
    store: S,
    user_patterns: BTreeMap<String, Vec<String>>,
    available_commands: Vec<String>,
}

impl RoutingEngine<InMemoryFeedbackStore> {
    pub fn new(
        framework_path: impl Into<PathBuf>,
        project_path: impl Into<PathBuf>,
        config: RoutingConfig,
    ) -> Self {
        let store = InMemoryFeedbackStore::new(config.history_limit);
        Self::with_store(framework_path, project_path, config, store)
    }
}

impl<S: FeedbackStore> RoutingEngine<S> {
    pub fn with_store(
        framework_path: impl Into<PathBuf>,
        project_path: impl Into<PathBuf>,
        config: RoutingConfig,
        store: S,
    ) -> Self {
        let framework_path = framework_path.into();
        let available_commands = discover_commands(&framework_path);
        Self {
            analyzer: ProjectAnalyzer::new(project_path),
            tree: RoutingDecisionTree::new(config.clone()),
            framework_path,
            config,
            store,
            user_patterns: BTreeMap::new(),
            available_commands,
        }
    }

    /// Replace the rule base, e.g. with a custom or empty one.
    pub fn with_rules(mut self, tree: RoutingDecisionTree) -> Self {
        self.tree = tree;
        self
    }

    pub fn add_rule(&mut self, rule: RoutingRule) -> Result<()> {
        self.tree.add_rule(rule)
    }

    pub fn rules(&self) -> &[RoutingRule] {
        self.tree.rules()
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn framework_path(&self) -> &Path {
        &self.framework_path
    }

    pub fn project_path(&self) -> &Path {
        self.analyzer.project_path()
    }

    /// Commands shipped with the framework, as `/name`, sorted.
    pub fn available_commands(&self) -> &[String] {
        &self.available_commands
    }

    pub fn feedback_history(&self) -> &[FeedbackRecord] {
        self.store.all()
    }

    // -----------------------------------------------------------------------
    // Recommendation
    // -----------------------------------------------------------------------

    /// Fresh analysis of the project; never cached.
    pub fn analyze_project(&self) -> ProjectSignals {
        self.analyzer.analyze()
    }

    pub fn build_context(&self, user_input: &str, recent_commands: &[String]) -> UserContext {
        let signals = self.analyze_project();
        UserContext::from_signals(user_input, &signals, recent_commands.to_vec())
    }

    /// Best recommendation for `user_input`. Falls back to `/auto` when no
    /// rule clears the confidence floor.
    pub fn get_routing_recommendation(
        &self,
        user_input: &str,
        recent_commands: &[String],
    ) -> RoutingRecommendation {
        let ctx = self.build_context(user_input, recent_commands);
        match self.tree.evaluate(&ctx).into_iter().next() {
            Some(best) => {
                let rec = self.apply_learning_adjustments(best, &ctx);
                tracing::debug!(command = %rec.command(), confidence = rec.confidence(), "recommended");
                rec
            }
            None => {
                tracing::debug!("no rule matched; falling back to /auto");
                RoutingRecommendation::fallback(
                    self.available_commands
                        .iter()
                        .take(FALLBACK_ALTERNATIVES)
                        .cloned()
                        .collect(),
                )
            }
        }
    }

    /// Up to `max` ranked recommendations, each adjusted by learning.
    /// Empty when nothing matches.
    pub fn get_multiple_recommendations(
        &self,
        user_input: &str,
        recent_commands: &[String],
        max: usize,
    ) -> Vec<RoutingRecommendation> {
        let ctx = self.build_context(user_input, recent_commands);
        self.tree
            .evaluate(&ctx)
            .into_iter()
            .take(max)
            .map(|rec| self.apply_learning_adjustments(rec, &ctx))
            .collect()
    }

    /// Compound every similar past verdict on this command, oldest first:
    /// positive ratings boost toward the ceiling, negative ones decay toward
    /// the floor. The result stays within `[0, 1]`.
    pub fn apply_learning_adjustments(
        &self,
        rec: RoutingRecommendation,
        ctx: &UserContext,
    ) -> RoutingRecommendation {
        let learning = &self.config.learning;
        let mut confidence = rec.confidence();
        let mut applied = 0usize;

        for record in self.store.all() {
            let feedback = &record.feedback;
            if feedback.recommended_command != rec.command()
                || !self.contexts_similar(&feedback.context, ctx)
            {
                continue;
            }
            if feedback.is_positive() {
                confidence = (confidence * learning.boost).min(learning.ceiling);
                applied += 1;
            } else if feedback.is_negative() {
                confidence = (confidence * learning.penalty).max(learning.floor);
                applied += 1;
            }
        }

        if applied == 0 {
            return rec;
        }
        tracing::debug!(
            command = %rec.command(),
            before = rec.confidence(),
            after = confidence,
            entries = applied,
            "learning adjustment"
        );
        rec.adjusted_confidence(confidence)
            .with_parameter("learning_entries", applied)
    }

    fn contexts_similar(&self, past: &FeedbackContext, ctx: &UserContext) -> bool {
        past.project_complexity == ctx.project_complexity
            || past.file_count.abs_diff(ctx.file_count) < self.config.similarity_window
    }

    // -----------------------------------------------------------------------
    // Feedback
    // -----------------------------------------------------------------------

    /// Record a verdict. Returns false, leaving state untouched, when the
    /// feedback is invalid.
    pub fn learn_from_feedback(&mut self, feedback: Feedback) -> bool {
        if let Err(e) = feedback.validate() {
            tracing::warn!(error = %e, "rejecting feedback");
            return false;
        }
        if !feedback.user_input.is_empty() && !feedback.actual_command.is_empty() {
            let seen = self
                .user_patterns
                .entry(feedback.user_input.clone())
                .or_default();
            seen.push(feedback.actual_command.clone());
            let excess = seen.len().saturating_sub(self.config.history_limit.max(1));
            seen.drain(..excess);
        }
        tracing::info!(
            command = %feedback.recommended_command,
            rating = feedback.user_rating,
            "feedback recorded"
        );
        self.store.append(FeedbackRecord::now(feedback));
        self.prune_patterns();
        true
    }

    /// Forget request texts whose feedback has aged out of the history.
    fn prune_patterns(&mut self) {
        let live: BTreeSet<&str> = self
            .store
            .all()
            .iter()
            .map(|r| r.feedback.user_input.as_str())
            .collect();
        let before = self.user_patterns.len();
        self.user_patterns.retain(|input, _| live.contains(input.as_str()));
        if self.user_patterns.len() < before {
            tracing::debug!(
                dropped = before - self.user_patterns.len(),
                "pruned request patterns"
            );
        }
    }

    pub fn learning_stats(&self) -> LearningStats {
        let history = self.store.all();
        let average_rating = if history.is_empty() {
            None
        } else {
            let total: u32 = history.iter().map(|r| u32::from(r.feedback.user_rating)).sum();
            Some(f64::from(total) / history.len() as f64)
        };
        LearningStats {
            feedback_entries: history.len(),
            user_patterns: self.user_patterns.len(),
            average_rating,
        }
    }

    /// Commands previously run for exactly this request text, oldest first.
    pub fn suggested_commands(&self, user_input: &str) -> &[String] {
        self.user_patterns
            .get(user_input)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Explanation
    // -----------------------------------------------------------------------

    pub fn explain_recommendation(&self, rec: &RoutingRecommendation) -> Explanation {
        Explanation {
            decision_path: format!(
                "Analyzed input '{}' with project context",
                rec.parameter_str("user_input").unwrap_or("N/A")
            ),
            context_factors: ContextBreakdown {
                file_count: rec.parameter_u64("file_count").unwrap_or(0),
                project_type: rec
                    .parameter_str("project_type")
                    .unwrap_or("unknown")
                    .to_string(),
                project_complexity: rec
                    .parameter_str("project_complexity")
                    .unwrap_or("unknown")
                    .to_string(),
                detected_patterns: rec.context_factors().to_vec(),
            },
            alternative_paths: rec
                .alternative_commands()
                .iter()
                .map(|cmd| AlternativePath {
                    command: cmd.clone(),
                    reason: "Alternative for different interpretation".to_string(),
                })
                .collect(),
            confidence_breakdown: ConfidenceBreakdown {
                base_confidence: EXPLAIN_BASE_CONFIDENCE,
                context_adjustments: rec.confidence() - EXPLAIN_BASE_CONFIDENCE,
                learning_adjustments: "Applied based on historical feedback".to_string(),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Model persistence
    // -----------------------------------------------------------------------

    pub fn to_model(&self) -> RoutingModel {
        RoutingModel {
            feedback_history: self.store.all().to_vec(),
            user_patterns: self.user_patterns.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Write the learning state as pretty JSON. Returns false on failure.
    pub fn save_model(&self, path: &Path) -> bool {
        match io::write_json(path, &self.to_model()) {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    entries = self.store.len(),
                    "routing model saved"
                );
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to save routing model");
                false
            }
        }
    }

    /// Replace the learning state from a saved model. Returns false, leaving
    /// state untouched, when the file is missing or malformed.
    pub fn load_model(&mut self, path: &Path) -> bool {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no routing model");
            return false;
        }
        let model: RoutingModel = match io::read_json(path) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load routing model");
                return false;
            }
        };
        if let Err(e) = validate_model(&model) {
            tracing::warn!(path = %path.display(), error = %e, "rejecting routing model");
            return false;
        }
        tracing::info!(
            path = %path.display(),
            entries = model.feedback_history.len(),
            "routing model loaded"
        );
        self.store.replace(model.feedback_history);
        self.user_patterns = model.user_patterns;
        true
    }
}

/// Every stored verdict must pass the same checks as fresh feedback, and
/// every remembered command must be a command.
fn validate_model(model: &RoutingModel) -> Result<()> {
    for record in &model.feedback_history {
        record.feedback.validate()?;
    }
    for commands in model.user_patterns.values() {
        for command in commands {
            validate_command(command)?;
        }
    }
    Ok(())
}

/// `/stem` for every `*.md` directly under `<framework>/commands`, sorted.
fn discover_commands(framework_path: &Path) -> Vec<String> {
    let dir = paths::commands_dir(framework_path);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "no command directory");
            return Vec::new();
        }
    };
    let mut commands: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .filter_map(|path| {
            path.file_stem()
                .map(|stem| format!("/{}", stem.to_string_lossy()))
        })
        .collect();
    commands.sort();
    commands
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complexity;
    use tempfile::TempDir;

    struct Fixture {
        framework: TempDir,
        project: TempDir,
    }

    impl Fixture {
        fn new(source_files: usize) -> Self {
            let framework = TempDir::new().unwrap();
            let commands = framework.path().join("commands");
            std::fs::create_dir_all(&commands).unwrap();
            for name in ["task", "feature", "query", "auto", "swarm"] {
                std::fs::write(commands.join(format!("{name}.md")), "# cmd").unwrap();
            }
            std::fs::write(commands.join("notes.txt"), "ignored").unwrap();

            let project = TempDir::new().unwrap();
            for i in 0..source_files {
                std::fs::write(project.path().join(format!("mod_{i}.rs")), "").unwrap();
            }
            Self { framework, project }
        }

        fn engine(&self) -> RoutingEngine {
            RoutingEngine::new(
                self.framework.path(),
                self.project.path(),
                RoutingConfig::default(),
            )
        }
    }

    fn task_feedback(rating: u8, file_count: usize) -> Feedback {
        Feedback {
            user_input: "Fix the login bug".to_string(),
            recommended_command: "/task".to_string(),
            actual_command: "/task".to_string(),
            user_rating: rating,
            context: FeedbackContext {
                file_count,
                project_complexity: Complexity::Small,
            },
        }
    }

    #[test]
    fn discovers_markdown_commands_sorted() {
        let fx = Fixture::new(0);
        assert_eq!(
            fx.engine().available_commands(),
            &["/auto", "/feature", "/query", "/swarm", "/task"]
        );
        let bare = RoutingEngine::new("/nonexistent/framework", fx.project.path(), RoutingConfig::default());
        assert!(bare.available_commands().is_empty());
    }

    #[test]
    fn single_file_bug_fix_routes_to_task() {
        let fx = Fixture::new(1);
        let rec = fx.engine().get_routing_recommendation("Fix the login bug", &[]);
        assert_eq!(rec.command(), "/task");
        assert_eq!(rec.parameter_u64("file_count"), Some(1));
        assert_eq!(rec.parameter_str("project_complexity"), Some("small"));
        assert!(rec.context_factors().contains(&"bug_fix_detected".to_string()));
    }

    #[test]
    fn feature_request_in_larger_project_routes_to_feature() {
        let fx = Fixture::new(40);
        let rec = fx
            .engine()
            .get_routing_recommendation("Build a new payment feature", &[]);
        assert_eq!(rec.command(), "/feature");
    }

    #[test]
    fn gibberish_routes_to_auto() {
        let fx = Fixture::new(0);
        let rec = fx.engine().get_routing_recommendation("asdkjasdkj random text", &[]);
        assert_eq!(rec.command(), "/auto");
        assert!((0.4..=0.5).contains(&rec.confidence()));
    }

    #[test]
    fn empty_rule_base_falls_back() {
        let fx = Fixture::new(2);
        let engine = fx
            .engine()
            .with_rules(RoutingDecisionTree::empty(RoutingConfig::default()));
        let rec = engine.get_routing_recommendation("anything", &[]);
        assert_eq!(rec.command(), "/auto");
        assert_eq!(rec.confidence(), 0.5);
        assert_eq!(rec.context_factors(), &["fallback"]);
        // first three discovered commands, minus /auto itself
        assert_eq!(rec.alternative_commands(), &["/feature", "/query"]);
        assert!(engine
            .get_multiple_recommendations("anything", &[], 3)
            .is_empty());
    }

    #[test]
    fn multiple_recommendations_are_ranked_and_capped() {
        let fx = Fixture::new(3);
        let engine = fx.engine();
        let recs = engine.get_multiple_recommendations("fix the bug, but why did it break?", &[], 2);
        assert!(!recs.is_empty() && recs.len() <= 2);
        assert_eq!(recs[0].command(), "/task");
        for pair in recs.windows(2) {
            assert!(pair[0].confidence() >= pair[1].confidence());
        }
    }

    #[test]
    fn positive_feedback_boosts_similar_contexts() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        let before = engine.get_routing_recommendation("Fix the login bug", &[]).confidence();

        assert!(engine.learn_from_feedback(task_feedback(5, 1)));
        let boosted = engine.get_routing_recommendation("Fix the login bug", &[]);
        let once = boosted.confidence();
        assert!((once - before * 1.1).abs() < 1e-9);
        assert_eq!(boosted.parameter_u64("learning_entries"), Some(1));

        assert!(engine.learn_from_feedback(task_feedback(4, 2)));
        let twice = engine.get_routing_recommendation("Fix the login bug", &[]).confidence();
        assert!((twice - before * 1.1 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn negative_feedback_decays_to_floor() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        for _ in 0..60 {
            engine.learn_from_feedback(task_feedback(1, 1));
        }
        let rec = engine.get_routing_recommendation("Fix the login bug", &[]);
        assert!((rec.confidence() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn neutral_and_dissimilar_feedback_is_ignored() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        let before = engine.get_routing_recommendation("Fix the login bug", &[]).confidence();
        engine.learn_from_feedback(task_feedback(3, 1));
        let mut far = task_feedback(5, 500);
        far.context.project_complexity = Complexity::Enterprise;
        engine.learn_from_feedback(far);
        let after = engine.get_routing_recommendation("Fix the login bug", &[]).confidence();
        assert_eq!(before, after);
    }

    #[test]
    fn boosted_confidence_is_capped() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        for _ in 0..50 {
            engine.learn_from_feedback(task_feedback(5, 1));
        }
        let rec = engine.get_routing_recommendation("Fix the login bug", &[]);
        assert_eq!(rec.confidence(), 1.0);
    }

    #[test]
    fn invalid_feedback_is_rejected() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        assert!(!engine.learn_from_feedback(task_feedback(0, 1)));
        assert!(!engine.learn_from_feedback(task_feedback(9, 1)));
        assert!(engine.feedback_history().is_empty());
        assert_eq!(engine.learning_stats().user_patterns, 0);
    }

    #[test]
    fn history_is_bounded() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        for i in 0..105u32 {
            let mut f = task_feedback(4, 1);
            f.user_input = format!("request {i}");
            engine.learn_from_feedback(f);
        }
        assert_eq!(engine.feedback_history().len(), 100);
        assert_eq!(engine.feedback_history()[0].feedback.user_input, "request 5");
    }

    #[test]
    fn stats_and_patterns() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        assert_eq!(engine.learning_stats().average_rating, None);

        engine.learn_from_feedback(task_feedback(5, 1));
        let mut other = task_feedback(2, 1);
        other.actual_command = "/query".to_string();
        engine.learn_from_feedback(other);

        let stats = engine.learning_stats();
        assert_eq!(stats.feedback_entries, 2);
        assert_eq!(stats.user_patterns, 1);
        assert_eq!(stats.average_rating, Some(3.5));
        assert_eq!(
            engine.suggested_commands("Fix the login bug"),
            &["/task", "/query"]
        );
        assert!(engine.suggested_commands("unknown").is_empty());
    }

    #[test]
    fn explanation_structure() {
        let fx = Fixture::new(1);
        let engine = fx.engine();
        let rec = engine.get_routing_recommendation("Fix the login bug", &[]);
        let ex = engine.explain_recommendation(&rec);
        assert_eq!(
            ex.decision_path,
            "Analyzed input 'Fix the login bug' with project context"
        );
        assert_eq!(ex.context_factors.file_count, 1);
        assert_eq!(ex.context_factors.project_complexity, "small");
        assert_eq!(ex.context_factors.detected_patterns, rec.context_factors());
        assert_eq!(ex.alternative_paths.len(), rec.alternative_commands().len());
        assert_eq!(ex.confidence_breakdown.base_confidence, 0.7);
        assert!((ex.confidence_breakdown.context_adjustments - (rec.confidence() - 0.7)).abs() < 1e-12);

        let bare = RoutingRecommendation::new("/task", 0.9, "r").unwrap();
        let ex = engine.explain_recommendation(&bare);
        assert_eq!(ex.decision_path, "Analyzed input 'N/A' with project context");
        assert_eq!(ex.context_factors.project_type, "unknown");
    }

    #[test]
    fn model_roundtrip() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        engine.learn_from_feedback(task_feedback(5, 1));
        let model_path = paths::model_path(fx.project.path());
        assert!(engine.save_model(&model_path));

        let mut fresh = fx.engine();
        assert!(fresh.load_model(&model_path));
        assert_eq!(fresh.feedback_history(), engine.feedback_history());
        assert_eq!(fresh.suggested_commands("Fix the login bug"), &["/task"]);
        assert_eq!(
            fresh.get_routing_recommendation("Fix the login bug", &[]),
            engine.get_routing_recommendation("Fix the login bug", &[])
        );
    }

    #[test]
    fn load_missing_or_malformed_model_keeps_state() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        engine.learn_from_feedback(task_feedback(5, 1));

        assert!(!engine.load_model(&fx.project.path().join("absent.json")));

        let bad = fx.project.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(!engine.load_model(&bad));
        assert_eq!(engine.feedback_history().len(), 1);
    }

    #[test]
    fn model_with_invalid_feedback_is_rejected() {
        let fx = Fixture::new(1);
        let mut engine = fx.engine();
        engine.learn_from_feedback(task_feedback(2, 1));
        let before = engine.get_routing_recommendation("Fix the login bug", &[]);

        let record = |rating: u32, actual: &str| {
            format!(
                r#"{{"user_input": "Fix the login bug", "recommended_command": "/task",
                    "actual_command": "{actual}", "user_rating": {rating},
                    "context": {{"file_count": 1, "project_complexity": "small"}},
                    "timestamp": "2024-01-01T00:00:00Z"}}"#
            )
        };
        let cases = [
            format!(r#"{{"feedback_history": [{}]}}"#, record(200, "/task")),
            format!(r#"{{"feedback_history": [{}]}}"#, record(5, "task")),
            r#"{"user_patterns": {"fix it": ["task"]}}"#.to_string(),
        ];
        for (i, body) in cases.iter().enumerate() {
            let path = fx.project.path().join(format!("model_{i}.json"));
            std::fs::write(&path, body).unwrap();
            assert!(!engine.load_model(&path), "case {i} was accepted");
        }

        assert_eq!(engine.feedback_history().len(), 1);
        assert_eq!(engine.learning_stats().average_rating, Some(2.0));
        assert_eq!(engine.get_routing_recommendation("Fix the login bug", &[]), before);
    }

    #[test]
    fn request_patterns_follow_history_limit() {
        let fx = Fixture::new(1);
        let config = RoutingConfig {
            history_limit: 3,
            ..RoutingConfig::default()
        };
        let mut engine = RoutingEngine::new(fx.framework.path(), fx.project.path(), config);

        for cmd in ["/task", "/query", "/feature", "/swarm", "/auto"] {
            let mut f = task_feedback(4, 1);
            f.actual_command = cmd.to_string();
            engine.learn_from_feedback(f);
        }
        assert_eq!(
            engine.suggested_commands("Fix the login bug"),
            &["/feature", "/swarm", "/auto"]
        );

        for i in 0..5 {
            let mut f = task_feedback(4, 1);
            f.user_input = format!("request {i}");
            engine.learn_from_feedback(f);
        }
        assert_eq!(engine.learning_stats().user_patterns, 3);
        assert!(engine.suggested_commands("Fix the login bug").is_empty());
        assert!(engine.suggested_commands("request 0").is_empty());
        assert_eq!(engine.suggested_commands("request 4"), &["/task"]);
    }

    #[test]
    fn partial_model_loads_with_defaults() {
        let fx = Fixture::new(1);
        let path = fx.project.path().join("model.json");
        std::fs::write(&path, r#"{"user_patterns": {"fix it": ["/task"]}}"#).unwrap();
        let mut engine = fx.engine();
        assert!(engine.load_model(&path));
        assert!(engine.feedback_history().is_empty());
        assert_eq!(engine.suggested_commands("fix it"), &["/task"]);
    }
}
