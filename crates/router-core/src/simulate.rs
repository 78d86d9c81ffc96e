use crate::error::{Result, RouterError};
use crate::tree::{default_graph, DecisionGraph, DecisionNode, DecisionPath, ROOT_ID};
use crate::types::NodeType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

const FALLBACK_COMMAND: &str = "/auto";
const FALLBACK_CONFIDENCE: f64 = 0.5;
const MAX_ALTERNATIVES: usize = 3;

// ---------------------------------------------------------------------------
// SimulationContext
// ---------------------------------------------------------------------------

/// Input to a graph walk. Every field is optional; absent numbers and
/// flags count as zero and false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_estimate: Option<i64>,
    /// Free-form label (`simple`, `moderate`, `complex`); informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_needed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_impact: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_functionality: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordination_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_critical: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl SimulationContext {
    /// File count with negatives clamped to 0.
    pub fn files(&self) -> u64 {
        self.file_count.unwrap_or(0).max(0) as u64
    }

    /// Line estimate with negatives clamped to 0.
    pub fn lines(&self) -> u64 {
        self.lines_estimate.unwrap_or(0).max(0) as u64
    }

    pub fn research_needed(&self) -> bool {
        self.research_needed.unwrap_or(false)
    }

    pub fn new_functionality(&self) -> bool {
        self.new_functionality.unwrap_or(false)
    }

    pub fn coordination_required(&self) -> bool {
        self.coordination_required.unwrap_or(false)
    }

    pub fn production_impact(&self) -> bool {
        self.production_impact.unwrap_or(false)
    }

    pub fn safety_critical(&self) -> bool {
        self.safety_critical.unwrap_or(false)
    }

    pub fn is_extended(&self) -> bool {
        self.duration.as_deref() == Some("extended")
    }
}

// ---------------------------------------------------------------------------
// Branch conditions
// ---------------------------------------------------------------------------

/// Label of the outgoing edge to follow from a branching node, or `None`
/// when the node has no named condition.
fn branch_label(node_id: &str, ctx: &SimulationContext) -> Option<&'static str> {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    match node_id {
        "complexity_check" => {
            let (lines, files) = (ctx.lines(), ctx.files());
            Some(if lines < 100 && files <= 1 {
                "simple"
            } else if lines < 500 && files <= 5 {
                "moderate"
            } else {
                "complex"
            })
        }
        "research_check" => Some(yes_no(ctx.research_needed())),
        "feature_check" => Some(yes_no(ctx.new_functionality())),
        "multi_component_check" => {
            Some(yes_no(ctx.coordination_required() || ctx.files() > 10))
        }
        "session_check" => Some(yes_no(ctx.is_extended())),
        "production_check" => Some(yes_no(ctx.production_impact() || ctx.safety_critical())),
        _ => None,
    }
}

/// Context-driven alternatives to `primary`, at most three, always ending
/// with `/auto` unless it is the primary.
pub fn generate_alternatives(ctx: &SimulationContext, primary: &str) -> Vec<String> {
    let candidates = [
        (ctx.research_needed(), "/query"),
        (ctx.new_functionality(), "/feature"),
        (ctx.coordination_required(), "/swarm"),
        (ctx.production_impact() || ctx.safety_critical(), "/protocol"),
        (true, FALLBACK_COMMAND),
    ];
    candidates
        .iter()
        .filter(|(applies, cmd)| *applies && *cmd != primary)
        .map(|(_, cmd)| cmd.to_string())
        .take(MAX_ALTERNATIVES)
        .collect()
}

// ---------------------------------------------------------------------------
// DecisionSimulator
// ---------------------------------------------------------------------------

/// Walks a [`DecisionGraph`] for a [`SimulationContext`].
#[derive(Debug, Clone)]
pub struct DecisionSimulator {
    graph: DecisionGraph,
}

impl DecisionSimulator {
    /// Simulator over [`default_graph`].
    pub fn new() -> Result<Self> {
        Ok(Self {
            graph: default_graph()?,
        })
    }

    pub fn with_graph(graph: DecisionGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &DecisionGraph {
        &self.graph
    }

    /// Walk from the root to a leaf. Branching nodes follow the edge whose
    /// condition matches their named check, or the first edge otherwise.
    /// Ending anywhere but a recommendation node yields `/auto` at 0.5.
    pub fn simulate_routing_decision(&self, ctx: &SimulationContext) -> DecisionPath {
        let started = Instant::now();
        let mut visited: Vec<DecisionNode> = Vec::new();
        let mut reasoning: Vec<String> = Vec::new();
        let mut current = self.graph.node(ROOT_ID);

        while let Some(node) = current {
            visited.push(node.clone());
            reasoning.push(format!("{}: {}", node.name, node.description));

            let outgoing = self.graph.outgoing(&node.node_id);
            let next = match outgoing.as_slice() {
                [] => None,
                [only] => Some(*only),
                many => {
                    let label = branch_label(&node.node_id, ctx);
                    many.iter()
                        .find(|e| label.is_some() && e.condition.as_deref() == label)
                        .or_else(|| many.first())
                        .copied()
                }
            };
            current = next.and_then(|edge| self.graph.node(&edge.to));
        }

        let (command, confidence) = match visited.last() {
            Some(last) if last.node_type == NodeType::Recommendation => (
                last.command().unwrap_or(FALLBACK_COMMAND).to_string(),
                last.confidence,
            ),
            _ => (FALLBACK_COMMAND.to_string(), FALLBACK_CONFIDENCE),
        };
        if reasoning.is_empty() {
            reasoning.push("No entry node; using default routing".to_string());
        }
        let alternatives = generate_alternatives(ctx, &command);

        tracing::debug!(
            command = %command,
            confidence,
            steps = visited.len(),
            "decision graph walked"
        );

        // Graph validation guarantees the command and confidence invariants.
        DecisionPath {
            path_id: uuid::Uuid::new_v4().to_string(),
            nodes: visited,
            input_context: ctx.clone(),
            final_recommendation: command,
            confidence_score: confidence,
            reasoning,
            alternatives,
            execution_time: started.elapsed().as_secs_f64(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample scenarios
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub context: SimulationContext,
    /// Command the scenario is meant to illustrate. The walk may disagree
    /// when the inputs straddle a threshold.
    pub expected_command: String,
}

fn scenario(
    name: &str,
    description: &str,
    expected: &str,
    context: SimulationContext,
) -> Scenario {
    Scenario {
        name: name.to_string(),
        description: description.to_string(),
        context,
        expected_command: expected.to_string(),
    }
}

/// Reference inputs covering every recommendation branch.
pub fn sample_scenarios() -> Vec<Scenario> {
    vec![
        scenario(
            "Simple Bug Fix",
            "Fix a small bug in user authentication",
            "/task",
            SimulationContext {
                request: Some("Fix the login validation issue".into()),
                file_count: Some(1),
                lines_estimate: Some(10),
                complexity: Some("simple".into()),
                research_needed: Some(false),
                production_impact: Some(false),
                ..SimulationContext::default()
            },
        ),
        scenario(
            "New Feature Development",
            "Add user profile management feature",
            "/feature",
            SimulationContext {
                request: Some("Implement user profile management with avatar upload".into()),
                file_count: Some(5),
                lines_estimate: Some(200),
                complexity: Some("moderate".into()),
                research_needed: Some(false),
                production_impact: Some(true),
                new_functionality: Some(true),
                ..SimulationContext::default()
            },
        ),
        scenario(
            "Codebase Research",
            "Understand existing authentication system",
            "/query",
            SimulationContext {
                request: Some("Help me understand how the current auth system works".into()),
                file_count: Some(2),
                lines_estimate: Some(150),
                complexity: Some("moderate".into()),
                research_needed: Some(true),
                production_impact: Some(false),
                ..SimulationContext::default()
            },
        ),
        scenario(
            "Multi-Component Refactor",
            "Refactor authentication across multiple services",
            "/swarm",
            SimulationContext {
                request: Some("Refactor authentication to use JWT across all services".into()),
                file_count: Some(5),
                lines_estimate: Some(400),
                complexity: Some("moderate".into()),
                research_needed: Some(false),
                production_impact: Some(true),
                coordination_required: Some(true),
                ..SimulationContext::default()
            },
        ),
        scenario(
            "Production Deployment",
            "Deploy security updates to production",
            "/protocol",
            SimulationContext {
                request: Some("Deploy the security patches to production safely".into()),
                file_count: Some(3),
                lines_estimate: Some(50),
                complexity: Some("moderate".into()),
                research_needed: Some(false),
                production_impact: Some(true),
                safety_critical: Some(true),
                ..SimulationContext::default()
            },
        ),
        scenario(
            "Long-Running Project",
            "Migrate database schema with extensive testing",
            "/session",
            SimulationContext {
                request: Some("Migrate to new database schema with comprehensive testing".into()),
                file_count: Some(20),
                lines_estimate: Some(800),
                complexity: Some("complex".into()),
                research_needed: Some(true),
                production_impact: Some(true),
                duration: Some("extended".into()),
                ..SimulationContext::default()
            },
        ),
    ]
}

// ---------------------------------------------------------------------------
// Questionnaire
// ---------------------------------------------------------------------------

/// Declares a questionnaire answer enum with slug parsing and a prompt label.
macro_rules! answer_enum {
    ($name:ident, $kind:literal { $($variant:ident => $slug:literal, $label:literal;)+ }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn all() -> &'static [$name] {
                &[$($name::$variant,)+]
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $slug,)+
                }
            }

            /// Answer text as shown to the user.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = RouterError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($slug => Ok($name::$variant),)+
                    _ => Err(RouterError::InvalidValue {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

answer_enum!(Purpose, "purpose" {
    FixBug => "fix-bug", "Fix a bug";
    AddFeature => "add-feature", "Add new feature";
    UnderstandCode => "understand-code", "Understand existing code";
    Refactor => "refactor", "Refactor code";
    Deploy => "deploy", "Deploy to production";
    Other => "other", "Other";
});

answer_enum!(FileScope, "file scope" {
    One => "one", "1 file";
    Few => "few", "2-5 files";
    Several => "several", "6-10 files";
    Many => "many", "More than 10 files";
    NotSure => "not-sure", "Not sure";
});

answer_enum!(Understanding, "understanding" {
    Clear => "clear", "Yes, I know exactly what to do";
    NeedsClarification => "needs-clarification", "Mostly, but need some clarification";
    NeedsResearch => "needs-research", "No, I need to research first";
});

answer_enum!(Criticality, "criticality" {
    Development => "development", "No, development only";
    LowRisk => "low-risk", "Yes, but low risk";
    HighRisk => "high-risk", "Yes, high risk";
    SafetyCritical => "safety-critical", "Yes, safety critical";
});

answer_enum!(Duration, "duration" {
    Quick => "quick", "Quick (< 1 hour)";
    Medium => "medium", "Medium (1-4 hours)";
    Long => "long", "Long (> 4 hours)";
    MultiDay => "multi-day", "Multiple days";
});

/// Answers to the five guided questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub purpose: Purpose,
    pub file_scope: FileScope,
    pub understanding: Understanding,
    pub criticality: Criticality,
    pub duration: Duration,
}

/// Translate questionnaire answers into a simulation input. Later answers
/// override earlier ones where they touch the same field.
pub fn map_answers_to_context(answers: &Questionnaire) -> SimulationContext {
    let mut ctx = SimulationContext::default();

    match answers.purpose {
        Purpose::FixBug => {
            ctx.complexity = Some("simple".into());
            ctx.new_functionality = Some(false);
        }
        Purpose::AddFeature => {
            ctx.complexity = Some("moderate".into());
            ctx.new_functionality = Some(true);
        }
        Purpose::UnderstandCode => {
            ctx.research_needed = Some(true);
            ctx.complexity = Some("simple".into());
        }
        Purpose::Refactor => {
            ctx.complexity = Some("moderate".into());
            ctx.coordination_required = Some(true);
        }
        Purpose::Deploy => {
            ctx.production_impact = Some(true);
            ctx.safety_critical = Some(true);
        }
        Purpose::Other => {}
    }

    let scope = match answers.file_scope {
        FileScope::One => Some((1, 50, false)),
        FileScope::Few => Some((3, 150, false)),
        FileScope::Several => Some((8, 300, true)),
        FileScope::Many => Some((15, 500, true)),
        FileScope::NotSure => None,
    };
    if let Some((files, lines, coordination)) = scope {
        ctx.file_count = Some(files);
        ctx.lines_estimate = Some(lines);
        if coordination {
            ctx.coordination_required = Some(true);
        }
    }

    match answers.understanding {
        Understanding::NeedsResearch => ctx.research_needed = Some(true),
        Understanding::NeedsClarification => {
            ctx.research_needed = Some(false);
            ctx.complexity = Some("moderate".into());
        }
        Understanding::Clear => {}
    }

    match answers.criticality {
        Criticality::Development => {}
        Criticality::LowRisk | Criticality::HighRisk => ctx.production_impact = Some(true),
        Criticality::SafetyCritical => {
            ctx.production_impact = Some(true);
            ctx.safety_critical = Some(true);
        }
    }

    ctx.duration = Some(
        match answers.duration {
            Duration::Quick => "short",
            Duration::Medium | Duration::Long => "medium",
            Duration::MultiDay => "extended",
        }
        .to_string(),
    );

    ctx
}

// ---------------------------------------------------------------------------
// PathAnalysis
// ---------------------------------------------------------------------------

/// Aggregate view over a batch of simulated paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathAnalysis {
    pub total_paths: usize,
    pub recommendation_counts: BTreeMap<String, usize>,
    pub node_visits: BTreeMap<String, usize>,
    pub min_confidence: f64,
    pub mean_confidence: f64,
    pub max_confidence: f64,
}

impl PathAnalysis {
    pub fn from_paths(paths: &[DecisionPath]) -> Self {
        if paths.is_empty() {
            return Self::default();
        }
        let mut analysis = Self {
            total_paths: paths.len(),
            min_confidence: f64::INFINITY,
            max_confidence: f64::NEG_INFINITY,
            ..Self::default()
        };
        let mut sum = 0.0;
        for path in paths {
            *analysis
                .recommendation_counts
                .entry(path.final_recommendation.clone())
                .or_insert(0) += 1;
            for node in &path.nodes {
                *analysis.node_visits.entry(node.node_id.clone()).or_insert(0) += 1;
            }
            analysis.min_confidence = analysis.min_confidence.min(path.confidence_score);
            analysis.max_confidence = analysis.max_confidence.max(path.confidence_score);
            sum += path.confidence_score;
        }
        analysis.mean_confidence = sum / paths.len() as f64;
        analysis
    }

    /// Most frequent final command; ties go to the lexically smallest.
    pub fn most_common_recommendation(&self) -> Option<&str> {
        self.recommendation_counts
            .iter()
            .fold(None, |best: Option<(&String, usize)>, (cmd, &n)| match best {
                Some((_, b)) if b >= n => best,
                _ => Some((cmd, n)),
            })
            .map(|(cmd, _)| cmd.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
