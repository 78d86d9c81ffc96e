use crate::error::{Result, RouterError};
use crate::recommendation::validate_command;
use crate::simulate::SimulationContext;
use crate::types::NodeType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Id of the single entry node of every decision graph.
pub const ROOT_ID: &str = "root";

// ---------------------------------------------------------------------------
// DecisionNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionNode {
    pub node_id: String,
    pub name: String,
    pub description: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub criteria: BTreeMap<String, String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Successor ids, filled in when the graph is built.
    #[serde(default)]
    pub outcomes: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl DecisionNode {
    pub fn new(
        node_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        node_type: NodeType,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            name: name.into(),
            description: description.into(),
            node_type,
            criteria: BTreeMap::new(),
            conditions: Vec::new(),
            outcomes: Vec::new(),
            confidence: 0.0,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_criteria(mut self, criteria: &[(&str, &str)]) -> Self {
        self.criteria = criteria
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn with_conditions(mut self, conditions: &[&str]) -> Self {
        self.conditions = conditions.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Command emitted when a walk ends here.
    pub fn with_command(mut self, command: &str) -> Self {
        self.metadata
            .insert("command".to_string(), command.to_string());
        self
    }

    pub fn command(&self) -> Option<&str> {
        self.metadata.get("command").map(String::as_str)
    }

    fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(RouterError::InvalidGraph("node id cannot be empty".to_string()));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(RouterError::InvalidGraph(format!(
                "node '{}' has confidence {} outside [0, 1]",
                self.node_id, self.confidence
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DecisionPath
// ---------------------------------------------------------------------------

/// Record of one walk through a decision graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPath {
    pub path_id: String,
    pub nodes: Vec<DecisionNode>,
    pub input_context: SimulationContext,
    pub final_recommendation: String,
    pub confidence_score: f64,
    pub reasoning: Vec<String>,
    pub alternatives: Vec<String>,
    /// Wall-clock seconds spent walking.
    pub execution_time: f64,
}

impl DecisionPath {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nodes: Vec<DecisionNode>,
        input_context: SimulationContext,
        final_recommendation: impl Into<String>,
        confidence_score: f64,
        reasoning: Vec<String>,
        alternatives: Vec<String>,
        execution_time: f64,
    ) -> Result<Self> {
        let final_recommendation = final_recommendation.into();
        validate_command(&final_recommendation)
            .map_err(|e| RouterError::InvalidPath(e.to_string()))?;
        if !confidence_score.is_finite() || !(0.0..=1.0).contains(&confidence_score) {
            return Err(RouterError::InvalidPath(format!(
                "confidence_score must be between 0 and 1, got {confidence_score}"
            )));
        }
        if reasoning.is_empty() {
            return Err(RouterError::InvalidPath("reasoning cannot be empty".to_string()));
        }
        if !execution_time.is_finite() || execution_time < 0.0 {
            return Err(RouterError::InvalidPath(format!(
                "execution_time must be non-negative, got {execution_time}"
            )));
        }
        Ok(Self {
            path_id: uuid::Uuid::new_v4().to_string(),
            nodes,
            input_context,
            final_recommendation,
            confidence_score,
            reasoning,
            alternatives,
            execution_time,
        })
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.node_id.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// DecisionGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Default)]
pub struct DecisionGraphBuilder {
    nodes: Vec<DecisionNode>,
    edges: Vec<GraphEdge>,
}

impl DecisionGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, node: DecisionNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str, condition: Option<&str>) -> Self {
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            condition: condition.map(str::to_string),
        });
        self
    }

    /// Validate and freeze the graph. It must be a single-rooted DAG whose
    /// root is [`ROOT_ID`] and whose leaves are all terminal nodes, with every
    /// recommendation leaf naming its command.
    pub fn build(self) -> Result<DecisionGraph> {
        let Self { mut nodes, edges } = self;
        if nodes.is_empty() {
            return Err(RouterError::InvalidGraph("graph has no nodes".to_string()));
        }

        let mut index: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            node.validate()?;
            if index.insert(node.node_id.clone(), i).is_some() {
                return Err(RouterError::InvalidGraph(format!(
                    "duplicate node id '{}'",
                    node.node_id
                )));
            }
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut in_degree: Vec<usize> = vec![0; nodes.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for edge in &edges {
            let lookup = |id: &str| {
                index.get(id).copied().ok_or_else(|| {
                    RouterError::InvalidGraph(format!("edge references unknown node '{id}'"))
                })
            };
            let from = lookup(&edge.from)?;
            let to = lookup(&edge.to)?;
            if !seen.insert((from, to)) {
                return Err(RouterError::InvalidGraph(format!(
                    "duplicate edge '{}' -> '{}'",
                    edge.from, edge.to
                )));
            }
            successors[from].push(to);
            in_degree[to] += 1;
        }

        let sources: Vec<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        match sources.as_slice() {
            [only] if nodes[*only].node_id == ROOT_ID => {}
            [only] => {
                return Err(RouterError::InvalidGraph(format!(
                    "entry node must be '{ROOT_ID}', found '{}'",
                    nodes[*only].node_id
                )))
            }
            [] => return Err(RouterError::InvalidGraph("graph has no entry node".to_string())),
            many => {
                let ids: Vec<&str> = many.iter().map(|&i| nodes[i].node_id.as_str()).collect();
                return Err(RouterError::InvalidGraph(format!(
                    "graph has {} entry nodes: {}",
                    ids.len(),
                    ids.join(", ")
                )));
            }
        }

        let order = kahn_order(&successors, &in_degree);
        if order.len() < nodes.len() {
            let placed: HashSet<usize> = order.iter().copied().collect();
            let cycled: Vec<&str> = (0..nodes.len())
                .filter(|i| !placed.contains(i))
                .map(|i| nodes[i].node_id.as_str())
                .collect();
            return Err(RouterError::InvalidGraph(format!(
                "cycle detected among nodes: {}",
                cycled.join(", ")
            )));
        }
        // One source plus no cycles means every node is reachable from root.

        for (i, node) in nodes.iter().enumerate() {
            if !successors[i].is_empty() {
                continue;
            }
            if !node.node_type.is_terminal() {
                return Err(RouterError::InvalidGraph(format!(
                    "leaf '{}' is a {} node",
                    node.node_id, node.node_type
                )));
            }
            if node.node_type == NodeType::Recommendation {
                let command = node.command().ok_or_else(|| {
                    RouterError::InvalidGraph(format!(
                        "recommendation '{}' has no command",
                        node.node_id
                    ))
                })?;
                validate_command(command).map_err(|e| {
                    RouterError::InvalidGraph(format!("node '{}': {e}", node.node_id))
                })?;
            }
        }

        let outcomes: Vec<Vec<String>> = successors
            .iter()
            .map(|succ| succ.iter().map(|&s| nodes[s].node_id.clone()).collect())
            .collect();
        for (node, out) in nodes.iter_mut().zip(outcomes) {
            node.outcomes = out;
        }

        Ok(DecisionGraph {
            nodes,
            edges,
            index,
            successors,
            in_degree,
            order,
        })
    }
}

/// Topological order by Kahn's algorithm. Shorter than the node count when
/// the graph has a cycle.
fn kahn_order(successors: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
    let mut remaining = in_degree.to_vec();
    let mut queue: VecDeque<usize> = (0..remaining.len()).filter(|&i| remaining[i] == 0).collect();
    let mut order = Vec::with_capacity(remaining.len());
    while let Some(i) = queue.pop_front() {
        order.push(i);
        for &next in &successors[i] {
            remaining[next] -= 1;
            if remaining[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    order
}

/// Immutable, validated decision graph.
#[derive(Debug, Clone)]
pub struct DecisionGraph {
    nodes: Vec<DecisionNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
    order: Vec<usize>,
}

impl DecisionGraph {
    pub fn node(&self, id: &str) -> Option<&DecisionNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[DecisionNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Successor ids in edge insertion order. Unknown ids have none.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.index
            .get(id)
            .map(|&i| {
                self.successors[i]
                    .iter()
                    .map(|&s| self.nodes[s].node_id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Outgoing edges of `id`, in insertion order.
    pub fn outgoing(&self, id: &str) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.from == id).collect()
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&i| self.in_degree[i])
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&i| self.successors[i].len())
    }

    pub fn roots(&self) -> Vec<&str> {
        self.ids_where(|i| self.in_degree[i] == 0)
    }

    pub fn leaves(&self) -> Vec<&str> {
        self.ids_where(|i| self.successors[i].is_empty())
    }

    pub fn topological_order(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&i| self.nodes[i].node_id.as_str())
            .collect()
    }

    fn ids_where(&self, pred: impl Fn(usize) -> bool) -> Vec<&str> {
        (0..self.nodes.len())
            .filter(|&i| pred(i))
            .map(|i| self.nodes[i].node_id.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Default routing graph
// ---------------------------------------------------------------------------

fn analysis(id: &str, name: &str, description: &str) -> DecisionNode {
    DecisionNode::new(id, name, description, NodeType::Analysis)
}

fn condition(id: &str, name: &str, description: &str) -> DecisionNode {
    DecisionNode::new(id, name, description, NodeType::Condition)
}

fn recommend(id: &str, command: &str, description: &str) -> DecisionNode {
    DecisionNode::new(id, format!("{command} Command"), description, NodeType::Recommendation)
        .with_command(command)
}

/// The static routing graph walked by the simulator.
pub fn default_graph() -> Result<DecisionGraph> {
    DecisionGraphBuilder::new()
        .add_node(
            analysis("root", "Input Analysis", "Analyze user request and context")
                .with_criteria(&[("input_length", "any"), ("clarity", "any")])
                .with_confidence(1.0),
        )
        .add_node(
            condition(
                "complexity_check",
                "Complexity Assessment",
                "Determine request complexity and scope",
            )
            .with_criteria(&[("lines_of_code", "estimate"), ("file_count", "estimate")])
            .with_conditions(&["simple", "moderate", "complex"])
            .with_confidence(0.9),
        )
        .add_node(
            analysis(
                "simple_analysis",
                "Simple Request Analysis",
                "Handle straightforward, single-file requests",
            )
            .with_criteria(&[("file_scope", "single"), ("changes", "minimal")])
            .with_confidence(0.85),
        )
        .add_node(
            recommend(
                "task_recommendation",
                "/task",
                "Recommend /task for focused, single-component work",
            )
            .with_criteria(&[("scope", "single_file"), ("complexity", "low")])
            .with_confidence(0.9),
        )
        .add_node(
            analysis("scope_analysis", "Scope Analysis", "Analyze request scope and requirements")
                .with_criteria(&[("research_needed", "bool"), ("feature_scope", "size")])
                .with_confidence(0.8),
        )
        .add_node(
            condition(
                "research_check",
                "Research Required?",
                "Check if research or understanding is needed",
            )
            .with_criteria(&[("unknown_codebase", "bool"), ("documentation_needed", "bool")])
            .with_conditions(&["yes", "no"])
            .with_confidence(0.85),
        )
        .add_node(
            recommend(
                "query_recommendation",
                "/query",
                "Recommend /query for research and analysis",
            )
            .with_criteria(&[("purpose", "research"), ("modifications", "none")])
            .with_confidence(0.9),
        )
        .add_node(
            condition(
                "feature_check",
                "Feature Development?",
                "Check if this is new feature development",
            )
            .with_criteria(&[("new_functionality", "bool"), ("requirements", "clear")])
            .with_conditions(&["yes", "no"])
            .with_confidence(0.8),
        )
        .add_node(
            recommend(
                "feature_recommendation",
                "/feature",
                "Recommend /feature for new functionality",
            )
            .with_criteria(&[("scope", "feature"), ("requirements", "defined")])
            .with_confidence(0.85),
        )
        .add_node(
            condition(
                "multi_component_check",
                "Multi-Component Work?",
                "Check if work spans multiple components",
            )
            .with_criteria(&[("components", "multiple"), ("coordination", "required")])
            .with_conditions(&["yes", "no"])
            .with_confidence(0.8),
        )
        .add_node(
            recommend(
                "swarm_recommendation",
                "/swarm",
                "Recommend /swarm for coordinated multi-component work",
            )
            .with_criteria(&[("coordination", "required"), ("parallel_work", "beneficial")])
            .with_confidence(0.8),
        )
        .add_node(
            analysis(
                "complexity_analysis",
                "Complex Request Analysis",
                "Handle complex, multi-faceted requests",
            )
            .with_criteria(&[("uncertainty", "high"), ("coordination", "complex")])
            .with_confidence(0.7),
        )
        .add_node(
            condition(
                "session_check",
                "Long-Running Work?",
                "Check if work requires session management",
            )
            .with_criteria(&[("duration", "long"), ("context_preservation", "important")])
            .with_conditions(&["yes", "no"])
            .with_confidence(0.75),
        )
        .add_node(
            recommend(
                "session_recommendation",
                "/session",
                "Recommend /session for long-running work",
            )
            .with_criteria(&[("duration", "extended"), ("context", "critical")])
            .with_confidence(0.8),
        )
        .add_node(
            condition(
                "production_check",
                "Production Work?",
                "Check if work involves production systems",
            )
            .with_criteria(&[("production_impact", "bool"), ("safety_critical", "bool")])
            .with_conditions(&["yes", "no"])
            .with_confidence(0.9),
        )
        .add_node(
            recommend(
                "protocol_recommendation",
                "/protocol",
                "Recommend /protocol for production-critical work",
            )
            .with_criteria(&[("safety", "critical"), ("validation", "required")])
            .with_confidence(0.95),
        )
        .add_node(
            DecisionNode::new(
                "auto_fallback",
                "Default Routing",
                "Fallback to intelligent routing analysis",
                NodeType::Recommendation,
            )
            .with_criteria(&[("fallback", "true")])
            .with_confidence(0.6)
            .with_command("/auto"),
        )
        .add_edge("root", "complexity_check", None)
        .add_edge("complexity_check", "simple_analysis", Some("simple"))
        .add_edge("simple_analysis", "task_recommendation", None)
        .add_edge("complexity_check", "scope_analysis", Some("moderate"))
        .add_edge("scope_analysis", "research_check", None)
        .add_edge("research_check", "query_recommendation", Some("yes"))
        .add_edge("research_check", "feature_check", Some("no"))
        .add_edge("feature_check", "feature_recommendation", Some("yes"))
        .add_edge("feature_check", "multi_component_check", Some("no"))
        .add_edge("multi_component_check", "swarm_recommendation", Some("yes"))
        .add_edge("complexity_check", "complexity_analysis", Some("complex"))
        .add_edge("complexity_analysis", "session_check", None)
        .add_edge("session_check", "session_recommendation", Some("yes"))
        .add_edge("session_check", "production_check", Some("no"))
        .add_edge("multi_component_check", "production_check", Some("no"))
        .add_edge("production_check", "protocol_recommendation", Some("yes"))
        .add_edge("production_check", "auto_fallback", Some("no"))
        .build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
