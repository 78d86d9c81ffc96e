use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ProjectType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    WebApplication,
    Api,
    Script,
    Library,
    #[default]
    Unknown,
}

impl ProjectType {
    pub fn all() -> &'static [ProjectType] {
        &[
            ProjectType::WebApplication,
            ProjectType::Api,
            ProjectType::Script,
            ProjectType::Library,
            ProjectType::Unknown,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::WebApplication => "web_application",
            ProjectType::Api => "api",
            ProjectType::Script => "script",
            ProjectType::Library => "library",
            ProjectType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectType {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web_application" | "web-application" => Ok(ProjectType::WebApplication),
            "api" => Ok(ProjectType::Api),
            "script" => Ok(ProjectType::Script),
            "library" => Ok(ProjectType::Library),
            "unknown" => Ok(ProjectType::Unknown),
            _ => Err(RouterError::InvalidValue {
                kind: "project type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Small,
    Medium,
    Large,
    Enterprise,
    /// Only seen on contexts built without a project analysis.
    #[default]
    Unknown,
}

impl Complexity {
    pub fn all() -> &'static [Complexity] {
        &[
            Complexity::Small,
            Complexity::Medium,
            Complexity::Large,
            Complexity::Enterprise,
            Complexity::Unknown,
        ]
    }

    /// Bucket a source-file count. Boundaries belong to the lower bucket.
    pub fn from_file_count(count: usize) -> Complexity {
        match count {
            0..=10 => Complexity::Small,
            11..=50 => Complexity::Medium,
            51..=200 => Complexity::Large,
            _ => Complexity::Enterprise,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Small => "small",
            Complexity::Medium => "medium",
            Complexity::Large => "large",
            Complexity::Enterprise => "enterprise",
            Complexity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Complexity::Small),
            "medium" => Ok(Complexity::Medium),
            "large" => Ok(Complexity::Large),
            "enterprise" => Ok(Complexity::Enterprise),
            "unknown" => Ok(Complexity::Unknown),
            _ => Err(RouterError::InvalidValue {
                kind: "complexity",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Analysis,
    Condition,
    Recommendation,
    Command,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Analysis => "analysis",
            NodeType::Condition => "condition",
            NodeType::Recommendation => "recommendation",
            NodeType::Command => "command",
        }
    }

    /// Node types allowed at the leaves of a decision graph.
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeType::Recommendation | NodeType::Command)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(NodeType::Analysis),
            "condition" => Ok(NodeType::Condition),
            "recommendation" => Ok(NodeType::Recommendation),
            "command" => Ok(NodeType::Command),
            _ => Err(RouterError::InvalidValue {
                kind: "node type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
