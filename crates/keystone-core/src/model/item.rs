use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle status of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
        }
    }
}

/// How one work item relates to another.
///
/// Only [`DependencyKind::Blocks`] ("A cannot start until B is done")
/// contributes an edge to the dependency graph. The informational kinds are
/// carried so records round-trip, but the analytics ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    #[default]
    #[serde(alias = "depends-on", alias = "depends_on", alias = "blocked_by")]
    Blocks,
    Related,
    #[serde(alias = "parent_child")]
    ParentChild,
    #[serde(alias = "discovered_from")]
    DiscoveredFrom,
    /// Any tag this build does not know about.
    #[serde(other)]
    Other,
}

impl DependencyKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Related => "related",
            Self::ParentChild => "parent-child",
            Self::DiscoveredFrom => "discovered-from",
            Self::Other => "other",
        }
    }

    /// Returns `true` if this kind produces a "depends on" edge.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Blocks)
    }
}

/// One declared dependency of a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The item this one depends on (the prerequisite).
    #[serde(alias = "depends_on")]
    pub depends_on_id: String,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: DependencyKind,
}

impl Dependency {
    /// A blocking dependency on `depends_on_id`.
    #[must_use]
    pub fn blocks(depends_on_id: impl Into<String>) -> Self {
        Self {
            depends_on_id: depends_on_id.into(),
            kind: DependencyKind::Blocks,
        }
    }

    /// A dependency of an arbitrary kind.
    #[must_use]
    pub fn new(depends_on_id: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            depends_on_id: depends_on_id.into(),
            kind,
        }
    }
}

/// A work item as consumed by the analytics engine.
///
/// Only `id` and `dependencies` matter to the graph; the rest is carried for
/// reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub dependencies: Vec<Dependency>,
}

impl WorkItem {
    /// An open item with no title and no dependencies.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Builder-style: add a blocking dependency on `depends_on_id`.
    #[must_use]
    pub fn depends_on(mut self, depends_on_id: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::blocks(depends_on_id));
        self
    }

    /// Builder-style: add a dependency of any kind.
    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Iterate the ids this item is blocked by.
    pub fn blocking_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| d.kind.is_blocking())
            .map(|d| d.depends_on_id.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('_', "-")
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "open" => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for DependencyKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "blocks" | "depends-on" | "blocked-by" => Ok(Self::Blocks),
            "related" => Ok(Self::Related),
            "parent-child" => Ok(Self::ParentChild),
            "discovered-from" => Ok(Self::DiscoveredFrom),
            _ => Err(ParseEnumError {
                expected: "dependency kind",
                got: s.to_string(),
            }),
        }
    }
}
