use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn local(entity_id: &str) -> Self {
        Self(format!("local:{entity_id}"))
    }

    pub fn global(entity_id: &str) -> Self {
        Self(format!("global:{entity_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Local,
    Global,
}

/// A regulation-like entity carrying the keywords it is matched on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalEntity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A standard item; its topic is what local keywords are scored against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalEntity {
    pub id: String,
    pub topic: String,
}

/// Global entities grouped by standard family ("GRI", "ISSB", ...).
pub type StandardCatalog = BTreeMap<String, Vec<GlobalEntity>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    pub x: f64,
    pub y: f64,
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: u32,
    pub score: u32,
}

/// Renderer-facing copy of the layout at a tick boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
}

impl Snapshot {
    pub fn node(&self, id: &NodeId) -> Option<&SnapshotNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Hit test in layout space. Later nodes are drawn on top, so they win.
    pub fn node_at(&self, x: f64, y: f64, radius: f64) -> Option<&SnapshotNode> {
        let r2 = radius * radius;
        self.nodes.iter().rev().find(|n| {
            let (dx, dy) = (n.x - x, n.y - y);
            dx * dx + dy * dy <= r2
        })
    }

    pub fn edges_for(&self, id: &NodeId) -> impl Iterator<Item = &SnapshotEdge> + '_ {
        let id = id.clone();
        self.edges
            .iter()
            .filter(move |e| e.source == id || e.target == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    Start,
    Stop,
    Rebuild {
        threshold: f64,
    },
    Reload {
        locals: Vec<LocalEntity>,
        standards: StandardCatalog,
        threshold: f64,
    },
    Pin {
        id: NodeId,
        x: f64,
        y: f64,
    },
    Unpin {
        id: NodeId,
    },
    ApplyViewTransform {
        scale: f64,
        origin_x: f64,
        origin_y: f64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Rebuild { .. } => "rebuild",
            Command::Reload { .. } => "reload",
            Command::Pin { .. } => "pin",
            Command::Unpin { .. } => "unpin",
            Command::ApplyViewTransform { .. } => "apply_view_transform",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Msg {
    Hello { version: String },
    RequestSnapshot,
    Snapshot { snapshot: Snapshot },
    Command { command: Command },
    Error { message: String },
    Ping,
    Pong,
}
