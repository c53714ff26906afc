use euclid::default::{Point2D, Vector2D};
use std::collections::HashMap;
use sustaingraph_core::{NodeId, NodeKind, Snapshot, SnapshotEdge, SnapshotNode};

use crate::oracle::MAX_SCORE;

pub type Position = Point2D<f64>;
pub type Velocity = Vector2D<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub family: Option<String>,
    pub position: Position,
    pub velocity: Velocity,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: u32,
    pub score: u32,
    pub(crate) source_ix: usize,
    pub(crate) target_ix: usize,
}

impl Edge {
    pub fn endpoints(&self) -> (usize, usize) {
        (self.source_ix, self.target_ix)
    }
}

/// `max(1, round(score / 20))`, rounding halves up. Scores above 100 count
/// as 100.
pub fn edge_weight(score: u32) -> u32 {
    ((score.min(MAX_SCORE) + 10) / 20).max(1)
}

/// Node arena plus an id index, so edge endpoints resolve in O(1).
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing any node with the same id in place.
    pub fn upsert_node(&mut self, node: Node) -> usize {
        if let Some(&ix) = self.index.get(&node.id) {
            self.nodes[ix] = node;
            return ix;
        }
        let ix = self.nodes.len();
        self.index.insert(node.id.clone(), ix);
        self.nodes.push(node);
        ix
    }

    /// Adds `source -> target` with `score` capped at 100. Returns false (and
    /// adds nothing) when either endpoint is unknown.
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId, score: u32) -> bool {
        let (Some(&source_ix), Some(&target_ix)) = (self.index.get(source), self.index.get(target))
        else {
            return false;
        };
        let score = score.min(MAX_SCORE);
        self.edges.push(Edge {
            source: source.clone(),
            target: target.clone(),
            weight: edge_weight(score),
            score,
            source_ix,
            target_ix,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|ix| &self.nodes[ix])
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let ix = self.index_of(id)?;
        Some(&mut self.nodes[ix])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn degree(&self, id: &NodeId) -> usize {
        let Some(ix) = self.index_of(id) else {
            return 0;
        };
        self.edges
            .iter()
            .filter(|e| e.source_ix == ix || e.target_ix == ix)
            .count()
    }

    pub fn neighbors<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a NodeId> + 'a {
        let ix = self.index_of(id);
        self.edges.iter().filter_map(move |e| match ix {
            Some(ix) if e.source_ix == ix => Some(&e.target),
            Some(ix) if e.target_ix == ix => Some(&e.source),
            _ => None,
        })
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.nodes.iter().map(|n| n.velocity.square_length()).sum()
    }

    pub fn to_snapshot(&self, tick: u64) -> Snapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|n| SnapshotNode {
                id: n.id.clone(),
                kind: n.kind,
                label: n.label.clone(),
                title: n.title.clone(),
                keywords: n.keywords.clone(),
                family: n.family.clone(),
                x: n.position.x,
                y: n.position.y,
                pinned: n.pinned,
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|e| SnapshotEdge {
                source: e.source.clone(),
                target: e.target.clone(),
                weight: e.weight,
                score: e.score,
            })
            .collect();
        Snapshot { tick, nodes, edges }
    }
}
