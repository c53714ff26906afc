use euclid::default::{Point2D, Vector2D};
use rand::Rng;
use std::collections::HashMap;
use sustaingraph_core::{GlobalEntity, LocalEntity, NodeId, NodeKind, StandardCatalog};

use crate::error::LayoutError;
use crate::graph::model::{Graph, Node, Position};
use crate::oracle::{SimilarityOracle, MAX_SCORE};
use crate::util::config::{LayoutConfig, Rect};

/// Validated builder input, held in canonical order: locals by id, globals
/// by (family, id). Building from it never depends on how the caller
/// ordered the source collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySet {
    locals: Vec<LocalEntity>,
    globals: Vec<(String, GlobalEntity)>,
}

impl EntitySet {
    pub fn new(mut locals: Vec<LocalEntity>, standards: StandardCatalog) -> Result<Self, LayoutError> {
        locals.sort_by(|a, b| a.id.cmp(&b.id));
        for pair in locals.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(LayoutError::DuplicateLocal(pair[0].id.clone()));
            }
        }
        if locals.iter().any(|l| l.id.trim().is_empty()) {
            return Err(LayoutError::EmptyId { kind: "local" });
        }

        let mut seen: HashMap<String, String> = HashMap::new();
        let mut globals = Vec::new();
        for (family, entries) in standards {
            for g in entries {
                if g.id.trim().is_empty() {
                    return Err(LayoutError::EmptyId { kind: "global" });
                }
                if let Some(first) = seen.insert(g.id.clone(), family.clone()) {
                    return Err(LayoutError::DuplicateGlobal {
                        id: g.id,
                        first,
                        second: family,
                    });
                }
                globals.push((family.clone(), g));
            }
        }
        globals.sort_by(|a, b| (&a.0, &a.1.id).cmp(&(&b.0, &b.1.id)));

        Ok(Self { locals, globals })
    }

    pub fn locals(&self) -> &[LocalEntity] {
        &self.locals
    }

    pub fn globals(&self) -> impl Iterator<Item = (&str, &GlobalEntity)> + '_ {
        self.globals.iter().map(|(family, g)| (family.as_str(), g))
    }
}

/// Turns an [`EntitySet`] into a scored bipartite [`Graph`].
pub struct GraphBuilder<'a> {
    oracle: &'a dyn SimilarityOracle,
    spawn: Rect,
    default_threshold: f64,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(cfg: &LayoutConfig, oracle: &'a dyn SimilarityOracle) -> Self {
        Self {
            oracle,
            spawn: cfg.spawn_rect(),
            default_threshold: LayoutConfig::clamp_threshold(cfg.threshold, 0.0),
        }
    }

    /// `threshold` is clamped into [0, 100]; NaN means the configured
    /// threshold. Node placement draws from `rng` in canonical node order,
    /// locals first.
    pub fn build<R: Rng + ?Sized>(&self, entities: &EntitySet, threshold: f64, rng: &mut R) -> Graph {
        let threshold = LayoutConfig::clamp_threshold(threshold, self.default_threshold);
        let mut graph = Graph::new();

        for local in entities.locals() {
            graph.upsert_node(Node {
                id: NodeId::local(&local.id),
                kind: NodeKind::Local,
                label: local.id.clone(),
                title: local.title.clone(),
                keywords: local.keywords.clone(),
                family: None,
                position: self.spawn_point(rng),
                velocity: Vector2D::zero(),
                pinned: false,
            });
        }
        for (family, global) in entities.globals() {
            graph.upsert_node(Node {
                id: NodeId::global(&global.id),
                kind: NodeKind::Global,
                label: global.id.clone(),
                title: global.topic.clone(),
                keywords: Vec::new(),
                family: Some(family.to_string()),
                position: self.spawn_point(rng),
                velocity: Vector2D::zero(),
                pinned: false,
            });
        }

        for local in entities.locals() {
            let source = NodeId::local(&local.id);
            for (_, global) in entities.globals() {
                let score = self.oracle.score(&local.keywords, &global.topic).min(MAX_SCORE);
                if f64::from(score) >= threshold {
                    graph.add_edge(&source, &NodeId::global(&global.id), score);
                }
            }
        }

        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edges().len(),
            threshold,
            "graph built"
        );
        graph
    }

    pub fn spawn_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Point2D::new(
            rng.gen_range(self.spawn.min_x..=self.spawn.max_x),
            rng.gen_range(self.spawn.min_y..=self.spawn.max_y),
        )
    }
}
