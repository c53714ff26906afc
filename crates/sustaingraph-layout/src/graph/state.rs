use crossbeam_channel::{Receiver, Sender};
use euclid::default::{Point2D, Vector2D};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, RwLock};
use sustaingraph_core::{Command, LocalEntity, NodeId, Snapshot, StandardCatalog};

use crate::app::handle::{publish, LayoutHandle};
use crate::error::LayoutError;
use crate::graph::builder::{EntitySet, GraphBuilder};
use crate::graph::layout::SimulationEngine;
use crate::graph::model::{Graph, Position};
use crate::oracle::SimilarityOracle;
use crate::util::config::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

/// Owns the live graph and serializes every mutation against tick
/// boundaries.
///
/// Commands go through an internal queue. While running they are applied at
/// the start of the next [`frame`](Self::frame); while stopped the direct
/// methods apply them on the spot.
pub struct LayoutController {
    cfg: LayoutConfig,
    engine: SimulationEngine,
    oracle: Arc<dyn SimilarityOracle>,
    entities: EntitySet,
    threshold: f64,
    rng: StdRng,
    graph: Graph,
    state: LoopState,
    tick: u64,
    tx: Sender<Command>,
    rx: Receiver<Command>,
    published: Arc<RwLock<Arc<Snapshot>>>,
}

impl LayoutController {
    pub fn new(
        cfg: LayoutConfig,
        entities: EntitySet,
        oracle: Arc<dyn SimilarityOracle>,
    ) -> Result<Self, LayoutError> {
        cfg.validate()?;

        let threshold = LayoutConfig::clamp_threshold(cfg.threshold, 0.0);
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let graph = GraphBuilder::new(&cfg, oracle.as_ref()).build(&entities, threshold, &mut rng);
        let (tx, rx) = crossbeam_channel::unbounded();
        let published = Arc::new(RwLock::new(Arc::new(graph.to_snapshot(0))));

        tracing::info!(
            nodes = graph.len(),
            edges = graph.edges().len(),
            threshold,
            seed = cfg.seed,
            "layout controller ready"
        );

        Ok(Self {
            engine: SimulationEngine::new(&cfg),
            cfg,
            oracle,
            entities,
            threshold,
            rng,
            graph,
            state: LoopState::Stopped,
            tick: 0,
            tx,
            rx,
            published,
        })
    }

    pub fn from_entities(
        cfg: LayoutConfig,
        locals: Vec<LocalEntity>,
        standards: StandardCatalog,
        oracle: Arc<dyn SimilarityOracle>,
    ) -> Result<Self, LayoutError> {
        let entities = EntitySet::new(locals, standards)?;
        Self::new(cfg, entities, oracle)
    }

    // ----- Loop state -----
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn start(&mut self) {
        self.set_state(LoopState::Running);
    }

    /// Stops ticking. Anything still queued is applied right away, since
    /// there is no tick left to wait for.
    pub fn stop(&mut self) {
        self.set_state(LoopState::Stopped);
        self.flush();
    }

    fn set_state(&mut self, next: LoopState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, tick = self.tick, "layout state change");
        }
        self.state = next;
    }

    // ----- Commands -----
    pub fn submit(&mut self, cmd: Command) {
        // We hold the receiver, so the channel can't be disconnected.
        let _ = self.tx.send(cmd);
        if !self.is_running() {
            self.flush();
        }
    }

    pub fn rebuild(&mut self, threshold: f64) {
        self.submit(Command::Rebuild { threshold });
    }

    pub fn reload(&mut self, locals: Vec<LocalEntity>, standards: StandardCatalog, threshold: f64) {
        self.submit(Command::Reload {
            locals,
            standards,
            threshold,
        });
    }

    pub fn pin(&mut self, id: NodeId, position: Position) {
        self.submit(Command::Pin {
            id,
            x: position.x,
            y: position.y,
        });
    }

    pub fn unpin(&mut self, id: NodeId) {
        self.submit(Command::Unpin { id });
    }

    pub fn apply_view_transform(&mut self, scale: f64, origin: Position) {
        self.submit(Command::ApplyViewTransform {
            scale,
            origin_x: origin.x,
            origin_y: origin.y,
        });
    }

    pub fn handle(&self) -> LayoutHandle {
        LayoutHandle::new(self.tx.clone(), Arc::clone(&self.published))
    }

    /// One scheduling callback: drain the queue, tick once if running,
    /// publish. Returns whether a tick happened.
    pub fn frame(&mut self) -> bool {
        self.pump();
        let ticked = if self.is_running() {
            self.engine.tick(&mut self.graph);
            self.tick += 1;
            true
        } else {
            false
        };
        publish(&self.published, Arc::new(self.snapshot()));
        ticked
    }

    fn flush(&mut self) {
        if self.pump() > 0 {
            publish(&self.published, Arc::new(self.snapshot()));
        }
    }

    fn pump(&mut self) -> usize {
        let pending: Vec<Command> = self.rx.try_iter().collect();
        let n = pending.len();
        for cmd in pending {
            self.apply(cmd);
        }
        n
    }

    fn apply(&mut self, cmd: Command) {
        tracing::debug!(command = cmd.name(), tick = self.tick, "applying layout command");
        match cmd {
            Command::Start => self.set_state(LoopState::Running),
            Command::Stop => self.set_state(LoopState::Stopped),
            Command::Rebuild { threshold } => self.apply_rebuild(None, threshold),
            Command::Reload {
                locals,
                standards,
                threshold,
            } => match EntitySet::new(locals, standards) {
                Ok(set) => self.apply_rebuild(Some(set), threshold),
                Err(err) => tracing::warn!(%err, "ignoring reload with invalid entities"),
            },
            Command::Pin { id, x, y } => self.apply_pin(&id, x, y),
            Command::Unpin { id } => self.apply_unpin(&id),
            Command::ApplyViewTransform {
                scale,
                origin_x,
                origin_y,
            } => self.apply_zoom(scale, origin_x, origin_y),
        }
    }

    fn apply_rebuild(&mut self, entities: Option<EntitySet>, threshold: f64) {
        let threshold = LayoutConfig::clamp_threshold(threshold, self.threshold);
        if let Some(set) = entities {
            self.entities = set;
        }

        let mut next = GraphBuilder::new(&self.cfg, self.oracle.as_ref()).build(
            &self.entities,
            threshold,
            &mut self.rng,
        );

        let mut kept = 0usize;
        for n in next.nodes_mut() {
            if let Some(prev) = self.graph.node(&n.id) {
                n.position = prev.position;
                n.velocity = prev.velocity;
                n.pinned = prev.pinned;
                kept += 1;
            }
        }
        let dropped = self.graph.len() - kept;
        let added = next.len() - kept;

        tracing::info!(
            threshold,
            nodes = next.len(),
            edges = next.edges().len(),
            kept,
            added,
            dropped,
            "layout rebuilt"
        );
        self.graph = next;
        self.threshold = threshold;
    }

    fn apply_pin(&mut self, id: &NodeId, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            tracing::warn!(%id, x, y, "ignoring pin to non-finite position");
            return;
        }
        let (cx, cy) = self.engine.bounds().clamp(x, y);
        let Some(n) = self.graph.node_mut(id) else {
            tracing::warn!(%id, "pin for unknown node ignored");
            return;
        };
        n.position = Point2D::new(cx, cy);
        n.velocity = Vector2D::zero();
        n.pinned = true;
    }

    fn apply_unpin(&mut self, id: &NodeId) {
        let Some(n) = self.graph.node_mut(id) else {
            tracing::warn!(%id, "unpin for unknown node ignored");
            return;
        };
        n.pinned = false;
        n.velocity = Vector2D::zero();
    }

    fn apply_zoom(&mut self, scale: f64, origin_x: f64, origin_y: f64) {
        if !(scale.is_finite() && scale > 0.0 && origin_x.is_finite() && origin_y.is_finite()) {
            tracing::warn!(scale, origin_x, origin_y, "ignoring degenerate view transform");
            return;
        }
        // Pinned nodes scale with the rest; every node stays inside the bounds.
        let bounds = self.engine.bounds();
        let origin = Point2D::new(origin_x, origin_y);
        for n in self.graph.nodes_mut() {
            let p = origin + (n.position - origin) * scale;
            let (x, y) = bounds.clamp(p.x, p.y);
            n.position = Point2D::new(x, y);
        }
    }

    // ----- Read side -----
    pub fn snapshot(&self) -> Snapshot {
        self.graph.to_snapshot(self.tick)
    }

    /// The snapshot handed out at the last publish.
    pub fn published(&self) -> Arc<Snapshot> {
        self.handle().snapshot()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn kinetic_energy(&self) -> f64 {
        SimulationEngine::kinetic_energy(&self.graph)
    }

    pub fn is_settled(&self) -> bool {
        self.kinetic_energy() <= self.cfg.settle_energy
    }
}
