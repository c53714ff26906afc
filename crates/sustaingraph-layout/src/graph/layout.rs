use euclid::default::Vector2D;

use crate::graph::model::Graph;
use crate::util::config::{LayoutConfig, Rect};

/// Floor for spring length so coincident endpoints still get a direction.
const MIN_SPRING_LENGTH: f64 = 0.001;

/// One-step force integrator: repulsion, springs, damping, clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationEngine {
    repulsion: f64,
    epsilon: f64,
    rest_length: f64,
    spring_stiffness: f64,
    weight_factor: f64,
    damping: f64,
    time_step: f64,
    bounds: Rect,
}

impl SimulationEngine {
    /// Expects a config that already passed [`LayoutConfig::validate`].
    pub fn new(cfg: &LayoutConfig) -> Self {
        Self {
            repulsion: cfg.repulsion,
            epsilon: cfg.epsilon,
            rest_length: cfg.rest_length,
            spring_stiffness: cfg.spring_stiffness,
            weight_factor: cfg.weight_factor,
            damping: cfg.damping,
            time_step: cfg.time_step,
            bounds: cfg.bounds(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn tick(&self, graph: &mut Graph) {
        if graph.is_empty() {
            return;
        }
        self.apply_repulsion(graph);
        self.apply_springs(graph);
        self.integrate(graph);
    }

    // Pinned nodes take part in both force passes; their accumulated
    // velocity is thrown away in `integrate`.
    fn apply_repulsion(&self, graph: &mut Graph) {
        let nodes = graph.nodes_mut();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let d = nodes[i].position - nodes[j].position;
                let dist2 = d.square_length() + self.epsilon;
                let dist = dist2.sqrt();
                let f = d / dist * (self.repulsion / dist2);

                nodes[i].velocity += f;
                nodes[j].velocity -= f;
            }
        }
    }

    fn apply_springs(&self, graph: &mut Graph) {
        let springs: Vec<(usize, usize, u32)> = graph
            .edges()
            .iter()
            .map(|e| {
                let (s, t) = e.endpoints();
                (s, t, e.weight)
            })
            .collect();

        let nodes = graph.nodes_mut();
        for (s, t, weight) in springs {
            let d = nodes[t].position - nodes[s].position;
            let len = d.length().max(MIN_SPRING_LENGTH);
            let k = self.spring_stiffness * (1.0 + f64::from(weight) * self.weight_factor);
            let f = d / len * ((len - self.rest_length) * k);

            nodes[s].velocity += f;
            nodes[t].velocity -= f;
        }
    }

    fn integrate(&self, graph: &mut Graph) {
        let b = self.bounds;
        for n in graph.nodes_mut() {
            if n.pinned {
                n.velocity = Vector2D::zero();
                continue;
            }

            n.velocity *= self.damping;
            n.position += n.velocity * self.time_step;

            // The wall absorbs the velocity component that pushed through it.
            let x = n.position.x.clamp(b.min_x, b.max_x);
            if x != n.position.x {
                n.position.x = x;
                n.velocity.x = 0.0;
            }
            let y = n.position.y.clamp(b.min_y, b.max_y);
            if y != n.position.y {
                n.position.y = y;
                n.velocity.y = 0.0;
            }
        }
    }

    pub fn kinetic_energy(graph: &Graph) -> f64 {
        graph.kinetic_energy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::Node;
    use euclid::default::Point2D;
    use sustaingraph_core::{NodeId, NodeKind};

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::from(id),
            kind: NodeKind::Local,
            label: id.to_string(),
            title: String::new(),
            keywords: Vec::new(),
            family: None,
            position: Point2D::new(x, y),
            velocity: Vector2D::zero(),
            pinned: false,
        }
    }

    fn pos(g: &Graph, id: &str) -> (f64, f64) {
        let n = g.node(&NodeId::from(id)).expect("node");
        (n.position.x, n.position.y)
    }

    #[test]
    fn repulsion_pushes_pairs_apart_symmetrically() {
        let cfg = LayoutConfig::default();
        let mut g = Graph::new();
        g.upsert_node(node("a", 480.0, 240.0));
        g.upsert_node(node("b", 520.0, 240.0));

        SimulationEngine::new(&cfg).tick(&mut g);

        let (ax, ay) = pos(&g, "a");
        let (bx, by) = pos(&g, "b");
        assert!(ax < 480.0 && bx > 520.0);
        assert!(((480.0 - ax) - (bx - 520.0)).abs() < 1e-9);
        assert_eq!((ay, by), (240.0, 240.0));
    }

    #[test]
    fn spring_pulls_stretched_edge_together() {
        let cfg = LayoutConfig {
            repulsion: 0.0,
            ..LayoutConfig::default()
        };
        let mut g = Graph::new();
        g.upsert_node(node("local:a", 100.0, 240.0));
        g.upsert_node(node("global:b", 900.0, 240.0));
        g.add_edge(&NodeId::from("local:a"), &NodeId::from("global:b"), 100);

        SimulationEngine::new(&cfg).tick(&mut g);

        // k = 0.05 * (1 + 5 * 0.05), stretch = 680, v = k * stretch * damping
        let expected_v = 0.05 * 1.25 * 680.0 * 0.85;
        let (ax, _) = pos(&g, "local:a");
        let (bx, _) = pos(&g, "global:b");
        assert!((ax - (100.0 + expected_v * 0.8)).abs() < 1e-9);
        assert!((bx - (900.0 - expected_v * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn coincident_nodes_do_not_produce_nan() {
        let cfg = LayoutConfig::default();
        let mut g = Graph::new();
        g.upsert_node(node("local:a", 300.0, 200.0));
        g.upsert_node(node("global:b", 300.0, 200.0));
        g.add_edge(&NodeId::from("local:a"), &NodeId::from("global:b"), 60);

        let engine = SimulationEngine::new(&cfg);
        for _ in 0..10 {
            engine.tick(&mut g);
        }
        for n in g.nodes() {
            assert!(n.position.x.is_finite() && n.position.y.is_finite());
            assert!(n.velocity.x.is_finite() && n.velocity.y.is_finite());
        }
    }

    #[test]
    fn clamps_into_bounds_and_absorbs_wall_velocity() {
        let cfg = LayoutConfig::default();
        let mut g = Graph::new();
        g.upsert_node(node("a", 40.0, 40.0));
        if let Some(n) = g.node_mut(&NodeId::from("a")) {
            n.velocity = Vector2D::new(-500.0, 10.0);
        }

        SimulationEngine::new(&cfg).tick(&mut g);

        let n = g.node(&NodeId::from("a")).expect("node");
        assert_eq!(n.position.x, 40.0);
        assert_eq!(n.velocity.x, 0.0);
        assert!(n.velocity.y > 0.0);
        assert!(n.position.y > 40.0);
    }

    #[test]
    fn pinned_node_holds_still_but_still_repels() {
        let cfg = LayoutConfig::default();
        let mut g = Graph::new();
        g.upsert_node(node("pinned", 500.0, 240.0));
        g.upsert_node(node("free", 530.0, 240.0));
        if let Some(n) = g.node_mut(&NodeId::from("pinned")) {
            n.pinned = true;
        }

        SimulationEngine::new(&cfg).tick(&mut g);

        let pinned = g.node(&NodeId::from("pinned")).expect("pinned");
        assert_eq!((pinned.position.x, pinned.position.y), (500.0, 240.0));
        assert_eq!(pinned.velocity, Vector2D::zero());
        assert!(pos(&g, "free").0 > 530.0);
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let mut g = Graph::new();
        SimulationEngine::new(&LayoutConfig::default()).tick(&mut g);
        assert!(g.is_empty());
    }
}
