pub mod builder;
pub mod layout;
pub mod model;
pub mod state;

pub use builder::{EntitySet, GraphBuilder};
pub use layout::SimulationEngine;
pub use model::{edge_weight, Edge, Graph, Node, Position, Velocity};
pub use state::{LayoutController, LoopState};
