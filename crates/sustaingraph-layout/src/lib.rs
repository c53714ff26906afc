//! Force-directed layout for the local-regulation / global-standard
//! alignment graph.
//!
//! [`GraphBuilder`] scores every local/global pair through a
//! [`SimilarityOracle`] and keeps the pairs that clear the threshold.
//! [`SimulationEngine`] moves nodes one tick at a time. [`LayoutController`]
//! owns the live graph and applies commands between ticks, and
//! [`FrameLoop`] schedules it on tokio.

pub mod app;
pub mod error;
pub mod graph;
pub mod oracle;
pub mod render;
pub mod util;

pub use app::handle::LayoutHandle;
pub use app::FrameLoop;
pub use error::{ConfigError, LayoutError};
pub use graph::{
    edge_weight, Edge, EntitySet, Graph, GraphBuilder, LayoutController, LoopState, Node, Position,
    SimulationEngine, Velocity,
};
pub use oracle::{KeywordOracle, SimilarityOracle};
pub use render::{DragGesture, NullAdapter, RenderAdapter};
pub use util::config::{LayoutConfig, Rect};
