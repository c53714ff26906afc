//! Contract for whatever draws the layout, plus the interaction helpers a
//! renderer needs to turn pointer input into layout commands.

use std::sync::Arc;
use sustaingraph_core::{NodeId, Snapshot};

use crate::app::handle::LayoutHandle;
use crate::util::config::LayoutConfig;

pub const ZOOM_IN: f64 = 0.9;
pub const ZOOM_OUT: f64 = 1.12;

pub trait RenderAdapter: Send {
    /// Called once per frame with the snapshot published at that frame.
    fn present(&mut self, snapshot: Arc<Snapshot>);
}

impl<F> RenderAdapter for F
where
    F: FnMut(Arc<Snapshot>) + Send,
{
    fn present(&mut self, snapshot: Arc<Snapshot>) {
        self(snapshot)
    }
}

/// Discards every frame. For headless runs that only poll the handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAdapter;

impl RenderAdapter for NullAdapter {
    fn present(&mut self, _snapshot: Arc<Snapshot>) {}
}

/// Drag-to-pin interaction.
///
/// `begin` grabs the node under the pointer and pins it where it is; `drag`
/// re-pins it under the pointer, keeping the grab offset; `end` unpins.
#[derive(Debug, Clone, Default)]
pub struct DragGesture {
    node: Option<NodeId>,
    offset_x: f64,
    offset_y: f64,
}

impl DragGesture {
    pub fn active(&self) -> Option<&NodeId> {
        self.node.as_ref()
    }

    pub fn begin(
        &mut self,
        handle: &LayoutHandle,
        snapshot: &Snapshot,
        x: f64,
        y: f64,
        hit_radius: f64,
    ) -> Option<NodeId> {
        let hit = snapshot.node_at(x, y, hit_radius)?;
        self.node = Some(hit.id.clone());
        self.offset_x = x - hit.x;
        self.offset_y = y - hit.y;
        handle.pin(hit.id.clone(), hit.x, hit.y);
        Some(hit.id.clone())
    }

    pub fn drag(&mut self, handle: &LayoutHandle, x: f64, y: f64) -> bool {
        let Some(id) = &self.node else {
            return false;
        };
        handle.pin(id.clone(), x - self.offset_x, y - self.offset_y)
    }

    pub fn end(&mut self, handle: &LayoutHandle) -> Option<NodeId> {
        let id = self.node.take()?;
        handle.unpin(id.clone());
        Some(id)
    }
}

/// Scales the layout about the canvas centre.
pub fn zoom(handle: &LayoutHandle, cfg: &LayoutConfig, factor: f64) -> bool {
    let (cx, cy) = cfg.bounds().center();
    handle.apply_view_transform(factor, cx, cy)
}

pub fn zoom_in(handle: &LayoutHandle, cfg: &LayoutConfig) -> bool {
    zoom(handle, cfg, ZOOM_IN)
}

pub fn zoom_out(handle: &LayoutHandle, cfg: &LayoutConfig) -> bool {
    zoom(handle, cfg, ZOOM_OUT)
}
