use crossbeam_channel::Sender;
use std::sync::{Arc, RwLock};
use sustaingraph_core::{Command, LocalEntity, NodeId, Snapshot, StandardCatalog};

/// Cloneable remote control for a [`LayoutController`](crate::LayoutController).
///
/// Sends commands into the controller's queue and reads the snapshot it
/// published at the last frame. Never touches the graph itself.
#[derive(Clone)]
pub struct LayoutHandle {
    tx: Sender<Command>,
    published: Arc<RwLock<Arc<Snapshot>>>,
}

impl LayoutHandle {
    pub(crate) fn new(tx: Sender<Command>, published: Arc<RwLock<Arc<Snapshot>>>) -> Self {
        Self { tx, published }
    }

    /// Queues a command. Returns false once the controller is gone.
    pub fn submit(&self, cmd: Command) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn start(&self) -> bool {
        self.submit(Command::Start)
    }

    pub fn stop(&self) -> bool {
        self.submit(Command::Stop)
    }

    pub fn rebuild(&self, threshold: f64) -> bool {
        self.submit(Command::Rebuild { threshold })
    }

    pub fn reload(&self, locals: Vec<LocalEntity>, standards: StandardCatalog, threshold: f64) -> bool {
        self.submit(Command::Reload {
            locals,
            standards,
            threshold,
        })
    }

    pub fn pin(&self, id: NodeId, x: f64, y: f64) -> bool {
        self.submit(Command::Pin { id, x, y })
    }

    pub fn unpin(&self, id: NodeId) -> bool {
        self.submit(Command::Unpin { id })
    }

    pub fn apply_view_transform(&self, scale: f64, origin_x: f64, origin_y: f64) -> bool {
        self.submit(Command::ApplyViewTransform {
            scale,
            origin_x,
            origin_y,
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.published.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

pub(crate) fn publish(slot: &RwLock<Arc<Snapshot>>, snapshot: Arc<Snapshot>) {
    match slot.write() {
        Ok(mut guard) => *guard = snapshot,
        Err(poisoned) => *poisoned.into_inner() = snapshot,
    }
}
