//! Cooperative frame scheduling on tokio.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::app::handle::LayoutHandle;
use crate::error::LayoutError;
use crate::graph::state::LayoutController;
use crate::render::RenderAdapter;

pub mod handle;

type Parts = (LayoutController, Box<dyn RenderAdapter>);

struct Pump {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Calls [`LayoutController::frame`] once per interval tick and hands each
/// published snapshot to the render adapter.
///
/// The pump task starts with the first [`start`](Self::start) and runs
/// until [`shutdown`](Self::shutdown). [`stop`](Self::stop) only halts the
/// simulation: the task keeps draining handle commands, so a stopped loop
/// still applies pins and zooms straight away, without ticking.
pub struct FrameLoop {
    interval: Duration,
    handle: LayoutHandle,
    parts: Arc<Mutex<Parts>>,
    pump: Option<Pump>,
}

impl FrameLoop {
    pub fn new(controller: LayoutController, adapter: Box<dyn RenderAdapter>) -> Self {
        Self {
            interval: controller.config().frame_interval(),
            handle: controller.handle(),
            parts: Arc::new(Mutex::new((controller, adapter))),
            pump: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn handle(&self) -> LayoutHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().map(|parts| parts.0.is_running()).unwrap_or(false)
    }

    /// Starts ticking. Idempotent.
    pub async fn start(&mut self) -> Result<(), LayoutError> {
        self.reap().await?;
        self.lock()?.0.start();
        if self.pump.is_none() {
            self.pump = Some(self.spawn_pump());
            tracing::debug!(interval_ms = self.interval.as_millis() as u64, "frame loop started");
        }
        Ok(())
    }

    /// Stops ticking. Already applied commands stay applied, and queued ones
    /// are applied now. Safe to call when not running.
    pub async fn stop(&mut self) -> Result<(), LayoutError> {
        self.reap().await?;
        let mut parts = self.lock()?;
        let (controller, adapter) = &mut *parts;
        controller.stop();
        adapter.present(controller.published());
        tracing::debug!(ticks = controller.tick_count(), "frame loop stopped");
        Ok(())
    }

    /// Runs `f` against the controller between frames.
    pub fn with_controller<R>(&mut self, f: impl FnOnce(&mut LayoutController) -> R) -> Option<R> {
        self.lock().ok().map(|mut parts| f(&mut parts.0))
    }

    /// Stops the loop, ends the pump task and hands back controller and
    /// adapter.
    pub async fn shutdown(mut self) -> Result<Parts, LayoutError> {
        self.stop().await?;
        if let Some(Pump { cancel, task }) = self.pump.take() {
            let _ = cancel.send(());
            task.await
                .map_err(|err| LayoutError::LoopAborted(err.to_string()))?;
        }

        let parts = Arc::clone(&self.parts);
        drop(self);
        let parts = Arc::try_unwrap(parts)
            .map_err(|_| LayoutError::LoopAborted("controller is still shared".to_string()))?;
        parts
            .into_inner()
            .map_err(|_| LayoutError::LoopAborted("frame loop panicked".to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Parts>, LayoutError> {
        self.parts
            .lock()
            .map_err(|_| LayoutError::LoopAborted("frame loop panicked".to_string()))
    }

    /// Surfaces a pump task that died on its own.
    async fn reap(&mut self) -> Result<(), LayoutError> {
        if !self.pump.as_ref().is_some_and(|pump| pump.task.is_finished()) {
            return Ok(());
        }
        if let Some(Pump { task, .. }) = self.pump.take() {
            task.await
                .map_err(|err| LayoutError::LoopAborted(err.to_string()))?;
        }
        Ok(())
    }

    fn spawn_pump(&self) -> Pump {
        let (cancel, mut cancelled) = oneshot::channel::<()>();
        let parts = Arc::clone(&self.parts);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut cancelled => break,
                    _ = ticker.tick() => {
                        let Ok(mut guard) = parts.lock() else {
                            break;
                        };
                        let (controller, adapter) = &mut *guard;
                        controller.frame();
                        adapter.present(controller.published());
                    }
                }
            }
        });
        Pump { cancel, task }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let Some(Pump { cancel, .. }) = self.pump.take() {
            let _ = cancel.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::LayoutConfig;
    use std::sync::{Arc, Mutex};
    use sustaingraph_core::{GlobalEntity, LocalEntity, NodeId, Snapshot, StandardCatalog};

    fn controller() -> LayoutController {
        let mut standards = StandardCatalog::new();
        standards.insert(
            "GRI".to_string(),
            vec![GlobalEntity {
                id: "GRI 302".to_string(),
                topic: "Energy".to_string(),
            }],
        );
        let locals = vec![
            LocalEntity {
                id: "ESDM-002".to_string(),
                title: "Permen Energi 2020".to_string(),
                keywords: vec!["energy".to_string()],
            },
            LocalEntity {
                id: "K3-003".to_string(),
                title: "Keselamatan Kerja 2019".to_string(),
                keywords: vec!["safety".to_string()],
            },
        ];
        LayoutController::from_entities(
            LayoutConfig::default(),
            locals,
            standards,
            Arc::new(crate::oracle::KeywordOracle::default()),
        )
        .expect("controller")
    }

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, Box<dyn RenderAdapter>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let adapter = move |snap: Arc<Snapshot>| {
            if let Ok(mut v) = sink.lock() {
                v.push(snap.tick);
            }
        };
        (seen, Box::new(adapter))
    }

    #[tokio::test]
    async fn loop_ticks_presents_and_hands_controller_back() {
        let (seen, adapter) = recorder();
        let mut frames = FrameLoop::new(controller(), adapter).with_interval(Duration::from_millis(1));

        frames.start().await.expect("start");
        assert!(frames.is_running());
        tokio::time::sleep(Duration::from_millis(40)).await;
        frames.stop().await.expect("stop");
        assert!(!frames.is_running());

        let ticks = frames
            .with_controller(|c| {
                assert!(!c.is_running());
                c.tick_count()
            })
            .expect("parked controller");
        assert!(ticks > 0);

        let seen = seen.lock().expect("lock").clone();
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last().copied(), Some(ticks));
    }

    #[tokio::test]
    async fn restart_resumes_from_last_committed_state() {
        let (_, adapter) = recorder();
        let mut frames = FrameLoop::new(controller(), adapter).with_interval(Duration::from_millis(1));

        frames.start().await.expect("start");
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Starting while already running is a no-op.
        frames.start().await.expect("restart");
        tokio::time::sleep(Duration::from_millis(20)).await;
        frames.stop().await.expect("stop");
        let first = frames.with_controller(|c| c.tick_count()).expect("parked");

        frames.start().await.expect("start again");
        tokio::time::sleep(Duration::from_millis(20)).await;
        let (controller, _) = frames.shutdown().await.expect("shutdown");
        assert!(controller.tick_count() > first);
    }

    #[tokio::test]
    async fn handle_commands_reach_running_loop() {
        let (_, adapter) = recorder();
        let mut frames = FrameLoop::new(controller(), adapter).with_interval(Duration::from_millis(1));
        let handle = frames.handle();

        frames.start().await.expect("start");
        assert!(handle.pin(NodeId::local("K3-003"), 250.0, 250.0));
        tokio::time::sleep(Duration::from_millis(30)).await;

        let snap = handle.snapshot();
        let node = snap.node(&NodeId::local("K3-003")).expect("node");
        assert!(node.pinned);
        assert_eq!((node.x, node.y), (250.0, 250.0));

        frames.stop().await.expect("stop");
        frames.stop().await.expect("second stop is harmless");
    }

    #[tokio::test]
    async fn stopped_loop_still_applies_handle_commands() {
        let (_, adapter) = recorder();
        let mut frames = FrameLoop::new(controller(), adapter).with_interval(Duration::from_millis(1));
        let handle = frames.handle();

        frames.start().await.expect("start");
        tokio::time::sleep(Duration::from_millis(10)).await;
        frames.stop().await.expect("stop");
        let ticks = frames.with_controller(|c| c.tick_count()).expect("controller");

        assert!(handle.pin(NodeId::local("ESDM-002"), 123.0, 321.0));
        tokio::time::sleep(Duration::from_millis(30)).await;

        let snap = handle.snapshot();
        let node = snap.node(&NodeId::local("ESDM-002")).expect("node");
        assert!(node.pinned);
        assert_eq!((node.x, node.y), (123.0, 321.0));

        let (controller, _) = frames.shutdown().await.expect("shutdown");
        assert!(!controller.is_running());
        assert_eq!(controller.tick_count(), ticks, "no ticks while stopped");
        assert!(controller.graph().node(&NodeId::local("ESDM-002")).expect("node").pinned);
    }
}
