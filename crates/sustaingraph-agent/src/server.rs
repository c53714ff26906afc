use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use sustaingraph_core::{Msg, Snapshot};
use sustaingraph_layout::{LayoutHandle, RenderAdapter};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Fans each presented frame out to every connected viewer.
pub struct BroadcastAdapter {
    tx: broadcast::Sender<Arc<Snapshot>>,
}

impl BroadcastAdapter {
    pub fn new(tx: broadcast::Sender<Arc<Snapshot>>) -> Self {
        Self { tx }
    }
}

impl RenderAdapter for BroadcastAdapter {
    fn present(&mut self, snapshot: Arc<Snapshot>) {
        // no viewers connected is fine
        let _ = self.tx.send(snapshot);
    }
}

pub async fn run(
    listener: UnixListener,
    handle: LayoutHandle,
    frames: broadcast::Sender<Arc<Snapshot>>,
) -> Result<()> {
    loop {
        let (stream, _addr) = listener.accept().await?;
        tracing::info!("viewer connected");

        let handle = handle.clone();
        let frames = frames.subscribe();
        tokio::spawn(async move {
            match serve_viewer(stream, handle, frames).await {
                Ok(()) => tracing::info!("viewer disconnected"),
                Err(err) => tracing::warn!(error = %err, "viewer connection failed"),
            }
        });
    }
}

async fn serve_viewer<S>(
    stream: S,
    handle: LayoutHandle,
    mut frames: broadcast::Receiver<Arc<Snapshot>>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

    send(
        &mut framed,
        &Msg::Hello {
            version: PROTOCOL_VERSION.into(),
        },
    )
    .await?;
    send(&mut framed, &snapshot_msg(&handle.snapshot())).await?;

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(snapshot) => send(&mut framed, &snapshot_msg(&snapshot)).await?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "viewer lagging, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = framed.next() => {
                let Some(bytes) = incoming else {
                    break;
                };
                if let Some(reply) = handle_msg(&handle, &bytes?) {
                    send(&mut framed, &reply).await?;
                }
            }
        }
    }
    Ok(())
}

fn handle_msg(handle: &LayoutHandle, bytes: &[u8]) -> Option<Msg> {
    let msg: Msg = match serde_json::from_slice(bytes) {
        Ok(msg) => msg,
        Err(err) => {
            return Some(Msg::Error {
                message: format!("malformed message: {err}"),
            })
        }
    };

    match msg {
        Msg::Hello { version } => {
            tracing::debug!(%version, "viewer hello");
            None
        }
        Msg::RequestSnapshot => Some(snapshot_msg(&handle.snapshot())),
        Msg::Command { command } => {
            let name = command.name();
            if handle.submit(command) {
                tracing::debug!(command = name, "forwarded viewer command");
                None
            } else {
                Some(Msg::Error {
                    message: "layout controller is gone".to_string(),
                })
            }
        }
        Msg::Ping => Some(Msg::Pong),
        Msg::Pong => None,
        Msg::Error { message } => {
            tracing::warn!(%message, "viewer reported error");
            None
        }
        Msg::Snapshot { .. } => Some(Msg::Error {
            message: "snapshots only flow from the agent".to_string(),
        }),
    }
}

fn snapshot_msg(snapshot: &Snapshot) -> Msg {
    Msg::Snapshot {
        snapshot: snapshot.clone(),
    }
}

async fn send<S>(framed: &mut Framed<S, LengthDelimitedCodec>, msg: &Msg) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed.send(tokio_util::bytes::Bytes::from(serde_json::to_vec(msg)?)).await?;
    Ok(())
}
