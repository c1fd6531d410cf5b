//! Client side of the reconciliation channel
//!
//! The network runs on its own thread with a current-thread tokio runtime.
//! The interaction loop talks to it through a [`SyncHandle`]: proposals go
//! in as [`SyncCommand`]s, snapshots come back out as [`SyncEvent`]s.
//! Proposals are fire-and-forget; there is no acknowledgement to wait for.

use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use floorplan_core::{ClientMsg, ServerMsg};
use iroh::discovery::{dns::DnsDiscovery, pkarr::PkarrPublisher};
use iroh::Endpoint;
use iroh_base::EndpointAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::framing::{send_frame, spawn_frame_reader};
use crate::ticket::decode_ticket;
use crate::ALPN;

/// Events from the network thread to the interaction loop
#[derive(Debug)]
pub enum SyncEvent {
    /// Stream to the server is open
    Connected { server: String },
    /// A validated message from the server
    Inbound(ServerMsg),
    /// The server closed the stream
    Disconnected,
    /// Error occurred
    Error(String),
}

/// Commands from the interaction loop to the network thread
#[derive(Debug)]
pub enum SyncCommand {
    /// Send a proposal to the server
    Propose(ClientMsg),
    /// Close the connection
    Shutdown,
}

/// Handle for communicating with the network thread
pub struct SyncHandle {
    command_tx: mpsc::UnboundedSender<SyncCommand>,
    event_rx: std_mpsc::Receiver<SyncEvent>,
    _thread: JoinHandle<()>,
}

impl SyncHandle {
    /// Non-blocking check for events
    pub fn poll_event(&self) -> Option<SyncEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Send a command to the network thread
    pub fn send_command(&self, cmd: SyncCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Network thread has stopped"))
    }

    /// Fire a proposal at the server
    pub fn propose(&self, msg: ClientMsg) -> Result<()> {
        self.send_command(SyncCommand::Propose(msg))
    }
}

/// Start the network thread and connect to the server behind `ticket`
pub fn start_client_thread(ticket: &str) -> Result<SyncHandle> {
    let addr = decode_ticket(ticket)?;
    let (event_tx, event_rx) = std_mpsc::channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let thread = thread::Builder::new()
        .name("floorplan-sync".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = event_tx.send(SyncEvent::Error(e.to_string()));
                    return;
                }
            };

            rt.block_on(async move {
                if let Err(e) = run_client(addr, event_tx.clone(), command_rx).await {
                    let _ = event_tx.send(SyncEvent::Error(format!("{e:#}")));
                }
            });
        })
        .context("Failed to spawn network thread")?;

    Ok(SyncHandle {
        command_tx,
        event_rx,
        _thread: thread,
    })
}

async fn run_client(
    addr: EndpointAddr,
    event_tx: std_mpsc::Sender<SyncEvent>,
    command_rx: mpsc::UnboundedReceiver<SyncCommand>,
) -> Result<()> {
    let endpoint = Endpoint::builder()
        .discovery(DnsDiscovery::n0_dns())
        .discovery(PkarrPublisher::n0_dns())
        .bind()
        .await?;

    let server = addr.id.to_string();
    let conn = endpoint
        .connect(addr, ALPN)
        .await
        .context("Failed to reach layout server")?;
    let (send, recv) = conn.open_bi().await?;
    tracing::info!(%server, "connected");
    let _ = event_tx.send(SyncEvent::Connected { server });

    drive(send, recv, event_tx, command_rx).await
}

/// Run one client connection over an established stream pair
pub async fn drive<S, R>(
    mut send: S,
    recv: R,
    event_tx: std_mpsc::Sender<SyncEvent>,
    mut command_rx: mpsc::UnboundedReceiver<SyncCommand>,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
    R: AsyncRead + Unpin + Send + 'static,
{
    // The server only sees a stream once something is written to it
    send_frame(&mut send, &[]).await?;
    let mut frames = spawn_frame_reader(recv);

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else {
                    let _ = event_tx.send(SyncEvent::Disconnected);
                    break;
                };
                match ServerMsg::decode(&frame) {
                    Ok(msg) => {
                        tracing::trace!(event = msg.event_name(), "inbound");
                        if event_tx.send(SyncEvent::Inbound(msg)).is_err() {
                            // Nobody is listening any more
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "dropping malformed server message"),
                }
            }
            cmd = command_rx.recv() => {
                match cmd {
                    Some(SyncCommand::Propose(msg)) => {
                        let bytes = msg.encode()?;
                        if let Err(e) = send_frame(&mut send, &bytes).await {
                            tracing::debug!(event = msg.event_name(), error = %e, "proposal lost in flight");
                            let _ = event_tx.send(SyncEvent::Disconnected);
                            break;
                        }
                    }
                    Some(SyncCommand::Shutdown) | None => break,
                }
            }
        }
    }

    Ok(())
}
