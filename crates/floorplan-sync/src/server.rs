//! Server side of the reconciliation channel
//!
//! A single [`LayoutDocument`] sits behind a mutex. Proposals from all
//! connections are applied one at a time in the order the lock is taken,
//! so the last one applied wins. Every broadcast goes to every connection,
//! the proposer included.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use floorplan_core::{ClientMsg, LayoutDocument, ServerMsg};
use iroh::discovery::{dns::DnsDiscovery, pkarr::PkarrPublisher};
use iroh::endpoint::Connection;
use iroh::protocol::{AcceptError, ProtocolHandler, Router};
use iroh::Endpoint;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, Mutex};
use tracing::Instrument;
use uuid::Uuid;

use crate::framing::{send_frame, spawn_frame_reader};
use crate::ticket::encode_ticket;
use crate::ALPN;

/// Broadcast queue depth before a slow connection is resynchronized
const BROADCAST_CAPACITY: usize = 256;

/// Reconciliation channel handler for iroh
#[derive(Clone)]
pub struct LayoutChannel {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LayoutChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutChannel").finish()
    }
}

struct Inner {
    /// The canonical layout
    doc: Mutex<LayoutDocument>,
    /// Snapshots going out to every connection
    outgoing_tx: broadcast::Sender<ServerMsg>,
}

impl LayoutChannel {
    /// Protocol identifier
    pub const ALPN: &'static [u8] = ALPN;

    pub fn new(doc: LayoutDocument) -> Self {
        let (outgoing_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                doc: Mutex::new(doc),
                outgoing_tx,
            }),
        }
    }

    /// Both collections as they stand right now
    pub async fn snapshots(&self) -> Vec<ServerMsg> {
        self.inner.doc.lock().await.welcome()
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.inner.outgoing_tx.receiver_count()
    }

    /// Apply one proposal, broadcast the result, and persist.
    ///
    /// Everything happens under the document lock, so snapshots leave and
    /// files are written in the same order proposals were applied.
    pub async fn apply_proposal(&self, msg: &ClientMsg) {
        let mut doc = self.inner.doc.lock().await;
        let out = doc.apply(msg);
        tracing::debug!(event = msg.event_name(), target = msg.target(), "applied proposal");
        for snapshot in out {
            // No receivers just means nobody is connected
            let _ = self.inner.outgoing_tx.send(snapshot);
        }

        let pending = match doc.take_pending_save() {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize layout");
                return;
            }
        };
        match tokio::task::spawn_blocking(move || pending.write()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to persist layout"),
            Err(e) => tracing::warn!(error = %e, "persist task failed"),
        }
    }

    /// Handle incoming connection
    async fn handle_peer(&self, conn: Connection) -> Result<()> {
        let (send, recv) = conn.accept_bi().await?;
        self.serve(send, recv).await
    }

    /// Serve one client over an established stream pair until it goes away
    pub async fn serve<S, R>(&self, mut send: S, recv: R) -> Result<()>
    where
        S: AsyncWrite + Unpin,
        R: AsyncRead + Unpin + Send + 'static,
    {
        let id = Uuid::new_v4();
        async move {
            // Subscribe before taking the welcome snapshot so no broadcast
            // falls between the two.
            let mut outgoing_rx = self.inner.outgoing_tx.subscribe();
            for msg in self.snapshots().await {
                send_frame(&mut send, &msg.encode()?).await?;
            }
            tracing::info!("client connected");

            let mut frames = spawn_frame_reader(recv);
            loop {
                tokio::select! {
                    result = outgoing_rx.recv() => {
                        match result {
                            Ok(msg) => send_frame(&mut send, &msg.encode()?).await?,
                            Err(broadcast::error::RecvError::Closed) => break,
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                // Drop the backlog, then resend full state. Same
                                // subscribe-before-snapshot order as the welcome.
                                tracing::warn!(skipped, "client lagged, resending snapshots");
                                outgoing_rx = outgoing_rx.resubscribe();
                                for msg in self.snapshots().await {
                                    send_frame(&mut send, &msg.encode()?).await?;
                                }
                            }
                        }
                    }
                    frame = frames.recv() => {
                        let Some(frame) = frame else {
                            break;
                        };
                        // Empty frames only announce the stream
                        if frame.is_empty() {
                            continue;
                        }
                        match ClientMsg::decode(&frame) {
                            Ok(msg) => self.apply_proposal(&msg).await,
                            Err(e) => tracing::warn!(error = %e, "dropping malformed proposal"),
                        }
                    }
                }
            }

            tracing::info!("client disconnected");
            Ok(())
        }
        .instrument(tracing::info_span!("conn", %id))
        .await
    }
}

impl ProtocolHandler for LayoutChannel {
    fn accept(&self, conn: Connection) -> impl Future<Output = Result<(), AcceptError>> + Send {
        let this = self.clone();
        async move {
            this.handle_peer(conn).await.map_err(|e| {
                AcceptError::from_err(std::io::Error::other(e.to_string()))
            })
        }
    }
}

/// A running server
pub struct ServerHandle {
    router: Router,
    channel: LayoutChannel,
    ticket: String,
}

impl ServerHandle {
    /// Ticket clients use to join
    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    pub fn channel(&self) -> &LayoutChannel {
        &self.channel
    }

    pub async fn shutdown(self) -> Result<()> {
        self.router.shutdown().await?;
        Ok(())
    }
}

/// Bind an endpoint and start accepting clients for the given layout
pub async fn start_server(doc: LayoutDocument) -> Result<ServerHandle> {
    // Create iroh endpoint with n0 discovery (DNS + Pkarr)
    let endpoint = Endpoint::builder()
        .discovery(DnsDiscovery::n0_dns())
        .discovery(PkarrPublisher::n0_dns())
        .bind()
        .await?;

    let ticket = encode_ticket(&endpoint.addr())?;
    let channel = LayoutChannel::new(doc);

    let router = Router::builder(endpoint)
        .accept(LayoutChannel::ALPN, channel.clone())
        .spawn();

    tracing::info!("layout server listening");
    Ok(ServerHandle {
        router,
        channel,
        ticket,
    })
}
