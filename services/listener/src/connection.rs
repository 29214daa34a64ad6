//! # Connection Reader
//!
//! One task per accepted socket: read into a fixed buffer, feed the stream
//! framer, and hand each completed frame to the parser pool through the shared
//! queue. The task ends on orderly close, a read error, framing overflow or
//! listener shutdown, and always releases its slot in `active_connections`.

use crate::worker::{ListenerContext, ParseJob};
use network::{safe_system_timestamp_ns, ActiveFlag, StreamFramer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Per-connection reader settings
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReaderLimits {
    pub(crate) recv_buffer_bytes: usize,
    pub(crate) max_frame_bytes: usize,
}

pub(crate) async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    ctx: Arc<ListenerContext>,
    limits: ReaderLimits,
    active: ActiveFlag,
) {
    info!(%peer, "Connection accepted");

    let mut framer = StreamFramer::with_max_pending(limits.max_frame_bytes);
    let mut read_buffer = vec![0u8; limits.recv_buffer_bytes];
    let mut frames = Vec::new();
    let mut frame_count = 0u64;

    loop {
        let read = tokio::select! {
            read = stream.read(&mut read_buffer) => read,
            _ = active.cancelled() => {
                debug!(%peer, "Reader stopping for shutdown");
                break;
            }
        };

        match read {
            Ok(0) => {
                debug!(%peer, "Connection closed by peer");
                break;
            }
            Ok(n) => {
                let received_at_ns = safe_system_timestamp_ns();
                ctx.stats.record_packet_received(n);

                let pushed = framer.push(&read_buffer[..n], &mut frames);
                frame_count += frames.len() as u64;
                for frame in frames.drain(..) {
                    ctx.queue.enqueue(ParseJob {
                        frame,
                        peer,
                        received_at_ns,
                    });
                }

                if let Err(e) = pushed {
                    ctx.stats.record_frame_dropped();
                    warn!(%peer, error = %e, "Closing connection after framing overflow");
                    break;
                }
            }
            Err(e) => {
                warn!(%peer, error = %e, "Connection read error");
                break;
            }
        }
    }

    ctx.stats.connection_closed();
    info!(%peer, frames = frame_count, pending = framer.pending_len(), "Connection closed");
}
