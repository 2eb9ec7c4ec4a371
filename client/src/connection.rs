use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use minerace_common::pipe::{Pipe, PipeSender};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Interval after which a blocked read wakes up to check liveness. Bounds
/// shutdown latency; elapsed timeouts are retried silently.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// One TCP connection to the server, with its pipe, writer task and read
/// loop already running.
pub struct Connection {
    sender: PipeSender,
    alive: Arc<AtomicBool>,
    read_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl Connection {
    /// Connect to the server. `setup` registers the pipe's handlers before
    /// the read loop starts, so no frame can arrive unhandled.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        setup: impl FnOnce(&mut Pipe),
    ) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!(peer = ?stream.peer_addr().ok(), "connected to server");
        let (mut read_half, mut write_half) = stream.into_split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let mut pipe = Pipe::new(outgoing);
        setup(&mut pipe);
        let sender = pipe.sender();

        let alive = Arc::new(AtomicBool::new(true));
        {
            let alive = alive.clone();
            sender.on_dead(move || alive.store(false, Ordering::SeqCst));
        }

        // All outgoing frames funnel through one writer task.
        let writer_task = tokio::spawn(async move {
            while let Some(bytes) = outgoing_rx.recv().await {
                if let Err(error) = write_half.write_all(&bytes).await {
                    warn!("failed to write to server: {}", error);
                    break;
                }
            }
            let _ = write_half.shutdown().await;
            debug!("writer task finished");
        });

        // The read loop owns the pipe; every frame is processed here, so all
        // handler state is touched from exactly one task.
        let read_task = {
            let sender = sender.clone();
            let alive = alive.clone();
            tokio::spawn(async move {
                let mut buffer = [0u8; 4096];
                while alive.load(Ordering::SeqCst) {
                    match timeout(READ_TIMEOUT, read_half.read(&mut buffer)).await {
                        Err(_) => continue,
                        Ok(Ok(0)) => {
                            info!("connection closed by server");
                            break;
                        }
                        Ok(Ok(received)) => {
                            if let Err(error) = pipe.receive(&buffer[..received]) {
                                warn!("protocol violation, closing connection: {}", error);
                                break;
                            }
                        }
                        Ok(Err(error)) => {
                            // A reset peer is a normal termination path.
                            info!("connection lost: {}", error);
                            break;
                        }
                    }
                }
                sender.close();
            })
        };

        Ok(Self {
            sender,
            alive,
            read_task,
            writer_task,
        })
    }

    pub fn sender(&self) -> PipeSender {
        self.sender.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Close the pipe and wait for both background tasks to wind down.
    pub async fn shutdown(self) {
        self.sender.close();
        let _ = self.read_task.await;
        let _ = self.writer_task.await;
        info!("disconnected from server");
    }
}
