//! Local listener the engine connects back to.
//!
//! Only the endpoint matters to the launch path: it is published as a
//! [`Rendezvous`] and handed to the orchestrator. Incoming lines are drained
//! and logged; their protocol is handled elsewhere.

use skirmish_core::Rendezvous;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct Bridge {
    rendezvous: Rendezvous,
    accept_task: JoinHandle<()>,
}

impl Bridge {
    /// Listens on an ephemeral loopback port.
    pub async fn bind() -> std::io::Result<Self> {
        Self::bind_to("127.0.0.1:0").await
    }

    pub async fn bind_to(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        let rendezvous = Rendezvous {
            address: local.ip().to_string(),
            port: local.port(),
        };
        debug!("Bridge listening on {rendezvous}");

        let accept_task = tokio::spawn(accept_loop(listener));
        Ok(Self {
            rendezvous,
            accept_task,
        })
    }

    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!("Engine connected to bridge from {peer}");
                tokio::spawn(drain(stream, peer));
            }
            Err(e) => {
                warn!("Bridge accept failed: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn drain(stream: TcpStream, peer: SocketAddr) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => debug!("Bridge message from {peer}: {line}"),
            Ok(None) => break,
            Err(e) => {
                debug!("Bridge connection {peer} failed: {e}");
                break;
            }
        }
    }
    debug!("Engine disconnected from bridge ({peer})");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn publishes_loopback_endpoint_and_accepts_connections() {
        let bridge = Bridge::bind().await.expect("bind");
        let rendezvous = bridge.rendezvous().clone();

        assert_eq!(rendezvous.address, "127.0.0.1");
        assert_ne!(rendezvous.port, 0);

        let mut stream = TcpStream::connect(rendezvous.to_string())
            .await
            .expect("connect");
        stream.write_all(b"{\"type\":\"hello\"}\n").await.unwrap();
    }
}
