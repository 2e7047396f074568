//! Nonblocking TCP transport with per-connection byte queues.
//!
//! Connections are numbered from 1. Reads drain into append-only
//! queues that the protocol layer inspects and flushes whole; a read
//! or write failure closes the connection and flips it to the closed
//! state the turn loop checks before every send. One misbehaving
//! client never takes the game down.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::ServerError;

/// Per-connection receive queue cap; bytes beyond it are dropped until
/// the protocol layer flushes.
const QUEUE_CAP: usize = 256 * 1024;

/// How long a poll sleeps between read sweeps.
const POLL_NAP: Duration = Duration::from_millis(5);

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Listener plus numbered client connections.
#[derive(Debug)]
pub struct Transport {
    listener: TcpListener,
    conns: Vec<Option<TcpStream>>,
    queues: Vec<Vec<u8>>,
}

impl Transport {
    /// Bind the listening socket. Port 0 picks an ephemeral port
    /// (useful in tests); see [`local_addr`](Transport::local_addr).
    pub fn bind(port: u16, max_conns: usize) -> Result<Transport, ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        Ok(Transport {
            listener,
            conns: (0..max_conns).map(|_| None).collect(),
            queues: (0..max_conns).map(|_| Vec::new()).collect(),
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Block until the next client connects; returns its connection
    /// number (1-based).
    pub fn wait_for_conn(&mut self) -> Result<usize, ServerError> {
        let (stream, peer) = self.listener.accept()?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;

        let slot = self
            .conns
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| {
                ServerError::Io(std::io::Error::new(
                    ErrorKind::Other,
                    "connection table full",
                ))
            })?;
        self.conns[slot] = Some(stream);
        self.queues[slot].clear();
        info!(conn = slot + 1, %peer, "client connected");
        Ok(slot + 1)
    }

    /// Drain readable sockets into their queues, waiting up to
    /// `timeout` for the first data. Returns whether anything arrived.
    pub fn poll(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let mut any = false;
            for slot in 0..self.conns.len() {
                if self.read_available(slot) {
                    any = true;
                }
            }
            if any {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(POLL_NAP);
        }
    }

    fn read_available(&mut self, slot: usize) -> bool {
        let Some(stream) = self.conns[slot].as_mut() else {
            return false;
        };
        let mut got = false;
        let mut tmp = [0u8; 4096];
        loop {
            match stream.read(&mut tmp) {
                Ok(0) => {
                    debug!(conn = slot + 1, "peer closed");
                    self.conns[slot] = None;
                    return got;
                }
                Ok(n) => {
                    let room = QUEUE_CAP.saturating_sub(self.queues[slot].len());
                    let take = n.min(room);
                    if take < n {
                        warn!(conn = slot + 1, dropped = n - take, "receive queue full");
                    }
                    self.queues[slot].extend_from_slice(&tmp[..take]);
                    got = true;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return got,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(conn = slot + 1, error = %e, "read failure, closing");
                    self.conns[slot] = None;
                    return got;
                }
            }
        }
    }

    /// Send bytes; failure closes the connection.
    pub fn send(&mut self, conn: usize, data: &[u8]) {
        let slot = conn - 1;
        let Some(stream) = self.conns.get_mut(slot).and_then(Option::as_mut) else {
            return;
        };
        if let Err(e) = stream.write_all(data) {
            warn!(conn, error = %e, "write failure, closing");
            self.conns[slot] = None;
        }
    }

    /// The bytes queued on a connection.
    pub fn queue(&self, conn: usize) -> &[u8] {
        &self.queues[conn - 1]
    }

    /// Queued byte count.
    pub fn queue_len(&self, conn: usize) -> usize {
        self.queues[conn - 1].len()
    }

    /// Discard a connection's queued bytes.
    pub fn flush(&mut self, conn: usize) {
        self.queues[conn - 1].clear();
    }

    /// Whether the connection is still live.
    pub fn is_open(&self, conn: usize) -> bool {
        self.conns
            .get(conn - 1)
            .map_or(false, Option::is_some)
    }

    /// Close a connection (severing a timed-out team).
    pub fn close(&mut self, conn: usize) {
        self.conns[conn - 1] = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;
    use std::thread;

    #[test]
    fn accept_queue_and_flush() {
        let mut t = Transport::bind(0, 2).unwrap();
        let addr = t.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut s = TcpStream::connect(addr).unwrap();
            s.write_all(b"hello there").unwrap();
            let mut buf = [0u8; 3];
            s.read_exact(&mut buf).unwrap();
            buf
        });

        let conn = t.wait_for_conn().unwrap();
        assert_eq!(conn, 1);
        assert!(t.is_open(conn));

        // Wait for the greeting.
        while t.queue_len(conn) < 11 {
            assert!(t.poll(Duration::from_secs(5)) || t.queue_len(conn) >= 11);
        }
        assert_eq!(t.queue(conn), b"hello there");

        t.send(conn, b"ack");
        t.flush(conn);
        assert_eq!(t.queue_len(conn), 0);

        assert_eq!(&client.join().unwrap(), b"ack");
    }

    #[test]
    fn peer_hangup_closes_the_connection() {
        let mut t = Transport::bind(0, 1).unwrap();
        let addr = t.local_addr().unwrap();

        let client = thread::spawn(move || {
            let s = TcpStream::connect(addr).unwrap();
            drop(s);
        });
        let conn = t.wait_for_conn().unwrap();
        client.join().unwrap();

        // The hangup surfaces on the next poll sweep.
        let deadline = Instant::now() + Duration::from_secs(5);
        while t.is_open(conn) && Instant::now() < deadline {
            t.poll(Duration::from_millis(20));
        }
        assert!(!t.is_open(conn));
    }
}
