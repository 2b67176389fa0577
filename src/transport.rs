use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex, OnceLock};

use log::debug;


/// Something that can deliver a datagram payload to a statsd server.
///
/// Implementations must be safe to share between every client and pipeline
/// in the process. A single `send` writes exactly one datagram.
pub trait Transport: Send + Sync {
    /// Send `payload` to `destination`, returning the number of bytes written.
    fn send(&self, destination: SocketAddr, payload: &[u8]) -> io::Result<usize>;
}


/// UDP transport with a socket that is bound on first use.
///
/// The socket is never closed explicitly; it lives as long as the transport.
#[derive(Debug, Default)]
pub struct UdpTransport {
    socket: OnceLock<UdpSocket>,
}

impl UdpTransport {
    pub fn new() -> UdpTransport {
        UdpTransport { socket: OnceLock::new() }
    }

    fn socket(&self) -> io::Result<&UdpSocket> {
        if let Some(socket) = self.socket.get() {
            return Ok(socket);
        }
        // Bind to a generic port as we'll only be writing on this
        // socket.
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0)))?;
        debug!("bound statsd socket to {}", socket.local_addr()?);
        // A racing thread may have won; its socket is kept and ours dropped.
        Ok(self.socket.get_or_init(|| socket))
    }
}

impl Transport for UdpTransport {
    fn send(&self, destination: SocketAddr, payload: &[u8]) -> io::Result<usize> {
        self.socket()?.send_to(payload, destination)
    }
}


/// The process-wide UDP transport used by clients unless another is given.
pub fn shared() -> Arc<UdpTransport> {
    static SHARED: OnceLock<Arc<UdpTransport>> = OnceLock::new();
    SHARED.get_or_init(|| Arc::new(UdpTransport::new())).clone()
}


/// Transport that discards every payload.
///
/// Useful for disabling metric collection.
#[derive(Debug, Clone, Default)]
pub struct NopTransport;

impl Transport for NopTransport {
    fn send(&self, _destination: SocketAddr, _payload: &[u8]) -> io::Result<usize> {
        Ok(0)
    }
}


/// Transport that records every datagram instead of sending it.
///
/// Clones share the same record, so a test can keep one handle and give
/// another to the client under test.
#[derive(Debug, Clone, Default)]
pub struct SpyTransport {
    sent: Arc<Mutex<Vec<(SocketAddr, Vec<u8>)>>>,
}

impl SpyTransport {
    pub fn new() -> SpyTransport {
        SpyTransport::default()
    }

    /// Payloads sent so far, in order, decoded as UTF-8.
    pub fn datagrams(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|(_, payload)| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }

    /// Destinations of the datagrams sent so far, in order.
    pub fn destinations(&self) -> Vec<SocketAddr> {
        self.lock().iter().map(|(addr, _)| *addr).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SocketAddr, Vec<u8>)>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for SpyTransport {
    fn send(&self, destination: SocketAddr, payload: &[u8]) -> io::Result<usize> {
        self.lock().push((destination, payload.to_vec()));
        Ok(payload.len())
    }
}
