use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::emitter::Emitter;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::transport::{self, Transport};


pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8125;


/// Construction-time settings for a [`Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host name or address of the statsd server.
    pub host: String,
    /// UDP port of the statsd server.
    pub port: u16,
    /// Namespace joined with a `.` before every stat name.
    pub prefix: Option<String>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            prefix: None,
        }
    }
}


/// Client socket for statsd servers.
///
/// After creating a client you can use it to send metrics to the
/// configured statsd server; every operation is sent as its own datagram.
/// Use [`pipeline`](Client::pipeline) to group several into one.
///
/// # Example
///
/// Creating a client and sending metrics is easy.
///
/// ```no_run
/// use statistician::{Client, Emitter};
///
/// let mut client = Client::new("127.0.0.1", 8125, Some("myapp")).unwrap();
/// client.incr("some.metric.completed").unwrap();
/// ```
pub struct Client {
    destination: SocketAddr,
    prefix: String,
    transport: Arc<dyn Transport>,
    rng: Box<dyn RngCore + Send>,
}

impl Client {
    /// Construct a new statsd client given a host, port & prefix.
    ///
    /// The host is resolved once, here, to its first IPv4 address.
    pub fn new(host: &str, port: u16, prefix: Option<&str>) -> Result<Client> {
        let destination = resolve(host, port)?;
        let prefix = match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}.", prefix),
            _ => String::new(),
        };
        Ok(Client {
            destination: destination,
            prefix: prefix,
            transport: transport::shared(),
            rng: Box::new(StdRng::from_entropy()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Client> {
        Client::new(&config.host, config.port, config.prefix.as_deref())
    }

    /// Send through `transport` instead of the process-wide UDP socket.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Client {
        self.transport = transport;
        self
    }

    /// Use `rng` for sampling decisions.
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Client {
        self.rng = Box::new(rng);
        self
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Start a pipeline that groups metrics into a single datagram.
    ///
    /// In the below example, `gorets`, `glork` and `gaugor` are all sent
    /// in a single packet when the pipeline goes out of scope:
    ///
    /// ```no_run
    /// # use statistician::{Client, Emitter};
    /// # let mut client = Client::new("localhost", 8125, None).unwrap();
    /// let mut pipeline = client.pipeline();
    /// pipeline.incr("gorets").unwrap();
    /// {
    ///     let _timer = pipeline.timer("glork");
    ///     // ...
    /// }
    /// pipeline.gauge("gaugor", 16.0).unwrap();
    /// ```
    pub fn pipeline(&mut self) -> Pipeline<'_> {
        Pipeline::new(self)
    }

    /// Send one datagram to the configured server.
    pub(crate) fn transmit(&self, payload: &str) -> Result<usize> {
        trace!("sending {:?} to {}", payload, self.destination);
        Ok(self.transport.send(self.destination, payload.as_bytes())?)
    }
}

impl Emitter for Client {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn draw(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn emit(&mut self, line: String) -> Result<()> {
        self.transmit(&line).map(|_| ())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Client")
            .field("destination", &self.destination)
            .field("prefix", &self.prefix)
            .finish()
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let resolution_error = |source| Error::Resolution {
        host: host.to_string(),
        port: port,
        source: source,
    };
    let mut addrs = (host, port).to_socket_addrs().map_err(resolution_error)?;
    addrs.find(SocketAddr::is_ipv4).ok_or_else(|| {
        resolution_error(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "no IPv4 address",
        ))
    })
}
