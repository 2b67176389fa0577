use std::io;

use thiserror::Error;

/// Errors raised while constructing a client or emitting metrics.
#[derive(Debug, Error)]
pub enum Error {
    /// The statsd host could not be resolved to an IPv4 address.
    #[error("unable to resolve statsd host {host}:{port}: {source}")]
    Resolution {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// A metric value or sample rate was out of range. Nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The local datagram write failed.
    #[error("failed to transmit metrics: {0}")]
    Transmission(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
