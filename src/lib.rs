/*!
A Rust statsd client.

The statsd protocol consists of plain-text messages sent over UDP, each
line containing not much more than a key, a value and a type code.
Several lines may share one datagram when sent through a [`Pipeline`].

Due to the inherent design of the system, there is no guarantee that metrics
will be received by the server, and there is (by design) no indication of
this.

```no_run
use statistician::{Client, Emitter};

# fn main() -> statistician::Result<()> {
let mut client = Client::new("localhost", 8125, Some("myapp"))?;
client.incr("some.metric.completed")?;
client.gauge("power_level.observed", 9001.0)?;
# Ok(())
# }
```
*/
pub mod client;
pub mod emitter;
pub mod error;
pub mod metric;
pub mod pipeline;
pub mod timer;
pub mod transport;

pub use crate::client::{Client, Config, DEFAULT_HOST, DEFAULT_PORT};
pub use crate::emitter::Emitter;
pub use crate::error::{Error, Result};
pub use crate::metric::MetricKind;
pub use crate::pipeline::Pipeline;
pub use crate::timer::{Timed, Timer};
pub use crate::transport::{NopTransport, SpyTransport, Transport, UdpTransport};
