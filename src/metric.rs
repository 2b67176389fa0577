//! Wire format for individual metric lines

use std::fmt;
use std::fmt::Write;


/// Enum of metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Timer,
    Gauge,
    Set,
}

impl MetricKind {
    /// The type code carried after the `|` of a metric line.
    pub fn code(self) -> &'static str {
        match self {
            MetricKind::Counter => "c",
            MetricKind::Timer   => "ms",
            MetricKind::Gauge   => "g",
            MetricKind::Set     => "s",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}


/// Format a single metric line.
///
/// The produced line has the form
///
/// ```text
/// <prefix><stat>:<value>|<code>[@<rate>]
/// ```
///
/// `prefix` is written verbatim, so it must already carry its trailing `.`
/// when non-empty. `value` is written as given. The sample rate is only
/// appended when it is below 1, using the shortest decimal form that parses
/// back to the same `f64` (`0.2`, never `0.200000`). No newline is appended.
pub fn format_line(
    prefix: &str,
    stat: &str,
    value: &str,
    kind: MetricKind,
    rate: Option<f64>,
) -> String {
    let mut line = String::with_capacity(prefix.len() + stat.len() + value.len() + 8);
    line.push_str(prefix);
    line.push_str(stat);
    line.push(':');
    line.push_str(value);
    line.push('|');
    line.push_str(kind.code());
    if let Some(rate) = rate {
        if rate < 1.0 {
            // f64's Display never uses exponent notation.
            let _ = write!(line, "@{}", rate);
        }
    }
    line
}
