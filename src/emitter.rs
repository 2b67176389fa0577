use std::fmt::Display;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::metric::{format_line, MetricKind};
use crate::timer::Timer;


/// The per-metric operations shared by [`Client`](crate::Client) and
/// [`Pipeline`](crate::Pipeline).
///
/// Implementors only decide what happens to a finished line: a client
/// sends it right away, a pipeline buffers it. Formatting, sampling and
/// argument checks live in the provided methods.
pub trait Emitter {
    /// Prefix written before every stat name, including its trailing `.`,
    /// or empty.
    fn prefix(&self) -> &str;

    /// Draw a uniform random value in `[0, 1)` for sampling decisions.
    fn draw(&mut self) -> f64;

    /// Hand off one formatted line.
    fn emit(&mut self, line: String) -> Result<()>;

    /// Increment a counter by 1
    ///
    /// ```no_run
    /// # use statistician::{Client, Emitter};
    /// # let mut client = Client::new("localhost", 8125, None).unwrap();
    /// client.incr("metric.completed").unwrap();
    /// ```
    fn incr(&mut self, stat: &str) -> Result<()> {
        self.count(stat, 1)
    }

    /// Decrement a counter by 1
    fn decr(&mut self, stat: &str) -> Result<()> {
        self.count(stat, -1)
    }

    /// Modify a counter by `by`, sending every time.
    fn count(&mut self, stat: &str, by: i64) -> Result<()> {
        send(self, stat, &by.to_string(), MetricKind::Counter, None)
    }

    /// Modify a counter by `by` only a `rate` fraction of the time.
    ///
    /// When the event is kept the line carries `@<rate>` so the server can
    /// scale it back up. A rate of 1 or more always sends, without a suffix.
    ///
    /// ```no_run
    /// # use statistician::{Client, Emitter};
    /// # let mut client = Client::new("localhost", 8125, None).unwrap();
    /// // Increment by 4 half of the time.
    /// client.sampled_count("metric.completed", 4, 0.5).unwrap();
    /// ```
    fn sampled_count(&mut self, stat: &str, by: i64, rate: f64) -> Result<()> {
        if !(rate > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "sample rate must be in (0, 1], got {}",
                rate
            )));
        }
        if rate >= 1.0 {
            return self.count(stat, by);
        }
        if self.draw() > rate {
            debug!("dropped sampled counter {} at rate {}", stat, rate);
            return Ok(());
        }
        send(self, stat, &by.to_string(), MetricKind::Counter, Some(rate))
    }

    /// Send a timer value.
    ///
    /// The value is expected to be in ms and is rounded half-up to a
    /// whole number.
    fn time(&mut self, stat: &str, value: f64) -> Result<()> {
        let rounded = (value + 0.5).trunc() as i64;
        send(self, stat, &rounded.to_string(), MetricKind::Timer, None)
    }

    /// Send a timer value from a `Duration`, kept to microsecond precision
    /// until rounding.
    fn time_duration(&mut self, stat: &str, elapsed: Duration) -> Result<()> {
        self.time(stat, elapsed.as_micros() as f64 / 1000.0)
    }

    /// Set a gauge value.
    ///
    /// Gauges can only be set to non-negative numbers; relative changes go
    /// through [`incr_gauge`](Emitter::incr_gauge).
    fn gauge(&mut self, stat: &str, value: f64) -> Result<()> {
        if !(value >= 0.0) || value.is_infinite() {
            return Err(Error::InvalidArgument(format!(
                "gauges can only be set to non-negative numbers, got {}",
                value
            )));
        }
        // Negative zero would print with a sign and read as a delta.
        let value = value + 0.0;
        send(self, stat, &value.to_string(), MetricKind::Gauge, None)
    }

    /// Modify a gauge value by `by`.
    fn incr_gauge(&mut self, stat: &str, by: f64) -> Result<()> {
        if !by.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "gauge delta must be finite, got {}",
                by
            )));
        }
        let value = by.to_string();
        let value = if value.starts_with('-') {
            value
        } else {
            format!("+{}", value)
        };
        send(self, stat, &value, MetricKind::Gauge, None)
    }

    /// Send a set value; the server counts unique values.
    fn set<V: Display>(&mut self, stat: &str, value: V) -> Result<()>
    where
        Self: Sized,
    {
        send(self, stat, &value.to_string(), MetricKind::Set, None)
    }

    /// Start a timer for `stat`, recorded when it is stopped or dropped.
    ///
    /// The timer dereferences to `self`, so metrics can still be emitted
    /// while it runs.
    fn timer(&mut self, stat: &str) -> Timer<'_, Self>
    where
        Self: Sized,
    {
        Timer::start(self, stat)
    }
}

/// Format one line with the emitter's prefix and emit it.
fn send<E: Emitter + ?Sized>(
    emitter: &mut E,
    stat: &str,
    value: &str,
    kind: MetricKind,
    rate: Option<f64>,
) -> Result<()> {
    let line = format_line(emitter.prefix(), stat, value, kind, rate);
    emitter.emit(line)
}
