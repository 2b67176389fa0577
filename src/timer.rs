use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use log::warn;

use crate::emitter::Emitter;
use crate::error::Result;


/// A running timer bound to an emitter and a stat name.
///
/// The elapsed time is recorded through [`Emitter::time_duration`] when the
/// timer is stopped or dropped, including when the scope unwinds from a
/// panic. Errors during a drop can't be returned and are logged instead;
/// use [`stop`](Timer::stop) to see them.
///
/// ```no_run
/// # use statistician::{Client, Emitter};
/// # let mut client = Client::new("localhost", 8125, None).unwrap();
/// {
///     let mut timer = client.timer("response.duration");
///     timer.incr("response.count").unwrap();
///     // Your code here.
/// }
/// ```
pub struct Timer<'a, E: Emitter> {
    emitter: &'a mut E,
    stat: String,
    start: Option<Instant>,
}

impl<'a, E: Emitter> Timer<'a, E> {
    pub(crate) fn start(emitter: &'a mut E, stat: &str) -> Timer<'a, E> {
        Timer {
            emitter: emitter,
            stat: stat.to_string(),
            start: Some(Instant::now()),
        }
    }

    pub fn stat(&self) -> &str {
        &self.stat
    }

    /// Time since the timer started, if it is running.
    pub fn elapsed(&self) -> Option<Duration> {
        self.start.map(|start| start.elapsed())
    }

    /// Stop the timer and record the elapsed time.
    pub fn stop(mut self) -> Result<Duration> {
        self.record().map(Option::unwrap_or_default)
    }

    /// Turn the timer into a wrapper around `f`.
    ///
    /// The scope timing is abandoned; instead each [`Timed::call`]
    /// records the duration of that single invocation.
    ///
    /// ```no_run
    /// # use statistician::{Client, Emitter};
    /// # let mut client = Client::new("localhost", 8125, None).unwrap();
    /// let mut lookup = client.timer("cache.lookup").wrap(|| {
    ///     // Your code here.
    /// });
    /// lookup.call();
    /// lookup.call();
    /// ```
    pub fn wrap<F>(mut self, f: F) -> Timed<'a, E, F> {
        self.start = None;
        Timed { timer: self, f: f }
    }

    fn record(&mut self) -> Result<Option<Duration>> {
        match self.start.take() {
            Some(start) => {
                let elapsed = start.elapsed();
                self.emitter.time_duration(&self.stat, elapsed)?;
                Ok(Some(elapsed))
            }
            None => Ok(None),
        }
    }
}

impl<'a, E: Emitter> Deref for Timer<'a, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &*self.emitter
    }
}

impl<'a, E: Emitter> DerefMut for Timer<'a, E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut *self.emitter
    }
}

impl<'a, E: Emitter> Drop for Timer<'a, E> {
    fn drop(&mut self) {
        if let Err(err) = self.record() {
            warn!("failed to record timer {}: {}", self.stat, err);
        }
    }
}


/// A callable whose every invocation is timed.
///
/// Created by [`Timer::wrap`]. Arguments are passed by capturing them in
/// the wrapped closure.
pub struct Timed<'a, E: Emitter, F> {
    timer: Timer<'a, E>,
    f: F,
}

impl<'a, E: Emitter, F> Timed<'a, E, F> {
    /// Invoke the wrapped callable and record how long it took.
    ///
    /// The sample is recorded before a panic from the callable continues to
    /// unwind. Failing results are returned unchanged.
    pub fn call<R>(&mut self) -> R
    where
        F: FnMut() -> R,
    {
        self.timer.start = Some(Instant::now());
        let scope = Scope(&mut self.timer);
        let out = (self.f)();
        drop(scope);
        out
    }
}

/// Records the enclosing invocation when dropped.
struct Scope<'t, 'a, E: Emitter>(&'t mut Timer<'a, E>);

impl<'t, 'a, E: Emitter> Drop for Scope<'t, 'a, E> {
    fn drop(&mut self) {
        if let Err(err) = self.0.record() {
            warn!("failed to record timer {}: {}", self.0.stat, err);
        }
    }
}
