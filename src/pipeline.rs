use std::mem;
use std::thread;

use log::{debug, warn};

use crate::client::Client;
use crate::emitter::Emitter;
use crate::error::Result;


/// Groups metrics from one scope into a single datagram.
///
/// A pipeline has the same operations as a [`Client`] but buffers every
/// line instead of sending it. The buffered lines are joined with newlines,
/// in call order, and sent as one datagram when the pipeline is flushed or
/// leaves scope. Nothing is sent for an empty pipeline, and a pipeline
/// dropped while its thread is panicking is discarded.
pub struct Pipeline<'a> {
    client: &'a mut Client,
    lines: Vec<String>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(client: &'a mut Client) -> Pipeline<'a> {
        Pipeline { client: client, lines: Vec::new() }
    }

    /// Lines buffered so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Send the buffered lines now, returning the bytes written.
    ///
    /// Unlike a flush on drop this reports transmission errors.
    pub fn flush(mut self) -> Result<usize> {
        self.send_batch()
    }

    fn send_batch(&mut self) -> Result<usize> {
        if self.lines.is_empty() {
            return Ok(0);
        }
        let payload = mem::take(&mut self.lines).join("\n");
        self.client.transmit(&payload)
    }
}

impl<'a> Emitter for Pipeline<'a> {
    fn prefix(&self) -> &str {
        self.client.prefix()
    }

    fn draw(&mut self) -> f64 {
        self.client.draw()
    }

    fn emit(&mut self, line: String) -> Result<()> {
        self.lines.push(line);
        Ok(())
    }
}

impl<'a> Drop for Pipeline<'a> {
    fn drop(&mut self) {
        if thread::panicking() {
            if !self.lines.is_empty() {
                debug!("discarding {} buffered metrics", self.lines.len());
            }
            return;
        }
        if let Err(err) = self.send_batch() {
            warn!("failed to flush metrics pipeline: {}", err);
        }
    }
}


#[cfg(test)]
mod test {
    use crate::client::Client;
    use crate::emitter::Emitter;
    use crate::error::{Error, Result};
    use crate::timer::test::assert_timing;
    use crate::transport::SpyTransport;
    use itertools::Itertools;
    use rand::rngs::mock::StepRng;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread::sleep;
    use std::time::Duration;

    fn client(prefix: Option<&str>) -> (Client, SpyTransport) {
        let spy = SpyTransport::new();
        let client = Client::new("127.0.0.1", 8125, prefix)
            .unwrap()
            .with_transport(Arc::new(spy.clone()))
            .with_rng(StepRng::new(0, 0));
        (client, spy)
    }

    #[test]
    fn test_pipeline() {
        let (mut client, spy) = client(None);
        {
            let mut pipeline = client.pipeline();
            pipeline.incr("gorets").unwrap();
            assert!(spy.datagrams().is_empty());

            {
                let _timer = pipeline.timer("glork");
                sleep(Duration::from_millis(10));
            }
            assert!(spy.datagrams().is_empty());

            pipeline.gauge("gaugor", 16.0).unwrap();
            assert!(spy.datagrams().is_empty());
        }

        let sent = spy.datagrams();
        assert_eq!(1, sent.len());
        let lines = sent[0].lines().collect_vec();
        assert_eq!(3, lines.len());
        assert_eq!("gorets:1|c", lines[0]);
        assert_timing(lines[1], "glork");
        assert_eq!("gaugor:16|g", lines[2]);
    }

    #[test]
    fn test_pipeline_flush() {
        let (mut client, spy) = client(Some("app"));
        let mut pipeline = client.pipeline();
        pipeline.incr("a").unwrap();
        pipeline.sampled_count("b", 2, 0.5).unwrap();
        pipeline.incr_gauge("c", -1.0).unwrap();
        pipeline.set("d", "x").unwrap();
        pipeline.time("e", 5.0).unwrap();
        assert_eq!(5, pipeline.len());

        let payload = "app.a:1|c\napp.b:2|c@0.5\napp.c:-1|g\napp.d:x|s\napp.e:5|ms";
        assert_eq!(payload.len(), pipeline.flush().unwrap());
        assert_eq!(vec![payload], spy.datagrams());
    }

    #[test]
    fn test_pipeline_keeps_duplicates_in_order() {
        let (mut client, spy) = client(None);
        {
            let mut pipeline = client.pipeline();
            pipeline.incr("b").unwrap();
            pipeline.incr("a").unwrap();
            pipeline.incr("b").unwrap();
        }
        assert_eq!(vec!["b:1|c\na:1|c\nb:1|c"], spy.datagrams());
    }

    #[test]
    fn test_empty_pipeline_sends_nothing() {
        let (mut client, spy) = client(None);
        {
            let pipeline = client.pipeline();
            assert!(pipeline.is_empty());
        }
        assert_eq!(0, client.pipeline().flush().unwrap());
        assert!(spy.datagrams().is_empty());
    }

    #[test]
    fn test_pipeline_invalid_argument_is_not_buffered() {
        let (mut client, spy) = client(None);
        {
            let mut pipeline = client.pipeline();
            pipeline.incr("a").unwrap();
            let err = pipeline.gauge("g", -1.0).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
            assert_eq!(vec!["a:1|c"], pipeline.lines());
        }
        assert_eq!(vec!["a:1|c"], spy.datagrams());
    }

    #[test]
    fn test_pipeline_flushes_on_early_return() {
        fn body(client: &mut Client) -> Result<()> {
            let mut pipeline = client.pipeline();
            pipeline.incr("before").unwrap();
            pipeline.gauge("bad", -5.0)?;
            pipeline.incr("after").unwrap();
            Ok(())
        }

        let (mut client, spy) = client(None);
        assert!(body(&mut client).is_err());
        assert_eq!(vec!["before:1|c"], spy.datagrams());
    }

    #[test]
    fn test_pipeline_discarded_on_panic() {
        let (mut client, spy) = client(None);
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut pipeline = client.pipeline();
            pipeline.incr("a").unwrap();
            panic!("body failed");
        }));
        assert!(result.is_err());
        assert!(spy.datagrams().is_empty());
    }

    #[test]
    fn test_nested_timer_emits_through_pipeline() {
        let (mut client, spy) = client(Some("app"));
        {
            let mut pipeline = client.pipeline();
            let mut timer = pipeline.timer("outer");
            timer.incr("inner").unwrap();
            timer.stop().unwrap();
            assert_eq!(2, pipeline.len());
        }
        let sent = spy.datagrams();
        assert_eq!(1, sent.len());
        let lines = sent[0].lines().collect_vec();
        assert_eq!("app.inner:1|c", lines[0]);
        assert_timing(lines[1], "app.outer");
    }
}
