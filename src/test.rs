#[cfg(test)]
mod tests {
    use crate::component::{connect, Component, Node, NodeBuilder, NodeIo};
    use crate::error::{PushFailReason, RecvError, SendFailReason};
    use crate::queue::MessageQueue;
    use crate::runtime::Runtime;
    use crate::signal::WakeSignal;
    use crate::utils::RunFlag;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    // ---- helpers

    fn wait_until(dur: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        loop {
            if cond() {
                return true;
            }
            if start.elapsed() > dur {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    // ---- test components

    /// Emits a fixed sequence on output 0, then idles until stopped.
    struct IntSource {
        values: Vec<u64>,
        next: usize,
        sent: Arc<AtomicUsize>,
    }

    impl IntSource {
        const OUT: u32 = 0;

        fn new(values: Vec<u64>) -> (Self, Arc<AtomicUsize>) {
            let sent = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    values,
                    next: 0,
                    sent: sent.clone(),
                },
                sent,
            )
        }

        fn node(self) -> Node {
            NodeBuilder::new().output::<u64>(Self::OUT).build(self)
        }
    }

    impl Component for IntSource {
        fn initialize(&mut self, _io: &mut NodeIo) {}

        fn process(&mut self, io: &mut NodeIo) {
            if self.next < self.values.len() {
                if io.send::<u64>(Self::OUT, self.values[self.next]).is_err() {
                    return;
                }
                self.next += 1;
                self.sent.fetch_add(1, Ordering::SeqCst);
            } else {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// Appends everything received on input 0 to a shared list, optionally
    /// sleeping per item to simulate a slow consumer.
    struct IntSink {
        seen: Arc<Mutex<Vec<u64>>>,
        delay: Duration,
    }

    impl IntSink {
        const IN: u32 = 0;

        fn new(delay: Duration) -> (Self, Arc<Mutex<Vec<u64>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    seen: seen.clone(),
                    delay,
                },
                seen,
            )
        }

        fn node(self, capacity: usize) -> Node {
            NodeBuilder::new().input::<u64>(Self::IN, capacity).build(self)
        }
    }

    impl Component for IntSink {
        fn initialize(&mut self, _io: &mut NodeIo) {}

        fn process(&mut self, io: &mut NodeIo) {
            match io.recv::<u64>(Self::IN) {
                Ok(value) => {
                    self.seen.lock().unwrap().push(value);
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
                Err(_) => {}
            }
        }
    }

    // ---- scenarios

    #[test]
    fn straight_pipe_delivers_in_order() {
        let mut rt = Runtime::new();
        let (sink, seen) = IntSink::new(Duration::ZERO);
        let sink = Arc::new(Mutex::new(Some(sink)));

        rt.register_component("Source", || IntSource::new(vec![1, 2, 3]).0.node());
        {
            let sink = sink.clone();
            rt.register_component("Sink", move || {
                sink.lock().unwrap().take().expect("single sink instance").node(8)
            });
        }

        rt.add_node("Source", "src").unwrap();
        rt.add_node("Sink", "snk").unwrap();
        rt.add_edge("src", IntSource::OUT, "snk", IntSink::IN);
        rt.start_network();

        assert!(wait_until(Duration::from_secs(2), || seen
            .lock()
            .unwrap()
            .len()
            >= 3));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);

        rt.stop_network();
    }

    #[test]
    fn backpressure_bounds_producer_lead() {
        let capacity = 2usize;
        let (source, sent) = IntSource::new((1..=5).collect());
        let (sink, seen) = IntSink::new(Duration::from_millis(10));

        let mut src = source.node();
        let mut snk = sink.node(capacity);
        connect(&src, IntSource::OUT, &snk, IntSink::IN);

        src.start_process();
        snk.start_process();

        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            // Sample the producer first: its count may only grow between
            // the two reads, so the bound below cannot fail spuriously.
            let produced = sent.load(Ordering::SeqCst);
            let consumed = seen.lock().unwrap().len();
            // The producer can be ahead by the queue depth plus the one
            // item popped but not yet recorded by the consumer.
            assert!(produced <= consumed + capacity + 1);
            if consumed >= 5 {
                break;
            }
            assert!(Instant::now() < deadline, "sink did not drain in time");
            thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);

        src.stop_process();
        snk.stop_process();
    }

    struct BlockedReceiver {
        terminated: Arc<AtomicBool>,
    }

    impl Component for BlockedReceiver {
        fn initialize(&mut self, _io: &mut NodeIo) {}

        fn process(&mut self, io: &mut NodeIo) {
            if let Err(RecvError::Terminated) = io.recv::<f64>(0) {
                self.terminated.store(true, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn stop_unblocks_receiver() {
        let terminated = Arc::new(AtomicBool::new(false));
        let mut node = NodeBuilder::new().input::<f64>(0, 4).build(BlockedReceiver {
            terminated: terminated.clone(),
        });

        node.start_process();
        assert!(wait_until(Duration::from_secs(1), || node.is_running()));

        node.stop_process();
        assert!(wait_until(Duration::from_secs(1), || terminated
            .load(Ordering::SeqCst)));
        assert!(wait_until(Duration::from_secs(1), || !node.is_running()));
        node.join();
    }

    struct Configured {
        config: Arc<Mutex<Vec<u32>>>,
        initialized: Arc<AtomicBool>,
    }

    impl Component for Configured {
        fn initialize(&mut self, io: &mut NodeIo) {
            let mut config = Vec::new();
            for index in 0..3u32 {
                match io.recv::<u32>(index) {
                    Ok(value) => config.push(value),
                    Err(_) => return,
                }
            }
            *self.config.lock().unwrap() = config;
            self.initialized.store(true, Ordering::SeqCst);
        }

        fn process(&mut self, _io: &mut NodeIo) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn initial_messages_drive_initialize() {
        let config = Arc::new(Mutex::new(Vec::new()));
        let initialized = Arc::new(AtomicBool::new(false));

        let behavior = Arc::new(Mutex::new(Some(Configured {
            config: config.clone(),
            initialized: initialized.clone(),
        })));

        let mut rt = Runtime::new();
        rt.register_component("Configured", move || {
            NodeBuilder::new()
                .input::<u32>(0, 1)
                .input::<u32>(1, 1)
                .input::<u32>(2, 1)
                .build(behavior.lock().unwrap().take().expect("single instance"))
        });
        rt.add_node("Configured", "cfg").unwrap();

        rt.add_initial("cfg", 0, 600u32);
        rt.add_initial("cfg", 1, 40u32);
        rt.add_initial("cfg", 2, 4u32);
        rt.start_network();

        assert!(wait_until(Duration::from_secs(1), || initialized
            .load(Ordering::SeqCst)));
        assert_eq!(*config.lock().unwrap(), vec![600, 40, 4]);

        rt.stop_network();
    }

    #[test]
    fn type_mismatch_leaves_queue_untouched() {
        let (sink, _seen) = IntSink::new(Duration::ZERO);
        let node = sink.node(4);

        // u32 into a u64 port: rejected, nothing enqueued.
        let err = node.inject::<u32>(IntSink::IN, 7).unwrap_err();
        assert_eq!(err.reason, SendFailReason::TypeMismatch);
        assert_eq!(err.value, Some(7));
        assert_eq!(node.input(IntSink::IN).unwrap().message_count(), 0);

        // Same law on the sending side.
        let out_node = NodeBuilder::new()
            .output::<f64>(0)
            .build(IntSource::new(vec![]).0);
        let running = RunFlag::new(true);
        let err = out_node
            .output(0)
            .unwrap()
            .send::<u32>(7, &running, Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err.reason, SendFailReason::TypeMismatch);
    }

    struct AwaitProbe {
        order: Vec<u32>,
        results: Arc<Mutex<Vec<u32>>>,
    }

    impl Component for AwaitProbe {
        fn initialize(&mut self, _io: &mut NodeIo) {}

        fn process(&mut self, io: &mut NodeIo) {
            match io.await_any(&self.order) {
                Ok(index) => {
                    let _ = io.recv::<u64>(index);
                    self.results.lock().unwrap().push(index);
                }
                Err(_) => {}
            }
        }
    }

    #[test]
    fn await_returns_the_ready_input() {
        let results = Arc::new(Mutex::new(Vec::new()));
        let mut node = NodeBuilder::new()
            .input::<u64>(0, 4)
            .input::<u64>(1, 4)
            .input::<u64>(2, 4)
            .build(AwaitProbe {
                order: vec![0, 1, 2],
                results: results.clone(),
            });

        // Only B (index 1) is ready before the first await.
        node.inject::<u64>(1, 7).unwrap();
        node.start_process();
        assert!(wait_until(Duration::from_secs(1), || results
            .lock()
            .unwrap()
            .len()
            >= 1));

        node.inject::<u64>(0, 8).unwrap();
        assert!(wait_until(Duration::from_secs(1), || results
            .lock()
            .unwrap()
            .len()
            >= 2));

        assert_eq!(*results.lock().unwrap(), vec![1, 0]);
        node.stop_process();
    }

    #[test]
    fn await_prefers_argument_order() {
        let results = Arc::new(Mutex::new(Vec::new()));
        let mut node = NodeBuilder::new()
            .input::<u64>(0, 4)
            .input::<u64>(1, 4)
            .build(AwaitProbe {
                order: vec![1, 0],
                results: results.clone(),
            });

        // Both ready: the first index in the argument list wins.
        node.inject::<u64>(0, 1).unwrap();
        node.inject::<u64>(1, 2).unwrap();
        node.start_process();

        assert!(wait_until(Duration::from_secs(1), || results
            .lock()
            .unwrap()
            .len()
            >= 1));
        assert_eq!(results.lock().unwrap()[0], 1);
        node.stop_process();
    }

    // ---- queue boundaries

    #[test]
    fn capacity_one_queue_blocks_second_push() {
        let signal = WakeSignal::new();
        let queue = MessageQueue::new::<u64>(1, signal.handle());

        queue.push(1u64, Duration::from_millis(10)).unwrap();
        assert_eq!(queue.message_count(), 1);
        assert!(queue.message_count() <= queue.capacity());

        let err = queue.push(2u64, Duration::from_millis(50)).unwrap_err();
        assert_eq!(err.reason, PushFailReason::Full);
        assert_eq!(err.value, 2);

        // The type witness rejects a mistyped push outright.
        let err = queue.push(3.5f64, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.reason, PushFailReason::Type);
        assert_eq!(queue.message_count(), 1);

        assert_eq!(queue.pop::<u64>(), Some(1));
        queue.push(2u64, Duration::from_millis(10)).unwrap();
        assert_eq!(queue.pop::<u64>(), Some(2));
    }

    #[test]
    fn close_is_idempotent_and_rejects_pushes() {
        let signal = WakeSignal::new();
        let queue = MessageQueue::new::<u64>(2, signal.handle());

        queue.push(1u64, Duration::from_millis(10)).unwrap();
        queue.close();
        queue.close();
        assert!(queue.is_closed());

        let err = queue.push(2u64, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.reason, PushFailReason::Closed);

        // Pending messages stay readable after close.
        assert_eq!(queue.pop::<u64>(), Some(1));
        assert_eq!(queue.pop::<u64>(), None);
    }

    struct DiscardProbe {
        outcome: Arc<Mutex<Option<bool>>>,
    }

    impl Component for DiscardProbe {
        fn initialize(&mut self, io: &mut NodeIo) {
            let ok = io.send::<u64>(0, 42).is_ok();
            *self.outcome.lock().unwrap() = Some(ok);
        }

        fn process(&mut self, _io: &mut NodeIo) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn unconnected_output_discards_silently() {
        let outcome = Arc::new(Mutex::new(None));
        let mut node = NodeBuilder::new().output::<u64>(0).build(DiscardProbe {
            outcome: outcome.clone(),
        });

        node.start_process();
        assert!(wait_until(Duration::from_secs(1), || outcome
            .lock()
            .unwrap()
            .is_some()));
        assert_eq!(*outcome.lock().unwrap(), Some(true));
        node.stop_process();
    }

    #[test]
    fn receiver_drains_messages_after_producer_gone() {
        let (source, sent) = IntSource::new(vec![10, 20, 30]);
        let (sink, seen) = IntSink::new(Duration::ZERO);

        let mut src = source.node();
        let mut snk = sink.node(8);
        connect(&src, IntSource::OUT, &snk, IntSink::IN);

        src.start_process();
        assert!(wait_until(Duration::from_secs(1), || sent
            .load(Ordering::SeqCst)
            >= 3));
        src.stop_process();
        drop(src);

        snk.start_process();
        assert!(wait_until(Duration::from_secs(1), || seen
            .lock()
            .unwrap()
            .len()
            >= 3));
        assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30]);
        snk.stop_process();
    }

    // ---- wiring rules

    #[test]
    fn connect_rejects_self_loops_and_type_mismatch() {
        let node = NodeBuilder::new()
            .input::<u64>(0, 4)
            .output::<u64>(0)
            .build(IntSource::new(vec![]).0);

        // Self-loop: output stays unconnected.
        connect(&node, 0, &node, 0);
        assert!(!node.output(0).unwrap().is_connected());

        // Type mismatch: likewise.
        let (sink, _seen) = IntSink::new(Duration::ZERO);
        let typed = NodeBuilder::new().input::<f64>(0, 4).build(sink);
        connect(&node, 0, &typed, 0);
        assert!(!node.output(0).unwrap().is_connected());
    }

    #[test]
    fn registry_checks_ids_and_names() {
        let mut rt = Runtime::new();
        rt.register_component("Source", || IntSource::new(vec![]).0.node());

        assert!(rt.add_node("NoSuchComponent", "a").is_err());
        rt.add_node("Source", "a").unwrap();
        assert!(rt.add_node("Source", "a").is_err());

        // The instance is the factory's product: same ports.
        assert!(rt.node("a").unwrap().output(IntSource::OUT).is_some());
        assert!(rt.node("a").unwrap().input(0).is_none());

        // Unknown names are quiet no-ops.
        rt.add_edge("a", 0, "missing", 0);
        rt.add_initial("missing", 0, 1u64);
        rt.remove_node("missing");

        rt.remove_node("a");
        assert!(rt.node("a").is_none());
    }

    #[test]
    fn ports_without_queues_report_defaults() {
        let node = NodeBuilder::new()
            .output::<u64>(0)
            .build(IntSource::new(vec![]).0);
        let out = node.output(0).unwrap();

        assert!(!out.is_connected());
        assert!(!out.has_message());
        assert_eq!(out.message_count(), 0);
        assert_eq!(out.capacity(), 0);
        assert!(out.is_closed());
    }
}
