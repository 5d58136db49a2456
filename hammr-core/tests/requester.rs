#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hammr_core::{
    BoxError, Error, Handler, HandlerConfig, Reporter, RequestOutcome, Requester, RunReport,
    RunState,
};
use parking_lot::Mutex;

/// Succeeds immediately, optionally failing every other call.
#[derive(Default)]
struct Scripted {
    alternate: bool,
    calls: AtomicU64,
    failures: AtomicU64,
    delay: Option<Duration>,
    init_calls: AtomicU64,
    fail_init: bool,
    seen_config: Mutex<Option<HandlerConfig>>,
}

#[async_trait::async_trait]
impl Handler for Scripted {
    async fn init(&self, config: &HandlerConfig) -> Result<(), BoxError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_config.lock() = Some(config.clone());
        if self.fail_init {
            return Err("target unreachable".into());
        }
        Ok(())
    }

    async fn do_request(&self) -> RequestOutcome {
        let start = Instant::now();
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let success = !(self.alternate && n % 2 == 1);
        if !success {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        RequestOutcome {
            start,
            end: Instant::now(),
            success,
        }
    }
}

#[derive(Default)]
struct Capture {
    reports: Mutex<Vec<RunReport>>,
}

impl Reporter for Capture {
    fn report(&self, report: &RunReport) -> std::io::Result<()> {
        self.reports.lock().push(*report);
        Ok(())
    }
}

struct Ignores;

#[async_trait::async_trait]
impl Handler for Ignores {
    async fn init(&self, _config: &HandlerConfig) -> Result<(), BoxError> {
        Ok(())
    }

    async fn do_request(&self) -> RequestOutcome {
        let now = Instant::now();
        RequestOutcome::success(now, now)
    }
}

fn requester(
    handler: Arc<dyn Handler>,
    concurrency: usize,
    duration: Duration,
) -> (Requester, Arc<Capture>) {
    let capture = Arc::new(Capture::default());
    let mut req = Requester::new();
    req.set_concurrency(concurrency);
    req.set_duration(duration);
    req.add_handler("scripted", handler);
    req.add_handler("ignores", Arc::new(Ignores));
    req.set_reporter(capture.clone());
    (req, capture)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_worker_reports_exactly_once() {
    for n in [1usize, 2, 5, 16] {
        let handler = Arc::new(Scripted::default());
        let (req, capture) = requester(handler.clone(), n, Duration::from_millis(40));

        let report = req.start("scripted").await.unwrap();

        assert_eq!(report.stats.reported_workers, n);
        assert_eq!(report.concurrency, n);
        assert_eq!(report.stats.total_requests, handler.calls.load(Ordering::SeqCst));
        assert!(report.stats.total_errors <= report.stats.total_requests);
        assert!(!report.stopped_early);
        assert_eq!(capture.reports.lock().as_slice(), &[report]);
        assert_eq!(req.state(), RunState::Stopped);
    }
}

#[tokio::test]
async fn zero_duration_run_makes_no_errors() {
    let handler = Arc::new(Scripted::default());
    let (req, _) = requester(handler.clone(), 1, Duration::ZERO);

    let report = req.start("scripted").await.unwrap();

    assert_eq!(report.stats.reported_workers, 1);
    assert_eq!(report.stats.total_errors, 0);
    assert_eq!(report.stats.total_requests, handler.calls.load(Ordering::SeqCst));
    assert_eq!(report.stats.min_latency(), None);
    assert_eq!(report.stats.max_latency(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn alternating_failures_are_counted_exactly() {
    let handler = Arc::new(Scripted {
        alternate: true,
        ..Scripted::default()
    });
    let (req, _) = requester(handler.clone(), 3, Duration::from_millis(50));

    let report = req.start("scripted").await.unwrap();

    assert!(report.stats.total_requests > 0);
    assert_eq!(report.stats.total_errors, handler.failures.load(Ordering::SeqCst));
    assert_eq!(report.stats.total_requests, handler.calls.load(Ordering::SeqCst));
    let min = report.stats.min_latency().unwrap();
    let max = report.stats.max_latency().unwrap();
    assert!(min <= max);
}

#[tokio::test]
async fn init_failure_aborts_before_any_worker() {
    let handler = Arc::new(Scripted {
        fail_init: true,
        ..Scripted::default()
    });
    let (req, capture) = requester(handler.clone(), 4, Duration::from_secs(5));

    let err = req.start("scripted").await.unwrap_err();

    assert!(matches!(err, Error::HandlerInit { ref name, .. } if name == "scripted"));
    assert_eq!(handler.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    assert!(capture.reports.lock().is_empty());
    assert_eq!(req.state(), RunState::Stopped);

    // Single use: no retry on the same requester.
    assert!(matches!(
        req.start("scripted").await,
        Err(Error::AlreadyFinished)
    ));
}

#[tokio::test]
async fn init_receives_handler_config() {
    let handler = Arc::new(Scripted::default());
    let (mut req, _) = requester(handler.clone(), 1, Duration::ZERO);
    let cfg = HandlerConfig::from_yaml_str("conf:\n  signerNodes: [\"n1:8080\"]\n").unwrap();
    req.set_handler_config(cfg.clone());

    req.start("scripted").await.unwrap();

    assert_eq!(handler.seen_config.lock().as_ref(), Some(&cfg));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_mid_run_still_collects_every_report() {
    let handler = Arc::new(Scripted {
        delay: Some(Duration::from_millis(5)),
        ..Scripted::default()
    });
    let (req, capture) = requester(handler.clone(), 6, Duration::from_secs(60));
    let stop = req.stop_handle();

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        stop.stop().unwrap();
    });

    let started = Instant::now();
    let report = tokio::time::timeout(Duration::from_secs(10), req.start("scripted"))
        .await
        .unwrap()
        .unwrap();
    stopper.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.stopped_early);
    assert_eq!(report.stats.reported_workers, 6);
    assert_eq!(report.stats.total_requests, handler.calls.load(Ordering::SeqCst));
    assert_eq!(capture.reports.lock().len(), 1);

    // Stopping a finished run is a no-op.
    assert!(req.stop().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_reaches_workers_of_a_handler_that_never_awaits() {
    let (req, _) = requester(Arc::new(Ignores), 4, Duration::from_secs(60));

    let stopped = AtomicBool::new(false);
    let run = async {
        let report = req.start("ignores").await;
        assert!(stopped.load(Ordering::SeqCst));
        report
    };
    let stop = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stopped.store(true, Ordering::SeqCst);
        req.stop().unwrap();
    };

    let (report, ()) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(run, stop)
    })
    .await
    .unwrap();

    let report = report.unwrap();
    assert!(report.stopped_early);
    assert_eq!(report.stats.reported_workers, 4);
    assert!(report.stats.total_requests > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stopped_resolves_only_after_an_accepted_stop() {
    let handler = Arc::new(Scripted {
        delay: Some(Duration::from_millis(1)),
        ..Scripted::default()
    });
    let (req, _) = requester(handler, 2, Duration::from_secs(60));
    let handle = req.stop_handle();

    // A rejected stop before the run leaves the signal untouched.
    assert!(matches!(handle.stop(), Err(Error::NotStarted)));
    let watcher = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.stopped().await })
    };
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!watcher.is_finished());
        handle.stop().unwrap();
        tokio::time::timeout(Duration::from_secs(2), watcher)
            .await
            .unwrap()
            .unwrap();
    });

    let report = tokio::time::timeout(Duration::from_secs(10), req.start("scripted"))
        .await
        .unwrap()
        .unwrap();
    stopper.await.unwrap();
    assert!(report.stopped_early);
}

#[tokio::test]
async fn stop_before_start_is_an_error() {
    let (req, _) = requester(Arc::new(Scripted::default()), 1, Duration::ZERO);
    assert!(matches!(req.stop(), Err(Error::NotStarted)));
    assert!(matches!(req.stop_handle().stop(), Err(Error::NotStarted)));
}

#[tokio::test]
async fn unknown_handler_is_rejected_up_front() {
    let (mut req, capture) = requester(Arc::new(Scripted::default()), 1, Duration::ZERO);

    let err = req.select_handler("nope").unwrap_err();
    match err {
        Error::UnknownHandler { name, available } => {
            assert_eq!(name, "nope");
            assert_eq!(available, "ignores, scripted");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        req.start("nope").await,
        Err(Error::UnknownHandler { .. })
    ));
    assert!(capture.reports.lock().is_empty());
    // The lifecycle is untouched; a valid handler can still run.
    assert_eq!(req.state(), RunState::Configured);
    req.select_handler("scripted").unwrap();
    assert!(req.start_selected().await.is_ok());
}

#[tokio::test]
async fn zero_concurrency_is_rejected() {
    let (req, _) = requester(Arc::new(Scripted::default()), 0, Duration::ZERO);
    assert!(matches!(
        req.start("scripted").await,
        Err(Error::InvalidConcurrency)
    ));
}

#[tokio::test]
async fn start_selected_without_selection_fails() {
    let req = Requester::new();
    assert_eq!(req.state(), RunState::Created);
    assert!(matches!(
        req.start_selected().await,
        Err(Error::NoHandlerSelected)
    ));
}
