//! End-to-end relay scenarios: attach/detach windows, ordering, isolation, toggling.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use logrelay::{Config, Event, EventChannel, Listen, LogView, RunState, Service};

#[derive(Debug, Error)]
#[error("read failed")]
struct ReadFailed {
    #[source]
    source: DeviceLost,
}

#[derive(Debug, Error)]
#[error("device lost")]
struct DeviceLost;

#[derive(Default)]
struct Collect {
    messages: Mutex<Vec<String>>,
    errors: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait]
impl Listen for Collect {
    async fn on_message(&self, text: &str) {
        self.messages.lock().push(text.to_string());
    }

    async fn on_error(&self, text: &str, stack_frames: &[String]) {
        self.errors.lock().push((text.to_string(), stack_frames.to_vec()));
    }

    fn name(&self) -> &'static str {
        "collect"
    }
}

struct FailsOnMessage;

#[async_trait]
impl Listen for FailsOnMessage {
    async fn on_message(&self, _text: &str) {
        panic!("cannot render");
    }

    async fn on_error(&self, _text: &str, _stack_frames: &[String]) {}

    fn name(&self) -> &'static str {
        "fails-on-message"
    }
}

#[tokio::test]
async fn listeners_see_only_their_attach_window() {
    let ch = EventChannel::new(Config::default());
    let l1 = Arc::new(Collect::default());
    let l2 = Arc::new(Collect::default());
    let l1_dyn: Arc<dyn Listen> = l1.clone();

    ch.attach(l1_dyn.clone());
    ch.emit_message("hello");
    ch.attach(l2.clone());
    ch.emit_message("world");
    ch.detach(&l1_dyn);
    ch.emit_message("gone");
    ch.shutdown().await;

    assert_eq!(*l1.messages.lock(), vec!["hello", "world"]);
    assert_eq!(*l2.messages.lock(), vec!["world", "gone"]);
}

#[tokio::test]
async fn nothing_is_received_while_detached() {
    let ch = EventChannel::new(Config::default());
    let l = Arc::new(Collect::default());
    let l_dyn: Arc<dyn Listen> = l.clone();

    ch.emit_message("before");
    ch.attach(l_dyn.clone());
    ch.emit_message("during-1");
    ch.detach(&l_dyn);
    ch.emit_message("between");
    ch.attach(l_dyn.clone());
    ch.emit_message("during-2");
    ch.shutdown().await;

    assert_eq!(*l.messages.lock(), vec!["during-1", "during-2"]);
}

#[tokio::test]
async fn double_attach_delivers_once() {
    let ch = EventChannel::new(Config::default());
    let l = Arc::new(Collect::default());
    ch.attach(l.clone());
    ch.attach(l.clone());
    ch.emit_message("x");
    ch.shutdown().await;

    assert_eq!(*l.messages.lock(), vec!["x"]);
}

#[tokio::test]
async fn detaching_a_stranger_is_harmless() {
    let ch = EventChannel::new(Config::default());
    let stranger: Arc<dyn Listen> = Arc::new(Collect::default());
    assert!(!ch.detach(&stranger));
    assert!(!ch.detach(&stranger));
    assert!(ch.is_empty());
}

#[tokio::test]
async fn faulty_listener_is_isolated() {
    let ch = EventChannel::new(Config::default());
    let good = Arc::new(Collect::default());
    ch.attach(Arc::new(FailsOnMessage));
    ch.attach(good.clone());

    ch.emit_message("one");
    ch.emit_message("two");
    ch.shutdown().await;

    assert_eq!(*good.messages.lock(), vec!["one", "two"]);
}

#[tokio::test]
async fn error_carries_cause_frames_in_order() {
    let ch = EventChannel::new(Config::default());
    let l = Arc::new(Collect::default());
    ch.attach(l.clone());

    let cause = ReadFailed { source: DeviceLost };
    ch.emit_error("boom", &cause);
    ch.shutdown().await;

    let errors = l.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "boom");
    assert_eq!(errors[0].1, vec!["read failed", "device lost"]);
}

#[tokio::test]
async fn toggle_scenario() {
    let service = Service::new(Config::default());
    service.channel().set_run_state(RunState::Stopped);
    assert_eq!(service.status(), RunState::Stopped);

    assert_eq!(service.toggle(), Ok(RunState::Running));
    assert_eq!(service.status(), RunState::Running);
    assert_eq!(service.toggle(), Ok(RunState::Stopped));
    assert_eq!(service.status(), RunState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_emitters_keep_a_single_order() {
    let ch = EventChannel::new(Config::default());

    #[derive(Default)]
    struct Seqs(Mutex<Vec<u64>>);

    #[async_trait]
    impl Listen for Seqs {
        async fn on_message(&self, _text: &str) {}
        async fn on_error(&self, _text: &str, _stack_frames: &[String]) {}
        async fn on_event(&self, event: &Event) {
            self.0.lock().push(event.seq);
        }
    }

    let a = Arc::new(Seqs::default());
    let b = Arc::new(Seqs::default());
    ch.attach(a.clone());
    ch.attach(b.clone());

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let ch = ch.clone();
            tokio::spawn(async move {
                for i in 0..100 {
                    ch.emit_message(format!("p{p}-{i}"));
                }
            })
        })
        .collect();
    for p in producers {
        p.await.unwrap();
    }
    ch.shutdown().await;

    let a = a.0.lock();
    let b = b.0.lock();
    assert_eq!(a.len(), 400);
    assert_eq!(*a, *b);
    assert!(a.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn view_mirrors_service_log() {
    let service = Service::new(Config::default());
    let view = Arc::new(LogView::new("surface"));
    service.channel().attach(view.clone());

    service.toggle().unwrap();
    service
        .emitter()
        .error("scan failed", &ReadFailed { source: DeviceLost });
    service.toggle().unwrap();
    service.shutdown().await;

    assert_eq!(
        view.lines(),
        vec![
            "Starting Service",
            "ERROR: scan failed",
            "read failed",
            "device lost",
            "Stopping Service",
        ]
    );
}
