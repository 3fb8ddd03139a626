//! Confirms that a rehash actually emits a `trace` record through the `log`
//! facade, rather than just trusting that the `log::trace!` call compiles.

use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record};
use rhmap::Map;

struct Recorder {
    messages: Mutex<Vec<(Level, String)>>,
}

impl Log for Recorder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.messages
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

fn recorder() -> &'static Recorder {
    static RECORDER: OnceLock<Recorder> = OnceLock::new();
    RECORDER.get_or_init(|| {
        let recorder = Recorder {
            messages: Mutex::new(Vec::new()),
        };
        // Leak a 'static reference so `log::set_logger` (which needs `&'static
        // dyn Log`) can install it; this runs at most once per test binary.
        let leaked: &'static Recorder = Box::leak(Box::new(recorder));
        log::set_logger(leaked).expect("logger installed exactly once");
        log::set_max_level(LevelFilter::Trace);
        leaked
    })
}

#[test]
fn growing_past_the_threshold_logs_a_trace_record() {
    let recorder = recorder();
    recorder.messages.lock().unwrap().clear();

    let mut map = Map::try_with_seed(4, 0).unwrap();
    for i in 0..10 {
        map.insert(format!("{i}").as_bytes(), i).unwrap();
    }

    let messages = recorder.messages.lock().unwrap();
    assert!(
        messages
            .iter()
            .any(|(level, msg)| *level == Level::Trace && msg.contains("rehashing map")),
        "expected a trace-level rehash record, got: {messages:?}"
    );
}
