use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

/// One throttle window per key: when it opened and how many events it
/// swallowed since the last emission.
#[derive(Debug)]
struct Window {
    opened_at: Instant,
    swallowed: u64,
}

static WINDOWS: OnceLock<Mutex<HashMap<&'static str, Window>>> = OnceLock::new();

fn windows() -> &'static Mutex<HashMap<&'static str, Window>> {
    WINDOWS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns `Some(swallowed)` when a log line for `key` may be emitted,
/// where `swallowed` counts the events suppressed since the previous
/// emission. Returns `None` while the window for `key` is still open and
/// counts the event as suppressed.
pub fn throttled(key: &'static str, window: Duration) -> Option<u64> {
    let mut map = windows().lock().expect("log throttle mutex poisoned");
    let now = Instant::now();

    let Some(state) = map.get_mut(key) else {
        map.insert(
            key,
            Window {
                opened_at: now,
                swallowed: 0,
            },
        );
        return Some(0);
    };

    if now.duration_since(state.opened_at) >= window {
        let swallowed = state.swallowed;
        state.opened_at = now;
        state.swallowed = 0;
        Some(swallowed)
    } else {
        state.swallowed += 1;
        None
    }
}
