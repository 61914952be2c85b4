use std::time::Duration;

/// Block the current thread for `duration`. Used by `Slow` to enforce its
/// minimum inter-element interval without pulling in a timer/async dependency.
pub fn sleep_compat(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
