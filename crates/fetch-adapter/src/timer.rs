//! Platform timer used to bound requests

use std::time::Duration;

/// Longest delay the browser timer accepts (`u32::MAX` ms)
pub(crate) const MAX_DELAY: Duration = Duration::from_millis(u32::MAX as u64);

/// Clamp `duration` to what every platform timer can represent
pub(crate) fn bounded(duration: Duration) -> Duration {
    duration.min(MAX_DELAY)
}

/// Resolve after `duration`, clamped to [`MAX_DELAY`]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep(duration: Duration) {
    tokio::time::sleep(bounded(duration)).await
}

/// Resolve after `duration`, clamped to [`MAX_DELAY`]
#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(bounded(duration)).await
}
