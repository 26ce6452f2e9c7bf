use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::debug;

/// Runs `operation` until it succeeds or `max_retries` retries are used up.
///
/// Delays grow along a Fibonacci sequence seeded with `initial_delay`.
/// The error of the final attempt is returned unchanged.
pub async fn retry_with_backoff<T, E, Fut, F>(
    operation: F,
    initial_delay: Duration,
    max_retries: usize,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut retries = 0;
    let mut delays = (initial_delay, initial_delay);

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if retries < max_retries => {
                debug!(
                    "Attempt {}/{} failed: {:?}. Retrying in {:?}",
                    retries + 1,
                    max_retries,
                    e,
                    delays.0
                );
                sleep(delays.0).await;
                retries += 1;
                delays = (delays.1, delays.0 + delays.1);
            }
            Err(e) => return Err(e),
        }
    }
}
