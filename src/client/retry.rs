use std::future::Future;

use crate::errors::ClientError;

/// Runs `attempt` up to `retries + 1` times (spec §4.8 "Retry policy"),
/// stopping as soon as it succeeds or raises a non-retryable error.
/// `on_retry` is called once per retried attempt, after the failing call
/// and before the next one, so a caller can hook metrics/reconnection.
pub(crate) async fn with_retries<F, Fut, T, R, RFut>(
    retries: u32,
    mut attempt: F,
    mut on_retry: R,
) -> Result<T, ClientError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
    R: FnMut(&ClientError) -> RFut,
    RFut: Future<Output = ()>,
{
    let mut attempt_no = 0;
    loop {
        match attempt(attempt_no).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt_no < retries => {
                on_retry(&err).await;
                attempt_no += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
