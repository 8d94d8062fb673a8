use futures::future::join_all;
use std::future::Future;
use tracing::warn;

use crate::error::UpstreamError;

/// Result of one sub-call in a batch, tagged with the input it came from.
#[derive(Debug)]
pub struct Outcome<I, T> {
    pub input: I,
    pub result: Result<T, UpstreamError>,
}

/// Run `call` for every input concurrently and wait for all of them.
/// A failing item never aborts the batch; output order matches input order.
pub async fn fan_out<I, T, F, Fut>(inputs: Vec<I>, call: F) -> Vec<Outcome<I, T>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let calls = inputs.into_iter().enumerate().map(|(index, input)| {
        let fut = call(input.clone());
        async move {
            let result = fut.await;
            if let Err(e) = &result {
                warn!(index, error = %e, "batch item failed");
            }
            Outcome { input, result }
        }
    });
    join_all(calls).await
}
