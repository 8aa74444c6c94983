//! Fan-out/fan-in barrier over independent store calls.

use std::future::Future;

use crate::{Result, TRACING_TARGET};

/// Runs every future concurrently and waits for all of them.
///
/// Unlike `try_join_all`, a failure does not drop the siblings still in
/// flight: the call returns only once every operation has finished, and
/// then reports the first error in submission order. Effects of the
/// operations that succeeded are left in place.
pub(crate) async fn join_all<T, F>(
    operation: &'static str,
    futures: impl IntoIterator<Item = F>,
) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>>,
{
    let results = futures::future::join_all(futures).await;
    let total = results.len();

    let mut values = Vec::with_capacity(total);
    let mut first_error = None;
    let mut failed = 0usize;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(error) => {
                failed += 1;
                first_error.get_or_insert(error);
            }
        }
    }

    match first_error {
        None => Ok(values),
        Some(error) => {
            tracing::error!(
                target: TRACING_TARGET,
                operation,
                total,
                failed,
                succeeded = total - failed,
                error = %error,
                "Batch operation failed, completed siblings were not rolled back"
            );
            Err(error)
        }
    }
}
