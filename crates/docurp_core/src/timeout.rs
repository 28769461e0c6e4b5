use std::future::Future;
use std::time::Duration;

use crate::ports::{PortError, PortResult};

/// Runs one upstream call, failing with `PortError::Timeout` once `limit` elapses.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> PortResult<T>
where
    F: Future<Output = PortResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(PortError::Timeout(limit)),
    }
}
