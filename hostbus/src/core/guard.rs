//! Connection guard for operations that need an attached bus handle.

use std::future::Future;

use crate::api::models::ProxyError;
use crate::Result;

/// Runs `op` against `handle`.
///
/// Fails with [`ProxyError::NotConnected`] before `op` is even constructed
/// into a future when there is no handle, so an unattached object never
/// produces bus traffic. The result type of `op` passes through unchanged.
pub async fn guarded<'h, H, T, F, Fut>(handle: Option<&'h H>, op: F) -> Result<T>
where
    F: FnOnce(&'h H) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match handle {
        Some(handle) => op(handle).await,
        None => Err(ProxyError::NotConnected),
    }
}
