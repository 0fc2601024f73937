use std::future::{pending, Future};
use tokio_util::sync::CancellationToken;

/// Cancellation token handed to the transport layer of a session.
pub type SessionCancellationToken = CancellationToken;

/// Outcome of racing a future against cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAware<T> {
    /// The future completed first.
    Value(T),
    /// Cancellation won.
    Cancelled,
}

/// Whether the given token (if any) has been cancelled.
pub fn is_cancelled(token: Option<&SessionCancellationToken>) -> bool {
    token.is_some_and(SessionCancellationToken::is_cancelled)
}

/// Run `fut` unless the token fires first.
///
/// With no token the future simply runs to completion. Cancellation is
/// cooperative: a value already being produced is returned, not dropped
/// mid-processing.
pub async fn await_or_cancel<T, F>(
    token: Option<&SessionCancellationToken>,
    fut: F,
) -> CancelAware<T>
where
    F: Future<Output = T>,
{
    if let Some(token) = token {
        tokio::select! {
            _ = token.cancelled() => CancelAware::Cancelled,
            value = fut => CancelAware::Value(value),
        }
    } else {
        CancelAware::Value(fut.await)
    }
}

/// Resolve when the token fires; never, if there is no token.
pub async fn cancelled(token: Option<&SessionCancellationToken>) {
    if let Some(token) = token {
        token.cancelled().await;
    } else {
        pending::<()>().await;
    }
}
