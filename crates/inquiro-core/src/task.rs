//! One background request per action type.

use std::future::Future;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ApiError;

/// Slot holding at most one running request.
///
/// While a request is running, further `start` calls are refused, which is
/// how a view disables its trigger. The result is collected with `poll` from
/// the UI loop.
#[derive(Debug)]
pub struct InFlight<T> {
    label: &'static str,
    handle: Option<JoinHandle<Result<T, ApiError>>>,
}

impl<T: Send + 'static> InFlight<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            handle: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn `future` unless a request of this kind is already running.
    pub fn start<F>(&mut self, future: F) -> bool
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if self.handle.is_some() {
            debug!("{} already in flight, ignoring trigger", self.label);
            return false;
        }
        self.handle = Some(tokio::spawn(future));
        true
    }

    /// Take the result once the request has finished. A panicked or
    /// cancelled task is reported as a transport failure so loading state
    /// is still cleared.
    pub async fn poll(&mut self) -> Option<Result<T, ApiError>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let handle = self.handle.take()?;
        Some(match handle.await {
            Ok(result) => result,
            Err(err) => Err(ApiError::TransportFailure(format!(
                "{} task failed: {}",
                self.label, err
            ))),
        })
    }

    /// Drop the running request; its result is never applied.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("cancelling {}", self.label);
            handle.abort();
        }
    }
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
