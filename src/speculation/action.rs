//! Speculative action interface
//!
//! An action is a read-only, idempotent async operation (typically a fetch)
//! that may run and be discarded without ever being committed. It receives a
//! cancellation token and is responsible for honouring it; the controller
//! never force-kills the work.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

use super::error::Result;

/// Side-effect-free async operation run ahead of a commit
#[async_trait]
pub trait SpeculativeAction: Send + Sync + 'static {
    /// Value produced on success
    type Output: Clone + Send + Sync + 'static;

    /// Run the action, stopping early with [`ActionError::Cancelled`]
    /// once `cancel` fires
    ///
    /// [`ActionError::Cancelled`]: super::ActionError::Cancelled
    async fn run(&self, cancel: CancellationToken) -> Result<Self::Output>;
}

/// Adapter turning an async closure into a [`SpeculativeAction`]
pub struct ActionFn<F, Fut, T> {
    f: F,
    _marker: PhantomData<fn() -> (Fut, T)>,
}

impl<F, Fut, T> ActionFn<F, Fut, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T> SpeculativeAction for ActionFn<F, Fut, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    async fn run(&self, cancel: CancellationToken) -> Result<T> {
        (self.f)(cancel).await
    }
}

/// Build an action from an async closure
///
/// ```no_run
/// use intent_prefetch::speculation::{action_fn, ActionError};
///
/// let action = action_fn(|cancel| async move {
///     tokio::select! {
///         _ = cancel.cancelled() => Err(ActionError::Cancelled),
///         _ = tokio::time::sleep(std::time::Duration::from_millis(80)) => Ok("payload".to_string()),
///     }
/// });
/// ```
pub fn action_fn<F, Fut, T>(f: F) -> ActionFn<F, Fut, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    ActionFn::new(f)
}
