//! Async call handles.
//!
//! A [`PendingCall`] settles exactly once. The paired [`Completer`] is held
//! by whoever produces the result (normally a transport callback); extra
//! completion attempts are ignored and reported as `false`.
//!
//! The handle can be consumed from both worlds: [`PendingCall::wait`]
//! blocks a thread, and `.await` works inside any executor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use crate::binding::shape::{Describe, TypeShape};
use crate::error::{ProxyError, ProxyResult, TransportError};

/// Lifecycle of an async call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Unbound,
    Dispatched,
    Completed,
    Failed,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Completed | CallState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Unbound => "unbound",
            CallState::Dispatched => "dispatched",
            CallState::Completed => "completed",
            CallState::Failed => "failed",
        }
    }
}

struct Slot<T> {
    state: CallState,
    outcome: Option<ProxyResult<T>>,
    waker: Option<Waker>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, outcome: ProxyResult<T>) -> bool {
        let mut slot = self.lock();
        if slot.state.is_terminal() {
            return false;
        }
        slot.state = if outcome.is_ok() {
            CallState::Completed
        } else {
            CallState::Failed
        };
        slot.outcome = Some(outcome);
        let waker = slot.waker.take();
        drop(slot);

        self.ready.notify_all();
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }
}

/// Handle to a result that is not available yet.
pub struct PendingCall<T> {
    shared: Arc<Shared<T>>,
}

/// Settles the paired [`PendingCall`].
pub struct Completer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> PendingCall<T> {
    /// A new unsettled call and its completer.
    pub fn new() -> (Self, Completer<T>) {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                state: CallState::Unbound,
                outcome: None,
                waker: None,
            }),
            ready: Condvar::new(),
        });
        (
            Self {
                shared: shared.clone(),
            },
            Completer { shared },
        )
    }

    /// An already completed call.
    pub fn completed(value: T) -> Self {
        let (call, completer) = Self::new();
        completer.complete(value);
        call
    }

    /// An already failed call.
    pub fn failed(error: ProxyError) -> Self {
        let (call, completer) = Self::new();
        completer.fail(error);
        call
    }

    pub fn state(&self) -> CallState {
        self.shared.lock().state
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Unbound → Dispatched. No effect in any other state.
    pub(crate) fn mark_dispatched(&self) {
        let mut slot = self.shared.lock();
        if slot.state == CallState::Unbound {
            slot.state = CallState::Dispatched;
        }
    }

    /// Block the current thread until the call settles.
    pub fn wait(self) -> ProxyResult<T> {
        let mut slot = self.shared.lock();
        while slot.outcome.is_none() && !slot.state.is_terminal() {
            slot = self
                .shared
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        slot.outcome.take().unwrap_or_else(|| Err(consumed()))
    }

    /// Like [`wait`](Self::wait), giving the handle back on timeout.
    pub fn wait_timeout(self, timeout: Duration) -> Result<ProxyResult<T>, Self> {
        let slot = self.shared.lock();
        let (mut slot, _) = self
            .shared
            .ready
            .wait_timeout_while(slot, timeout, |s| s.outcome.is_none() && !s.state.is_terminal())
            .unwrap_or_else(PoisonError::into_inner);

        if slot.state.is_terminal() {
            return Ok(slot.outcome.take().unwrap_or_else(|| Err(consumed())));
        }
        drop(slot);
        Err(self)
    }
}

impl<T> Completer<T> {
    /// Complete with a value. `false` if the call had already settled.
    pub fn complete(&self, value: T) -> bool {
        let settled = self.shared.settle(Ok(value));
        if !settled {
            tracing::debug!("Ignoring completion of an already settled call");
        }
        settled
    }

    /// Fail with an error. `false` if the call had already settled.
    pub fn fail(&self, error: ProxyError) -> bool {
        let settled = self.shared.settle(Err(error));
        if !settled {
            tracing::debug!("Ignoring failure of an already settled call");
        }
        settled
    }

    pub fn is_settled(&self) -> bool {
        self.shared.lock().state.is_terminal()
    }
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Future for PendingCall<T> {
    type Output = ProxyResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.shared.lock();
        if let Some(outcome) = slot.outcome.take() {
            return Poll::Ready(outcome);
        }
        if slot.state.is_terminal() {
            return Poll::Ready(Err(consumed()));
        }
        match &slot.waker {
            Some(waker) if waker.will_wake(cx.waker()) => {}
            _ => slot.waker = Some(cx.waker().clone()),
        }
        Poll::Pending
    }
}

impl<T> fmt::Debug for PendingCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("state", &self.state())
            .finish()
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T: Describe> Describe for PendingCall<T> {
    fn shape() -> TypeShape {
        TypeShape::pending(T::shape())
    }
}

fn consumed() -> ProxyError {
    TransportError::Runtime("pending call result was already taken".to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingError;

    #[test]
    fn test_completes_exactly_once() {
        let (call, completer) = PendingCall::<u32>::new();
        assert_eq!(call.state(), CallState::Unbound);
        call.mark_dispatched();
        assert_eq!(call.state(), CallState::Dispatched);

        assert!(completer.complete(1));
        assert!(!completer.complete(2));
        assert!(!completer.fail(BindingError::MissingVerb { method: "m".into() }.into()));

        assert_eq!(call.state(), CallState::Completed);
        assert_eq!(call.wait().unwrap(), 1);
    }

    #[test]
    fn test_failure_is_terminal() {
        let call = PendingCall::<u32>::failed(
            TransportError::InvalidRequest("boom".into()).into(),
        );
        assert_eq!(call.state(), CallState::Failed);
        call.mark_dispatched();
        assert_eq!(call.state(), CallState::Failed);
        assert!(call.wait().unwrap_err().as_transport().is_some());
    }

    #[test]
    fn test_wait_across_threads() {
        let (call, completer) = PendingCall::<String>::new();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            completer.complete("done".to_string())
        });
        assert_eq!(call.wait().unwrap(), "done");
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_wait_timeout_returns_handle() {
        let (call, completer) = PendingCall::<u8>::new();
        let call = call.wait_timeout(Duration::from_millis(10)).unwrap_err();
        completer.complete(9);
        assert_eq!(call.wait_timeout(Duration::from_millis(10)).unwrap().unwrap(), 9);
    }

    #[test]
    fn test_shape_is_pending() {
        assert_eq!(
            <PendingCall<Vec<String>>>::shape(),
            TypeShape::pending(TypeShape::list(TypeShape::String))
        );
    }

    #[tokio::test]
    async fn test_await() {
        let (call, completer) = PendingCall::<u64>::new();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            completer.complete(42);
        });
        assert_eq!(call.await.unwrap(), 42);
    }
}
