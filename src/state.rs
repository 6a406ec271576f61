//! Published flow state.
//!
//! Every controller keeps its state in a [`Published`] cell: writes go
//! through [`Published::update`], which applies the change under a lock and
//! then publishes a snapshot on a `tokio::sync::watch` channel. Views call
//! [`Published::subscribe`] to react to changes and never write.

use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub struct Published<T> {
    current: Mutex<T>,
    tx: watch::Sender<T>,
}

impl<T: Clone> Published<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial.clone());
        Self {
            current: Mutex::new(initial),
            tx,
        }
    }

    /// Applies `f`, publishes the new state, and returns `f`'s result.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut current);
        self.tx.send_replace(current.clone());
        out
    }

    /// Reads the current state without publishing.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        f(&current)
    }

    pub fn snapshot(&self) -> T {
        self.read(T::clone)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

type Settle<'a, T> = Box<dyn FnOnce(&mut T) + Send + 'a>;

/// Settles an in-flight operation if its future is dropped before finishing.
///
/// Holds a closure that is applied to the state on drop unless
/// [`disarm`](SettleGuard::disarm) was called or the owning flow was
/// cancelled. This keeps loading flags from sticking when a caller aborts the
/// task running the operation.
pub struct SettleGuard<'a, T: Clone> {
    state: &'a Published<T>,
    cancel: &'a CancellationToken,
    settle: Option<Settle<'a, T>>,
}

impl<'a, T: Clone> SettleGuard<'a, T> {
    pub fn new(
        state: &'a Published<T>,
        cancel: &'a CancellationToken,
        settle: impl FnOnce(&mut T) + Send + 'a,
    ) -> Self {
        Self {
            state,
            cancel,
            settle: Some(Box::new(settle)),
        }
    }

    pub fn disarm(mut self) {
        self.settle = None;
    }
}

impl<T: Clone> Drop for SettleGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(settle) = self.settle.take() {
            if !self.cancel.is_cancelled() {
                self.state.update(settle);
            }
        }
    }
}
