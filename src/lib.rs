//! Sender/receiver composition without allocation.
//!
//! A [`Sender`] describes asynchronous work. [`Connect`]ing it to a
//! [`Receiver`] builds an [`OperationState`] in place inside a pinned
//! [`Slot`]; starting the operation eventually delivers exactly one of three
//! completions to the receiver: a value, an error, or done (cancellation).
//!
//! The centrepiece is [`let_value`]: run a predecessor, feed its value to a
//! factory that returns a successor sender, run that, and forward its
//! outcome. The predecessor and successor operations share storage inside
//! the operation state, since they are never alive at the same time.
//!
//! ```
//! use relay::{ok, sync_wait, SenderExt};
//!
//! let sender = ok::<_, ()>(42).let_value(|value: &mut i32| ok::<_, ()>(*value + 1));
//! assert_eq!(sync_wait(sender).unwrap(), Some(43));
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

use core::pin::Pin;

mod blocking;
pub use blocking::Blocking;
mod continuation;
pub use continuation::ContinuationInfo;
pub mod sender;
pub use sender::{
    done, err, let_value, ok, ready, Either, LetValue, LetValueError, SenderExt,
};
mod panic;
pub use panic::Panic;
mod slot;
pub use slot::Slot;
mod stop;
#[cfg(feature = "alloc")]
pub use stop::StopSource;
pub use stop::StopToken;
#[cfg(feature = "std")]
mod sync_wait;
#[cfg(feature = "std")]
pub use sync_wait::{sync_wait, SyncWaitReceiver};

#[cfg(test)]
mod testing;

/// Describes asynchronous work and what it can complete with.
///
/// The associated constants are the static completion signature; they let
/// combinators compute their own signature before anything runs.
pub trait Sender {
    type Value;
    type Error;

    const SENDS_DONE: bool = true;
    const BLOCKING: Blocking = Blocking::Maybe;
    /// Whether completion always happens on the execution context `start`
    /// was called on.
    const SCHEDULER_AFFINE: bool = false;

    fn blocking(&self) -> Blocking {
        Self::BLOCKING
    }
}

pub trait Receiver<V, E>: Sized {
    fn set_value(self, value: V);
    fn set_error(self, error: E);
    fn set_done(self);

    fn stop_token(&self) -> StopToken {
        StopToken::never()
    }

    /// Reports the receivers waiting on this one's completion.
    fn visit_continuations(&self, _visit: &mut dyn FnMut(ContinuationInfo<'_>)) {}
}

/// A connected, not yet started, unit of work.
///
/// Once an operation has delivered its completion it must not touch itself
/// again: the receiver may already have dropped it or reused its storage.
pub trait OperationState {
    fn start(self: Pin<&mut Self>);
}

pub trait Connect<R>: Sender {
    type Operation: OperationState;

    /// Builds the operation for `receiver` inside `place`, which must be
    /// vacant.
    fn connect(self, receiver: R, place: Pin<&mut Slot<Self::Operation>>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<V, E> {
    Value(V),
    Error(E),
    Done,
}

impl<V, E> Completion<V, E> {
    /// `Ok(None)` stands for done.
    pub fn into_result(self) -> Result<Option<V>, E> {
        match self {
            Completion::Value(value) => Ok(Some(value)),
            Completion::Error(error) => Err(error),
            Completion::Done => Ok(None),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Completion::Done)
    }

    pub fn complete<R: Receiver<V, E>>(self, receiver: R) {
        match self {
            Completion::Value(value) => receiver.set_value(value),
            Completion::Error(error) => receiver.set_error(error),
            Completion::Done => receiver.set_done(),
        }
    }
}

impl<V, E> From<Result<V, E>> for Completion<V, E> {
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(value) => Completion::Value(value),
            Err(error) => Completion::Error(error),
        }
    }
}
