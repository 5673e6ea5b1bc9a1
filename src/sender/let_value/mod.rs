use crate::{Blocking, Connect, Receiver, Sender, Slot};
use core::{fmt, panic::Location, pin::Pin};

mod error;
pub use error::LetValueError;
mod operation;
pub use operation::LetValueOperation;
use operation::{PredecessorRcv, SuccessorRcv};
mod receiver;
pub use receiver::{PredecessorReceiver, SuccessorReceiver};

/// Sender returned by [`let_value`].
pub struct LetValue<P, F> {
    predecessor: P,
    factory: F,
    return_address: &'static Location<'static>,
}

/// Runs `predecessor`, then calls `factory` with a mutable reference to the
/// value it produced and runs the sender the factory returns.
///
/// The value lives inside the operation state until that is dropped, so the
/// successor may borrow from it through raw pointers or hold on to anything
/// derived from it. Errors and done from the predecessor skip the factory and
/// reach the receiver as [`LetValueError::Predecessor`] and done. A panic
/// while building or connecting the successor becomes
/// [`LetValueError::Panicked`].
#[track_caller]
pub fn let_value<P, F, S>(predecessor: P, factory: F) -> LetValue<P, F>
where
    P: Sender,
    F: FnOnce(&mut P::Value) -> S,
    S: Sender,
{
    LetValue {
        predecessor,
        factory,
        return_address: Location::caller(),
    }
}

impl<P, F> LetValue<P, F> {
    /// Where the combinator was built, for diagnostics and tracing.
    pub fn return_address(&self) -> &'static Location<'static> {
        self.return_address
    }
}

impl<P: fmt::Debug, F> fmt::Debug for LetValue<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LetValue")
            .field("predecessor", &self.predecessor)
            .field("return_address", &self.return_address)
            .finish_non_exhaustive()
    }
}

impl<P, F, S> Sender for LetValue<P, F>
where
    P: Sender,
    F: FnOnce(&mut P::Value) -> S,
    S: Sender,
{
    type Value = S::Value;
    type Error = LetValueError<P::Error, S::Error>;

    const SENDS_DONE: bool = P::SENDS_DONE || S::SENDS_DONE;
    const BLOCKING: Blocking = Blocking::sequence(P::BLOCKING, S::BLOCKING);
    const SCHEDULER_AFFINE: bool = P::SCHEDULER_AFFINE && S::SCHEDULER_AFFINE;

    fn blocking(&self) -> Blocking {
        Blocking::sequence(self.predecessor.blocking(), S::BLOCKING)
    }
}

impl<P, F, S, R> Connect<R> for LetValue<P, F>
where
    P: Connect<PredecessorRcv<P, S, F, R>>,
    F: FnOnce(&mut P::Value) -> S,
    S: Connect<SuccessorRcv<P, S, F, R>>,
    R: Receiver<S::Value, LetValueError<P::Error, S::Error>>,
{
    type Operation = LetValueOperation<P, S, F, R>;

    fn connect(self, receiver: R, place: Pin<&mut Slot<Self::Operation>>) {
        log::trace!("let_value: connecting (built at {})", self.return_address);
        let predecessor = self.predecessor;
        place.fill_with(LetValueOperation::new(self.factory, receiver), |operation| {
            operation.connect_predecessor(predecessor)
        });
    }
}
