use crate::{ContinuationInfo, Receiver, StopToken};
use core::{marker::PhantomData, ptr::NonNull};

/// Type-erased entry points into the operation a receiver belongs to.
///
/// Erasing the operation type keeps the receiver types independent of the
/// operation they point into, which in turn contains operations connected
/// to those receivers.
pub(super) struct Completions<V, E> {
    pub(super) value: unsafe fn(NonNull<()>, V),
    pub(super) error: unsafe fn(NonNull<()>, E),
    pub(super) done: unsafe fn(NonNull<()>),
    pub(super) stop_token: unsafe fn(NonNull<()>) -> StopToken,
    pub(super) visit_continuations: unsafe fn(NonNull<()>, &mut dyn FnMut(ContinuationInfo<'_>)),
}

/// Receiver connected to the predecessor of a
/// [`LetValue`](super::LetValue).
///
/// A value hands over to the successor; an error or done goes straight to the
/// final receiver.
pub struct PredecessorReceiver<V, E, T> {
    operation: NonNull<()>,
    completions: Completions<V, E>,
    ty: PhantomData<T>,
}

/// Receiver connected to the successor; forwards everything.
pub struct SuccessorReceiver<V, E, T> {
    operation: NonNull<()>,
    completions: Completions<V, E>,
    ty: PhantomData<T>,
}

impl<V, E, T> PredecessorReceiver<V, E, T> {
    /// # Safety
    ///
    /// `operation` must point at the pinned operation the entry points were
    /// taken from, and stay valid for as long as the receiver is reachable.
    pub(super) unsafe fn new(operation: NonNull<()>, completions: Completions<V, E>) -> Self {
        PredecessorReceiver {
            operation,
            completions,
            ty: PhantomData,
        }
    }
}

impl<V, E, T> SuccessorReceiver<V, E, T> {
    /// # Safety
    ///
    /// Same contract as [`PredecessorReceiver::new`].
    pub(super) unsafe fn new(operation: NonNull<()>, completions: Completions<V, E>) -> Self {
        SuccessorReceiver {
            operation,
            completions,
            ty: PhantomData,
        }
    }
}

// SAFETY: the receivers are handles into an operation owning values of the
// marker types; they may cross threads whenever those may.
unsafe impl<V: Send, E: Send, T: Send> Send for PredecessorReceiver<V, E, T> {}
unsafe impl<V: Send, E: Send, T: Send> Send for SuccessorReceiver<V, E, T> {}

// SAFETY (all calls below): `new` guarantees the pointer targets the live,
// pinned operation for as long as the receiver exists, and each completion
// consumes the receiver, so it runs at most once.

impl<V, E, T> Receiver<V, E> for PredecessorReceiver<V, E, T> {
    fn set_value(self, value: V) {
        unsafe { (self.completions.value)(self.operation, value) }
    }

    fn set_error(self, error: E) {
        unsafe { (self.completions.error)(self.operation, error) }
    }

    fn set_done(self) {
        unsafe { (self.completions.done)(self.operation) }
    }

    fn stop_token(&self) -> StopToken {
        unsafe { (self.completions.stop_token)(self.operation) }
    }

    fn visit_continuations(&self, visit: &mut dyn FnMut(ContinuationInfo<'_>)) {
        unsafe { (self.completions.visit_continuations)(self.operation, visit) }
    }
}

impl<V, E, T> Receiver<V, E> for SuccessorReceiver<V, E, T> {
    fn set_value(self, value: V) {
        unsafe { (self.completions.value)(self.operation, value) }
    }

    fn set_error(self, error: E) {
        unsafe { (self.completions.error)(self.operation, error) }
    }

    fn set_done(self) {
        unsafe { (self.completions.done)(self.operation) }
    }

    fn stop_token(&self) -> StopToken {
        unsafe { (self.completions.stop_token)(self.operation) }
    }

    fn visit_continuations(&self, visit: &mut dyn FnMut(ContinuationInfo<'_>)) {
        unsafe { (self.completions.visit_continuations)(self.operation, visit) }
    }
}
