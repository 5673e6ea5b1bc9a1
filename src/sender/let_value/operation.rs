use super::{
    receiver::{Completions, PredecessorReceiver, SuccessorReceiver},
    LetValueError,
};
use crate::{panic, Connect, ContinuationInfo, OperationState, Receiver, Sender, Slot, StopToken};
use core::{marker::PhantomPinned, mem::ManuallyDrop, pin::Pin, ptr::NonNull};
use pin_project::pin_project;

type Marker<P, S, F, R> = (P, S, F, R);

pub(super) type PredecessorRcv<P, S, F, R> = PredecessorReceiver<
    <P as Sender>::Value,
    <P as Sender>::Error,
    Marker<P, S, F, R>,
>;
pub(super) type SuccessorRcv<P, S, F, R> =
    SuccessorReceiver<<S as Sender>::Value, <S as Sender>::Error, Marker<P, S, F, R>>;

type PredecessorOp<P, S, F, R> = <P as Connect<PredecessorRcv<P, S, F, R>>>::Operation;
type SuccessorOp<P, S, F, R> = <S as Connect<SuccessorRcv<P, S, F, R>>>::Operation;

/// What the operation owns right now, and so what dropping it must destroy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cleanup {
    /// Mid-handoff between the predecessor and the successor. Nothing can be
    /// torn down safely.
    Invalid,
    PredecessorOp,
    /// The predecessor's value is stored; no successor exists yet.
    Values,
    SuccessorOpAndValues,
}

/// Storage shared by the two child operations, which never coexist.
#[pin_project(project = StorageProj)]
enum Storage<PO, SO> {
    Vacant,
    Predecessor(#[pin] Slot<PO>),
    Successor(#[pin] Slot<SO>),
}

impl<PO, SO> Storage<PO, SO> {
    fn predecessor(self: Pin<&mut Self>) -> Option<Pin<&mut Slot<PO>>> {
        match self.project() {
            StorageProj::Predecessor(slot) => Some(slot),
            _ => None,
        }
    }

    fn successor(self: Pin<&mut Self>) -> Option<Pin<&mut Slot<SO>>> {
        match self.project() {
            StorageProj::Successor(slot) => Some(slot),
            _ => None,
        }
    }

    fn emplace_predecessor(mut self: Pin<&mut Self>) -> Pin<&mut Slot<PO>> {
        self.set(Storage::Predecessor(Slot::new()));
        match self.predecessor() {
            Some(slot) => slot,
            None => unreachable!(),
        }
    }

    fn emplace_successor(mut self: Pin<&mut Self>) -> Pin<&mut Slot<SO>> {
        self.set(Storage::Successor(Slot::new()));
        match self.successor() {
            Some(slot) => slot,
            None => unreachable!(),
        }
    }
}

/// Operation state of a [`LetValue`](super::LetValue).
///
/// The storage is only ever destroyed through [`Cleanup`]: it is wrapped in
/// `ManuallyDrop` and torn down in the order the current state demands, the
/// successor operation always before the values it may borrow from.
pub struct LetValueOperation<P, S, F, R>
where
    P: Connect<PredecessorRcv<P, S, F, R>>,
    S: Connect<SuccessorRcv<P, S, F, R>>,
{
    factory: Option<F>,
    receiver: Option<R>,
    values: Option<P::Value>,
    storage: ManuallyDrop<Storage<PredecessorOp<P, S, F, R>, SuccessorOp<P, S, F, R>>>,
    cleanup: Cleanup,
    _pinned: PhantomPinned,
}

impl<P, S, F, R> LetValueOperation<P, S, F, R>
where
    P: Connect<PredecessorRcv<P, S, F, R>>,
    S: Connect<SuccessorRcv<P, S, F, R>>,
{
    pub(super) fn new(factory: F, receiver: R) -> Self {
        LetValueOperation {
            factory: Some(factory),
            receiver: Some(receiver),
            values: None,
            storage: ManuallyDrop::new(Storage::Vacant),
            cleanup: Cleanup::PredecessorOp,
            _pinned: PhantomPinned,
        }
    }

    #[cfg(test)]
    pub(crate) fn cleanup(&self) -> Cleanup {
        self.cleanup
    }

    /// # Safety
    ///
    /// `self` must be pinned.
    unsafe fn storage(
        &mut self,
    ) -> Pin<&mut Storage<PredecessorOp<P, S, F, R>, SuccessorOp<P, S, F, R>>> {
        Pin::new_unchecked(&mut *self.storage)
    }

    fn complete(&mut self, deliver: impl FnOnce(R)) {
        match self.receiver.take() {
            Some(receiver) => deliver(receiver),
            None => panic!("let_value completed more than once"),
        }
    }

    fn check_cleanup(&self, expected: Cleanup) {
        debug_assert_eq!(
            self.cleanup, expected,
            "let_value completion arrived in the wrong state"
        );
    }

    /// # Safety
    ///
    /// `self` must be pinned and never used again afterwards.
    unsafe fn teardown(&mut self) {
        log::trace!("let_value: tearing down from {:?}", self.cleanup);
        match self.cleanup {
            Cleanup::PredecessorOp => self.storage().set(Storage::Vacant),
            // A successor whose connect unwound may have left part of itself
            // behind, and that part may point into the values.
            Cleanup::Values | Cleanup::SuccessorOpAndValues => {
                self.storage().set(Storage::Vacant);
                self.values = None;
            }
            Cleanup::Invalid => {
                log::error!("let_value operation dropped mid-handoff; leaking its child operation")
            }
        }
    }
}

impl<P, S, F, R> LetValueOperation<P, S, F, R>
where
    P: Connect<PredecessorRcv<P, S, F, R>>,
    F: FnOnce(&mut P::Value) -> S,
    S: Connect<SuccessorRcv<P, S, F, R>>,
    R: Receiver<S::Value, LetValueError<P::Error, S::Error>>,
{
    pub(super) fn connect_predecessor(self: Pin<&mut Self>, predecessor: P) {
        // SAFETY: the receiver captures the pinned address; the operation
        // outlives the predecessor operation stored inside it.
        unsafe {
            let this = self.get_unchecked_mut();
            let operation = NonNull::from(&mut *this).cast::<()>();
            let slot = this.storage().emplace_predecessor();
            predecessor.connect(Self::predecessor_receiver(operation), slot);
        }
    }

    unsafe fn predecessor_receiver(operation: NonNull<()>) -> PredecessorRcv<P, S, F, R> {
        PredecessorReceiver::new(
            operation,
            Completions {
                value: Self::predecessor_value,
                error: Self::predecessor_error,
                done: Self::predecessor_done,
                stop_token: Self::stop_token,
                visit_continuations: Self::visit_continuations,
            },
        )
    }

    unsafe fn successor_receiver(operation: NonNull<()>) -> SuccessorRcv<P, S, F, R> {
        SuccessorReceiver::new(
            operation,
            Completions {
                value: Self::successor_value,
                error: Self::successor_error,
                done: Self::successor_done,
                stop_token: Self::stop_token,
                visit_continuations: Self::visit_continuations,
            },
        )
    }

    unsafe fn predecessor_value(operation: NonNull<()>, values: P::Value) {
        let this = operation.cast::<Self>().as_mut();
        this.check_cleanup(Cleanup::PredecessorOp);
        log::trace!("let_value: predecessor produced a value");

        if let Err(panic) = panic::catch(|| unsafe { this.connect_successor(operation, values) }) {
            log::debug!("let_value: building the successor failed: {}", panic);
            this.complete(|receiver| receiver.set_error(LetValueError::Panicked(panic)));
            return;
        }

        this.cleanup = Cleanup::SuccessorOpAndValues;
        match this.storage().successor() {
            Some(slot) => slot.start(),
            None => unreachable!(),
        }
    }

    /// Stores the values, replaces the predecessor with the successor built
    /// from them and connects it. May unwind; the cleanup state is accurate at
    /// every point an unwind can start from.
    unsafe fn connect_successor(&mut self, operation: NonNull<()>, values: P::Value) {
        let values = self.values.insert(values);
        self.cleanup = Cleanup::Invalid;
        Pin::new_unchecked(&mut *self.storage).set(Storage::Vacant);
        self.cleanup = Cleanup::Values;

        let factory = self
            .factory
            .take()
            .unwrap_or_else(|| panic!("let_value factory already consumed"));
        let successor = factory(values);
        log::trace!("let_value: connecting successor");
        let slot = Pin::new_unchecked(&mut *self.storage).emplace_successor();
        successor.connect(Self::successor_receiver(operation), slot);
    }

    unsafe fn predecessor_error(operation: NonNull<()>, error: P::Error) {
        let this = operation.cast::<Self>().as_mut();
        this.check_cleanup(Cleanup::PredecessorOp);
        log::trace!("let_value: predecessor failed, skipping the factory");
        this.complete(|receiver| receiver.set_error(LetValueError::Predecessor(error)));
    }

    unsafe fn predecessor_done(operation: NonNull<()>) {
        let this = operation.cast::<Self>().as_mut();
        this.check_cleanup(Cleanup::PredecessorOp);
        log::trace!("let_value: predecessor stopped, skipping the factory");
        this.complete(|receiver| receiver.set_done());
    }

    unsafe fn successor_value(operation: NonNull<()>, value: S::Value) {
        let this = operation.cast::<Self>().as_mut();
        this.check_cleanup(Cleanup::SuccessorOpAndValues);
        this.complete(|receiver| receiver.set_value(value));
    }

    unsafe fn successor_error(operation: NonNull<()>, error: S::Error) {
        let this = operation.cast::<Self>().as_mut();
        this.check_cleanup(Cleanup::SuccessorOpAndValues);
        this.complete(|receiver| receiver.set_error(LetValueError::Successor(error)));
    }

    unsafe fn successor_done(operation: NonNull<()>) {
        let this = operation.cast::<Self>().as_mut();
        this.check_cleanup(Cleanup::SuccessorOpAndValues);
        this.complete(|receiver| receiver.set_done());
    }

    unsafe fn stop_token(operation: NonNull<()>) -> StopToken {
        let this = operation.cast::<Self>().as_ref();
        this.receiver
            .as_ref()
            .map_or_else(StopToken::never, |receiver| receiver.stop_token())
    }

    unsafe fn visit_continuations(
        operation: NonNull<()>,
        visit: &mut dyn FnMut(ContinuationInfo<'_>),
    ) {
        let this = operation.cast::<Self>().as_ref();
        if let Some(receiver) = &this.receiver {
            visit(ContinuationInfo::from_receiver::<
                S::Value,
                LetValueError<P::Error, S::Error>,
                R,
            >(receiver));
        }
    }
}

impl<P, S, F, R> OperationState for LetValueOperation<P, S, F, R>
where
    P: Connect<PredecessorRcv<P, S, F, R>>,
    S: Connect<SuccessorRcv<P, S, F, R>>,
{
    fn start(self: Pin<&mut Self>) {
        log::trace!("let_value: starting predecessor");
        // SAFETY: the storage is only projected, never moved.
        let storage = unsafe { self.get_unchecked_mut().storage() };
        match storage.predecessor() {
            Some(slot) => slot.start(),
            None => panic!("let_value operation started more than once"),
        }
    }
}

impl<P, S, F, R> Drop for LetValueOperation<P, S, F, R>
where
    P: Connect<PredecessorRcv<P, S, F, R>>,
    S: Connect<SuccessorRcv<P, S, F, R>>,
{
    fn drop(&mut self) {
        // SAFETY: operations are pinned from connect onwards and dropped in
        // place.
        unsafe { self.teardown() }
    }
}
