use crate::{Blocking, Completion, Connect, OperationState, Receiver, Sender, Slot};
use core::{convert::Infallible, marker::PhantomData, marker::PhantomPinned, pin::Pin};
use pin_project::pin_project;

/// Completes inline with a value or an error.
pub struct Ready<T, E = Infallible> {
    data: Result<T, E>,
}

/// Completes inline with done.
pub struct Done<T = (), E = Infallible> {
    ty: PhantomData<fn() -> (T, E)>,
}

#[pin_project]
pub struct ReadyOperation<T, E, R> {
    completion: Option<(Completion<T, E>, R)>,
    #[pin]
    _pinned: PhantomPinned,
}

impl<T, E> Sender for Ready<T, E> {
    type Value = T;
    type Error = E;

    const SENDS_DONE: bool = false;
    const BLOCKING: Blocking = Blocking::AlwaysInline;
    const SCHEDULER_AFFINE: bool = true;
}

impl<T, E> Sender for Done<T, E> {
    type Value = T;
    type Error = E;

    const SENDS_DONE: bool = true;
    const BLOCKING: Blocking = Blocking::AlwaysInline;
    const SCHEDULER_AFFINE: bool = true;
}

impl<T, E, R: Receiver<T, E>> Connect<R> for Ready<T, E> {
    type Operation = ReadyOperation<T, E, R>;

    fn connect(self, receiver: R, place: Pin<&mut Slot<Self::Operation>>) {
        place.fill(ReadyOperation::new(self.data.into(), receiver));
    }
}

impl<T, E, R: Receiver<T, E>> Connect<R> for Done<T, E> {
    type Operation = ReadyOperation<T, E, R>;

    fn connect(self, receiver: R, place: Pin<&mut Slot<Self::Operation>>) {
        place.fill(ReadyOperation::new(Completion::Done, receiver));
    }
}

impl<T, E, R> ReadyOperation<T, E, R> {
    fn new(completion: Completion<T, E>, receiver: R) -> Self {
        ReadyOperation {
            completion: Some((completion, receiver)),
            _pinned: PhantomPinned,
        }
    }
}

impl<T, E, R: Receiver<T, E>> OperationState for ReadyOperation<T, E, R> {
    fn start(self: Pin<&mut Self>) {
        let (completion, receiver) = self
            .project()
            .completion
            .take()
            .unwrap_or_else(|| panic!("Ready started more than once"));
        completion.complete(receiver);
    }
}

pub fn ready<T, E>(data: Result<T, E>) -> Ready<T, E> {
    Ready { data }
}

pub fn ok<T, E>(data: T) -> Ready<T, E> {
    Ready { data: Ok(data) }
}

pub fn err<T, E>(data: E) -> Ready<T, E> {
    Ready { data: Err(data) }
}

pub fn done<T, E>() -> Done<T, E> {
    Done { ty: PhantomData }
}
