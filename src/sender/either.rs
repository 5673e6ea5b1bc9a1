use crate::{Blocking, Connect, OperationState, Sender, Slot};
use core::pin::Pin;
use pin_project::pin_project;

/// A sender that is one of two senders with the same completion types.
///
/// Its static signature is the union of both: a factory returning
/// `Either` describes every successor it can produce.
#[derive(Debug, Clone)]
pub enum Either<A, B> {
    Left(A),
    Right(B),
}

#[pin_project(project = EitherOperationProj)]
pub enum EitherOperation<A, B> {
    Left(#[pin] Slot<A>),
    Right(#[pin] Slot<B>),
}

impl<A: Sender, B: Sender<Value = A::Value, Error = A::Error>> Sender for Either<A, B> {
    type Value = A::Value;
    type Error = A::Error;

    const SENDS_DONE: bool = A::SENDS_DONE || B::SENDS_DONE;
    const BLOCKING: Blocking = Blocking::either(A::BLOCKING, B::BLOCKING);
    const SCHEDULER_AFFINE: bool = A::SCHEDULER_AFFINE && B::SCHEDULER_AFFINE;

    fn blocking(&self) -> Blocking {
        match self {
            Either::Left(sender) => sender.blocking(),
            Either::Right(sender) => sender.blocking(),
        }
    }
}

impl<A, B, R> Connect<R> for Either<A, B>
where
    A: Connect<R>,
    B: Connect<R, Value = A::Value, Error = A::Error>,
{
    type Operation = EitherOperation<A::Operation, B::Operation>;

    fn connect(self, receiver: R, place: Pin<&mut Slot<Self::Operation>>) {
        match self {
            Either::Left(sender) => {
                place.fill_with(EitherOperation::Left(Slot::new()), |operation| {
                    match operation.project() {
                        EitherOperationProj::Left(slot) => sender.connect(receiver, slot),
                        EitherOperationProj::Right(_) => unreachable!(),
                    }
                })
            }
            Either::Right(sender) => {
                place.fill_with(EitherOperation::Right(Slot::new()), |operation| {
                    match operation.project() {
                        EitherOperationProj::Right(slot) => sender.connect(receiver, slot),
                        EitherOperationProj::Left(_) => unreachable!(),
                    }
                })
            }
        }
    }
}

impl<A: OperationState, B: OperationState> OperationState for EitherOperation<A, B> {
    fn start(self: Pin<&mut Self>) {
        match self.project() {
            EitherOperationProj::Left(slot) => slot.start(),
            EitherOperationProj::Right(slot) => slot.start(),
        }
    }
}
