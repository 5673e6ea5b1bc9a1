mod either;
pub use either::{Either, EitherOperation};
mod let_value;
pub use let_value::{
    let_value, LetValue, LetValueError, LetValueOperation, PredecessorReceiver, SuccessorReceiver,
};
mod ready;
pub use ready::{done, err, ok, ready, Done, Ready, ReadyOperation};

use crate::Sender;

pub trait SenderExt: Sender {
    /// Runs `factory` on the value this sender produces and continues with
    /// the sender it returns.
    ///
    /// The value stays alive, in place, until the whole operation is dropped.
    #[track_caller]
    fn let_value<F, S>(self, factory: F) -> LetValue<Self, F>
    where
        Self: Sized,
        F: FnOnce(&mut Self::Value) -> S,
        S: Sender,
    {
        let_value(self, factory)
    }

    fn into_left<T>(self) -> Either<Self, T>
    where
        Self: Sized,
    {
        Either::Left(self)
    }

    fn into_right<T>(self) -> Either<T, Self>
    where
        Self: Sized,
    {
        Either::Right(self)
    }
}

impl<T: Sender> SenderExt for T {}
