use crate::{Completion, Connect, OperationState, Receiver, Sender, Slot};
use core::pin::pin;
use futures::{
    channel::oneshot::{self, Canceled},
    executor::block_on,
};

/// Receiver that hands its completion to a blocked [`sync_wait`] caller.
pub struct SyncWaitReceiver<V, E> {
    sender: oneshot::Sender<Completion<V, E>>,
}

impl<V, E> SyncWaitReceiver<V, E> {
    fn deliver(self, completion: Completion<V, E>) {
        if self.sender.send(completion).is_err() {
            log::warn!("sync_wait: completion arrived after the waiter gave up");
        }
    }
}

impl<V, E> Receiver<V, E> for SyncWaitReceiver<V, E> {
    fn set_value(self, value: V) {
        self.deliver(Completion::Value(value))
    }

    fn set_error(self, error: E) {
        self.deliver(Completion::Error(error))
    }

    fn set_done(self) {
        self.deliver(Completion::Done)
    }
}

/// Connects and starts `sender` on the current thread, then blocks until it
/// completes.
///
/// The operation state lives on this stack frame and is dropped only after
/// the completion has been received. Done is reported as `Ok(None)`.
///
/// # Panics
///
/// If the operation drops its receiver without completing it.
pub fn sync_wait<S>(sender: S) -> Result<Option<S::Value>, S::Error>
where
    S: Connect<SyncWaitReceiver<<S as Sender>::Value, <S as Sender>::Error>>,
{
    log::trace!("sync_wait: starting a {:?} sender", sender.blocking());
    let (completed, completion) = oneshot::channel();

    let mut place = pin!(Slot::new());
    sender.connect(SyncWaitReceiver { sender: completed }, place.as_mut());
    place.as_mut().start();

    match block_on(completion) {
        Ok(completion) => completion.into_result(),
        Err(Canceled) => panic!("sync_wait: operation dropped its receiver without completing"),
    }
}
