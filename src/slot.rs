use crate::OperationState;
use core::{marker::PhantomPinned, mem, pin::Pin};
use pin_project::pin_project;

/// Operations capture their own address in the receivers they hand out, so
/// they are built directly in their final place and never moved afterwards.
/// A slot starts out vacant; [`Connect::connect`](crate::Connect::connect)
/// fills it, and dropping the slot drops the operation in place.
#[pin_project]
pub struct Slot<O> {
    #[pin]
    operation: Option<O>,
    #[pin]
    _pinned: PhantomPinned,
}

impl<O> Slot<O> {
    pub const fn new() -> Self {
        Slot {
            operation: None,
            _pinned: PhantomPinned,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.operation.is_none()
    }

    /// An operation already in the slot is dropped in place first.
    pub fn fill(self: Pin<&mut Self>, operation: O) -> Pin<&mut O> {
        debug_assert!(self.is_vacant(), "connected into an occupied slot");
        let mut place = self.project().operation;
        place.set(Some(operation));
        match place.as_pin_mut() {
            Some(operation) => operation,
            None => unreachable!(),
        }
    }

    /// Fills the slot, then finishes building the operation in place.
    ///
    /// If `build` unwinds, the partly built operation is dropped and the slot
    /// is left vacant.
    pub fn fill_with(mut self: Pin<&mut Self>, operation: O, build: impl FnOnce(Pin<&mut O>)) {
        struct Vacate<'a, O>(Pin<&'a mut Slot<O>>);

        impl<O> Drop for Vacate<'_, O> {
            fn drop(&mut self) {
                self.0.as_mut().clear();
            }
        }

        self.as_mut().fill(operation);
        let mut vacate = Vacate(self);
        if let Some(operation) = vacate.0.as_mut().as_pin_mut() {
            build(operation);
        }
        mem::forget(vacate);
    }

    pub fn as_pin_mut(self: Pin<&mut Self>) -> Option<Pin<&mut O>> {
        self.project().operation.as_pin_mut()
    }

    pub fn clear(self: Pin<&mut Self>) {
        self.project().operation.set(None);
    }
}

impl<O> Default for Slot<O> {
    fn default() -> Self {
        Slot::new()
    }
}

impl<O: OperationState> OperationState for Slot<O> {
    fn start(self: Pin<&mut Self>) {
        match self.as_pin_mut() {
            Some(operation) => operation.start(),
            None => panic!("started a vacant operation slot"),
        }
    }
}
