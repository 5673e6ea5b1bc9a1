use crate::Receiver;
use core::{any, fmt, marker::PhantomData, ptr::NonNull};

/// Type-erased view of a receiver waiting on a completion.
///
/// Stack-walking tools start from a receiver and follow
/// [`Receiver::visit_continuations`] to reconstruct the asynchronous call
/// chain.
#[derive(Clone, Copy)]
pub struct ContinuationInfo<'a> {
    address: NonNull<()>,
    type_name: &'static str,
    visit: unsafe fn(NonNull<()>, &mut dyn FnMut(ContinuationInfo<'_>)),
    receiver: PhantomData<&'a ()>,
}

impl<'a> ContinuationInfo<'a> {
    pub fn from_receiver<V, E, R: Receiver<V, E>>(receiver: &'a R) -> Self {
        ContinuationInfo {
            address: NonNull::from(receiver).cast(),
            type_name: any::type_name::<R>(),
            visit: visit_receiver::<V, E, R>,
            receiver: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn address(&self) -> *const () {
        self.address.as_ptr()
    }

    pub fn visit_continuations(&self, visit: &mut dyn FnMut(ContinuationInfo<'_>)) {
        // SAFETY: `address` borrows the receiver `visit` was instantiated for,
        // and the borrow lasts for `'a`.
        unsafe { (self.visit)(self.address, visit) }
    }
}

unsafe fn visit_receiver<V, E, R: Receiver<V, E>>(
    address: NonNull<()>,
    visit: &mut dyn FnMut(ContinuationInfo<'_>),
) {
    address.cast::<R>().as_ref().visit_continuations(visit)
}

impl fmt::Debug for ContinuationInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationInfo")
            .field("type_name", &self.type_name)
            .field("address", &self.address)
            .finish()
    }
}
