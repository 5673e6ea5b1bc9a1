#[cfg(feature = "alloc")]
use alloc::sync::Arc;
#[cfg(feature = "alloc")]
use core::sync::atomic::{AtomicBool, Ordering};

/// Cancellation control a receiver exposes to the operation feeding it.
///
/// Operations that can stop early ask their receiver for a token and finish
/// with `set_done` once a stop has been requested. Tokens are forwarded
/// unchanged through wrapping receivers.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    #[cfg(feature = "alloc")]
    flag: Option<Arc<AtomicBool>>,
}

impl StopToken {
    pub const fn never() -> Self {
        StopToken {
            #[cfg(feature = "alloc")]
            flag: None,
        }
    }

    pub fn stop_possible(&self) -> bool {
        #[cfg(feature = "alloc")]
        {
            self.flag.is_some()
        }
        #[cfg(not(feature = "alloc"))]
        {
            false
        }
    }

    pub fn stop_requested(&self) -> bool {
        #[cfg(feature = "alloc")]
        {
            self.flag
                .as_ref()
                .map_or(false, |flag| flag.load(Ordering::Acquire))
        }
        #[cfg(not(feature = "alloc"))]
        {
            false
        }
    }
}

#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Default)]
pub struct StopSource {
    flag: Arc<AtomicBool>,
}

#[cfg(feature = "alloc")]
impl StopSource {
    pub fn new() -> Self {
        StopSource::default()
    }

    pub fn token(&self) -> StopToken {
        StopToken {
            flag: Some(self.flag.clone()),
        }
    }

    /// Returns `true` if this call made the request.
    pub fn request_stop(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
