use core::fmt::{self, Debug, Display, Formatter};
use thiserror::Error;

#[cfg(feature = "std")]
use std::{any::Any, boxed::Box, panic};

/// A panic caught while building a successor operation.
///
/// Delivered through the error channel so the final receiver sees one error
/// surface regardless of which construction step failed.
#[derive(Error)]
#[error("panicked{}", MessageSuffix(self.message()))]
pub struct Panic {
    #[cfg(feature = "std")]
    payload: Box<dyn Any + Send + 'static>,
}

impl Panic {
    #[cfg(feature = "std")]
    fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Panic { payload }
    }

    /// The panic message, when the payload is a string.
    pub fn message(&self) -> Option<&str> {
        #[cfg(feature = "std")]
        {
            if let Some(message) = self.payload.downcast_ref::<&'static str>() {
                return Some(message);
            }
            self.payload
                .downcast_ref::<std::string::String>()
                .map(|message| message.as_str())
        }
        #[cfg(not(feature = "std"))]
        {
            None
        }
    }

    /// Hands the payload back, e.g. for [`std::panic::resume_unwind`].
    #[cfg(feature = "std")]
    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }
}

struct MessageSuffix<'a>(Option<&'a str>);

impl Display for MessageSuffix<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.0 {
            Some(message) => write!(f, ": {}", message),
            None => Ok(()),
        }
    }
}

impl Debug for Panic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Panic")
            .field("message", &self.message())
            .finish()
    }
}

#[cfg(feature = "std")]
pub(crate) fn catch<T, F: FnOnce() -> T>(call: F) -> Result<T, Panic> {
    panic::catch_unwind(panic::AssertUnwindSafe(call)).map_err(Panic::new)
}

#[cfg(not(feature = "std"))]
pub(crate) fn catch<T, F: FnOnce() -> T>(call: F) -> Result<T, Panic> {
    Ok(call())
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn catches_static_and_formatted_messages() {
        let panic = catch(|| panic!("static")).unwrap_err();
        assert_eq!(panic.message(), Some("static"));
        assert_eq!(panic.to_string(), "panicked: static");

        let code = 7;
        let panic = catch(|| panic!("code {}", code)).unwrap_err();
        assert_eq!(panic.message(), Some("code 7"));
    }

    #[test]
    fn opaque_payloads_have_no_message() {
        let panic = catch(|| std::panic::panic_any(3_u8)).unwrap_err();
        assert_eq!(panic.message(), None);
        assert_eq!(panic.to_string(), "panicked");
        assert_eq!(panic.into_payload().downcast_ref::<u8>(), Some(&3));
    }

    #[test]
    fn passes_through_values() {
        assert_eq!(catch(|| 5).unwrap(), 5);
    }
}
