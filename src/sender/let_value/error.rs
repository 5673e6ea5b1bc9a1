use crate::Panic;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LetValueError<P, S> {
    #[error("{0}")]
    Predecessor(#[source] P),
    #[error("{0}")]
    Successor(#[source] S),
    #[error("failed to build the successor: {0}")]
    Panicked(#[source] Panic),
}

impl<P, S> LetValueError<P, S> {
    pub fn is_panic(&self) -> bool {
        matches!(self, LetValueError::Panicked(_))
    }
}
