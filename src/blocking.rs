/// Whether a sender completes on the thread that started it.
///
/// Variants are ordered by severity: the further down the list, the less a
/// caller may assume about where completion happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blocking {
    /// Completes before `start` returns, on the starting thread.
    AlwaysInline,
    /// Completes on the starting thread, possibly after `start` returns.
    Always,
    /// No guarantee either way.
    Maybe,
    /// Never completes on the starting thread before `start` returns.
    Never,
}

impl Blocking {
    const fn severity(self) -> u8 {
        match self {
            Blocking::AlwaysInline => 0,
            Blocking::Always => 1,
            Blocking::Maybe => 2,
            Blocking::Never => 3,
        }
    }

    pub const fn max(self, other: Blocking) -> Blocking {
        if self.severity() >= other.severity() {
            self
        } else {
            other
        }
    }

    pub const fn min(self, other: Blocking) -> Blocking {
        if self.severity() <= other.severity() {
            self
        } else {
            other
        }
    }

    /// Classification of running `successor` after `predecessor` completes
    /// with a value.
    ///
    /// The successor only runs on the success path; errors and cancellation
    /// complete straight from the predecessor, so its contribution is capped
    /// at [`Blocking::Maybe`].
    pub const fn sequence(predecessor: Blocking, successor: Blocking) -> Blocking {
        predecessor.max(successor.min(Blocking::Maybe))
    }

    /// Classification of a sender that behaves like either `left` or `right`.
    pub const fn either(left: Blocking, right: Blocking) -> Blocking {
        if left.severity() == right.severity() {
            left
        } else if left.is_synchronous() && right.is_synchronous() {
            Blocking::Always
        } else {
            Blocking::Maybe
        }
    }

    pub const fn is_synchronous(self) -> bool {
        matches!(self, Blocking::AlwaysInline | Blocking::Always)
    }
}
