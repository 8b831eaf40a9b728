use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Literal: a node id together with an optional negation, encoded as `2 * id + negated`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Ref(pub(crate) u32);

impl Ref {
    pub const FALSE: Ref = Ref(0);
    pub const TRUE: Ref = Ref(1);

    pub const fn new(id: u32, negated: bool) -> Self {
        Self((id << 1) + negated as u32)
    }
    pub const fn positive(id: u32) -> Self {
        Self::new(id, false)
    }
    pub const fn negative(id: u32) -> Self {
        Self::new(id, true)
    }
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn id(self) -> u32 {
        self.0 >> 1
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    pub const fn is_const(self) -> bool {
        self.id() == 0
    }

    pub const fn negate(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Returns the value of a constant literal, `None` otherwise.
    pub const fn get_const(self) -> Option<bool> {
        if self.is_const() {
            Some(self.is_negated())
        } else {
            None
        }
    }

    /// Applies the negation of `self` to `value`.
    pub const fn apply(self, value: bool) -> bool {
        value ^ self.is_negated()
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.id()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(Ref::FALSE.get_const(), Some(false));
        assert_eq!(Ref::TRUE.get_const(), Some(true));
        assert_eq!(-Ref::FALSE, Ref::TRUE);
        assert_eq!(Ref::positive(3).get_const(), None);
    }

    #[test]
    fn test_encoding() {
        let r = Ref::negative(5);
        assert_eq!(r.raw(), 11);
        assert_eq!(r.id(), 5);
        assert!(r.is_negated());
        assert_eq!(-r, Ref::positive(5));
        assert_eq!(r.to_string(), "~@5");
    }
}
