/// An entry of a declaration collection.
///
/// Metadata can contain dangling entries: an indirection row pointing nowhere, a member run
/// reaching past its table, a nesting row naming a type that does not exist. The loader keeps
/// such entries as [`Slot::Absent`] so that collections mirror the metadata without a
/// nullable declaration type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<T> {
    /// A resolved declaration
    Present(T),
    /// A dangling entry
    Absent,
}

impl<T> Slot<T> {
    /// Returns `true` for [`Slot::Present`]
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Slot::Present(_))
    }

    /// Returns `true` for [`Slot::Absent`]
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    /// The declaration, if present
    #[must_use]
    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Slot::Present(value) => Some(value),
            Slot::Absent => None,
        }
    }

    /// The declaration, if present, mutably
    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Present(value) => Some(value),
            Slot::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Slot<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Slot::Present(value),
            None => Slot::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let mut present = Slot::Present(5);
        let absent: Slot<i32> = Slot::Absent;

        assert!(present.is_present());
        assert!(absent.is_absent());
        assert_eq!(present.as_ref(), Some(&5));
        assert_eq!(absent.as_ref(), None);

        if let Some(value) = present.as_mut() {
            *value = 6;
        }
        assert_eq!(present, Slot::Present(6));

        assert_eq!(Slot::from(Some(1)), Slot::Present(1));
        assert_eq!(Slot::<u8>::from(None), Slot::Absent);
    }
}
