//! The declaration graph a module is loaded into.
//!
//! A [`crate::Module`] owns its top-level [`TypeDeclaration`]s; each type owns its nested
//! types, methods and fields. Collections hold [`Slot`]s so dangling metadata entries stay
//! visible without a nullable declaration type.
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::{metadata::typesystem::Slot, Module};
//!
//! let module = Module::from_file("Library.dll".as_ref())?;
//! for ty in module.types().iter().filter_map(Slot::as_ref) {
//!     println!("{} {}", ty.full_name(), ty.visibility());
//! }
//! # Ok::<(), publicizer::Error>(())
//! ```

mod declarations;
mod slot;
mod visibility;

pub use declarations::{FieldDeclaration, MethodDeclaration, TypeDeclaration, MEMBER_ACCESS_MASK};
pub use slot::Slot;
pub use visibility::{MemberAccess, TypeVisibility};

/// Depth-first iterator over every present type of a declaration tree, parents before their
/// nested types.
pub struct TypeIter<'a> {
    stack: Vec<std::slice::Iter<'a, Slot<TypeDeclaration>>>,
}

impl<'a> TypeIter<'a> {
    /// Iterate over `roots` and everything nested inside them.
    #[must_use]
    pub fn new(roots: &'a [Slot<TypeDeclaration>]) -> Self {
        TypeIter {
            stack: vec![roots.iter()],
        }
    }
}

impl<'a> Iterator for TypeIter<'a> {
    type Item = &'a TypeDeclaration;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(Slot::Present(ty)) => {
                    self.stack.push(ty.nested_types.iter());
                    return Some(ty);
                }
                Some(Slot::Absent) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{tables::TableId, token::Token};

    fn decl(rid: u32, nested_types: Vec<Slot<TypeDeclaration>>) -> Slot<TypeDeclaration> {
        Slot::Present(TypeDeclaration {
            token: Token::from_parts(TableId::TypeDef, rid),
            name: format!("T{rid}"),
            namespace: String::new(),
            flags: 0,
            is_nested: false,
            nested_types,
            methods: Vec::new(),
            fields: Vec::new(),
        })
    }

    #[test]
    fn depth_first_order() {
        let roots = vec![
            decl(2, vec![decl(3, vec![decl(4, Vec::new())]), Slot::Absent]),
            Slot::Absent,
            decl(5, Vec::new()),
        ];

        let names: Vec<&str> = TypeIter::new(&roots).map(|ty| ty.name.as_str()).collect();
        assert_eq!(names, vec!["T2", "T3", "T4", "T5"]);
    }

    #[test]
    fn deep_nesting() {
        let mut chain = decl(10_000, Vec::new());
        for rid in (2..10_000).rev() {
            chain = decl(rid, vec![chain]);
        }

        let roots = vec![chain];
        assert_eq!(TypeIter::new(&roots).count(), 9_999);

        // unwind without recursive drop glue

        let mut pending = roots;
        while let Some(slot) = pending.pop() {
            if let Slot::Present(mut ty) = slot {
                pending.append(&mut ty.nested_types);
            }
        }
    }
}
