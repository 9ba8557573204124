//! The visibility rewriter.
//!
//! Every type, method and field that is not already maximally visible gets its visibility
//! bits replaced: top-level types become `Public`, nested types `NestedPublic`, methods and
//! fields `Public`. No other attribute bit changes, so the pass is idempotent and each
//! declaration is rewritten independently of every other one.
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::{publicize, Module, PublicizeOptions};
//!
//! let mut module = Module::from_file("Library.dll".as_ref())?;
//! let stats = publicize(&mut module, &PublicizeOptions::default());
//! println!("{} types, {} methods, {} fields", stats.types, stats.methods, stats.fields);
//! # Ok::<(), publicizer::Error>(())
//! ```

use std::{
    iter::Sum,
    ops::{Add, AddAssign},
};

use log::debug;
use rayon::prelude::*;

use crate::metadata::{
    typesystem::{MemberAccess, Slot, TypeDeclaration, TypeVisibility},
    Module,
};

/// Options of a rewrite pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct PublicizeOptions {
    /// Rewrite top-level type trees on the rayon thread pool
    pub parallel: bool,
}

/// Number of declarations a rewrite pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublicizeStats {
    /// Types, nested ones included
    pub types: usize,
    /// Methods, accessors included
    pub methods: usize,
    /// Fields
    pub fields: usize,
}

impl PublicizeStats {
    /// Total number of changed declarations
    #[must_use]
    pub fn total(&self) -> usize {
        self.types + self.methods + self.fields
    }
}

impl Add for PublicizeStats {
    type Output = PublicizeStats;

    fn add(self, other: PublicizeStats) -> PublicizeStats {
        PublicizeStats {
            types: self.types + other.types,
            methods: self.methods + other.methods,
            fields: self.fields + other.fields,
        }
    }
}

impl AddAssign for PublicizeStats {
    fn add_assign(&mut self, other: PublicizeStats) {
        *self = *self + other;
    }
}

impl Sum for PublicizeStats {
    fn sum<I: Iterator<Item = PublicizeStats>>(iter: I) -> PublicizeStats {
        iter.fold(PublicizeStats::default(), Add::add)
    }
}

/// Make every declaration of `module` public and count the changes.
///
/// Absent slots are skipped and not counted. Running the pass on its own output changes
/// nothing and returns all-zero stats.
pub fn publicize(module: &mut Module, options: &PublicizeOptions) -> PublicizeStats {
    let stats = if options.parallel {
        module
            .types_mut()
            .par_iter_mut()
            .map(publicize_tree)
            .reduce(PublicizeStats::default, Add::add)
    } else {
        module.types_mut().iter_mut().map(publicize_tree).sum()
    };

    debug!(
        "Publicized {} types, {} methods, {} fields in {}",
        stats.types,
        stats.methods,
        stats.fields,
        module.name()
    );
    stats
}

fn publicize_tree(root: &mut Slot<TypeDeclaration>) -> PublicizeStats {
    let mut stats = PublicizeStats::default();
    let mut pending = vec![root];

    while let Some(slot) = pending.pop() {
        let Slot::Present(ty) = slot else {
            continue;
        };

        stats += publicize_declaration(ty);
        pending.extend(ty.nested_types.iter_mut());
    }

    stats
}

fn publicize_declaration(ty: &mut TypeDeclaration) -> PublicizeStats {
    let mut stats = PublicizeStats::default();

    if !ty.is_public() {
        ty.set_visibility(TypeVisibility::public_for(ty.is_nested));
        stats.types += 1;
    }

    for method in ty.methods.iter_mut().filter_map(Slot::as_mut) {
        if !method.is_public() {
            method.set_access(MemberAccess::Public);
            stats.methods += 1;
        }
    }

    for field in ty.fields.iter_mut().filter_map(Slot::as_mut) {
        if !field.is_public() {
            field.set_access(MemberAccess::Public);
            stats.fields += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::tables::{FieldAttributes, MethodModifiers, TypeAttributes},
        test::{ImageBuilder, TypeSpec},
    };

    fn expected(types: usize, methods: usize, fields: usize) -> PublicizeStats {
        PublicizeStats {
            types,
            methods,
            fields,
        }
    }

    #[test]
    fn scenario() {
        let mut module = Module::from_mem(ImageBuilder::scenario().build()).unwrap();

        let stats = publicize(&mut module, &PublicizeOptions::default());
        assert_eq!(stats, expected(2, 1, 1));

        let a = module.types()[0].as_ref().unwrap();
        assert_eq!(a.visibility(), TypeVisibility::Public);
        assert_eq!(
            a.nested_types[0].as_ref().unwrap().visibility(),
            TypeVisibility::NestedPublic
        );
        assert!(a.methods[0].as_ref().unwrap().is_public());
        assert!(a.fields[0].as_ref().unwrap().is_public());
    }

    #[test]
    fn module_type_is_rewritten() {
        let image = ImageBuilder::scenario().with_module_type().build();
        let mut module = Module::from_mem(image).unwrap();

        let stats = publicize(&mut module, &PublicizeOptions::default());
        assert_eq!(stats, expected(3, 1, 1));
        assert_eq!(
            module.types()[0].as_ref().unwrap().visibility(),
            TypeVisibility::Public
        );
    }

    #[test]
    fn idempotent() {
        let mut module = Module::from_mem(ImageBuilder::scenario().build()).unwrap();

        let first = publicize(&mut module, &PublicizeOptions::default());
        assert_ne!(first.total(), 0);

        let second = publicize(&mut module, &PublicizeOptions::default());
        assert_eq!(second, PublicizeStats::default());
    }

    #[test]
    fn only_visibility_bits_change() {
        let sealed_abstract =
            TypeAttributes::SEALED | TypeAttributes::ABSTRACT | TypeAttributes::BEFORE_FIELD_INIT;
        let accessor = (MethodModifiers::SPECIAL_NAME | MethodModifiers::STATIC).bits() as u16;
        let static_field = FieldAttributes::STATIC as u16;
        let image = ImageBuilder::new()
            .ty(TypeSpec::new("<Module>", 0))
            .ty(TypeSpec::new("Helpers", sealed_abstract)
                .namespace("Demo")
                .method("get_Instance", accessor | 0x0001)
                .method("set_Instance", accessor | 0x0003)
                .field("instance", static_field | 0x0001))
            .build();
        let mut module = Module::from_mem(image).unwrap();

        let stats = publicize(&mut module, &PublicizeOptions::default());
        assert_eq!(stats, expected(2, 2, 1));

        let helpers = module.types()[1].as_ref().unwrap();
        assert_eq!(helpers.flags, sealed_abstract | TypeAttributes::PUBLIC);
        for method in helpers.methods.iter().filter_map(Slot::as_ref) {
            assert_eq!(method.flags, accessor | 0x0006);
            assert!(method.is_special_name());
        }

        let field = helpers.fields[0].as_ref().unwrap();
        assert_eq!(field.flags, static_field | 0x0006);
        assert!(field.is_static());
    }

    #[test]
    fn absent_slots_are_skipped() {
        let image = ImageBuilder::new()
            .uncompressed()
            .ty(TypeSpec::new("<Module>", TypeAttributes::PUBLIC))
            .ty(TypeSpec::new("Holder", TypeAttributes::PUBLIC).method("Run", 0x0006))
            .dangling_method_ptr()
            .build();
        let mut module = Module::from_mem(image).unwrap();
        assert_eq!(module.stats().absent, 1);

        let stats = publicize(&mut module, &PublicizeOptions::default());
        assert_eq!(stats, PublicizeStats::default());
    }

    #[test]
    fn parallel_matches_sequential() {
        let build = || {
            let mut builder = ImageBuilder::new().ty(TypeSpec::new("<Module>", 0));
            for index in 0..64u32 {
                builder = builder.ty(
                    TypeSpec::new(&format!("Type{index}"), index % 2)
                        .method("Run", (index % 7) as u16)
                        .field("value", (index % 5) as u16),
                );
            }
            Module::from_mem(builder.build()).unwrap()
        };

        let mut sequential = build();
        let mut parallel = build();

        let sequential_stats = publicize(&mut sequential, &PublicizeOptions { parallel: false });
        let parallel_stats = publicize(&mut parallel, &PublicizeOptions { parallel: true });
        assert_eq!(sequential_stats, parallel_stats);

        let flags = |module: &Module| -> Vec<u32> { module.all_types().map(|ty| ty.flags).collect() };
        assert_eq!(flags(&sequential), flags(&parallel));
    }
}
