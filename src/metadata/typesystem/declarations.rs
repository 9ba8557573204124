use crate::metadata::{
    tables::{FieldAttributes, MethodImplCodeType, MethodModifiers, TypeAttributes},
    token::Token,
    typesystem::{MemberAccess, Slot, TypeVisibility},
};

/// Mask of the accessibility bits in a method or field attribute word.
pub const MEMBER_ACCESS_MASK: u16 = 0x0007;

/// A type declared in the module (a `TypeDef` row).
#[derive(Clone, Debug)]
pub struct TypeDeclaration {
    /// `TypeDef` token
    pub token: Token,
    /// Simple name
    pub name: String,
    /// Namespace, empty for nested types and the global namespace
    pub namespace: String,
    /// Full `TypeAttributes` word
    pub flags: u32,
    /// Whether a `NestedClass` row places this type inside another
    pub is_nested: bool,
    /// Nested types in declaration order
    pub nested_types: Vec<Slot<TypeDeclaration>>,
    /// Methods in declaration order
    pub methods: Vec<Slot<MethodDeclaration>>,
    /// Fields in declaration order
    pub fields: Vec<Slot<FieldDeclaration>>,
}

impl TypeDeclaration {
    /// Current visibility classifier
    #[must_use]
    pub fn visibility(&self) -> TypeVisibility {
        TypeVisibility::from_flags(self.flags)
    }

    /// Whether the type is already as visible as its nesting allows.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility() == TypeVisibility::public_for(self.is_nested)
    }

    /// Replace the visibility bits, leaving every other bit untouched.
    pub fn set_visibility(&mut self, visibility: TypeVisibility) {
        self.flags = (self.flags & !TypeAttributes::VISIBILITY_MASK) | visibility.bits();
    }

    /// `Namespace.Name`, or just the name without a namespace
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A method declared in the module (a `MethodDef` row).
///
/// Property and event accessors are ordinary methods carrying the special-name flag.
#[derive(Clone, Debug)]
pub struct MethodDeclaration {
    /// `MethodDef` token
    pub token: Token,
    /// Name
    pub name: String,
    /// Full `MethodAttributes` word
    pub flags: u16,
    /// `MethodImplAttributes` word, read only
    pub impl_flags: u16,
    /// RVA of the body, read only
    pub rva: u32,
}

impl MethodDeclaration {
    /// Current accessibility classifier
    #[must_use]
    pub fn access(&self) -> MemberAccess {
        MemberAccess::from_flags(self.flags)
    }

    /// Whether the method is already public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access() == MemberAccess::Public
    }

    /// Replace the accessibility bits, leaving every other bit untouched.
    pub fn set_access(&mut self, access: MemberAccess) {
        self.flags = (self.flags & !MEMBER_ACCESS_MASK) | access.bits();
    }

    /// Whether the name has a special meaning (property and event accessors, operators)
    #[must_use]
    pub fn is_special_name(&self) -> bool {
        MethodModifiers::from_method_flags(u32::from(self.flags))
            .contains(MethodModifiers::SPECIAL_NAME)
    }

    /// Whether the body is native code
    #[must_use]
    pub fn is_native(&self) -> bool {
        MethodImplCodeType::from_impl_flags(u32::from(self.impl_flags)).is_native()
    }
}

/// A field declared in the module (a `Field` row).
#[derive(Clone, Debug)]
pub struct FieldDeclaration {
    /// `Field` token
    pub token: Token,
    /// Name
    pub name: String,
    /// Full `FieldAttributes` word
    pub flags: u16,
}

impl FieldDeclaration {
    /// Current accessibility classifier
    #[must_use]
    pub fn access(&self) -> MemberAccess {
        MemberAccess::from_flags(self.flags)
    }

    /// Whether the field is already public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access() == MemberAccess::Public
    }

    /// Replace the accessibility bits, leaving every other bit untouched.
    pub fn set_access(&mut self, access: MemberAccess) {
        self.flags = (self.flags & !MEMBER_ACCESS_MASK) | access.bits();
    }

    /// Whether the field is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        u32::from(self.flags) & FieldAttributes::STATIC != 0
    }
}
