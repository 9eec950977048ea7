//! Shared type model for Prism.
//!
//! Prism introspects class shapes that were produced by some reflective or
//! static-analysis front end. This crate is the vocabulary those front ends
//! speak: class identities, the [`Type`] representation, class metadata, and
//! the subtyping/substitution helpers the property resolver relies on.
//!
//! Nothing here touches a runtime. A [`TypeEnv`] is the only way to learn
//! about a class, so the resolver stays reusable against any surface source.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

mod relations;

pub use relations::{is_assignable, most_specific, substitute, type_key};

/// Identity of a class known to a [`TypeEnv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Identity of a class-level type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(u32);

impl TypeVarId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

/// A class instantiation: the class definition plus its type arguments.
///
/// `args` is empty both for non-generic classes and for raw uses of generic
/// ones; [`ClassDef::type_params`] disambiguates the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Void,
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    /// A nominal external type known only by its binary name.
    Named(String),
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    pub fn boolean() -> Self {
        Type::Primitive(PrimitiveType::Boolean)
    }

    pub fn int() -> Self {
        Type::Primitive(PrimitiveType::Int)
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    #[must_use]
    pub fn is_int(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveType::Int))
    }

    #[must_use]
    pub fn is_primitive_boolean(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveType::Boolean))
    }

    /// `boolean` or its boxed counterpart.
    ///
    /// The resolver gives `isX` accessors precedence for either flavor.
    #[must_use]
    pub fn is_boolean_like(&self) -> bool {
        match self {
            Type::Primitive(PrimitiveType::Boolean) => true,
            Type::Named(name) => name == "java.lang.Boolean",
            _ => false,
        }
    }

    /// The element type if this is an array type.
    #[must_use]
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A class-level type parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub id: TypeVarId,
    pub name: String,
    pub upper_bounds: Vec<Type>,
}

impl TypeParamDef {
    pub fn new(id: TypeVarId, name: impl Into<String>, upper_bounds: Vec<Type>) -> Self {
        Self {
            id,
            name: name.into(),
            upper_bounds,
        }
    }

    /// The bound a raw instantiation erases this parameter to.
    #[must_use]
    pub fn first_bound(&self) -> Option<&Type> {
        self.upper_bounds.first()
    }
}

/// Span-free summary of one class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub type_params: Vec<TypeParamDef>,
    /// Whether the class can be reflected upon at all. Surface extraction
    /// fails for the whole type when any ancestor is inaccessible.
    pub accessible: bool,
}

impl Default for ClassDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ClassKind::Class,
            super_class: None,
            interfaces: Vec::new(),
            type_params: Vec::new(),
            accessible: true,
        }
    }
}

impl ClassDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Query interface over class metadata.
///
/// Returns owned snapshots so implementations are free to keep their class
/// tables behind locks and drop entries while readers are active.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<ClassDef>;

    /// The root of the reference-type hierarchy (`java.lang.Object` in the
    /// canonical front end). Everything non-primitive is assignable to it.
    fn object_root(&self) -> ClassId;
}

impl<T: TypeEnv + ?Sized> TypeEnv for &T {
    fn class(&self, id: ClassId) -> Option<ClassDef> {
        (**self).class(id)
    }

    fn object_root(&self) -> ClassId {
        (**self).object_root()
    }
}

/// Substitution from type variables to concrete types.
pub type Substitution = HashMap<TypeVarId, Type>;
