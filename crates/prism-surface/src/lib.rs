//! Reflective surface of a class.
//!
//! A [`TypeSurface`] is an immutable snapshot of everything the property
//! resolver is allowed to see about one class: its methods (own, inherited,
//! and interface-declared, already flattened and deduplicated), its fields,
//! and an identity token used for cache keying. Surfaces are produced on
//! demand by a [`SurfaceProvider`] and discarded after resolution; only the
//! derived descriptors are cached.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use prism_types::{type_key, ClassId, Type};

mod error;
mod extract;
mod store;

pub use error::{IntrospectError, Result};
pub use extract::extract;
pub use store::{ClassDecl, MemoryTypeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    PackagePrivate,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Str(String),
    StrList(Vec<String>),
}

impl AnnotationValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// A declared annotation: a name plus named arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub args: Vec<(String, AnnotationValue)>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        let mut name = name.into();
        if let Some(stripped) = name.strip_prefix('@') {
            name = stripped.to_string();
        }
        Self {
            name,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.args.push((key.into(), value));
        self
    }

    /// Matches either the simple or the fully qualified annotation name.
    pub fn matches(&self, query: &str) -> bool {
        if self.name == query {
            return true;
        }
        let own_simple = self.name.rsplit('.').next().unwrap_or(&self.name);
        let query_simple = query.rsplit('.').next().unwrap_or(query);
        own_simple == query_simple
    }

    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&AnnotationValue> {
        self.args
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// One method as it appears on a class's introspectable surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Type,
    pub is_static: bool,
    pub is_varargs: bool,
    pub visibility: Visibility,
    /// Class that declared the winning definition of this method.
    pub declared_in: ClassId,
    pub annotations: Vec<Annotation>,
}

impl MethodSig {
    /// A public instance method. Adjust flags through the `with_*` helpers.
    pub fn new(name: impl Into<String>, params: Vec<Parameter>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            is_static: false,
            is_varargs: false,
            visibility: Visibility::Public,
            declared_in: ClassId::new(0),
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn with_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.matches(name))
    }

    #[must_use]
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.matches(name))
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Deterministic total ordering key for tie-breaks.
    ///
    /// Ordering by this key is antisymmetric by construction, which is the
    /// only contract resolution tie-breaks rely on.
    #[must_use]
    pub fn sort_key(&self) -> (String, usize, Vec<String>, String) {
        (
            self.name.clone(),
            self.params.len(),
            self.params.iter().map(|p| type_key(&p.ty)).collect(),
            type_key(&self.return_type),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSig {
    pub name: String,
    pub ty: Type,
}

impl FieldSig {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Identity token for a class.
///
/// The owning store holds the only strong `Arc`; caches downgrade to `Weak`
/// so an unloaded class's entries become reclaimable without an explicit
/// flush.
#[derive(Debug)]
pub struct ClassToken {
    class: ClassId,
}

impl ClassToken {
    pub fn new(class: ClassId) -> Self {
        Self { class }
    }

    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }
}

/// Immutable snapshot of one class's introspectable members.
#[derive(Debug, Clone)]
pub struct TypeSurface {
    pub class: ClassId,
    /// Flattened methods in discovery order: most-derived class first,
    /// declaration order within a class, superclasses before interfaces.
    pub methods: Vec<MethodSig>,
    pub fields: Vec<FieldSig>,
    pub token: Arc<ClassToken>,
}

/// Source of per-class declarations consumed by [`extract`].
///
/// Declarations are *unflattened*: each call returns only what the class
/// itself declares. The extractor walks the hierarchy and does the merging.
pub trait SurfaceSource: prism_types::TypeEnv {
    fn declared_methods(&self, class: ClassId) -> Vec<MethodSig>;
    fn declared_fields(&self, class: ClassId) -> Vec<FieldSig>;
    fn token(&self, class: ClassId) -> Option<Arc<ClassToken>>;
}

/// Capability interface handing out finished surfaces.
///
/// Separate from [`SurfaceSource`] so callers can interpose doubles (e.g. an
/// extraction counter) without re-implementing storage.
pub trait SurfaceProvider {
    fn extract_surface(&self, class: ClassId) -> Result<TypeSurface>;
}

impl<T: SurfaceProvider + ?Sized> SurfaceProvider for &T {
    fn extract_surface(&self, class: ClassId) -> Result<TypeSurface> {
        (**self).extract_surface(class)
    }
}
