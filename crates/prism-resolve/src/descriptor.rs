//! Resolved property descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use prism_surface::MethodSig;
use prism_types::{ClassId, Type};

/// Reference to a chosen accessor method.
///
/// Descriptors outlive the surface they were resolved from, so this carries
/// enough of the signature to re-locate the method instead of borrowing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: ClassId,
    pub name: String,
    pub param_types: Vec<Type>,
    pub return_type: Type,
}

impl MethodRef {
    pub fn of(method: &MethodSig) -> Self {
        Self {
            owner: method.declared_in,
            name: method.name.clone(),
            param_types: method.params.iter().map(|p| p.ty.clone()).collect(),
            return_type: method.return_type.clone(),
        }
    }
}

/// One expanded enumeration value: symbolic short name, literal value as
/// text, and the fully qualified reference expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationValue {
    pub name: String,
    pub literal: String,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataValue {
    Bool(bool),
    Str(String),
    Enumeration(Vec<EnumerationValue>),
}

/// The canonical description of one bean-style property.
///
/// Constructed once per (type, property name) pair per resolution and
/// immutable as far as the engine is concerned; `display_name` exists for
/// callers and is why the cache hands out independent copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    /// `None` when only indexed accessors exist.
    pub property_type: Option<Type>,
    pub indexed_property_type: Option<Type>,
    pub read_method: Option<MethodRef>,
    pub write_method: Option<MethodRef>,
    pub indexed_read_method: Option<MethodRef>,
    pub indexed_write_method: Option<MethodRef>,
    pub bound: bool,
    pub constrained: bool,
    /// Caller-owned display label. Never set by resolution.
    pub display_name: Option<String>,
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl PropertyDescriptor {
    pub(crate) fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type: None,
            indexed_property_type: None,
            read_method: None,
            write_method: None,
            indexed_read_method: None,
            indexed_write_method: None,
            bound: false,
            constrained: false,
            display_name: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Whether any accessor slot is populated.
    #[must_use]
    pub fn has_accessors(&self) -> bool {
        self.read_method.is_some()
            || self.write_method.is_some()
            || self.indexed_read_method.is_some()
            || self.indexed_write_method.is_some()
    }
}
