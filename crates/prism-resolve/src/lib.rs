//! Bean-style property resolution.
//!
//! Turns a class's reflective surface into canonical property descriptors:
//! classify every method against the accessor shapes, group candidates by
//! inferred property name, disambiguate overloads and inheritance, then
//! overlay declarative metadata from the winning accessors.
//!
//! The pipeline is pure and synchronous; [`resolve`] is safe to call from
//! any thread. Caching lives a layer up, in `prism-introspect`.

mod annotate;
mod classify;
mod descriptor;
mod resolver;

pub use annotate::{
    AnnotationMetadata, MetadataSource, PropertyMetadata, METADATA_ANNOTATION,
};
pub use classify::{classify, decapitalize, Candidate, MethodRole};
pub use descriptor::{EnumerationValue, MetadataValue, MethodRef, PropertyDescriptor};
pub use resolver::{resolve, resolve_with, ConflictPolicy, ResolverOptions};
