use prism_types::ClassId;

pub type Result<T> = std::result::Result<T, IntrospectError>;

/// Errors produced while extracting a class's reflective surface.
///
/// Resolution itself never fails for ordinary ambiguity; every error here is
/// a reflection-access failure and is always surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntrospectError {
    #[error("class `{name}` is not accessible for introspection")]
    Inaccessible { name: String },

    #[error("unknown class {0:?}")]
    UnknownClass(ClassId),
}
