//! Declarative metadata overlay.
//!
//! Metadata rides on the *chosen* canonical accessors; annotations on losing
//! overloads never reach the descriptor. When getter and setter both carry
//! an instance, the getter's whole instance wins; attributes are never
//! mixed across accessors.

use prism_surface::{AnnotationValue, MethodSig};

use crate::descriptor::{EnumerationValue, MetadataValue, PropertyDescriptor};

/// Simple name of the annotation the default [`MetadataSource`] reads.
pub const METADATA_ANNOTATION: &str = "BeanProperty";

/// One whole metadata instance as declared on an accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMetadata {
    pub bound: bool,
    pub constrained: bool,
    pub expert: bool,
    pub hidden: bool,
    pub preferred: bool,
    pub required: bool,
    pub visual_update: bool,
    pub transient: bool,
    pub short_description: Option<String>,
    /// Fully qualified reference expressions, optionally suffixed
    /// `=literal`.
    pub enumeration_values: Vec<String>,
}

/// Capability yielding a metadata instance per method.
///
/// Abstracts over where declarative metadata lives: annotations, sidecar
/// config, or explicit registration.
pub trait MetadataSource {
    fn metadata_for(&self, method: &MethodSig) -> Option<PropertyMetadata>;
}

/// Default source: a `BeanProperty` annotation on the method itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationMetadata;

impl MetadataSource for AnnotationMetadata {
    fn metadata_for(&self, method: &MethodSig) -> Option<PropertyMetadata> {
        let annotation = method.annotation(METADATA_ANNOTATION)?;

        let flag = |key: &str| annotation.arg(key).and_then(AnnotationValue::as_bool);
        let mut metadata = PropertyMetadata {
            bound: flag("bound").unwrap_or(false),
            constrained: flag("constrained").unwrap_or(false),
            expert: flag("expert").unwrap_or(false),
            hidden: flag("hidden").unwrap_or(false),
            preferred: flag("preferred").unwrap_or(false),
            required: flag("required").unwrap_or(false),
            visual_update: flag("visualUpdate").unwrap_or(false),
            transient: flag("transient").unwrap_or(false),
            short_description: annotation
                .arg("description")
                .or_else(|| annotation.arg("shortDescription"))
                .and_then(AnnotationValue::as_str)
                .map(str::to_string),
            enumeration_values: Vec::new(),
        };
        if let Some(AnnotationValue::StrList(values)) = annotation.arg("enumerationValues") {
            metadata.enumeration_values = values.clone();
        }
        Some(metadata)
    }
}

/// Overlay metadata onto a resolved descriptor.
///
/// `accessors` lists the chosen canonical methods in precedence order
/// (read, write, indexed read, indexed write); the first one carrying an
/// instance supplies the whole descriptor's metadata. `boolean_style`
/// suppresses enumeration-value expansion for `is`-backed properties.
pub fn apply(
    descriptor: &mut PropertyDescriptor,
    accessors: &[Option<&MethodSig>],
    source: &dyn MetadataSource,
    boolean_style: bool,
) {
    let Some(metadata) = accessors
        .iter()
        .flatten()
        .copied()
        .find_map(|method| source.metadata_for(method))
    else {
        return;
    };

    descriptor.bound = metadata.bound;
    descriptor.constrained = metadata.constrained;

    let flags = [
        ("expert", metadata.expert),
        ("hidden", metadata.hidden),
        ("preferred", metadata.preferred),
        ("required", metadata.required),
        ("visualUpdate", metadata.visual_update),
        ("transient", metadata.transient),
    ];
    for (key, value) in flags {
        descriptor
            .metadata
            .insert(key.to_string(), MetadataValue::Bool(value));
    }

    if let Some(description) = metadata.short_description {
        descriptor
            .metadata
            .insert("shortDescription".to_string(), MetadataValue::Str(description));
    }

    if !boolean_style && !metadata.enumeration_values.is_empty() {
        let expanded: Vec<EnumerationValue> = metadata
            .enumeration_values
            .iter()
            .map(|entry| expand_enumeration_value(entry))
            .collect();
        descriptor.metadata.insert(
            "enumerationValues".to_string(),
            MetadataValue::Enumeration(expanded),
        );
    }
}

/// Expand one declared enumeration entry into its three columns.
///
/// `javax.swing.SwingConstants.TOP=1` becomes
/// (`TOP`, `1`, `javax.swing.SwingConstants.TOP`); without the `=literal`
/// suffix the short name doubles as the literal.
fn expand_enumeration_value(entry: &str) -> EnumerationValue {
    let (expression, literal) = match entry.split_once('=') {
        Some((expression, literal)) => (expression, Some(literal)),
        None => (entry, None),
    };
    let name = expression.rsplit('.').next().unwrap_or(expression);
    EnumerationValue {
        name: name.to_string(),
        literal: literal.unwrap_or(name).to_string(),
        expression: expression.to_string(),
    }
}
