//! Accessor-shape classification.
//!
//! Pure function of the surface: each method either matches exactly one
//! accessor shape or drops out of property candidacy. No property-name
//! binding happens here beyond inferring the name itself.

use prism_surface::{MethodSig, TypeSurface, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodRole {
    Getter,
    BooleanGetter,
    IndexedGetter,
    Setter,
    IndexedSetter,
}

/// A method that matched an accessor shape, tagged with its role and the
/// property name it infers.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub method: &'a MethodSig,
    pub role: MethodRole,
    pub property: String,
}

/// Classify every surface method. Overloads sharing a name and role shape
/// are all retained; disambiguation is the resolver's job.
pub fn classify(surface: &TypeSurface) -> Vec<Candidate<'_>> {
    surface.methods.iter().filter_map(classify_method).collect()
}

fn classify_method(method: &MethodSig) -> Option<Candidate<'_>> {
    // Statics never participate, private methods cannot be accessors, and
    // variadic methods fail the exact-arity shapes.
    if method.is_static || method.is_varargs || method.visibility == Visibility::Private {
        return None;
    }

    if let Some(rest) = method.name.strip_prefix("is") {
        if method.params.is_empty() && method.return_type.is_boolean_like() {
            return candidate(method, MethodRole::BooleanGetter, rest);
        }
    }

    if let Some(rest) = method.name.strip_prefix("get") {
        if !method.return_type.is_void() {
            if method.params.is_empty() {
                return candidate(method, MethodRole::Getter, rest);
            }
            if method.params.len() == 1 && method.params[0].ty.is_int() {
                return candidate(method, MethodRole::IndexedGetter, rest);
            }
        }
    }

    if let Some(rest) = method.name.strip_prefix("set") {
        // A write method never has a non-void return type.
        if method.return_type.is_void() {
            if method.params.len() == 1 {
                return candidate(method, MethodRole::Setter, rest);
            }
            if method.params.len() == 2 && method.params[0].ty.is_int() {
                return candidate(method, MethodRole::IndexedSetter, rest);
            }
        }
    }

    None
}

fn candidate<'a>(method: &'a MethodSig, role: MethodRole, rest: &str) -> Option<Candidate<'a>> {
    if rest.is_empty() {
        return None;
    }
    Some(Candidate {
        method,
        role,
        property: decapitalize(rest),
    })
}

/// Infer a property name from an accessor suffix.
///
/// Lowercases the first character, except when the first two characters are
/// both uppercase: `getURL` stays `URL`, matching what callers of the
/// canonical introspector expect for acronym-led names.
pub fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if first.is_uppercase() && chars.clone().next().is_some_and(|c| c.is_uppercase()) {
        return s.to_string();
    }
    first.to_lowercase().collect::<String>() + chars.as_str()
}
