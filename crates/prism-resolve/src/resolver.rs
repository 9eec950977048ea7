//! Property resolution: candidate groups to canonical descriptors.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use prism_surface::{MethodSig, TypeSurface};
use prism_types::{is_assignable, most_specific, Type, TypeEnv};

use crate::annotate::{self, AnnotationMetadata, MetadataSource};
use crate::classify::{classify, Candidate, MethodRole};
use crate::descriptor::{MethodRef, PropertyDescriptor};

/// What to do when the chosen getter and setter disagree on a property's
/// type with no subtype relation either way.
///
/// The source behavior this engine was distilled from is inconsistent here,
/// so the answer is a knob rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Keep the getter; the conflicting setter is dropped. The default.
    #[default]
    PreferGetter,
    /// Keep the setter; the property type follows its parameter.
    PreferSetter,
    /// Drop both plain accessors; the property survives only if indexed
    /// accessors remain.
    Exclude,
}

#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    pub conflict_policy: ConflictPolicy,
}

/// Resolve with default options and annotation-backed metadata.
pub fn resolve(env: &dyn TypeEnv, surface: &TypeSurface) -> Vec<PropertyDescriptor> {
    resolve_with(
        env,
        surface,
        &ResolverOptions::default(),
        &AnnotationMetadata,
    )
}

/// Resolve the surface's candidate groups into one descriptor per property
/// name.
///
/// Never fails: groups that cannot produce a consistent property are
/// excluded from the output rather than reported. Output order is the
/// first-discovery order of each property name over the surface's
/// deterministic method order.
pub fn resolve_with(
    env: &dyn TypeEnv,
    surface: &TypeSurface,
    options: &ResolverOptions,
    metadata: &dyn MetadataSource,
) -> Vec<PropertyDescriptor> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group<'_>> = HashMap::new();

    for candidate in classify(surface) {
        let group = match groups.entry(candidate.property.clone()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                order.push(candidate.property.clone());
                vacant.insert(Group::default())
            }
        };
        group.add(candidate);
    }

    order
        .iter()
        .filter_map(|name| resolve_group(env, name, &groups[name], options, metadata))
        .collect()
}

/// All same-named accessor candidates, partitioned by role.
#[derive(Default)]
struct Group<'a> {
    getter: Option<&'a MethodSig>,
    boolean_getter: Option<&'a MethodSig>,
    indexed_getter: Option<&'a MethodSig>,
    setters: Vec<&'a MethodSig>,
    indexed_setters: Vec<&'a MethodSig>,
}

impl<'a> Group<'a> {
    fn add(&mut self, candidate: Candidate<'a>) {
        match candidate.role {
            MethodRole::Getter => {
                self.getter.get_or_insert(candidate.method);
            }
            MethodRole::BooleanGetter => {
                self.boolean_getter.get_or_insert(candidate.method);
            }
            MethodRole::IndexedGetter => {
                self.indexed_getter.get_or_insert(candidate.method);
            }
            MethodRole::Setter => self.setters.push(candidate.method),
            MethodRole::IndexedSetter => self.indexed_setters.push(candidate.method),
        }
    }
}

fn resolve_group(
    env: &dyn TypeEnv,
    name: &str,
    group: &Group<'_>,
    options: &ResolverOptions,
    metadata: &dyn MetadataSource,
) -> Option<PropertyDescriptor> {
    // Canonical accessors must be public; non-public candidates only ever
    // matter as override anchors, and those were merged during extraction.
    let boolean_getter = group.boolean_getter.filter(|m| m.is_public());
    let plain_getter = group.getter.filter(|m| m.is_public());

    // `isX` is the canonical read method whenever it exists; its return
    // type is boolean-like by classification.
    let mut read = boolean_getter.or(plain_getter);
    let mut property_type = read.map(|m| m.return_type.clone());

    let setter_candidates: Vec<&MethodSig> = group
        .setters
        .iter()
        .copied()
        .filter(|m| m.is_public())
        .collect();
    let mut write = select_setter(env, name, &setter_candidates, property_type.as_ref());

    if let (Some(expected), Some(chosen)) = (property_type.as_ref(), write) {
        let written = &chosen.params[0].ty;
        // A setter may widen (accept a supertype of the read type); anything
        // else is a conflict.
        let compatible = written == expected || is_assignable(env, expected, written);
        if !compatible {
            tracing::debug!(
                property = name,
                policy = ?options.conflict_policy,
                "getter and setter disagree on property type"
            );
            match options.conflict_policy {
                ConflictPolicy::PreferGetter => write = None,
                ConflictPolicy::PreferSetter => {
                    property_type = Some(written.clone());
                    read = None;
                }
                ConflictPolicy::Exclude => {
                    read = None;
                    write = None;
                    property_type = None;
                }
            }
        }
    }
    if property_type.is_none() {
        property_type = write.map(|m| m.params[0].ty.clone());
    }

    let indexed_read = group.indexed_getter.filter(|m| m.is_public());
    let indexed_candidates: Vec<&MethodSig> = group
        .indexed_setters
        .iter()
        .copied()
        .filter(|m| m.is_public())
        .collect();
    let indexed_write = select_indexed_setter(
        env,
        name,
        &indexed_candidates,
        indexed_read.map(|m| &m.return_type),
    );
    let indexed_type = indexed_read
        .map(|m| m.return_type.clone())
        .or_else(|| indexed_write.map(|m| m.params[1].ty.clone()));

    // Indexed and non-indexed accessors merge only when the whole-property
    // type really is an array of the element type; otherwise the property
    // falls back to indexed-only semantics.
    if let (Some(element), Some(whole)) = (indexed_type.as_ref(), property_type.as_ref()) {
        if !is_assignable(env, &Type::array(element.clone()), whole) {
            read = None;
            write = None;
            property_type = None;
        }
    }

    let boolean_style = read.is_some_and(|m| m.name.starts_with("is"));

    let mut descriptor = PropertyDescriptor::named(name);
    descriptor.property_type = property_type;
    descriptor.indexed_property_type = indexed_type;
    descriptor.read_method = read.map(MethodRef::of);
    descriptor.write_method = write.map(MethodRef::of);
    descriptor.indexed_read_method = indexed_read.map(MethodRef::of);
    descriptor.indexed_write_method = indexed_write.map(MethodRef::of);

    if !descriptor.has_accessors() {
        return None;
    }

    annotate::apply(
        &mut descriptor,
        &[read, write, indexed_read, indexed_write],
        metadata,
        boolean_style,
    );
    Some(descriptor)
}

/// Pick one setter among overloads: most-specific parameter type first,
/// then the overload matching the getter's type, then a deterministic
/// signature-order tie-break.
fn select_setter<'a>(
    env: &dyn TypeEnv,
    property: &str,
    candidates: &[&'a MethodSig],
    getter_type: Option<&Type>,
) -> Option<&'a MethodSig> {
    match candidates {
        [] => None,
        [only] => Some(*only),
        _ => {
            let param_types: Vec<Type> =
                candidates.iter().map(|m| m.params[0].ty.clone()).collect();
            if let Some(idx) = most_specific(env, &param_types) {
                return Some(candidates[idx]);
            }
            if let Some(expected) = getter_type {
                if let Some(chosen) = candidates
                    .iter()
                    .copied()
                    .find(|m| &m.params[0].ty == expected)
                {
                    return Some(chosen);
                }
            }
            let mut ordered: Vec<&MethodSig> = candidates.to_vec();
            ordered.sort_by_cached_key(|m| m.sort_key());
            tracing::warn!(
                property,
                overloads = candidates.len(),
                "ambiguous setter overloads; deterministic tie-break applied"
            );
            Some(ordered[0])
        }
    }
}

/// Pick one indexed setter. An indexed getter fixes the element type:
/// mismatching indexed setters are dropped rather than corrupting the
/// descriptor.
fn select_indexed_setter<'a>(
    env: &dyn TypeEnv,
    property: &str,
    candidates: &[&'a MethodSig],
    element_type: Option<&Type>,
) -> Option<&'a MethodSig> {
    if let Some(expected) = element_type {
        return candidates
            .iter()
            .copied()
            .find(|m| &m.params[1].ty == expected);
    }
    match candidates {
        [] => None,
        [only] => Some(*only),
        _ => {
            let param_types: Vec<Type> =
                candidates.iter().map(|m| m.params[1].ty.clone()).collect();
            if let Some(idx) = most_specific(env, &param_types) {
                return Some(candidates[idx]);
            }
            let mut ordered: Vec<&MethodSig> = candidates.to_vec();
            ordered.sort_by_cached_key(|m| m.sort_key());
            tracing::warn!(
                property,
                overloads = candidates.len(),
                "ambiguous indexed setter overloads; deterministic tie-break applied"
            );
            Some(ordered[0])
        }
    }
}
