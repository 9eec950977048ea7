//! Surface extraction: flatten a class hierarchy into one method list.

use std::collections::{HashMap, HashSet, VecDeque};

use prism_types::{is_assignable, substitute, type_key, ClassId, Substitution, Type};

use crate::{FieldSig, IntrospectError, MethodSig, Result, SurfaceSource, TypeSurface, Visibility};

/// Build the introspectable surface of `class`.
///
/// Walks the superclass chain and all transitively implemented interfaces,
/// substituting type arguments along every edge so inherited members arrive
/// concretely typed. Raw uses of generic ancestors resolve each type
/// parameter to its first bound (the object root when unbounded).
///
/// Any inaccessible ancestor aborts extraction for the whole type.
pub fn extract(source: &dyn SurfaceSource, class: ClassId) -> Result<TypeSurface> {
    let token = source
        .token(class)
        .ok_or(IntrospectError::UnknownClass(class))?;

    let object = source.object_root();
    let mut collected = Collected::default();
    let mut fields: Vec<FieldSig> = Vec::new();
    let mut field_names: HashSet<String> = HashSet::new();

    let mut queue: VecDeque<(ClassId, Substitution, usize)> = VecDeque::new();
    let mut seen: HashSet<ClassId> = HashSet::new();

    let root_def = source
        .class(class)
        .ok_or(IntrospectError::UnknownClass(class))?;
    // Introspecting a generic class directly is a raw use of it.
    let mut root_subst = Substitution::new();
    for formal in &root_def.type_params {
        let bound = formal
            .first_bound()
            .cloned()
            .unwrap_or_else(|| Type::class(object, vec![]));
        root_subst.insert(formal.id, bound);
    }
    queue.push_back((class, root_subst, 0));

    while let Some((current, subst, depth)) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }

        let def = source
            .class(current)
            .ok_or(IntrospectError::UnknownClass(current))?;
        if !def.accessible {
            return Err(IntrospectError::Inaccessible { name: def.name });
        }

        for mut method in source.declared_methods(current) {
            // Private members never flow down the hierarchy.
            if depth > 0 && method.visibility == Visibility::Private {
                continue;
            }
            for param in &mut method.params {
                param.ty = concretize(&param.ty, &subst, object);
            }
            method.return_type = concretize(&method.return_type, &subst, object);
            collected.insert(source, method);
        }

        for field in source.declared_fields(current) {
            // Most-derived declaration shadows by name.
            if field_names.insert(field.name.clone()) {
                fields.push(FieldSig {
                    ty: concretize(&field.ty, &subst, object),
                    ..field
                });
            }
        }

        for super_ty in def.super_class.iter().chain(def.interfaces.iter()) {
            let Type::Class(super_ct) = super_ty else {
                // Nominal external supertypes are opaque; nothing to walk.
                continue;
            };
            let Some(super_def) = source.class(super_ct.def) else {
                return Err(IntrospectError::UnknownClass(super_ct.def));
            };

            let mut super_subst = Substitution::with_capacity(super_def.type_params.len());
            for (idx, formal) in super_def.type_params.iter().enumerate() {
                let actual = match super_ct.args.get(idx) {
                    Some(arg) => substitute(arg, &subst),
                    // Raw `extends Generic`: erase to the first bound.
                    None => formal
                        .first_bound()
                        .cloned()
                        .unwrap_or_else(|| Type::class(object, vec![])),
                };
                super_subst.insert(formal.id, actual);
            }
            queue.push_back((super_ct.def, super_subst, depth + 1));
        }
    }

    tracing::trace!(
        class = class.as_u32(),
        methods = collected.methods.len(),
        "extracted type surface"
    );

    Ok(TypeSurface {
        class,
        methods: collected.methods,
        fields,
        token,
    })
}

/// Substitute, then erase any type variable still free (method-level
/// generics, unbounded class variables) to the object root.
fn concretize(ty: &Type, subst: &Substitution, object: ClassId) -> Type {
    fn erase(ty: Type, object: ClassId) -> Type {
        match ty {
            Type::TypeVar(_) => Type::class(object, vec![]),
            Type::Array(element) => Type::array(erase(*element, object)),
            Type::Class(mut ct) => {
                ct.args = ct.args.into_iter().map(|arg| erase(arg, object)).collect();
                Type::Class(ct)
            }
            other => other,
        }
    }
    erase(substitute(ty, subst), object)
}

#[derive(Default)]
struct Collected {
    methods: Vec<MethodSig>,
    by_signature: HashMap<(String, Vec<String>), usize>,
}

impl Collected {
    fn insert(&mut self, env: &dyn SurfaceSource, method: MethodSig) {
        let key = (
            method.name.clone(),
            method.params.iter().map(|p| type_key(&p.ty)).collect(),
        );
        match self.by_signature.get(&key) {
            None => {
                self.by_signature.insert(key, self.methods.len());
                self.methods.push(method);
            }
            Some(&existing_idx) => {
                let existing = &self.methods[existing_idx];
                // The walk visits most-derived declarations first, so an
                // existing entry normally wins. The exception is a covariant
                // bridge pair inside one class: keep the more specific
                // return type.
                if existing.declared_in == method.declared_in
                    && existing.return_type != method.return_type
                    && is_assignable(&env, &method.return_type, &existing.return_type)
                {
                    self.methods[existing_idx] = method;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use prism_types::{ClassDef, ClassKind, Type};

    use crate::{ClassDecl, MemoryTypeStore, Parameter, Visibility};

    use super::*;

    fn string() -> Type {
        Type::Named("java.lang.String".into())
    }

    #[test]
    fn inherited_methods_follow_own_declarations() {
        let store = MemoryTypeStore::new();
        let base = store.add_class(ClassDecl::new(ClassDef::named("Base")).with_method(
            MethodSig::new("getName", vec![], string()),
        ));
        let sub = store.add_class(
            ClassDecl::new({
                let mut def = ClassDef::named("Sub");
                def.super_class = Some(Type::class(base, vec![]));
                def
            })
            .with_method(MethodSig::new("getAge", vec![], Type::int())),
        );

        let surface = extract(&store, sub).unwrap();
        let names: Vec<&str> = surface.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["getAge", "getName"]);
        assert_eq!(surface.methods[1].declared_in, base);
    }

    #[test]
    fn override_wins_over_superclass_declaration() {
        let store = MemoryTypeStore::new();
        let base = store.add_class(
            ClassDecl::new(ClassDef::named("Base")).with_method(
                MethodSig::new("getName", vec![], string())
                    .with_visibility(Visibility::Protected),
            ),
        );
        let sub = store.add_class(
            ClassDecl::new({
                let mut def = ClassDef::named("Sub");
                def.super_class = Some(Type::class(base, vec![]));
                def
            })
            .with_method(MethodSig::new("getName", vec![], string())),
        );

        let surface = extract(&store, sub).unwrap();
        assert_eq!(surface.methods.len(), 1);
        assert_eq!(surface.methods[0].declared_in, sub);
        assert!(surface.methods[0].is_public());
    }

    #[test]
    fn bridge_pair_in_one_class_keeps_specific_return() {
        // Compiler-style bridge: `Object getValue()` next to `String getValue()`.
        let store = MemoryTypeStore::new();
        let object_ty = Type::class(store.object_root(), vec![]);
        let class = store.add_class(
            ClassDecl::new(ClassDef::named("Holder"))
                .with_method(MethodSig::new("getValue", vec![], object_ty))
                .with_method(MethodSig::new("getValue", vec![], string())),
        );

        let surface = extract(&store, class).unwrap();
        let getters: Vec<&MethodSig> = surface
            .methods
            .iter()
            .filter(|m| m.name == "getValue")
            .collect();
        assert_eq!(getters.len(), 1);
        assert_eq!(getters[0].return_type, string());
    }

    #[test]
    fn generic_superclass_members_arrive_concrete() {
        // Box<T> { T getContent(); void setContent(T) } ; StringBox extends Box<String>
        let store = MemoryTypeStore::new();
        let t = store.alloc_type_param("T", vec![]);
        let boxed = store.add_class(
            ClassDecl::new({
                let mut def = ClassDef::named("Box");
                def.type_params = vec![t.clone()];
                def
            })
            .with_method(MethodSig::new("getContent", vec![], Type::TypeVar(t.id)))
            .with_method(MethodSig::new(
                "setContent",
                vec![Parameter::new("value", Type::TypeVar(t.id))],
                Type::Void,
            )),
        );
        let string_box = store.add_class(ClassDecl::new({
            let mut def = ClassDef::named("StringBox");
            def.super_class = Some(Type::class(boxed, vec![string()]));
            def
        }));

        let surface = extract(&store, string_box).unwrap();
        let getter = surface
            .methods
            .iter()
            .find(|m| m.name == "getContent")
            .unwrap();
        assert_eq!(getter.return_type, string());
        let setter = surface
            .methods
            .iter()
            .find(|m| m.name == "setContent")
            .unwrap();
        assert_eq!(setter.params[0].ty, string());
    }

    #[test]
    fn raw_generic_use_erases_to_first_bound() {
        let store = MemoryTypeStore::new();
        let number = store.add_class(ClassDecl::new(ClassDef::named("java.lang.Number")));
        let t = store.alloc_type_param("T", vec![Type::class(number, vec![])]);
        let counter = store.add_class(
            ClassDecl::new({
                let mut def = ClassDef::named("Counter");
                def.type_params = vec![t.clone()];
                def
            })
            .with_method(MethodSig::new("getCount", vec![], Type::TypeVar(t.id))),
        );

        let surface = extract(&store, counter).unwrap();
        assert_eq!(surface.methods[0].return_type, Type::class(number, vec![]));
    }

    #[test]
    fn interface_declared_methods_are_collected() {
        let store = MemoryTypeStore::new();
        let iface = store.add_class(
            ClassDecl::new({
                let mut def = ClassDef::named("Named");
                def.kind = ClassKind::Interface;
                def
            })
            .with_method(MethodSig::new("getName", vec![], string())),
        );
        let impl_class = store.add_class(ClassDecl::new({
            let mut def = ClassDef::named("Impl");
            def.interfaces = vec![Type::class(iface, vec![])];
            def
        }));

        let surface = extract(&store, impl_class).unwrap();
        assert_eq!(surface.methods.len(), 1);
        assert_eq!(surface.methods[0].declared_in, iface);
    }

    #[test]
    fn private_ancestor_members_do_not_flow_down() {
        let store = MemoryTypeStore::new();
        let base = store.add_class(
            ClassDecl::new(ClassDef::named("Base")).with_method(
                MethodSig::new("getSecret", vec![], string()).with_visibility(Visibility::Private),
            ),
        );
        let sub = store.add_class(ClassDecl::new({
            let mut def = ClassDef::named("Sub");
            def.super_class = Some(Type::class(base, vec![]));
            def
        }));

        let surface = extract(&store, sub).unwrap();
        assert!(surface.methods.is_empty());
    }

    #[test]
    fn inaccessible_ancestor_aborts_extraction() {
        let store = MemoryTypeStore::new();
        let hidden = store.add_class(ClassDecl::new({
            let mut def = ClassDef::named("internal.Hidden");
            def.accessible = false;
            def
        }));
        let sub = store.add_class(
            ClassDecl::new({
                let mut def = ClassDef::named("Sub");
                def.super_class = Some(Type::class(hidden, vec![]));
                def
            })
            .with_method(MethodSig::new("getName", vec![], string())),
        );

        let err = extract(&store, sub).unwrap_err();
        assert_eq!(
            err,
            IntrospectError::Inaccessible {
                name: "internal.Hidden".into()
            }
        );
    }

    #[test]
    fn field_shadowing_keeps_most_derived_declaration() {
        let store = MemoryTypeStore::new();
        let base = store.add_class(
            ClassDecl::new(ClassDef::named("Base")).with_field(FieldSig::new("value", string())),
        );
        let sub = store.add_class(
            ClassDecl::new({
                let mut def = ClassDef::named("Sub");
                def.super_class = Some(Type::class(base, vec![]));
                def
            })
            .with_field(FieldSig::new("value", Type::int())),
        );

        let surface = extract(&store, sub).unwrap();
        assert_eq!(surface.fields.len(), 1);
        assert_eq!(surface.fields[0].ty, Type::int());
    }
}
