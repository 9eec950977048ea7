//! Subtyping, substitution, and ordering helpers over [`Type`].

use std::collections::{HashSet, VecDeque};

use crate::{ClassId, ClassType, PrimitiveType, Substitution, Type, TypeEnv};

/// Apply a type-variable substitution to `ty`.
///
/// Variables absent from the map are left in place; callers that need a
/// fully concrete result seed the map with every in-scope variable first.
pub fn substitute(ty: &Type, subst: &Substitution) -> Type {
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Array(element) => Type::array(substitute(element, subst)),
        Type::Class(ClassType { def, args }) => Type::class(
            *def,
            args.iter().map(|arg| substitute(arg, subst)).collect(),
        ),
        Type::Primitive(_) | Type::Void | Type::Named(_) => ty.clone(),
    }
}

/// Whether a value of type `from` can be bound where `to` is expected.
///
/// Identity for primitives, covariant arrays, and a breadth-first walk of the
/// superclass/interface graph for class types. Raw target instantiations
/// accept any instantiation of the same class. `Named` externals are nominal:
/// equal names only, except that every reference type widens to the object
/// root.
pub fn is_assignable(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    if from == to {
        return true;
    }

    // Everything non-primitive widens to the object root.
    if let Type::Class(ClassType { def, args }) = to {
        if *def == env.object_root() && args.is_empty() {
            return !matches!(from, Type::Primitive(_) | Type::Void);
        }
    }

    match (from, to) {
        (Type::Array(from_elem), Type::Array(to_elem)) => is_assignable(env, from_elem, to_elem),
        (Type::Class(from_ct), Type::Class(to_ct)) => class_assignable(env, from_ct, to_ct),
        _ => false,
    }
}

fn class_assignable(env: &dyn TypeEnv, from: &ClassType, to: &ClassType) -> bool {
    let mut queue: VecDeque<ClassType> = VecDeque::new();
    let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
    queue.push_back(from.clone());

    while let Some(current) = queue.pop_front() {
        if !seen.insert((current.def, current.args.clone())) {
            continue;
        }

        if current.def == to.def {
            // Raw target accepts any instantiation; otherwise arguments are
            // invariant.
            if to.args.is_empty() || current.args == to.args {
                return true;
            }
            continue;
        }

        let Some(class_def) = env.class(current.def) else {
            continue;
        };

        // A raw instantiation of a generic class keeps its supertypes raw.
        let raw = current.args.is_empty() && !class_def.type_params.is_empty();
        let mut subst = Substitution::with_capacity(class_def.type_params.len());
        if !raw {
            for (idx, formal) in class_def.type_params.iter().enumerate() {
                if let Some(arg) = current.args.get(idx) {
                    subst.insert(formal.id, arg.clone());
                }
            }
        }

        for super_ty in class_def
            .super_class
            .iter()
            .chain(class_def.interfaces.iter())
        {
            if let Type::Class(super_ct) = super_ty {
                if raw {
                    queue.push_back(ClassType {
                        def: super_ct.def,
                        args: Vec::new(),
                    });
                } else if let Type::Class(ct) = substitute(super_ty, &subst) {
                    queue.push_back(ct);
                }
            }
        }
    }

    false
}

/// Index of the unique most-specific type among `candidates`: the one
/// assignable to every other candidate. `None` when the candidates form an
/// antichain or several are mutually assignable.
pub fn most_specific(env: &dyn TypeEnv, candidates: &[Type]) -> Option<usize> {
    let mut winner: Option<usize> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let beats_all = candidates
            .iter()
            .enumerate()
            .all(|(other_idx, other)| other_idx == idx || is_assignable(env, candidate, other));
        if beats_all {
            match winner {
                // Two candidates each assignable to all others means they are
                // mutually assignable: no single winner.
                Some(_) => return None,
                None => winner = Some(idx),
            }
        }
    }
    winner
}

/// A stable textual key for a type, used for deterministic ordering.
///
/// The only contract is that distinct types get distinct keys and the same
/// type always gets the same key; the rendering is not for humans.
pub fn type_key(ty: &Type) -> String {
    match ty {
        Type::Void => "void".to_string(),
        Type::Primitive(p) => match p {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Char => "char",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
        .to_string(),
        Type::Array(element) => format!("{}[]", type_key(element)),
        Type::TypeVar(id) => format!("tv#{}", id.0),
        Type::Named(name) => format!("n:{name}"),
        Type::Class(ClassType { def, args }) => {
            if args.is_empty() {
                format!("c#{}", def.as_u32())
            } else {
                let args: Vec<String> = args.iter().map(type_key).collect();
                format!("c#{}<{}>", def.as_u32(), args.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ClassDef, ClassKind, TypeParamDef, TypeVarId};

    struct FixedEnv {
        classes: HashMap<ClassId, ClassDef>,
        object: ClassId,
    }

    impl FixedEnv {
        fn new() -> Self {
            let object = ClassId::new(0);
            let mut classes = HashMap::new();
            classes.insert(object, ClassDef::named("java.lang.Object"));
            Self { classes, object }
        }

        fn add(&mut self, raw: u32, def: ClassDef) -> ClassId {
            let id = ClassId::new(raw);
            self.classes.insert(id, def);
            id
        }
    }

    impl TypeEnv for FixedEnv {
        fn class(&self, id: ClassId) -> Option<ClassDef> {
            self.classes.get(&id).cloned()
        }

        fn object_root(&self) -> ClassId {
            self.object
        }
    }

    fn chain_env() -> (FixedEnv, ClassId, ClassId, ClassId) {
        // base <- middle <- derived
        let mut env = FixedEnv::new();
        let base = env.add(1, {
            let mut def = ClassDef::named("Base");
            def.super_class = Some(Type::class(env.object, vec![]));
            def
        });
        let middle = env.add(2, {
            let mut def = ClassDef::named("Middle");
            def.super_class = Some(Type::class(base, vec![]));
            def
        });
        let derived = env.add(3, {
            let mut def = ClassDef::named("Derived");
            def.super_class = Some(Type::class(middle, vec![]));
            def
        });
        (env, base, middle, derived)
    }

    #[test]
    fn assignable_walks_superclass_chain() {
        let (env, base, _, derived) = chain_env();
        assert!(is_assignable(
            &env,
            &Type::class(derived, vec![]),
            &Type::class(base, vec![])
        ));
        assert!(!is_assignable(
            &env,
            &Type::class(base, vec![]),
            &Type::class(derived, vec![])
        ));
    }

    #[test]
    fn assignable_through_interface() {
        let mut env = FixedEnv::new();
        let iface = env.add(1, {
            let mut def = ClassDef::named("Marker");
            def.kind = ClassKind::Interface;
            def
        });
        let impl_class = env.add(2, {
            let mut def = ClassDef::named("Impl");
            def.super_class = Some(Type::class(env.object, vec![]));
            def.interfaces = vec![Type::class(iface, vec![])];
            def
        });
        assert!(is_assignable(
            &env,
            &Type::class(impl_class, vec![]),
            &Type::class(iface, vec![])
        ));
    }

    #[test]
    fn everything_reference_widens_to_object_root() {
        let (env, base, ..) = chain_env();
        let object = Type::class(env.object, vec![]);
        assert!(is_assignable(&env, &Type::class(base, vec![]), &object));
        assert!(is_assignable(&env, &Type::array(Type::int()), &object));
        assert!(is_assignable(
            &env,
            &Type::Named("ext.Thing".into()),
            &object
        ));
        assert!(!is_assignable(&env, &Type::int(), &object));
    }

    #[test]
    fn primitives_assign_by_identity_only() {
        let env = FixedEnv::new();
        assert!(is_assignable(&env, &Type::int(), &Type::int()));
        assert!(!is_assignable(
            &env,
            &Type::int(),
            &Type::Primitive(PrimitiveType::Long)
        ));
    }

    #[test]
    fn arrays_are_covariant_on_element_type() {
        let (env, base, _, derived) = chain_env();
        assert!(is_assignable(
            &env,
            &Type::array(Type::class(derived, vec![])),
            &Type::array(Type::class(base, vec![]))
        ));
        assert!(!is_assignable(
            &env,
            &Type::array(Type::int()),
            &Type::array(Type::Primitive(PrimitiveType::Long))
        ));
    }

    #[test]
    fn generic_supertype_instantiation_is_substituted() {
        // Holder<T> ; StringHolder extends Holder<String>
        let mut env = FixedEnv::new();
        let tv = TypeVarId::new(0);
        let holder = env.add(1, {
            let mut def = ClassDef::named("Holder");
            def.type_params = vec![TypeParamDef::new(tv, "T", vec![])];
            def
        });
        let string_holder = env.add(2, {
            let mut def = ClassDef::named("StringHolder");
            def.super_class = Some(Type::class(
                holder,
                vec![Type::Named("java.lang.String".into())],
            ));
            def
        });

        let sub = Type::class(string_holder, vec![]);
        assert!(is_assignable(
            &env,
            &sub,
            &Type::class(holder, vec![Type::Named("java.lang.String".into())])
        ));
        assert!(!is_assignable(
            &env,
            &sub,
            &Type::class(holder, vec![Type::Named("java.lang.Integer".into())])
        ));
        // Raw target accepts the instantiated subclass.
        assert!(is_assignable(&env, &sub, &Type::class(holder, vec![])));
    }

    #[test]
    fn most_specific_picks_the_bottom_of_the_chain() {
        let (env, base, middle, derived) = chain_env();
        let candidates = vec![
            Type::class(base, vec![]),
            Type::class(derived, vec![]),
            Type::class(middle, vec![]),
        ];
        assert_eq!(most_specific(&env, &candidates), Some(1));
    }

    #[test]
    fn most_specific_rejects_antichains() {
        let (mut env, base, ..) = chain_env();
        let unrelated = env.add(9, {
            let mut def = ClassDef::named("Unrelated");
            def.super_class = Some(Type::class(env.object, vec![]));
            def
        });
        let candidates = vec![Type::class(base, vec![]), Type::class(unrelated, vec![])];
        assert_eq!(most_specific(&env, &candidates), None);
    }

    #[test]
    fn substitute_reaches_nested_positions() {
        let tv = TypeVarId::new(7);
        let mut subst = Substitution::new();
        subst.insert(tv, Type::Named("java.lang.String".into()));

        let ty = Type::array(Type::class(
            ClassId::new(4),
            vec![Type::TypeVar(tv), Type::int()],
        ));
        assert_eq!(
            substitute(&ty, &subst),
            Type::array(Type::class(
                ClassId::new(4),
                vec![Type::Named("java.lang.String".into()), Type::int()],
            ))
        );
    }

    #[test]
    fn type_keys_are_distinct_and_stable() {
        let a = Type::array(Type::class(ClassId::new(1), vec![Type::int()]));
        let b = Type::class(ClassId::new(1), vec![Type::array(Type::int())]);
        assert_eq!(type_key(&a), type_key(&a));
        assert!(type_key(&a) != type_key(&b));
    }
}
