//! In-memory class store.
//!
//! Backs unit tests and embedders that assemble class shapes by hand (for
//! example from a static-analysis front end). Interior locking keeps the
//! store shareable: classes can be unloaded while introspectors hold a
//! reference to the store, which is exactly what the descriptor cache's weak
//! keying is exercised against.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use prism_types::{ClassDef, ClassId, Type, TypeEnv, TypeParamDef, TypeVarId};

use crate::{
    extract, ClassToken, FieldSig, MethodSig, Result, SurfaceProvider, SurfaceSource, TypeSurface,
};

/// One class declaration headed for [`MemoryTypeStore::add_class`].
#[derive(Debug, Clone, Default)]
pub struct ClassDecl {
    pub def: ClassDef,
    pub methods: Vec<MethodSig>,
    pub fields: Vec<FieldSig>,
}

impl ClassDecl {
    pub fn new(def: ClassDef) -> Self {
        Self {
            def,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodSig) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldSig) -> Self {
        self.fields.push(field);
        self
    }
}

struct ClassEntry {
    def: ClassDef,
    methods: Vec<MethodSig>,
    fields: Vec<FieldSig>,
    token: Arc<ClassToken>,
}

struct Inner {
    classes: HashMap<ClassId, ClassEntry>,
    object: ClassId,
    next_class: u32,
    next_type_var: u32,
}

pub struct MemoryTypeStore {
    inner: RwLock<Inner>,
}

impl MemoryTypeStore {
    /// An empty store holding only the object root.
    pub fn new() -> Self {
        let object = ClassId::new(0);
        let mut classes = HashMap::new();
        classes.insert(
            object,
            ClassEntry {
                def: ClassDef::named("java.lang.Object"),
                methods: Vec::new(),
                fields: Vec::new(),
                token: Arc::new(ClassToken::new(object)),
            },
        );
        Self {
            inner: RwLock::new(Inner {
                classes,
                object,
                next_class: 1,
                next_type_var: 0,
            }),
        }
    }

    /// Register a class. `declared_in` on every supplied method is stamped
    /// with the fresh id, so callers never fill it in themselves.
    pub fn add_class(&self, decl: ClassDecl) -> ClassId {
        let mut inner = self.inner.write();
        let id = ClassId::new(inner.next_class);
        inner.next_class += 1;

        let ClassDecl {
            def,
            mut methods,
            fields,
        } = decl;
        for method in &mut methods {
            method.declared_in = id;
        }
        inner.classes.insert(
            id,
            ClassEntry {
                def,
                methods,
                fields,
                token: Arc::new(ClassToken::new(id)),
            },
        );
        id
    }

    /// Allocate a fresh class-level type parameter.
    pub fn alloc_type_param(&self, name: impl Into<String>, upper_bounds: Vec<Type>) -> TypeParamDef {
        let mut inner = self.inner.write();
        let id = TypeVarId::new(inner.next_type_var);
        inner.next_type_var += 1;
        TypeParamDef::new(id, name, upper_bounds)
    }

    /// Drop a class, releasing the strong reference to its identity token.
    ///
    /// Outstanding cache entries keyed on the token become reclaimable once
    /// every other strong reference is gone.
    pub fn unload(&self, class: ClassId) -> bool {
        let removed = self.inner.write().classes.remove(&class).is_some();
        if removed {
            tracing::debug!(class = class.as_u32(), "unloaded class");
        }
        removed
    }

    pub fn contains(&self, class: ClassId) -> bool {
        self.inner.read().classes.contains_key(&class)
    }
}

impl Default for MemoryTypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv for MemoryTypeStore {
    fn class(&self, id: ClassId) -> Option<ClassDef> {
        self.inner.read().classes.get(&id).map(|e| e.def.clone())
    }

    fn object_root(&self) -> ClassId {
        self.inner.read().object
    }
}

impl SurfaceSource for MemoryTypeStore {
    fn declared_methods(&self, class: ClassId) -> Vec<MethodSig> {
        self.inner
            .read()
            .classes
            .get(&class)
            .map(|e| e.methods.clone())
            .unwrap_or_default()
    }

    fn declared_fields(&self, class: ClassId) -> Vec<FieldSig> {
        self.inner
            .read()
            .classes
            .get(&class)
            .map(|e| e.fields.clone())
            .unwrap_or_default()
    }

    fn token(&self, class: ClassId) -> Option<Arc<ClassToken>> {
        self.inner
            .read()
            .classes
            .get(&class)
            .map(|e| Arc::clone(&e.token))
    }
}

impl SurfaceProvider for MemoryTypeStore {
    fn extract_surface(&self, class: ClassId) -> Result<TypeSurface> {
        extract(self, class)
    }
}
