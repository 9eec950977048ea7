//! Cached property introspection.
//!
//! [`Introspector`] is the engine's front door: it runs extraction and
//! resolution on demand and memoizes the resulting descriptor set per class.
//! Entries are keyed weakly on the class's identity token, so unloading a
//! class makes its entry reclaimable without an explicit flush; explicit
//! [`Introspector::flush`] / [`Introspector::flush_all`] exist for callers
//! that redefine classes in place.
//!
//! Lookups hand out independent copies of the cached descriptor set. Two
//! callers mutating auxiliary fields (such as `display_name`) on their own
//! copies never observe each other's edits.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use prism_resolve::{resolve_with, AnnotationMetadata, PropertyDescriptor, ResolverOptions};
use prism_surface::{ClassToken, Result, SurfaceProvider};
use prism_types::{ClassId, TypeEnv};

pub use prism_resolve::ConflictPolicy;
pub use prism_surface::IntrospectError;

struct CacheEntry {
    token: Weak<ClassToken>,
    descriptors: Arc<Vec<PropertyDescriptor>>,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        self.token.strong_count() > 0
    }
}

pub struct Introspector<P> {
    provider: P,
    options: ResolverOptions,
    cache: RwLock<HashMap<ClassId, CacheEntry>>,
}

impl<P> Introspector<P>
where
    P: SurfaceProvider + TypeEnv,
{
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, ResolverOptions::default())
    }

    pub fn with_options(provider: P, options: ResolverOptions) -> Self {
        Self {
            provider,
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The descriptor set for `class`, resolved on first request.
    ///
    /// Resolution runs outside the cache lock; concurrent first requests
    /// for the same class may resolve twice, which is harmless because
    /// resolution is idempotent. Failures are never cached.
    pub fn descriptors(&self, class: ClassId) -> Result<Vec<PropertyDescriptor>> {
        if let Some(found) = self.lookup(class) {
            tracing::debug!(class = class.as_u32(), "descriptor cache hit");
            return Ok(found);
        }

        let surface = self.provider.extract_surface(class)?;
        let resolved = Arc::new(resolve_with(
            &self.provider,
            &surface,
            &self.options,
            &AnnotationMetadata,
        ));
        let token = Arc::downgrade(&surface.token);

        let mut cache = self.cache.write();
        cache.retain(|_, entry| entry.is_live());
        let entry = cache.entry(class).or_insert(CacheEntry {
            token,
            descriptors: Arc::clone(&resolved),
        });
        tracing::debug!(
            class = class.as_u32(),
            properties = entry.descriptors.len(),
            "descriptor cache fill"
        );
        Ok(entry.descriptors.as_ref().clone())
    }

    fn lookup(&self, class: ClassId) -> Option<Vec<PropertyDescriptor>> {
        {
            let cache = self.cache.read();
            let entry = cache.get(&class)?;
            if entry.is_live() {
                return Some(entry.descriptors.as_ref().clone());
            }
        }
        // The class behind this entry is gone; reclaim eagerly now that we
        // have noticed.
        let mut cache = self.cache.write();
        if cache.get(&class).is_some_and(|entry| !entry.is_live()) {
            cache.remove(&class);
        }
        None
    }

    /// Whether `class` currently has a live cache entry.
    ///
    /// Prunes dead entries as a side effect, so this also reflects
    /// reclamation after a class was unloaded.
    pub fn cached(&self, class: ClassId) -> bool {
        let live = {
            let cache = self.cache.read();
            match cache.get(&class) {
                None => return false,
                Some(entry) => entry.is_live(),
            }
        };
        if !live {
            self.cache.write().retain(|_, entry| entry.is_live());
        }
        live
    }

    /// Drop one class's entry. Safe on classes never introspected.
    pub fn flush(&self, class: ClassId) {
        if self.cache.write().remove(&class).is_some() {
            tracing::debug!(class = class.as_u32(), "flushed descriptor cache entry");
        }
    }

    /// Clear every entry process-wide for this introspector.
    pub fn flush_all(&self) {
        let mut cache = self.cache.write();
        let dropped = cache.len();
        cache.clear();
        tracing::debug!(dropped, "flushed descriptor cache");
    }

    /// Explicit unload hook: the class (or its loader) is gone, so its
    /// entry must not be served again.
    pub fn on_type_unloaded(&self, class: ClassId) {
        self.flush(class);
    }
}
