//! Session-scoped memoization of runtime resources.
//!
//! Each glTF entity that an import materializes is constructed at most once
//! per session and shared through [`IndexedResource`]. The cache lives inside
//! the session context and is dropped with it.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;

/// A runtime value paired with the glTF index it was built from.
///
/// Cloning shares the underlying value.
#[derive(Debug)]
pub struct IndexedResource<T> {
    /// Index of the source entity in its glTF array.
    pub index: usize,
    /// The constructed value.
    pub value: Rc<T>,
}

impl<T> IndexedResource<T> {
    pub fn new(index: usize, value: T) -> Self {
        Self {
            index,
            value: Rc::new(value),
        }
    }

    /// Whether both handles point at the same constructed value.
    pub fn same_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}

impl<T> Clone for IndexedResource<T> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            value: Rc::clone(&self.value),
        }
    }
}

/// Kind of a cached glTF entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Node,
    Mesh,
    Material,
    Texture,
    Image,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Node => "node",
            Self::Mesh => "mesh",
            Self::Material => "material",
            Self::Texture => "texture",
            Self::Image => "image",
        };
        f.write_str(name)
    }
}

/// Insertion-ordered table of constructed resources.
#[derive(Debug)]
pub struct CacheTable<K, T> {
    entries: IndexMap<K, IndexedResource<T>>,
}

impl<K, T> Default for CacheTable<K, T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq, T> CacheTable<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&IndexedResource<T>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a resource, replacing any previous entry for `key`.
    pub fn insert(&mut self, key: K, resource: IndexedResource<T>) {
        self.entries.insert(key, resource);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &IndexedResource<T>)> {
        self.entries.iter()
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &IndexedResource<T>> {
        self.entries.values()
    }
}

/// One table per entity kind, keyed by glTF index.
#[derive(Debug)]
pub struct ResourceCache<N, M, Mat, Tex, Img> {
    pub nodes: CacheTable<usize, N>,
    pub meshes: CacheTable<usize, M>,
    pub materials: CacheTable<usize, Mat>,
    pub textures: CacheTable<usize, Tex>,
    pub images: CacheTable<usize, Img>,
}

impl<N, M, Mat, Tex, Img> Default for ResourceCache<N, M, Mat, Tex, Img> {
    fn default() -> Self {
        Self {
            nodes: CacheTable::default(),
            meshes: CacheTable::default(),
            materials: CacheTable::default(),
            textures: CacheTable::default(),
            images: CacheTable::default(),
        }
    }
}

impl<N, M, Mat, Tex, Img> ResourceCache<N, M, Mat, Tex, Img> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Return the cached resource for `key`, constructing it on first request.
///
/// `select` picks the table out of the context. The constructor receives the
/// whole context mutably, so it may request resources from other tables (or
/// the same one under different keys); those requests get the same
/// guarantee. A failed construction stores nothing, so a later request calls
/// the constructor again.
pub fn cache_object_if_not_exists<C, K, T, E, S, F>(
    ctx: &mut C,
    select: S,
    key: K,
    index: usize,
    construct: F,
) -> Result<IndexedResource<T>, E>
where
    K: Hash + Eq,
    S: Fn(&mut C) -> &mut CacheTable<K, T>,
    F: FnOnce(&mut C, usize) -> Result<T, E>,
{
    if let Some(hit) = select(ctx).get(&key) {
        return Ok(hit.clone());
    }
    let value = construct(ctx, index)?;
    let resource = IndexedResource::new(index, value);
    select(ctx).insert(key, resource.clone());
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Ctx {
        cache: ResourceCache<(), (), String, String, String>,
        calls: Cell<usize>,
    }

    fn texture(ctx: &mut Ctx, index: usize) -> Result<IndexedResource<String>, String> {
        cache_object_if_not_exists(ctx, |c| &mut c.cache.textures, index, index, |c, i| {
            c.calls.set(c.calls.get() + 1);
            Ok(format!("tex{i}"))
        })
    }

    #[test]
    fn test_constructs_once() {
        let mut ctx = Ctx::default();
        let a = texture(&mut ctx, 0).unwrap();
        let b = texture(&mut ctx, 0).unwrap();
        assert!(a.same_value(&b));
        assert_eq!(ctx.calls.get(), 1);
        assert_eq!(ctx.cache.textures.len(), 1);
    }

    #[test]
    fn test_recursive_requests_share() {
        let mut ctx = Ctx::default();
        let material = |ctx: &mut Ctx, index: usize| {
            cache_object_if_not_exists(ctx, |c| &mut c.cache.materials, index, index, |c, i| {
                let tex = texture(c, 7)?;
                Ok::<_, String>(format!("mat{i}+{}", tex.value))
            })
        };
        let m0 = material(&mut ctx, 0).unwrap();
        let m1 = material(&mut ctx, 1).unwrap();
        assert_eq!(*m0.value, "mat0+tex7");
        assert_eq!(*m1.value, "mat1+tex7");
        assert_eq!(ctx.calls.get(), 1);
        let keys: Vec<_> = ctx.cache.materials.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![0, 1]);
    }

    #[test]
    fn test_failure_not_stored() {
        let mut ctx = Ctx::default();
        let attempts = Cell::new(0);
        let request = |ctx: &mut Ctx| {
            cache_object_if_not_exists(ctx, |c| &mut c.cache.images, 2, 2, |_, _| {
                attempts.set(attempts.get() + 1);
                if attempts.get() == 1 {
                    Err("boom".to_string())
                } else {
                    Ok("img".to_string())
                }
            })
        };
        assert!(request(&mut ctx).is_err());
        assert!(!ctx.cache.images.contains(&2));
        assert!(request(&mut ctx).is_ok());
        assert!(request(&mut ctx).is_ok());
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::Material.to_string(), "material");
    }
}
