//! Resumable import of a decoded document through an [`ImportBridge`].
//!
//! The importer walks the selected scene depth-first with an explicit stack.
//! Every entity the walk reaches is built through the session's
//! [`ResourceCache`], so a texture shared by two materials, or a mesh shared
//! by two nodes, is constructed exactly once.

mod bridge;

pub use bridge::{ImportBridge, MaterialTextures, PostImportHook, PrimitiveData};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::cache::{cache_object_if_not_exists, IndexedResource, ResourceCache, ResourceKind};
use crate::container::GltfContainer;
use crate::error::{BoxError, Result, VgltfError};
use crate::options::ImportOptions;
use crate::schema::{Gltf, PrimitiveMode};
use crate::slicer::{Progress, SliceState, TimeSlicer};
use crate::store::ResourcesStore;

/// Cache of everything an import session has built.
pub type ImportCache<B> = ResourceCache<
    <B as ImportBridge>::Node,
    <B as ImportBridge>::Mesh,
    <B as ImportBridge>::Material,
    <B as ImportBridge>::Texture,
    <B as ImportBridge>::Image,
>;

/// Session state shared with hooks.
pub struct ImporterContext<B: ImportBridge> {
    pub store: ResourcesStore,
    pub cache: ImportCache<B>,
    slicer: Box<dyn TimeSlicer>,
    options: ImportOptions,
}

fn constructor_failure(kind: ResourceKind, index: usize) -> impl FnOnce(BoxError) -> VgltfError {
    move |source| VgltfError::ConstructorFailure { kind, index, source }
}

impl<B: ImportBridge> ImporterContext<B> {
    pub fn gltf(&self) -> &Gltf {
        self.store.gltf()
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Image `index`, built on first request.
    pub fn image(&mut self, bridge: &mut B, index: usize) -> Result<IndexedResource<B::Image>> {
        cache_object_if_not_exists(self, |c| &mut c.cache.images, index, index, |c, i| {
            let resource = c.store.image(i)?;
            trace!(kind = %ResourceKind::Image, index = i, "constructing resource");
            bridge
                .create_image(i, &resource)
                .map_err(constructor_failure(ResourceKind::Image, i))
        })
    }

    /// Texture `index`, built on first request. A texture without a source
    /// is built with no image.
    pub fn texture(&mut self, bridge: &mut B, index: usize) -> Result<IndexedResource<B::Texture>> {
        cache_object_if_not_exists(self, |c| &mut c.cache.textures, index, index, |c, i| {
            let texture = c
                .gltf()
                .textures
                .get(i)
                .cloned()
                .ok_or_else(|| VgltfError::reference(format!("textures[{i}]"), "no such texture"))?;
            let image = match texture.source {
                Some(source) => Some(c.image(bridge, source)?),
                None => None,
            };
            let sampler = match texture.sampler {
                Some(s) => Some(c.gltf().samplers.get(s).cloned().ok_or_else(|| {
                    VgltfError::reference(format!("textures[{i}].sampler"), format!("no sampler {s}"))
                })?),
                None => None,
            };
            trace!(kind = %ResourceKind::Texture, index = i, "constructing resource");
            bridge
                .create_texture(i, &texture, image, sampler.as_ref())
                .map_err(constructor_failure(ResourceKind::Texture, i))
        })
    }

    /// Material `index` with its textures, built on first request.
    pub fn material(&mut self, bridge: &mut B, index: usize) -> Result<IndexedResource<B::Material>> {
        cache_object_if_not_exists(self, |c| &mut c.cache.materials, index, index, |c, i| {
            let material = c
                .gltf()
                .materials
                .get(i)
                .cloned()
                .ok_or_else(|| VgltfError::reference(format!("materials[{i}]"), "no such material"))?;

            let mut textures = MaterialTextures::default();
            if let Some(pbr) = &material.pbr_metallic_roughness {
                if let Some(info) = &pbr.base_color_texture {
                    textures.base_color = Some(c.texture(bridge, info.index)?);
                }
                if let Some(info) = &pbr.metallic_roughness_texture {
                    textures.metallic_roughness = Some(c.texture(bridge, info.index)?);
                }
            }
            if let Some(info) = &material.normal_texture {
                textures.normal = Some(c.texture(bridge, info.index)?);
            }
            if let Some(info) = &material.occlusion_texture {
                textures.occlusion = Some(c.texture(bridge, info.index)?);
            }
            if let Some(info) = &material.emissive_texture {
                textures.emissive = Some(c.texture(bridge, info.index)?);
            }

            trace!(kind = %ResourceKind::Material, index = i, "constructing resource");
            bridge
                .create_material(i, &material, &textures)
                .map_err(constructor_failure(ResourceKind::Material, i))
        })
    }

    /// Mesh `index` with its accessors and materials, built on first request.
    pub fn mesh(&mut self, bridge: &mut B, index: usize) -> Result<IndexedResource<B::Mesh>> {
        cache_object_if_not_exists(self, |c| &mut c.cache.meshes, index, index, |c, i| {
            let mesh = c
                .gltf()
                .meshes
                .get(i)
                .cloned()
                .ok_or_else(|| VgltfError::reference(format!("meshes[{i}]"), "no such mesh"))?;

            let mut primitives = Vec::with_capacity(mesh.primitives.len());
            for (p, primitive) in mesh.primitives.iter().enumerate() {
                let path = format!("meshes[{i}].primitives[{p}]");
                if !primitive.attributes.contains_key("POSITION") {
                    return Err(VgltfError::reference(
                        format!("{path}.attributes"),
                        "missing required POSITION attribute",
                    ));
                }
                let mode = PrimitiveMode::from_gl(primitive.mode).ok_or_else(|| {
                    VgltfError::schema(format!("{path}.mode"), format!("invalid primitive mode {}", primitive.mode))
                })?;

                let mut attributes = IndexMap::with_capacity(primitive.attributes.len());
                for (name, &accessor) in &primitive.attributes {
                    attributes.insert(name.clone(), c.store.accessor(accessor)?);
                }
                let indices = match primitive.indices {
                    Some(accessor) => Some(c.store.accessor(accessor)?),
                    None => None,
                };
                let material = match primitive.material {
                    Some(material) => Some(c.material(bridge, material)?),
                    None => None,
                };
                let mut targets = Vec::with_capacity(primitive.targets.len());
                for target in &primitive.targets {
                    let mut resolved = IndexMap::with_capacity(target.len());
                    for (name, &accessor) in target {
                        resolved.insert(name.clone(), c.store.accessor(accessor)?);
                    }
                    targets.push(resolved);
                }

                primitives.push(PrimitiveData {
                    attributes,
                    indices,
                    mode,
                    material,
                    targets,
                });
            }

            trace!(kind = %ResourceKind::Mesh, index = i, "constructing resource");
            bridge
                .create_mesh(i, &mesh, &primitives)
                .map_err(constructor_failure(ResourceKind::Mesh, i))
        })
    }

    /// Node `index` with its mesh, built on first request. Children are not
    /// visited here; the importer's traversal links them.
    pub fn node(&mut self, bridge: &mut B, index: usize) -> Result<IndexedResource<B::Node>> {
        cache_object_if_not_exists(self, |c| &mut c.cache.nodes, index, index, |c, i| {
            let node = c
                .gltf()
                .nodes
                .get(i)
                .cloned()
                .ok_or_else(|| VgltfError::reference(format!("nodes[{i}]"), "no such node"))?;
            let mesh = match node.mesh {
                Some(mesh) => Some(c.mesh(bridge, mesh)?),
                None => None,
            };
            trace!(kind = %ResourceKind::Node, index = i, "constructing resource");
            bridge
                .create_node(i, &node, mesh)
                .map_err(constructor_failure(ResourceKind::Node, i))
        })
    }
}

struct Frame<N> {
    index: usize,
    parent: Option<IndexedResource<N>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Complete,
    Failed,
}

/// Result of a completed import.
pub struct ImportedScene<B: ImportBridge> {
    /// Root nodes of the imported scene, in scene order.
    pub roots: Vec<IndexedResource<B::Node>>,
    pub cache: ImportCache<B>,
    pub store: ResourcesStore,
    pub bridge: B,
}

/// A resumable import session.
pub struct Importer<B: ImportBridge> {
    ctx: ImporterContext<B>,
    bridge: B,
    hooks: Vec<Box<dyn PostImportHook<B>>>,
    stack: Vec<Frame<B::Node>>,
    roots: Vec<IndexedResource<B::Node>>,
    phase: Phase,
}

impl<B: ImportBridge> Importer<B> {
    /// Start a session over a decoded container.
    pub fn new(container: GltfContainer, bridge: B, options: ImportOptions) -> Result<Self> {
        Self::with_store(ResourcesStore::new(container), bridge, options)
    }

    /// Start a session over a store the caller has already populated with
    /// external resources.
    pub fn with_store(store: ResourcesStore, bridge: B, options: ImportOptions) -> Result<Self> {
        if options.validate {
            store.gltf().validate()?;
        }
        let roots = root_nodes(store.gltf(), &options)?;
        debug!(roots = roots.len(), nodes = store.gltf().nodes.len(), "import started");

        let stack = roots
            .into_iter()
            .rev()
            .map(|index| Frame { index, parent: None })
            .collect();
        Ok(Self {
            ctx: ImporterContext {
                store,
                cache: ResourceCache::new(),
                slicer: options.slicer.build(),
                options,
            },
            bridge,
            hooks: Vec::new(),
            stack,
            roots: Vec::new(),
            phase: Phase::Running,
        })
    }

    /// Register a hook to run after the node graph, in registration order.
    pub fn add_hook(&mut self, hook: Box<dyn PostImportHook<B>>) {
        self.hooks.push(hook);
    }

    pub fn context(&self) -> &ImporterContext<B> {
        &self.ctx
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Advance until the slicer yields or the import completes.
    ///
    /// After an error the session is poisoned.
    pub fn step(&mut self) -> Result<Progress> {
        match self.phase {
            Phase::Failed => {
                return Err(VgltfError::InvalidState("import session already failed".into()))
            }
            Phase::Complete => return Ok(Progress::Complete),
            Phase::Running => {}
        }
        self.advance().map_err(|err| {
            self.phase = Phase::Failed;
            err
        })
    }

    /// Drive [`step`](Self::step) to completion.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? == Progress::Yielded {}
        Ok(())
    }

    /// Hand over the imported scene. The session must have completed.
    pub fn finish(self) -> Result<ImportedScene<B>> {
        match self.phase {
            Phase::Complete => Ok(ImportedScene {
                roots: self.roots,
                cache: self.ctx.cache,
                store: self.ctx.store,
                bridge: self.bridge,
            }),
            Phase::Running => Err(VgltfError::InvalidState("import has not completed".into())),
            Phase::Failed => Err(VgltfError::InvalidState("import session already failed".into())),
        }
    }

    fn advance(&mut self) -> Result<Progress> {
        self.ctx.slicer.reset();
        while let Some(frame) = self.stack.pop() {
            self.visit(frame)?;
            if self.ctx.slicer.tick() == SliceState::Yield && !self.stack.is_empty() {
                trace!(pending = self.stack.len(), "import yielded");
                return Ok(Progress::Yielded);
            }
        }

        for hook in &mut self.hooks {
            debug!(hook = hook.name(), "running post-import hook");
            hook.post_import(&mut self.ctx, &mut self.bridge)
                .map_err(|err| VgltfError::hook(hook.name(), err))?;
        }

        self.phase = Phase::Complete;
        debug!(
            roots = self.roots.len(),
            nodes = self.ctx.cache.nodes.len(),
            meshes = self.ctx.cache.meshes.len(),
            materials = self.ctx.cache.materials.len(),
            "import finished"
        );
        Ok(Progress::Complete)
    }

    fn visit(&mut self, frame: Frame<B::Node>) -> Result<()> {
        let seen = self.ctx.cache.nodes.contains(&frame.index);
        let node = self.ctx.node(&mut self.bridge, frame.index)?;

        match &frame.parent {
            Some(parent) => self
                .bridge
                .attach_child(parent, &node)
                .map_err(constructor_failure(ResourceKind::Node, frame.index))?,
            None => self.roots.push(node.clone()),
        }

        if !seen {
            let children = &self.ctx.gltf().nodes[frame.index].children;
            for &child in children.iter().rev() {
                self.stack.push(Frame {
                    index: child,
                    parent: Some(node.clone()),
                });
            }
        }
        Ok(())
    }
}

/// Scene roots: the chosen scene's nodes, or every parentless node when the
/// document has no scenes.
fn root_nodes(gltf: &Gltf, options: &ImportOptions) -> Result<Vec<usize>> {
    match options.scene.or_else(|| gltf.default_scene()) {
        Some(scene) => gltf
            .scenes
            .get(scene)
            .map(|s| s.nodes.clone())
            .ok_or_else(|| VgltfError::reference("scene", format!("scene {scene} does not exist"))),
        None => {
            let mut has_parent = vec![false; gltf.nodes.len()];
            for node in &gltf.nodes {
                for &child in &node.children {
                    if let Some(flag) = has_parent.get_mut(child) {
                        *flag = true;
                    }
                }
            }
            Ok((0..gltf.nodes.len()).filter(|&i| !has_parent[i]).collect())
        }
    }
}
