//! Resumable export of a host scene graph into a [`GltfContainer`].
//!
//! Objects are visited depth-first in pre-order with an explicit stack. A
//! node's index is assigned when it is visited and appended to its parent's
//! `children` afterwards, so nodes never hold back references. Meshes,
//! materials, textures and images are keyed by their source handles and
//! written once no matter how many objects share them.

mod accessor;
mod source;

pub use source::{
    ImageData, MaterialData, MeshData, NodeDescription, PostExportHook, PrimitiveSource, SceneSource,
    TextureData, Transform,
};

use tracing::{debug, trace};

use crate::buffer::{BufferBuilder, ViewUsage};
use crate::cache::{cache_object_if_not_exists, CacheTable, IndexedResource, ResourceKind};
use crate::container::GltfContainer;
use crate::error::{BoxError, Result, VgltfError};
use crate::options::ExportOptions;
use crate::schema::{
    Buffer, Gltf, Image, Material, Mesh, Node, NormalTextureInfo, OcclusionTextureInfo,
    PbrMetallicRoughness, Primitive, Scene, Texture, TextureInfo,
};
use crate::slicer::{Progress, SliceState, TimeSlicer};

/// Session state shared with hooks: the document under construction, the
/// binary buffer, and the handle-to-index tables.
pub struct ExporterContext<S: SceneSource> {
    pub gltf: Gltf,
    pub buffer: BufferBuilder,
    pub meshes: CacheTable<S::Mesh, S::Mesh>,
    pub materials: CacheTable<S::Material, S::Material>,
    pub textures: CacheTable<S::Texture, S::Texture>,
    pub images: CacheTable<S::Image, S::Image>,
    slicer: Box<dyn TimeSlicer>,
}

fn constructor_failure(kind: ResourceKind, index: usize) -> impl FnOnce(BoxError) -> VgltfError {
    move |source| VgltfError::ConstructorFailure { kind, index, source }
}

impl<S: SceneSource> ExporterContext<S> {
    fn new(options: &ExportOptions) -> Self {
        let mut gltf = Gltf::new();
        gltf.asset.generator = Some(options.generator.clone());
        Self {
            gltf,
            buffer: BufferBuilder::new(),
            meshes: CacheTable::new(),
            materials: CacheTable::new(),
            textures: CacheTable::new(),
            images: CacheTable::new(),
            slicer: options.slicer.build(),
        }
    }

    /// Export `image` as a buffer-view image, once per handle.
    pub fn export_image(&mut self, source: &S, image: &S::Image) -> Result<IndexedResource<S::Image>> {
        let index = self.gltf.images.len();
        cache_object_if_not_exists(self, |c| &mut c.images, image.clone(), index, |c, i| {
            let data = source
                .image_data(image)
                .map_err(constructor_failure(ResourceKind::Image, i))?;
            if data.bytes.is_empty() {
                return Err(constructor_failure(ResourceKind::Image, i)("image has no bytes".into()));
            }
            let view = c.buffer.add_view(&data.bytes, ViewUsage::Raw);
            let mut entry = Image::from_buffer_view(view, data.mime_type);
            entry.name = data.name;
            c.gltf.add_image(entry);
            trace!(kind = %ResourceKind::Image, index = i, "exported resource");
            Ok(image.clone())
        })
    }

    /// Export `texture` and its image, once per handle.
    pub fn export_texture(&mut self, source: &S, texture: &S::Texture) -> Result<IndexedResource<S::Texture>> {
        let index = self.gltf.textures.len();
        cache_object_if_not_exists(self, |c| &mut c.textures, texture.clone(), index, |c, i| {
            let data = source
                .texture_data(texture)
                .map_err(constructor_failure(ResourceKind::Texture, i))?;
            let image = match &data.image {
                Some(image) => Some(c.export_image(source, image)?.index),
                None => None,
            };
            let sampler = data.sampler.map(|s| c.gltf.add_sampler(s));
            c.gltf.add_texture(Texture {
                sampler,
                source: image,
                name: data.name,
                ..Default::default()
            });
            trace!(kind = %ResourceKind::Texture, index = i, "exported resource");
            Ok(texture.clone())
        })
    }

    fn export_texture_slot(&mut self, source: &S, texture: Option<&S::Texture>) -> Result<Option<usize>> {
        match texture {
            Some(texture) => Ok(Some(self.export_texture(source, texture)?.index)),
            None => Ok(None),
        }
    }

    /// Export `material` and its textures, once per handle.
    pub fn export_material(&mut self, source: &S, material: &S::Material) -> Result<IndexedResource<S::Material>> {
        let index = self.gltf.materials.len();
        cache_object_if_not_exists(self, |c| &mut c.materials, material.clone(), index, |c, i| {
            let data = source
                .material_data(material)
                .map_err(constructor_failure(ResourceKind::Material, i))?;

            let base_color = c.export_texture_slot(source, data.base_color_texture.as_ref())?;
            let metallic_roughness = c.export_texture_slot(source, data.metallic_roughness_texture.as_ref())?;
            let normal = c.export_texture_slot(source, data.normal_texture.as_ref())?;
            let occlusion = c.export_texture_slot(source, data.occlusion_texture.as_ref())?;
            let emissive = c.export_texture_slot(source, data.emissive_texture.as_ref())?;

            c.gltf.add_material(Material {
                name: data.name,
                pbr_metallic_roughness: Some(PbrMetallicRoughness {
                    base_color_factor: data.base_color_factor,
                    base_color_texture: base_color.map(TextureInfo::new),
                    metallic_factor: data.metallic_factor,
                    roughness_factor: data.roughness_factor,
                    metallic_roughness_texture: metallic_roughness.map(TextureInfo::new),
                    ..Default::default()
                }),
                normal_texture: normal.map(|index| NormalTextureInfo {
                    index,
                    tex_coord: 0,
                    scale: 1.0,
                    extensions: Default::default(),
                    extras: None,
                    unknown: Default::default(),
                }),
                occlusion_texture: occlusion.map(|index| OcclusionTextureInfo {
                    index,
                    tex_coord: 0,
                    strength: 1.0,
                    extensions: Default::default(),
                    extras: None,
                    unknown: Default::default(),
                }),
                emissive_texture: emissive.map(TextureInfo::new),
                emissive_factor: data.emissive_factor,
                alpha_mode: data.alpha_mode.as_str().to_string(),
                alpha_cutoff: data.alpha_cutoff,
                double_sided: data.double_sided,
                ..Default::default()
            });
            trace!(kind = %ResourceKind::Material, index = i, "exported resource");
            Ok(material.clone())
        })
    }

    /// Export `mesh`, its accessors and its materials, once per handle.
    pub fn export_mesh(&mut self, source: &S, mesh: &S::Mesh) -> Result<IndexedResource<S::Mesh>> {
        let index = self.gltf.meshes.len();
        cache_object_if_not_exists(self, |c| &mut c.meshes, mesh.clone(), index, |c, i| {
            let data = source
                .mesh_data(mesh)
                .map_err(constructor_failure(ResourceKind::Mesh, i))?;

            if data.primitives.is_empty() {
                return Err(constructor_failure(ResourceKind::Mesh, i)("mesh has no primitives".into()));
            }
            let mut primitives = Vec::with_capacity(data.primitives.len());
            for (p, primitive) in data.primitives.iter().enumerate() {
                if primitive.positions.is_empty() {
                    return Err(constructor_failure(ResourceKind::Mesh, i)(
                        format!("primitive {p} has no positions").into(),
                    ));
                }
                if primitive.indices.as_ref().is_some_and(Vec::is_empty) {
                    return Err(constructor_failure(ResourceKind::Mesh, i)(
                        format!("primitive {p} has an empty index list").into(),
                    ));
                }

                let mut out = Primitive {
                    mode: primitive.mode as u32,
                    ..Default::default()
                };
                out.attributes
                    .insert("POSITION".into(), c.add_accessor_vec3(&primitive.positions, true)?);
                // Empty optional streams are left out.
                if let Some(normals) = primitive.normals.as_ref().filter(|n| !n.is_empty()) {
                    out.attributes.insert("NORMAL".into(), c.add_accessor_vec3(normals, false)?);
                }
                if let Some(tangents) = primitive.tangents.as_ref().filter(|t| !t.is_empty()) {
                    out.attributes.insert("TANGENT".into(), c.add_accessor_vec4(tangents)?);
                }
                for (set, coords) in primitive.tex_coords.iter().take_while(|t| !t.is_empty()).enumerate() {
                    out.attributes
                        .insert(format!("TEXCOORD_{set}"), c.add_accessor_vec2(coords)?);
                }
                if let Some(colors) = primitive.colors.as_ref().filter(|colors| !colors.is_empty()) {
                    out.attributes.insert("COLOR_0".into(), c.add_accessor_vec4(colors)?);
                }
                if let Some(indices) = &primitive.indices {
                    out.indices = Some(c.add_accessor_indices(indices)?);
                }
                if let Some(material) = &primitive.material {
                    out.material = Some(c.export_material(source, material)?.index);
                }
                primitives.push(out);
            }

            c.gltf.add_mesh(Mesh {
                name: data.name,
                primitives,
                ..Default::default()
            });
            trace!(kind = %ResourceKind::Mesh, index = i, "exported resource");
            Ok(mesh.clone())
        })
    }
}

struct Frame<O> {
    object: O,
    parent: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Complete,
    Failed,
}

/// A resumable export session.
pub struct Exporter<S: SceneSource> {
    ctx: ExporterContext<S>,
    options: ExportOptions,
    hooks: Vec<Box<dyn PostExportHook<S>>>,
    stack: Vec<Frame<S::Object>>,
    roots: Vec<usize>,
    root: Option<S::Object>,
    phase: Phase,
}

impl<S: SceneSource> Exporter<S> {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            ctx: ExporterContext::new(&options),
            options,
            hooks: Vec::new(),
            stack: Vec::new(),
            roots: Vec::new(),
            root: None,
            phase: Phase::Idle,
        }
    }

    /// Register a hook to run after the node graph, in registration order.
    pub fn add_hook(&mut self, hook: Box<dyn PostExportHook<S>>) {
        self.hooks.push(hook);
    }

    pub fn context(&self) -> &ExporterContext<S> {
        &self.ctx
    }

    /// Queue `root` for export. With `use_children`, the root's children
    /// become the scene roots and the root itself is not exported.
    pub fn begin(&mut self, source: &S, root: S::Object) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(VgltfError::InvalidState("export already started".into()));
        }
        let tops = if self.options.use_children {
            source.children(&root)
        } else {
            vec![root.clone()]
        };
        self.stack = tops
            .into_iter()
            .rev()
            .map(|object| Frame { object, parent: None })
            .collect();
        self.root = Some(root);
        self.phase = Phase::Running;
        debug!(roots = self.stack.len(), use_children = self.options.use_children, "export started");
        Ok(())
    }

    /// Advance until the slicer yields or the export completes.
    ///
    /// After an error the session is poisoned.
    pub fn step(&mut self, source: &S) -> Result<Progress> {
        match self.phase {
            Phase::Idle => return Err(VgltfError::InvalidState("export has not begun".into())),
            Phase::Failed => {
                return Err(VgltfError::InvalidState("export session already failed".into()))
            }
            Phase::Complete => return Ok(Progress::Complete),
            Phase::Running => {}
        }
        self.advance(source).map_err(|err| {
            self.phase = Phase::Failed;
            err
        })
    }

    /// Drive [`step`](Self::step) to completion.
    pub fn run(&mut self, source: &S) -> Result<()> {
        while self.step(source)? == Progress::Yielded {}
        Ok(())
    }

    /// Pack the binary buffer and hand over the finished container.
    ///
    /// Hooks put their binary data through `ctx.buffer`; the exporter owns
    /// buffer 0 and every buffer view, so a document that already has
    /// either is rejected.
    pub fn into_container(self) -> Result<GltfContainer> {
        if self.phase != Phase::Complete {
            return Err(VgltfError::InvalidState("export has not completed".into()));
        }
        let ExporterContext { mut gltf, buffer, .. } = self.ctx;
        if !gltf.buffers.is_empty() || !gltf.buffer_views.is_empty() {
            return Err(VgltfError::InvalidState(format!(
                "{} buffers and {} buffer views were added outside the exporter's buffer",
                gltf.buffers.len(),
                gltf.buffer_views.len()
            )));
        }
        let (bytes, views) = buffer.build_bytes();
        if bytes.is_empty() {
            return Ok(GltfContainer::new(gltf));
        }
        gltf.buffer_views = views;
        gltf.buffers.push(Buffer::stored(bytes.len()));
        Ok(GltfContainer::new(gltf).with_payload(bytes))
    }

    fn advance(&mut self, source: &S) -> Result<Progress> {
        self.ctx.slicer.reset();
        while let Some(frame) = self.stack.pop() {
            self.visit(source, frame)?;
            if self.ctx.slicer.tick() == SliceState::Yield && !self.stack.is_empty() {
                trace!(pending = self.stack.len(), "export yielded");
                return Ok(Progress::Yielded);
            }
        }

        let scene = self.ctx.gltf.add_scene(Scene {
            nodes: std::mem::take(&mut self.roots),
            ..Default::default()
        });
        self.ctx.gltf.scene = Some(scene);

        let root = self
            .root
            .as_ref()
            .ok_or_else(|| VgltfError::InvalidState("export has no root".into()))?;
        for hook in &mut self.hooks {
            debug!(hook = hook.name(), "running post-export hook");
            hook.post_export(&mut self.ctx, source, root)
                .map_err(|err| VgltfError::hook(hook.name(), err))?;
        }

        self.phase = Phase::Complete;
        debug!(
            nodes = self.ctx.gltf.nodes.len(),
            meshes = self.ctx.gltf.meshes.len(),
            materials = self.ctx.gltf.materials.len(),
            bytes = self.ctx.buffer.len(),
            "export finished"
        );
        Ok(Progress::Complete)
    }

    fn visit(&mut self, source: &S, frame: Frame<S::Object>) -> Result<()> {
        let description = source.node(&frame.object);
        let mut node = Node {
            name: description.name,
            ..Default::default()
        };
        description.transform.apply(&mut node);
        let index = self.ctx.gltf.add_node(node);

        if let Some(mesh) = source.mesh(&frame.object) {
            let mesh = self.ctx.export_mesh(source, &mesh)?;
            self.ctx.gltf.nodes[index].mesh = Some(mesh.index);
        }

        match frame.parent {
            Some(parent) => self.ctx.gltf.nodes[parent].children.push(index),
            None => self.roots.push(index),
        }

        for child in source.children(&frame.object).into_iter().rev() {
            self.stack.push(Frame {
                object: child,
                parent: Some(index),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::result::Result;
    use crate::options::SlicerConfig;
    use crate::schema::MimeType;

    /// Objects are indices into `objects`; meshes, materials, textures and
    /// images are small integers.
    #[derive(Default)]
    struct Tree {
        objects: Vec<(String, Vec<usize>, Option<u32>)>,
        broken_mesh: Option<u32>,
        hollow_mesh: Option<u32>,
    }

    impl SceneSource for Tree {
        type Object = usize;
        type Mesh = u32;
        type Material = u32;
        type Texture = u32;
        type Image = u32;

        fn children(&self, object: &usize) -> Vec<usize> {
            self.objects[*object].1.clone()
        }

        fn node(&self, object: &usize) -> NodeDescription {
            NodeDescription {
                name: Some(self.objects[*object].0.clone()),
                transform: Transform::Identity,
            }
        }

        fn mesh(&self, object: &usize) -> Option<u32> {
            self.objects[*object].2
        }

        fn mesh_data(&self, mesh: &u32) -> Result<MeshData<u32>, BoxError> {
            if self.broken_mesh == Some(*mesh) {
                return Err("mesh is not readable".into());
            }
            let positions = if self.hollow_mesh == Some(*mesh) {
                Vec::new()
            } else {
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            };
            let mut primitive = PrimitiveSource::new(positions);
            primitive.normals = Some(Vec::new());
            primitive.tex_coords = vec![Vec::new(), vec![[0.0, 0.0]; 3]];
            primitive.indices = Some(vec![0, 1, 2]);
            primitive.material = Some(*mesh % 2);
            Ok(MeshData {
                name: Some(format!("mesh{mesh}")),
                primitives: vec![primitive],
            })
        }

        fn material_data(&self, _material: &u32) -> Result<MaterialData<u32>, BoxError> {
            Ok(MaterialData {
                base_color_texture: Some(7),
                ..Default::default()
            })
        }

        fn texture_data(&self, _texture: &u32) -> Result<TextureData<u32>, BoxError> {
            Ok(TextureData {
                name: None,
                image: Some(1),
                sampler: None,
            })
        }

        fn image_data(&self, _image: &u32) -> Result<ImageData, BoxError> {
            Ok(ImageData {
                name: Some("atlas".into()),
                mime_type: MimeType::ImagePng,
                bytes: vec![0x89, b'P', b'N', b'G', 1],
            })
        }
    }

    /// 0 "root" -> [1 "body" (mesh 0) -> [3 "hand" (mesh 1)], 2 "hair" (mesh 0)]
    fn tree() -> Tree {
        Tree {
            objects: vec![
                ("root".into(), vec![1, 2], None),
                ("body".into(), vec![3], Some(0)),
                ("hair".into(), vec![], Some(0)),
                ("hand".into(), vec![], Some(1)),
            ],
            broken_mesh: None,
            hollow_mesh: None,
        }
    }

    #[test]
    fn test_pre_order_with_children_appended() {
        let source = tree();
        let mut exporter = Exporter::new(ExportOptions::new());
        exporter.begin(&source, 0).unwrap();
        exporter.run(&source).unwrap();
        let container = exporter.into_container().unwrap();
        let gltf = &container.gltf;

        let names: Vec<_> = gltf.nodes.iter().map(|n| n.name.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["body", "hand", "hair"]);
        assert_eq!(gltf.nodes[0].children, vec![1]);
        assert_eq!(gltf.scenes[0].nodes, vec![0, 2]);
        assert_eq!(gltf.scene, Some(0));
        assert_eq!(gltf.asset.generator.as_deref(), Some("vgltf"));

        // Two mesh handles, two materials, one shared texture and image.
        assert_eq!(gltf.meshes.len(), 2);
        assert_eq!(gltf.nodes[0].mesh, gltf.nodes[2].mesh);
        assert_eq!(gltf.materials.len(), 2);
        assert_eq!(gltf.textures.len(), 1);
        assert_eq!(gltf.images.len(), 1);
        assert_eq!(gltf.images[0].name.as_deref(), Some("atlas"));

        // Empty normals and texture coordinates are left out.
        let attributes: Vec<_> = gltf.meshes[0].primitives[0].attributes.keys().collect();
        assert_eq!(attributes, vec!["POSITION"]);

        let payload = container.payload().unwrap();
        assert_eq!(gltf.buffers.len(), 1);
        assert_eq!(gltf.buffers[0].byte_length, payload.len());
        assert!(gltf.validate().is_ok());

        let glb = container.to_glb().unwrap();
        assert_eq!(GltfContainer::from_glb(&glb).unwrap(), container);
    }

    #[test]
    fn test_without_use_children_root_is_exported() {
        let source = tree();
        let mut exporter = Exporter::new(ExportOptions::new().with_use_children(false));
        exporter.begin(&source, 0).unwrap();
        exporter.run(&source).unwrap();
        let gltf = exporter.into_container().unwrap().gltf;
        assert_eq!(gltf.nodes[0].name.as_deref(), Some("root"));
        assert_eq!(gltf.nodes[0].children, vec![1, 3]);
        assert_eq!(gltf.scenes[0].nodes, vec![0]);
    }

    #[test]
    fn test_empty_graph_has_no_buffer() {
        let source = Tree {
            objects: vec![("root".into(), vec![1], None), ("empty".into(), vec![], None)],
            broken_mesh: None,
            hollow_mesh: None,
        };
        let mut exporter = Exporter::new(ExportOptions::new());
        exporter.begin(&source, 0).unwrap();
        exporter.run(&source).unwrap();
        let container = exporter.into_container().unwrap();
        assert!(container.buffer.is_none());
        assert!(container.gltf.buffers.is_empty());
        assert!(container.gltf.buffer_views.is_empty());
    }

    #[test]
    fn test_session_order_is_enforced() {
        let source = tree();
        let mut exporter = Exporter::<Tree>::new(ExportOptions::new().with_slicer(SlicerConfig::WorkUnits(1)));
        assert!(matches!(exporter.step(&source), Err(VgltfError::InvalidState(_))));
        exporter.begin(&source, 0).unwrap();
        assert!(matches!(exporter.begin(&source, 0), Err(VgltfError::InvalidState(_))));
        assert_eq!(exporter.step(&source).unwrap(), Progress::Yielded);
        assert_eq!(exporter.context().gltf.nodes.len(), 1);
        assert!(matches!(exporter.into_container(), Err(VgltfError::InvalidState(_))));
    }

    #[test]
    fn test_mesh_failure_poisons_session() {
        let source = Tree {
            broken_mesh: Some(1),
            ..tree()
        };
        let mut exporter = Exporter::new(ExportOptions::new());
        exporter.begin(&source, 0).unwrap();
        let err = exporter.run(&source).unwrap_err();
        assert!(matches!(
            err,
            VgltfError::ConstructorFailure {
                kind: ResourceKind::Mesh,
                index: 1,
                ..
            }
        ));
        assert!(matches!(exporter.step(&source), Err(VgltfError::InvalidState(_))));
    }

    struct Stamp(&'static str, bool);

    impl PostExportHook<Tree> for Stamp {
        fn name(&self) -> &str {
            self.0
        }

        fn post_export(&mut self, ctx: &mut ExporterContext<Tree>, _source: &Tree, root: &usize) -> Result<(), BoxError> {
            if self.1 {
                return Err("rejected".into());
            }
            let stamps = ctx.gltf.extras.get_or_insert_with(|| serde_json::json!([]));
            if let Some(list) = stamps.as_array_mut() {
                list.push(serde_json::json!(format!("{}@{root}", self.0)));
            }
            Ok(())
        }
    }

    #[test]
    fn test_hooks_run_in_order() {
        let source = tree();
        let mut exporter = Exporter::<Tree>::new(ExportOptions::new());
        exporter.add_hook(Box::new(Stamp("a", false)));
        exporter.add_hook(Box::new(Stamp("b", false)));
        exporter.begin(&source, 0).unwrap();
        exporter.run(&source).unwrap();
        let gltf = exporter.into_container().unwrap().gltf;
        assert_eq!(gltf.extras, Some(serde_json::json!(["a@0", "b@0"])));
    }

    #[test]
    fn test_failing_hook_prevents_container() {
        let source = tree();
        let mut exporter = Exporter::<Tree>::new(ExportOptions::new());
        exporter.add_hook(Box::new(Stamp("gate", true)));
        exporter.add_hook(Box::new(Stamp("after", false)));
        exporter.begin(&source, 0).unwrap();
        let err = exporter.run(&source).unwrap_err();
        assert!(matches!(err, VgltfError::Hook { ref name, .. } if name == "gate"));
        assert!(exporter.context().gltf.extras.is_none());
        assert!(matches!(exporter.into_container(), Err(VgltfError::InvalidState(_))));
    }

    #[test]
    fn test_empty_positions_fail_mesh_export() {
        let source = Tree {
            hollow_mesh: Some(0),
            ..tree()
        };
        let mut exporter = Exporter::new(ExportOptions::new());
        exporter.begin(&source, 0).unwrap();
        let err = exporter.run(&source).unwrap_err();
        assert!(matches!(
            err,
            VgltfError::ConstructorFailure {
                kind: ResourceKind::Mesh,
                index: 0,
                ..
            }
        ));
        assert!(err.to_string().contains("no positions"));
    }

    #[test]
    fn test_empty_accessor_data_is_rejected() {
        let mut ctx = ExporterContext::<Tree>::new(&ExportOptions::new());
        assert!(matches!(ctx.add_accessor_indices(&[]), Err(VgltfError::SchemaViolation { .. })));
        assert!(matches!(ctx.add_accessor_vec2(&[]), Err(VgltfError::SchemaViolation { .. })));
        assert!(ctx.buffer.is_empty());
        assert!(ctx.gltf.accessors.is_empty());
    }

    struct StrayBuffer;

    impl PostExportHook<Tree> for StrayBuffer {
        fn name(&self) -> &str {
            "stray"
        }

        fn post_export(&mut self, ctx: &mut ExporterContext<Tree>, _source: &Tree, _root: &usize) -> Result<(), BoxError> {
            ctx.gltf.buffers.push(Buffer {
                uri: Some("extra.bin".into()),
                ..Buffer::stored(4)
            });
            Ok(())
        }
    }

    #[test]
    fn test_buffers_added_by_hooks_are_rejected() {
        let source = tree();
        let mut exporter = Exporter::<Tree>::new(ExportOptions::new());
        exporter.add_hook(Box::new(StrayBuffer));
        exporter.begin(&source, 0).unwrap();
        exporter.run(&source).unwrap();
        assert!(matches!(exporter.into_container(), Err(VgltfError::InvalidState(_))));
    }
}
