//! glTF 2.0 JSON schema types.
//!
//! These types mirror the glTF 2.0 JSON schema. Raw wire values
//! (component types, accessor types, alpha modes, ...) are kept as they appear
//! in JSON so that documents round-trip untouched; typed views over them live
//! in [`enums`]. Every entity keeps its `extensions` and `extras` opaquely,
//! and members the model does not know about survive in its `unknown` map.

mod enums;
mod validate;

pub use enums::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque extension blocks, keyed by extension name.
pub type Extensions = IndexMap<String, Value>;

/// Root glTF object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gltf {
    /// Asset information.
    pub asset: Asset,
    /// Default scene index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    /// Scenes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<Scene>,
    /// Nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    /// Meshes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<Mesh>,
    /// Accessors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    /// Buffer views.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    /// Buffers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    /// Materials.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
    /// Textures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<Texture>,
    /// Images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    /// Samplers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<Sampler>,
    /// Animations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<Animation>,
    /// Skins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<Skin>,
    /// Cameras.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<Camera>,
    /// Extension names used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    /// Required extension names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
    /// Extensions (vendor data such as VRM).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Top-level keys this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Gltf {
    /// Create an empty glTF 2.0 document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scene and return its index.
    pub fn add_scene(&mut self, scene: Scene) -> usize {
        push_index(&mut self.scenes, scene)
    }

    /// Append a node and return its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        push_index(&mut self.nodes, node)
    }

    /// Append a mesh and return its index.
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        push_index(&mut self.meshes, mesh)
    }

    /// Append an accessor and return its index.
    pub fn add_accessor(&mut self, accessor: Accessor) -> usize {
        push_index(&mut self.accessors, accessor)
    }

    /// Append a material and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        push_index(&mut self.materials, material)
    }

    /// Append a texture and return its index.
    pub fn add_texture(&mut self, texture: Texture) -> usize {
        push_index(&mut self.textures, texture)
    }

    /// Append an image and return its index.
    pub fn add_image(&mut self, image: Image) -> usize {
        push_index(&mut self.images, image)
    }

    /// Append a sampler and return its index.
    pub fn add_sampler(&mut self, sampler: Sampler) -> usize {
        push_index(&mut self.samplers, sampler)
    }

    /// Record an extension as used (once).
    pub fn use_extension(&mut self, name: &str) {
        if !self.extensions_used.iter().any(|n| n == name) {
            self.extensions_used.push(name.to_string());
        }
    }

    /// Index of the scene an importer should start from.
    pub fn default_scene(&self) -> Option<usize> {
        match self.scene {
            Some(idx) => Some(idx),
            None if !self.scenes.is_empty() => Some(0),
            None => None,
        }
    }
}

fn push_index<T>(items: &mut Vec<T>, item: T) -> usize {
    let index = items.len();
    items.push(item);
    index
}

/// Asset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// glTF version.
    pub version: String,
    /// Minimum glTF version required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    /// Generator name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Copyright.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            min_version: None,
            generator: None,
            copyright: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }
}

/// A scene containing root nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root node indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<usize>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// A node in the scene graph.
///
/// `matrix` and the TRS properties are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Child node indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    /// Mesh index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<usize>,
    /// Camera index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<usize>,
    /// Skin index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin: Option<usize>,
    /// Local transformation matrix (column-major).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    /// Translation (TRS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f32; 3]>,
    /// Rotation quaternion, xyzw (TRS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    /// Scale (TRS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    /// Morph target weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Node {
    /// Whether any TRS property is present.
    pub fn has_trs(&self) -> bool {
        self.translation.is_some() || self.rotation.is_some() || self.scale.is_some()
    }

    /// Local transform as a matrix, from `matrix` or from TRS.
    pub fn local_transform(&self) -> glam::Mat4 {
        if let Some(matrix) = &self.matrix {
            return glam::Mat4::from_cols_array(matrix);
        }
        let translation = self.translation.map(glam::Vec3::from).unwrap_or(glam::Vec3::ZERO);
        let rotation = self
            .rotation
            .map(|r| glam::Quat::from_xyzw(r[0], r[1], r[2], r[3]))
            .unwrap_or(glam::Quat::IDENTITY);
        let scale = self.scale.map(glam::Vec3::from).unwrap_or(glam::Vec3::ONE);
        glam::Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

/// A mesh containing primitives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Mesh name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mesh primitives (at least one).
    pub primitives: Vec<Primitive>,
    /// Morph target weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f32>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// A mesh primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Vertex attributes (POSITION, NORMAL, TEXCOORD_0, etc.) to accessor index.
    pub attributes: IndexMap<String, usize>,
    /// Index accessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<usize>,
    /// Material index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    /// Rendering mode (0=POINTS, 1=LINES, 4=TRIANGLES, etc.).
    #[serde(default = "default_primitive_mode")]
    pub mode: u32,
    /// Morph targets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<IndexMap<String, usize>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            attributes: IndexMap::new(),
            indices: None,
            material: None,
            mode: default_primitive_mode(),
            targets: Vec::new(),
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }
}

fn default_primitive_mode() -> u32 {
    PrimitiveMode::Triangles as u32
}

/// An accessor for typed buffer data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    /// Buffer view index. Absent means all zeros (or sparse-only data).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    /// Byte offset within buffer view.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    /// Component type (5120=BYTE, 5121=UNSIGNED_BYTE, 5122=SHORT, 5123=UNSIGNED_SHORT, 5125=UNSIGNED_INT, 5126=FLOAT).
    pub component_type: u32,
    /// Number of elements.
    pub count: usize,
    /// Element type ("SCALAR", "VEC2", "VEC3", "VEC4", "MAT2", "MAT3", "MAT4").
    #[serde(rename = "type")]
    pub accessor_type: String,
    /// Whether integer values are normalized.
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalized: bool,
    /// Minimum values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f64>>,
    /// Maximum values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f64>>,
    /// Sparse storage of elements that deviate from their initialization value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse: Option<AccessorSparse>,
    /// Accessor name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Accessor {
    /// Create an accessor over a whole buffer view.
    pub fn new(
        buffer_view: usize,
        component_type: ComponentType,
        accessor_type: AccessorType,
        count: usize,
    ) -> Self {
        Self {
            buffer_view: Some(buffer_view),
            byte_offset: 0,
            component_type: component_type as u32,
            count,
            accessor_type: accessor_type.as_str().to_string(),
            normalized: false,
            min: None,
            max: None,
            sparse: None,
            name: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }

    /// Typed component type, if valid.
    pub fn component(&self) -> Option<ComponentType> {
        ComponentType::from_gl(self.component_type)
    }

    /// Typed element type, if valid.
    pub fn element(&self) -> Option<AccessorType> {
        AccessorType::parse(&self.accessor_type)
    }

    /// Byte size of one tightly packed element.
    pub fn element_size(&self) -> Option<usize> {
        Some(self.component()?.size() * self.element()?.component_count())
    }

    /// Layout of one element as stored in the buffer view.
    pub fn layout(&self) -> Option<ElementLayout> {
        Some(self.element()?.layout(self.component()?))
    }

    /// Total byte size of all elements when tightly packed. `None` on an
    /// invalid type or overflow.
    pub fn byte_size(&self) -> Option<usize> {
        self.count.checked_mul(self.element_size()?)
    }

    /// Offset one past the last byte read from the buffer view, given the
    /// view's stride. `None` on an invalid type, a zero count or overflow.
    pub fn view_end(&self, byte_stride: Option<usize>) -> Option<usize> {
        let element_size = self.layout()?.stored_size();
        let stride = byte_stride.unwrap_or(element_size);
        self.count
            .checked_sub(1)?
            .checked_mul(stride)?
            .checked_add(element_size)?
            .checked_add(self.byte_offset)
    }
}

/// Largest accessor, in packed bytes, materialized without a backing
/// buffer view. Such accessors are zero-filled, so their size is bounded
/// by nothing in the file.
pub const MAX_UNBACKED_ACCESSOR_BYTES: usize = 1 << 30;

/// Sparse accessor storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorSparse {
    /// Number of deviating elements.
    pub count: usize,
    /// Indices of the deviating elements.
    pub indices: SparseIndices,
    /// Replacement values.
    pub values: SparseValues,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Sparse index storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndices {
    /// Buffer view holding the indices.
    pub buffer_view: usize,
    /// Byte offset within the view.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    /// Index component type (u8, u16 or u32).
    pub component_type: u32,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Sparse value storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValues {
    /// Buffer view holding the values.
    pub buffer_view: usize,
    /// Byte offset within the view.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// A view into a buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    /// Buffer index.
    pub buffer: usize,
    /// Byte offset into buffer.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: usize,
    /// Byte length.
    pub byte_length: usize,
    /// Byte stride for vertex data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<usize>,
    /// Target (34962=ARRAY_BUFFER, 34963=ELEMENT_ARRAY_BUFFER).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Buffer view name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl BufferView {
    /// Byte range covered within the buffer, or `None` if its end
    /// overflows.
    pub fn range(&self) -> Option<std::ops::Range<usize>> {
        let end = self.byte_offset.checked_add(self.byte_length)?;
        Some(self.byte_offset..end)
    }
}

/// A buffer containing binary data.
///
/// A buffer without `uri` at index 0 refers to the GLB binary chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    /// Byte length.
    pub byte_length: usize,
    /// URI (data URI or external file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Buffer name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Buffer {
    /// A buffer backed by the container's binary chunk.
    pub fn stored(byte_length: usize) -> Self {
        Self {
            byte_length,
            uri: None,
            name: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }
}

/// A PBR material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Material name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// PBR metallic-roughness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    /// Normal texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<NormalTextureInfo>,
    /// Occlusion texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    /// Emissive texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<TextureInfo>,
    /// Emissive factor.
    #[serde(default = "default_emissive_factor", skip_serializing_if = "is_black")]
    pub emissive_factor: [f32; 3],
    /// Alpha mode ("OPAQUE", "MASK", "BLEND").
    #[serde(default = "default_alpha_mode")]
    pub alpha_mode: String,
    /// Alpha cutoff for MASK mode.
    #[serde(default = "default_alpha_cutoff")]
    pub alpha_cutoff: f32,
    /// Double-sided rendering.
    #[serde(default, skip_serializing_if = "is_false")]
    pub double_sided: bool,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            pbr_metallic_roughness: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            emissive_factor: default_emissive_factor(),
            alpha_mode: default_alpha_mode(),
            alpha_cutoff: default_alpha_cutoff(),
            double_sided: false,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }
}

impl Material {
    /// Every texture index this material references, with its field path.
    pub fn texture_refs(&self) -> Vec<(&'static str, usize)> {
        let mut refs = Vec::new();
        if let Some(pbr) = &self.pbr_metallic_roughness {
            if let Some(info) = &pbr.base_color_texture {
                refs.push(("pbrMetallicRoughness.baseColorTexture", info.index));
            }
            if let Some(info) = &pbr.metallic_roughness_texture {
                refs.push(("pbrMetallicRoughness.metallicRoughnessTexture", info.index));
            }
        }
        if let Some(info) = &self.normal_texture {
            refs.push(("normalTexture", info.index));
        }
        if let Some(info) = &self.occlusion_texture {
            refs.push(("occlusionTexture", info.index));
        }
        if let Some(info) = &self.emissive_texture {
            refs.push(("emissiveTexture", info.index));
        }
        refs
    }
}

fn default_emissive_factor() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_alpha_mode() -> String {
    AlphaMode::Opaque.as_str().to_string()
}

fn default_alpha_cutoff() -> f32 {
    0.5
}

/// PBR metallic-roughness properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    /// Base color factor.
    #[serde(default = "default_base_color_factor")]
    pub base_color_factor: [f32; 4],
    /// Base color texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfo>,
    /// Metallic factor.
    #[serde(default = "default_one")]
    pub metallic_factor: f32,
    /// Roughness factor.
    #[serde(default = "default_one")]
    pub roughness_factor: f32,
    /// Metallic-roughness texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic_roughness_texture: Option<TextureInfo>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Default for PbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: default_base_color_factor(),
            base_color_texture: None,
            metallic_factor: default_one(),
            roughness_factor: default_one(),
            metallic_roughness_texture: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }
}

fn default_base_color_factor() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

fn default_one() -> f32 {
    1.0
}

/// Texture reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    /// Texture index.
    pub index: usize,
    /// Texture coordinate set.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tex_coord: u32,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl TextureInfo {
    /// Reference a texture on texture coordinate set 0.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            tex_coord: 0,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }
}

/// Normal texture reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalTextureInfo {
    /// Texture index.
    pub index: usize,
    /// Texture coordinate set.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tex_coord: u32,
    /// Normal scale.
    #[serde(default = "default_one")]
    pub scale: f32,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Occlusion texture reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcclusionTextureInfo {
    /// Texture index.
    pub index: usize,
    /// Texture coordinate set.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tex_coord: u32,
    /// Occlusion strength.
    #[serde(default = "default_one")]
    pub strength: f32,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// A texture. `source` may be absent, meaning untextured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    /// Sampler index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler: Option<usize>,
    /// Image source index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
    /// Texture name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Where an image's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Data URI or external file.
    Uri(String),
    /// Buffer view holding encoded image bytes.
    BufferView(usize),
}

/// An image, referencing exactly one of a URI or a buffer view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawImage", into = "RawImage")]
pub struct Image {
    source: ImageSource,
    /// MIME type, e.g. "image/png". Required for buffer views; any value is
    /// kept as written.
    pub mime_type: Option<String>,
    /// Image name.
    pub name: Option<String>,
    /// Extensions.
    pub extensions: Extensions,
    /// Application-specific data.
    pub extras: Option<Value>,
    /// Members this model does not know about.
    pub unknown: IndexMap<String, Value>,
}

impl Image {
    /// An image stored at a URI.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self::with_source(ImageSource::Uri(uri.into()), None)
    }

    /// An image stored in a buffer view; buffer-view images carry a MIME type.
    pub fn from_buffer_view(buffer_view: usize, mime_type: MimeType) -> Self {
        Self::with_source(
            ImageSource::BufferView(buffer_view),
            Some(mime_type.as_str().to_string()),
        )
    }

    fn with_source(source: ImageSource, mime_type: Option<String>) -> Self {
        Self {
            source,
            mime_type,
            name: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }

    /// Set the image name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Where the image's bytes live.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// The URI, when the image is URI-backed.
    pub fn uri(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Uri(uri) => Some(uri),
            ImageSource::BufferView(_) => None,
        }
    }

    /// The buffer view, when the image is stored in the binary buffer.
    pub fn buffer_view(&self) -> Option<usize> {
        match self.source {
            ImageSource::BufferView(index) => Some(index),
            ImageSource::Uri(_) => None,
        }
    }
}

/// Wire form of [`Image`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buffer_view: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    extensions: Extensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    extras: Option<Value>,
    #[serde(flatten)]
    unknown: IndexMap<String, Value>,
}

impl TryFrom<RawImage> for Image {
    type Error = String;

    fn try_from(raw: RawImage) -> Result<Self, Self::Error> {
        let source = match (raw.uri, raw.buffer_view) {
            (Some(uri), None) => ImageSource::Uri(uri),
            (None, Some(view)) => {
                if raw.mime_type.is_none() {
                    return Err("image with `bufferView` requires `mimeType`".into());
                }
                ImageSource::BufferView(view)
            }
            (Some(_), Some(_)) => {
                return Err("image must not define both `uri` and `bufferView`".into())
            }
            (None, None) => return Err("image must define one of `uri` or `bufferView`".into()),
        };
        Ok(Self {
            source,
            mime_type: raw.mime_type,
            name: raw.name,
            extensions: raw.extensions,
            extras: raw.extras,
            unknown: raw.unknown,
        })
    }
}

impl From<Image> for RawImage {
    fn from(image: Image) -> Self {
        let (uri, buffer_view) = match image.source {
            ImageSource::Uri(uri) => (Some(uri), None),
            ImageSource::BufferView(view) => (None, Some(view)),
        };
        Self {
            uri,
            mime_type: image.mime_type,
            buffer_view,
            name: image.name,
            extensions: image.extensions,
            extras: image.extras,
            unknown: image.unknown,
        }
    }
}

/// A texture sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sampler {
    /// Magnification filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mag_filter: Option<u32>,
    /// Minification filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_filter: Option<u32>,
    /// S (U) wrap mode.
    #[serde(default = "default_wrap_mode")]
    pub wrap_s: u32,
    /// T (V) wrap mode.
    #[serde(default = "default_wrap_mode")]
    pub wrap_t: u32,
    /// Sampler name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            mag_filter: None,
            min_filter: None,
            wrap_s: default_wrap_mode(),
            wrap_t: default_wrap_mode(),
            name: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: IndexMap::new(),
        }
    }
}

fn default_wrap_mode() -> u32 {
    WRAP_REPEAT
}

/// An animation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Animation name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Animation channels.
    #[serde(default)]
    pub channels: Vec<AnimationChannel>,
    /// Animation samplers.
    #[serde(default)]
    pub samplers: Vec<AnimationSampler>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// An animation channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationChannel {
    /// Sampler index.
    pub sampler: usize,
    /// Target.
    pub target: AnimationTarget,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Animation target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationTarget {
    /// Node index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<usize>,
    /// Target path ("translation", "rotation", "scale", "weights").
    pub path: String,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Animation sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSampler {
    /// Input accessor (time).
    pub input: usize,
    /// Output accessor (values).
    pub output: usize,
    /// Interpolation ("LINEAR", "STEP", "CUBICSPLINE").
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

fn default_interpolation() -> String {
    "LINEAR".to_string()
}

/// A skin for skeletal animation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    /// Skin name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Inverse bind matrices accessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverse_bind_matrices: Option<usize>,
    /// Skeleton root node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<usize>,
    /// Joint node indices.
    #[serde(default)]
    pub joints: Vec<usize>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// A camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// Camera name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Camera type ("perspective" or "orthographic").
    #[serde(rename = "type")]
    pub camera_type: String,
    /// Perspective camera properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perspective: Option<PerspectiveCamera>,
    /// Orthographic camera properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orthographic: Option<OrthographicCamera>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: Extensions,
    /// Application-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Perspective camera properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveCamera {
    /// Aspect ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    /// Vertical FOV in radians.
    pub yfov: f32,
    /// Near clipping plane.
    pub znear: f32,
    /// Far clipping plane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zfar: Option<f32>,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Orthographic camera properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrthographicCamera {
    /// Horizontal magnification.
    pub xmag: f32,
    /// Vertical magnification.
    pub ymag: f32,
    /// Near clipping plane.
    pub znear: f32,
    /// Far clipping plane.
    pub zfar: f32,
    /// Members this model does not know about.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_black(value: &[f32; 3]) -> bool {
    *value == [0.0, 0.0, 0.0]
}
