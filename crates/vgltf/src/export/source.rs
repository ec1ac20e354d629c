//! The external scene graph an export reads from.

use std::hash::Hash;

use glam::{Mat4, Quat, Vec3};

use super::ExporterContext;
use crate::error::BoxError;
use crate::schema::{AlphaMode, MimeType, Node, PrimitiveMode, Sampler};

/// Read access to a host scene graph.
///
/// Mesh, material, texture and image handles identify shared resources:
/// two objects returning equal handles share one exported entity.
pub trait SceneSource {
    type Object: Clone;
    type Mesh: Clone + Eq + Hash;
    type Material: Clone + Eq + Hash;
    type Texture: Clone + Eq + Hash;
    type Image: Clone + Eq + Hash;

    /// Children of `object`, in order.
    fn children(&self, object: &Self::Object) -> Vec<Self::Object>;

    fn node(&self, object: &Self::Object) -> NodeDescription;

    fn mesh(&self, object: &Self::Object) -> Option<Self::Mesh>;

    fn mesh_data(&self, mesh: &Self::Mesh) -> Result<MeshData<Self::Material>, BoxError>;

    fn material_data(&self, material: &Self::Material) -> Result<MaterialData<Self::Texture>, BoxError>;

    fn texture_data(&self, texture: &Self::Texture) -> Result<TextureData<Self::Image>, BoxError>;

    /// Already-encoded image bytes.
    fn image_data(&self, image: &Self::Image) -> Result<ImageData, BoxError>;
}

/// Local transform of an exported node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Transform {
    #[default]
    Identity,
    Trs {
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    },
    Matrix(Mat4),
}

impl Transform {
    /// Translation, rotation and scale, decomposing a matrix if needed.
    pub fn to_trs(&self) -> (Vec3, Quat, Vec3) {
        match *self {
            Self::Identity => (Vec3::ZERO, Quat::IDENTITY, Vec3::ONE),
            Self::Trs {
                translation,
                rotation,
                scale,
            } => (translation, rotation, scale),
            Self::Matrix(matrix) => {
                let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
                (translation, rotation, scale)
            }
        }
    }

    /// Write TRS properties onto `node`, omitting default values.
    pub fn apply(&self, node: &mut Node) {
        let (translation, rotation, scale) = self.to_trs();
        node.translation = (translation != Vec3::ZERO).then(|| translation.to_array());
        node.rotation = (rotation != Quat::IDENTITY).then(|| rotation.to_array());
        node.scale = (scale != Vec3::ONE).then(|| scale.to_array());
        node.matrix = None;
    }
}

/// Name and transform of an exported node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDescription {
    pub name: Option<String>,
    pub transform: Transform,
}

/// Geometry of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData<M> {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveSource<M>>,
}

/// Vertex streams of one primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSource<M> {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 4]>>,
    /// TEXCOORD_0, TEXCOORD_1, ...
    pub tex_coords: Vec<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    pub indices: Option<Vec<u32>>,
    pub mode: PrimitiveMode,
    pub material: Option<M>,
}

impl<M> PrimitiveSource<M> {
    /// Triangles with positions only.
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            normals: None,
            tangents: None,
            tex_coords: Vec::new(),
            colors: None,
            indices: None,
            mode: PrimitiveMode::Triangles,
            material: None,
        }
    }
}

/// PBR metallic-roughness parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData<T> {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<T>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<T>,
    pub normal_texture: Option<T>,
    pub occlusion_texture: Option<T>,
    pub emissive_texture: Option<T>,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
}

impl<T> Default for MaterialData<T> {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0; 4],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            emissive_factor: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureData<I> {
    pub name: Option<String>,
    /// `None` exports an untextured texture.
    pub image: Option<I>,
    pub sampler: Option<Sampler>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub name: Option<String>,
    pub mime_type: MimeType,
    pub bytes: Vec<u8>,
}

/// Runs after the node graph has been exported, in registration order.
pub trait PostExportHook<S: SceneSource> {
    fn name(&self) -> &str;

    fn post_export(
        &mut self,
        ctx: &mut ExporterContext<S>,
        source: &S,
        root: &S::Object,
    ) -> Result<(), BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_decomposes_to_trs() {
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(1.0, 0.0, -3.0),
        );
        let mut node = Node::default();
        Transform::Matrix(matrix).apply(&mut node);
        assert_eq!(node.translation, Some([1.0, 0.0, -3.0]));
        assert_eq!(node.rotation, None);
        assert_eq!(node.scale, Some([2.0, 2.0, 2.0]));
        assert_eq!(node.matrix, None);
    }

    #[test]
    fn test_identity_omits_everything() {
        let mut node = Node::default();
        Transform::Identity.apply(&mut node);
        assert!(!node.has_trs());
    }
}
