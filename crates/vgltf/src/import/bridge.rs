//! Collaborator interfaces for building runtime resources from a document.

use std::rc::Rc;

use indexmap::IndexMap;

use super::ImporterContext;
use crate::cache::IndexedResource;
use crate::error::BoxError;
use crate::schema::{Material, Mesh, Node, PrimitiveMode, Sampler, Texture};
use crate::store::{AccessorData, ImageResource};

/// Builds engine-side resources for glTF entities.
///
/// Each constructor is called at most once per index per session; the
/// importer memoizes the results and hands shared handles to dependents.
pub trait ImportBridge {
    type Node;
    type Mesh;
    type Material;
    type Texture;
    type Image;

    fn create_image(&mut self, index: usize, image: &ImageResource) -> Result<Self::Image, BoxError>;

    /// `image` is `None` when the texture has no source.
    fn create_texture(
        &mut self,
        index: usize,
        texture: &Texture,
        image: Option<IndexedResource<Self::Image>>,
        sampler: Option<&Sampler>,
    ) -> Result<Self::Texture, BoxError>;

    fn create_material(
        &mut self,
        index: usize,
        material: &Material,
        textures: &MaterialTextures<Self::Texture>,
    ) -> Result<Self::Material, BoxError>;

    fn create_mesh(
        &mut self,
        index: usize,
        mesh: &Mesh,
        primitives: &[PrimitiveData<Self::Material>],
    ) -> Result<Self::Mesh, BoxError>;

    fn create_node(
        &mut self,
        index: usize,
        node: &Node,
        mesh: Option<IndexedResource<Self::Mesh>>,
    ) -> Result<Self::Node, BoxError>;

    /// Link `child` under `parent`. Called once per edge, parent first.
    fn attach_child(
        &mut self,
        parent: &IndexedResource<Self::Node>,
        child: &IndexedResource<Self::Node>,
    ) -> Result<(), BoxError>;
}

/// Resolved texture slots of a material. Absent slots are `None`.
#[derive(Debug)]
pub struct MaterialTextures<T> {
    pub base_color: Option<IndexedResource<T>>,
    pub metallic_roughness: Option<IndexedResource<T>>,
    pub normal: Option<IndexedResource<T>>,
    pub occlusion: Option<IndexedResource<T>>,
    pub emissive: Option<IndexedResource<T>>,
}

impl<T> Default for MaterialTextures<T> {
    fn default() -> Self {
        Self {
            base_color: None,
            metallic_roughness: None,
            normal: None,
            occlusion: None,
            emissive: None,
        }
    }
}

impl<T> MaterialTextures<T> {
    /// Filled slots, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedResource<T>> {
        [
            &self.base_color,
            &self.metallic_roughness,
            &self.normal,
            &self.occlusion,
            &self.emissive,
        ]
        .into_iter()
        .flatten()
    }
}

/// A mesh primitive with its accessors and material resolved.
#[derive(Debug)]
pub struct PrimitiveData<M> {
    pub attributes: IndexMap<String, Rc<AccessorData>>,
    pub indices: Option<Rc<AccessorData>>,
    pub mode: PrimitiveMode,
    pub material: Option<IndexedResource<M>>,
    pub targets: Vec<IndexMap<String, Rc<AccessorData>>>,
}

impl<M> PrimitiveData<M> {
    /// The POSITION attribute, which every primitive carries.
    pub fn positions(&self) -> Option<&Rc<AccessorData>> {
        self.attributes.get("POSITION")
    }
}

/// Runs after the node graph has been imported, in registration order.
pub trait PostImportHook<B: ImportBridge> {
    fn name(&self) -> &str;

    fn post_import(&mut self, ctx: &mut ImporterContext<B>, bridge: &mut B) -> Result<(), BoxError>;
}
