//! VRM 0.x extension schema.
//!
//! Only the parts an engine bridge commonly touches are typed. Everything
//! else (first person settings, blend shapes, spring bones, unmodelled keys)
//! is kept as raw JSON so a document survives a read/write cycle.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vgltf::Gltf;

use crate::error::{check_index, Result, VrmError};

/// Key of the extension in `extensions` and `extensionsUsed`.
pub const EXTENSION_NAME: &str = "VRM";

/// Root of the `VRM` extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vrm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exporter_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub humanoid: Humanoid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_person: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend_shape_master: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_animation: Option<Value>,
    /// One entry per glTF material, in material index order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub material_properties: Vec<MaterialProperty>,
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Avatar metadata and license terms.
///
/// The `*_ussage_name` spellings are the wire names VRM 0.x uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_information: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Thumbnail, as a glTF texture index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violent_ussage_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sexual_ussage_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commercial_ussage_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_permission_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_license_url: Option<String>,
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

/// Mapping of humanoid bones onto glTF nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Humanoid {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub human_bones: Vec<HumanBone>,
    /// Arm stretch, twist limits and the like.
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl Humanoid {
    /// Node mapped to `bone`, e.g. `"hips"`.
    pub fn node_of(&self, bone: &str) -> Option<usize> {
        self.human_bones.iter().find(|b| b.bone == bone).map(|b| b.node)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanBone {
    pub bone: String,
    pub node: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_default_values: Option<bool>,
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl HumanBone {
    pub fn new(bone: impl Into<String>, node: usize) -> Self {
        Self {
            bone: bone.into(),
            node,
            use_default_values: Some(true),
            unknown: IndexMap::new(),
        }
    }
}

/// Shader parameters of one material (MToon or a fallback shader).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub shader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_queue: Option<i32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub float_properties: IndexMap<String, f32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub vector_properties: IndexMap<String, Vec<f32>>,
    /// Texture slots, as glTF texture indices.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub texture_properties: IndexMap<String, usize>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub keyword_map: IndexMap<String, bool>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tag_map: IndexMap<String, String>,
    #[serde(flatten)]
    pub unknown: IndexMap<String, Value>,
}

impl MaterialProperty {
    /// Shader name VRM readers treat as "use the glTF material as is".
    pub const UNSUPPORTED_SHADER: &'static str = "VRM_USE_GLTFSHADER";

    pub fn new(name: Option<String>, shader: impl Into<String>) -> Self {
        Self {
            name,
            shader: shader.into(),
            render_queue: None,
            float_properties: IndexMap::new(),
            vector_properties: IndexMap::new(),
            texture_properties: IndexMap::new(),
            keyword_map: IndexMap::new(),
            tag_map: IndexMap::new(),
            unknown: IndexMap::new(),
        }
    }

    /// A property deferring to the glTF material.
    pub fn gltf_fallback(name: Option<String>) -> Self {
        Self::new(name, Self::UNSUPPORTED_SHADER)
    }
}

impl Vrm {
    /// Parse the extension from `gltf`, if present.
    pub fn from_gltf(gltf: &Gltf) -> Result<Option<Self>> {
        match gltf.extensions.get(EXTENSION_NAME) {
            Some(value) => Ok(Some(Self::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// Store the extension on `gltf` and list it in `extensionsUsed`.
    pub fn write_to(&self, gltf: &mut Gltf) -> Result<()> {
        gltf.extensions
            .insert(EXTENSION_NAME.to_string(), serde_json::to_value(self)?);
        gltf.use_extension(EXTENSION_NAME);
        Ok(())
    }

    /// Check every node and texture index against `gltf`.
    pub fn validate(&self, gltf: &Gltf) -> Result<()> {
        let mut bones = HashSet::new();
        for (i, bone) in self.humanoid.human_bones.iter().enumerate() {
            check_index(format!("humanoid.humanBones[{i}].node"), bone.node, gltf.nodes.len(), "nodes")?;
            if !bones.insert(bone.bone.as_str()) {
                return Err(VrmError::DuplicateBone(bone.bone.clone()));
            }
        }

        if let Some(texture) = self.meta.texture {
            check_index("meta.texture", texture, gltf.textures.len(), "textures")?;
        }

        for (i, property) in self.material_properties.iter().enumerate() {
            for (slot, &texture) in &property.texture_properties {
                check_index(
                    format!("materialProperties[{i}].textureProperties.{slot}"),
                    texture,
                    gltf.textures.len(),
                    "textures",
                )?;
            }
        }
        Ok(())
    }
}
