//! Writing the `VRM` extension at the end of an export.

use tracing::debug;
use vgltf::{BoxError, ExporterContext, IndexedResource, PostExportHook, SceneSource};

use crate::error::VrmError;
use crate::types::{MaterialProperty, Vrm};

/// Engine-side knowledge the exporter cannot derive from the glTF graph.
pub trait VrmExportBridge<S: SceneSource> {
    /// Fill `vrm.meta`, `vrm.humanoid` and the other avatar-level blocks.
    ///
    /// Textures needed by the meta (the thumbnail) can be exported through
    /// `ctx`.
    fn export_meta(
        &mut self,
        ctx: &mut ExporterContext<S>,
        vrm: &mut Vrm,
        source: &S,
        root: &S::Object,
    ) -> Result<(), BoxError>;

    /// Shader parameters for one exported material.
    fn material_property(
        &mut self,
        ctx: &mut ExporterContext<S>,
        vrm: &mut Vrm,
        material: &IndexedResource<S::Material>,
    ) -> Result<MaterialProperty, BoxError>;
}

/// Post-export hook adding the `VRM` extension.
pub struct VrmExportHook<V> {
    bridge: V,
    exporter_version: String,
}

impl<V> VrmExportHook<V> {
    pub fn new(bridge: V) -> Self {
        Self {
            bridge,
            exporter_version: format!("vgltf-vrm0-{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_exporter_version(mut self, version: impl Into<String>) -> Self {
        self.exporter_version = version.into();
        self
    }

    pub fn bridge(&self) -> &V {
        &self.bridge
    }
}

impl<S, V> PostExportHook<S> for VrmExportHook<V>
where
    S: SceneSource,
    V: VrmExportBridge<S>,
{
    fn name(&self) -> &str {
        crate::EXTENSION_NAME
    }

    fn post_export(&mut self, ctx: &mut ExporterContext<S>, source: &S, root: &S::Object) -> Result<(), BoxError> {
        let mut vrm = Vrm {
            exporter_version: Some(self.exporter_version.clone()),
            spec_version: Some("0.0".to_string()),
            ..Default::default()
        };
        self.bridge
            .export_meta(ctx, &mut vrm, source, root)
            .map_err(VrmError::Bridge)?;

        let mut materials: Vec<IndexedResource<S::Material>> = ctx.materials.values().cloned().collect();
        materials.sort_by_key(|m| m.index);
        for material in &materials {
            let property = self
                .bridge
                .material_property(ctx, &mut vrm, material)
                .map_err(VrmError::Bridge)?;
            vrm.material_properties.push(property);
        }

        vrm.validate(&ctx.gltf)?;
        vrm.write_to(&mut ctx.gltf)?;
        debug!(
            bones = vrm.humanoid.human_bones.len(),
            materials = vrm.material_properties.len(),
            "wrote VRM extension"
        );
        Ok(())
    }
}
