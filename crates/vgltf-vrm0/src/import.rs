//! Reading the `VRM` extension at the end of an import.

use tracing::debug;
use vgltf::{BoxError, ImportBridge, ImporterContext, PostImportHook};

use crate::error::VrmError;
use crate::types::Vrm;

/// Applies a parsed, validated `VRM` extension to the engine scene.
pub trait VrmImportBridge<B: ImportBridge> {
    /// Every node the scene reaches is already in `ctx.cache`; textures the
    /// extension names can be built on demand through `ctx.texture`.
    fn import_vrm(&mut self, ctx: &mut ImporterContext<B>, bridge: &mut B, vrm: &Vrm) -> Result<(), BoxError>;
}

/// Post-import hook reading the `VRM` extension.
pub struct VrmImportHook<V> {
    bridge: V,
    required: bool,
}

impl<V> VrmImportHook<V> {
    pub fn new(bridge: V) -> Self {
        Self { bridge, required: false }
    }

    /// Fail the import when the document carries no `VRM` extension.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn bridge(&self) -> &V {
        &self.bridge
    }
}

impl<B, V> PostImportHook<B> for VrmImportHook<V>
where
    B: ImportBridge,
    V: VrmImportBridge<B>,
{
    fn name(&self) -> &str {
        crate::EXTENSION_NAME
    }

    fn post_import(&mut self, ctx: &mut ImporterContext<B>, bridge: &mut B) -> Result<(), BoxError> {
        let Some(vrm) = Vrm::from_gltf(ctx.gltf())? else {
            if self.required {
                return Err(VrmError::Missing.into());
            }
            debug!("document has no VRM extension");
            return Ok(());
        };
        vrm.validate(ctx.gltf())?;
        debug!(
            bones = vrm.humanoid.human_bones.len(),
            materials = vrm.material_properties.len(),
            "read VRM extension"
        );
        self.bridge
            .import_vrm(ctx, bridge, &vrm)
            .map_err(|err| VrmError::Bridge(err).into())
    }
}
