//! VRM 0.x support for vgltf.
//!
//! The `VRM` extension is read and written by post-import and post-export
//! hooks, so the core orchestrators need no knowledge of it:
//!
//! ```ignore
//! let mut exporter = Exporter::new(ExportOptions::default());
//! exporter.add_hook(Box::new(VrmExportHook::new(my_vrm_bridge)));
//! ```

pub mod error;
pub mod export;
pub mod import;
pub mod types;

pub use error::{Result, VrmError};
pub use export::{VrmExportBridge, VrmExportHook};
pub use import::{VrmImportBridge, VrmImportHook};
pub use types::{HumanBone, Humanoid, MaterialProperty, Meta, Vrm, EXTENSION_NAME};
