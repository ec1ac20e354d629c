//! glTF 2.0 and GLB import/export core.
//!
//! This crate provides:
//! - a typed, validated model of the glTF 2.0 JSON document ([`schema`])
//! - GLB and bare-JSON container codecs ([`container`])
//! - a builder packing binary payloads into aligned buffer views ([`buffer`])
//! - lazy decoding of buffers, images and accessors ([`store`])
//! - resumable import and export sessions driven by collaborator traits
//!   ([`import`], [`export`]) with per-session memoization ([`cache`]) and
//!   cooperative time slicing ([`slicer`])
//!
//! # Example
//!
//! ```ignore
//! use vgltf::{GltfContainer, ImportOptions, Importer};
//!
//! let container = GltfContainer::from_bytes(&data)?;
//! let mut importer = Importer::new(container, my_bridge, ImportOptions::default())?;
//! importer.run()?;
//! let scene = importer.finish()?;
//! ```

pub mod buffer;
pub mod cache;
pub mod container;
pub mod error;
pub mod export;
pub mod import;
pub mod options;
pub mod schema;
pub mod slicer;
pub mod store;

pub use buffer::{BufferBuilder, ViewUsage};
pub use cache::{cache_object_if_not_exists, CacheTable, IndexedResource, ResourceCache, ResourceKind};
pub use container::{ContainerKind, GltfContainer, StoredBuffer};
pub use error::{BoxError, Result, VgltfError};
pub use export::{Exporter, ExporterContext, PostExportHook, SceneSource};
pub use import::{ImportBridge, ImportedScene, Importer, ImporterContext, PostImportHook};
pub use options::{ContainerOptions, ExportOptions, ImportOptions, SlicerConfig};
pub use schema::Gltf;
pub use slicer::{Progress, SliceState, TimeSlicer};
pub use store::{AccessorData, ImageResource, ResourcesStore};
