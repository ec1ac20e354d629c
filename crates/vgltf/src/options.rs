//! Session and codec options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::slicer::{TimeSlicer, Unbounded, WallClockSlicer, WorkUnitSlicer};

/// Which time slicer a session uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlicerConfig {
    /// Finish in a single step.
    #[default]
    Unbounded,
    /// Yield after this many nodes per step.
    WorkUnits(usize),
    /// Yield once a step has run for this long.
    WallClock { budget_micros: u64 },
}

impl SlicerConfig {
    pub fn build(&self) -> Box<dyn TimeSlicer> {
        match *self {
            Self::Unbounded => Box::new(Unbounded),
            Self::WorkUnits(budget) => Box::new(WorkUnitSlicer::new(budget)),
            Self::WallClock { budget_micros } => {
                Box::new(WallClockSlicer::new(Duration::from_micros(budget_micros)))
            }
        }
    }
}

/// Options for an import session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Scene to import. Defaults to the document's `scene`, then scene 0.
    pub scene: Option<usize>,
    /// Cooperative yielding policy.
    pub slicer: SlicerConfig,
    /// Validate the document when decoding.
    pub validate: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            scene: None,
            slicer: SlicerConfig::Unbounded,
            validate: true,
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, scene: usize) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn with_slicer(mut self, slicer: SlicerConfig) -> Self {
        self.slicer = slicer;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Options for an export session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Export the root's children as scene roots instead of the root itself.
    pub use_children: bool,
    /// Written to `asset.generator`.
    pub generator: String,
    /// Cooperative yielding policy.
    pub slicer: SlicerConfig,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            use_children: true,
            generator: "vgltf".to_string(),
            slicer: SlicerConfig::Unbounded,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_use_children(mut self, use_children: bool) -> Self {
        self.use_children = use_children;
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    pub fn with_slicer(mut self, slicer: SlicerConfig) -> Self {
        self.slicer = slicer;
        self
    }
}

/// Options for the bare JSON container form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOptions {
    /// Pretty-print the JSON.
    pub pretty: bool,
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slicer::SliceState;

    #[test]
    fn test_defaults() {
        let import = ImportOptions::default();
        assert!(import.validate);
        assert_eq!(import.scene, None);

        let export = ExportOptions::new();
        assert!(export.use_children);
        assert_eq!(export.generator, "vgltf");
        assert_eq!(export.slicer, SlicerConfig::Unbounded);
    }

    #[test]
    fn test_builder() {
        let options = ExportOptions::new()
            .with_use_children(false)
            .with_generator("tool")
            .with_slicer(SlicerConfig::WorkUnits(8));
        assert!(!options.use_children);
        assert_eq!(options.generator, "tool");
        assert_eq!(options.slicer, SlicerConfig::WorkUnits(8));
    }

    #[test]
    fn test_slicer_build() {
        let mut slicer = SlicerConfig::WorkUnits(1).build();
        slicer.reset();
        assert_eq!(slicer.tick(), SliceState::Yield);
    }

    #[test]
    fn test_options_serde() {
        let options = ImportOptions::new()
            .with_scene(1)
            .with_slicer(SlicerConfig::WallClock { budget_micros: 500 });
        let json = serde_json::to_string(&options).unwrap();
        let back: ImportOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
