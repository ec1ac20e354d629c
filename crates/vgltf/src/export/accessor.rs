//! Writing vertex and index streams as accessors.

use super::{ExporterContext, SceneSource};
use crate::buffer::ViewUsage;
use crate::error::{Result, VgltfError};
use crate::schema::{Accessor, AccessorType, ComponentType};

impl<S: SceneSource> ExporterContext<S> {
    /// Add a VEC3 float accessor, optionally with per-component min/max
    /// (required for POSITION).
    ///
    /// Every `add_accessor_*` fails on empty data: accessors hold at least
    /// one element.
    pub fn add_accessor_vec3(&mut self, data: &[[f32; 3]], bounds: bool) -> Result<usize> {
        let bounds = bounds.then(|| component_bounds(data)).flatten();
        self.add_float_accessor(&flatten(data), AccessorType::Vec3, data.len(), bounds)
    }

    /// Add a VEC2 float accessor (texcoords).
    pub fn add_accessor_vec2(&mut self, data: &[[f32; 2]]) -> Result<usize> {
        self.add_float_accessor(&flatten(data), AccessorType::Vec2, data.len(), None)
    }

    /// Add a VEC4 float accessor (tangents, colors).
    pub fn add_accessor_vec4(&mut self, data: &[[f32; 4]]) -> Result<usize> {
        self.add_float_accessor(&flatten(data), AccessorType::Vec4, data.len(), None)
    }

    /// Add an index accessor, as u16 when every index fits and u32 otherwise.
    pub fn add_accessor_indices(&mut self, indices: &[u32]) -> Result<usize> {
        self.check_not_empty(indices.len())?;
        let max_index = indices.iter().copied().max().unwrap_or(0);

        let (component, bytes): (ComponentType, Vec<u8>) = if max_index <= u16::MAX as u32 {
            (
                ComponentType::UnsignedShort,
                indices.iter().flat_map(|&i| (i as u16).to_le_bytes()).collect(),
            )
        } else {
            (
                ComponentType::UnsignedInt,
                indices.iter().flat_map(|&i| i.to_le_bytes()).collect(),
            )
        };

        let view = self.buffer.add_view(&bytes, ViewUsage::Index { component });
        Ok(self
            .gltf
            .add_accessor(Accessor::new(view, component, AccessorType::Scalar, indices.len())))
    }

    fn check_not_empty(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(VgltfError::schema(
                format!("accessors[{}].count", self.gltf.accessors.len()),
                "accessor must hold at least 1 element",
            ));
        }
        Ok(())
    }

    fn add_float_accessor(
        &mut self,
        components: &[f32],
        accessor_type: AccessorType,
        count: usize,
        bounds: Option<(Vec<f64>, Vec<f64>)>,
    ) -> Result<usize> {
        self.check_not_empty(count)?;
        let bytes: Vec<u8> = components.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.buffer.add_view(
            &bytes,
            ViewUsage::Vertex {
                component: ComponentType::Float,
                stride: None,
            },
        );

        let mut accessor = Accessor::new(view, ComponentType::Float, accessor_type, count);
        if let Some((min, max)) = bounds {
            accessor.min = Some(min);
            accessor.max = Some(max);
        }
        Ok(self.gltf.add_accessor(accessor))
    }
}

fn flatten<const N: usize>(data: &[[f32; N]]) -> Vec<f32> {
    data.iter().flatten().copied().collect()
}

fn component_bounds<const N: usize>(data: &[[f32; N]]) -> Option<(Vec<f64>, Vec<f64>)> {
    let first = data.first()?;
    let mut min = *first;
    let mut max = *first;
    for v in data {
        for c in 0..N {
            min[c] = min[c].min(v[c]);
            max[c] = max[c].max(v[c]);
        }
    }
    Some((
        min.iter().map(|&v| v as f64).collect(),
        max.iter().map(|&v| v as f64).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let (min, max) = component_bounds(&[[1.0, -2.0, 3.0], [-1.0, 5.0, 0.5]]).unwrap();
        assert_eq!(min, vec![-1.0, -2.0, 0.5]);
        assert_eq!(max, vec![1.0, 5.0, 3.0]);
        assert!(component_bounds::<3>(&[]).is_none());
    }
}
