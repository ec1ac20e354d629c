//! Structural validation of a glTF document.

use super::{
    AccessorType, AlphaMode, BufferTarget, ComponentType, Gltf, ImageSource, PrimitiveMode,
    MAG_FILTERS, MAX_UNBACKED_ACCESSOR_BYTES, MIN_FILTERS, WRAP_MODES,
};
use crate::error::{Result, VgltfError};

impl Gltf {
    /// Check the constraints of the glTF 2.0 schema that serde cannot express.
    ///
    /// Fails with the first violation found. Out-of-bounds indices are
    /// [`VgltfError::Reference`]; everything else is a
    /// [`VgltfError::SchemaViolation`].
    pub fn validate(&self) -> Result<()> {
        self.validate_asset()?;
        self.validate_scenes()?;
        self.validate_nodes()?;
        self.validate_meshes()?;
        self.validate_buffers()?;
        self.validate_accessors()?;
        self.validate_materials()?;
        self.validate_textures()?;
        self.validate_skins_and_animations()?;
        self.validate_node_graph()
    }

    fn validate_asset(&self) -> Result<()> {
        let version = &self.asset.version;
        let well_formed = version
            .split_once('.')
            .map(|(major, minor)| is_number(major) && is_number(minor))
            .unwrap_or(false);
        if !well_formed {
            return Err(VgltfError::schema(
                "asset.version",
                format!("expected `major.minor`, got {version:?}"),
            ));
        }
        Ok(())
    }

    fn validate_scenes(&self) -> Result<()> {
        if let Some(scene) = self.scene {
            check_ref("scene", scene, self.scenes.len(), "scenes")?;
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            for (j, &node) in scene.nodes.iter().enumerate() {
                check_ref(format!("scenes[{i}].nodes[{j}]"), node, self.nodes.len(), "nodes")?;
            }
        }
        Ok(())
    }

    fn validate_nodes(&self) -> Result<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            let path = format!("nodes[{i}]");
            if node.matrix.is_some() && node.has_trs() {
                return Err(VgltfError::schema(
                    path,
                    "`matrix` and `translation`/`rotation`/`scale` are mutually exclusive",
                ));
            }
            for (j, &child) in node.children.iter().enumerate() {
                check_ref(format!("{path}.children[{j}]"), child, self.nodes.len(), "nodes")?;
            }
            if let Some(mesh) = node.mesh {
                check_ref(format!("{path}.mesh"), mesh, self.meshes.len(), "meshes")?;
            }
            if let Some(camera) = node.camera {
                check_ref(format!("{path}.camera"), camera, self.cameras.len(), "cameras")?;
            }
            if let Some(skin) = node.skin {
                check_ref(format!("{path}.skin"), skin, self.skins.len(), "skins")?;
            }
            if let Some(weights) = &node.weights {
                check_min_items(format!("{path}.weights"), weights.len())?;
            }
        }
        Ok(())
    }

    fn validate_meshes(&self) -> Result<()> {
        for (i, mesh) in self.meshes.iter().enumerate() {
            let path = format!("meshes[{i}]");
            check_min_items(format!("{path}.primitives"), mesh.primitives.len())?;
            if let Some(weights) = &mesh.weights {
                check_min_items(format!("{path}.weights"), weights.len())?;
            }
            for (p, primitive) in mesh.primitives.iter().enumerate() {
                let path = format!("{path}.primitives[{p}]");
                if PrimitiveMode::from_gl(primitive.mode).is_none() {
                    return Err(VgltfError::schema(
                        format!("{path}.mode"),
                        format!("invalid primitive mode {}", primitive.mode),
                    ));
                }
                for (name, &accessor) in &primitive.attributes {
                    check_ref(
                        format!("{path}.attributes.{name}"),
                        accessor,
                        self.accessors.len(),
                        "accessors",
                    )?;
                    if self.accessors[accessor].byte_offset % 4 != 0 {
                        return Err(VgltfError::schema(
                            format!("accessors[{accessor}].byteOffset"),
                            "vertex attribute offset must be a multiple of 4",
                        ));
                    }
                }
                if let Some(indices) = primitive.indices {
                    check_ref(format!("{path}.indices"), indices, self.accessors.len(), "accessors")?;
                }
                if let Some(material) = primitive.material {
                    check_ref(format!("{path}.material"), material, self.materials.len(), "materials")?;
                }
                for (t, target) in primitive.targets.iter().enumerate() {
                    for (name, &accessor) in target {
                        check_ref(
                            format!("{path}.targets[{t}].{name}"),
                            accessor,
                            self.accessors.len(),
                            "accessors",
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_buffers(&self) -> Result<()> {
        for (i, buffer) in self.buffers.iter().enumerate() {
            check_min_bytes(format!("buffers[{i}].byteLength"), buffer.byte_length)?;
        }
        for (i, view) in self.buffer_views.iter().enumerate() {
            let path = format!("bufferViews[{i}]");
            check_ref(format!("{path}.buffer"), view.buffer, self.buffers.len(), "buffers")?;
            check_min_bytes(format!("{path}.byteLength"), view.byte_length)?;
            let buffer_length = self.buffers[view.buffer].byte_length;
            if !view.range().is_some_and(|range| range.end <= buffer_length) {
                return Err(VgltfError::reference(
                    path,
                    format!(
                        "{} bytes at offset {} exceed buffer {} ({} bytes)",
                        view.byte_length, view.byte_offset, view.buffer, buffer_length
                    ),
                ));
            }
            if let Some(stride) = view.byte_stride {
                if !(4..=252).contains(&stride) || stride % 4 != 0 {
                    return Err(VgltfError::schema(
                        format!("{path}.byteStride"),
                        format!("stride {stride} must be a multiple of 4 in 4..=252"),
                    ));
                }
            }
            if let Some(target) = view.target {
                if BufferTarget::from_gl(target).is_none() {
                    return Err(VgltfError::schema(
                        format!("{path}.target"),
                        format!("invalid target {target}"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_accessors(&self) -> Result<()> {
        for (i, accessor) in self.accessors.iter().enumerate() {
            let path = format!("accessors[{i}]");
            let component = ComponentType::from_gl(accessor.component_type).ok_or_else(|| {
                VgltfError::schema(
                    format!("{path}.componentType"),
                    format!("invalid component type {}", accessor.component_type),
                )
            })?;
            let element = AccessorType::parse(&accessor.accessor_type).ok_or_else(|| {
                VgltfError::schema(
                    format!("{path}.type"),
                    format!("invalid accessor type {:?}", accessor.accessor_type),
                )
            })?;
            check_min_items(format!("{path}.count"), accessor.count)?;

            match accessor.buffer_view {
                Some(view_index) => {
                    check_ref(format!("{path}.bufferView"), view_index, self.buffer_views.len(), "bufferViews")?;
                    let view = &self.buffer_views[view_index];
                    let size = component.size();
                    if accessor.byte_offset % size != 0 || view.byte_offset % size != 0 {
                        return Err(VgltfError::schema(
                            format!("{path}.byteOffset"),
                            format!("offset must be aligned to the component size ({size})"),
                        ));
                    }
                    let end = accessor.view_end(view.byte_stride);
                    if !end.is_some_and(|end| end <= view.byte_length) {
                        return Err(VgltfError::schema(
                            path,
                            format!(
                                "{} {} elements at offset {} overrun view {} ({} bytes)",
                                accessor.count,
                                element.as_str(),
                                accessor.byte_offset,
                                view_index,
                                view.byte_length
                            ),
                        ));
                    }
                }
                None => {
                    if !accessor.byte_size().is_some_and(|n| n <= MAX_UNBACKED_ACCESSOR_BYTES) {
                        return Err(VgltfError::schema(
                            format!("{path}.count"),
                            format!(
                                "{} elements without a buffer view exceed {MAX_UNBACKED_ACCESSOR_BYTES} bytes",
                                accessor.count
                            ),
                        ));
                    }
                }
            }

            if let Some(sparse) = &accessor.sparse {
                let path = format!("{path}.sparse");
                check_min_items(format!("{path}.count"), sparse.count)?;
                if sparse.count > accessor.count {
                    return Err(VgltfError::schema(
                        format!("{path}.count"),
                        format!("{} substitutions for {} elements", sparse.count, accessor.count),
                    ));
                }
                let index_type = ComponentType::from_gl(sparse.indices.component_type)
                    .filter(|c| c.is_index())
                    .ok_or_else(|| {
                        VgltfError::schema(
                            format!("{path}.indices.componentType"),
                            format!("invalid index type {}", sparse.indices.component_type),
                        )
                    })?;
                self.check_sparse_block(
                    format!("{path}.indices"),
                    sparse.indices.buffer_view,
                    sparse.indices.byte_offset,
                    sparse.count.checked_mul(index_type.size()),
                )?;
                self.check_sparse_block(
                    format!("{path}.values"),
                    sparse.values.buffer_view,
                    sparse.values.byte_offset,
                    sparse.count.checked_mul(element.layout(component).stored_size()),
                )?;
            }
        }
        Ok(())
    }

    /// A sparse index or value block must lie inside its buffer view.
    fn check_sparse_block(&self, path: String, view: usize, offset: usize, len: Option<usize>) -> Result<()> {
        check_ref(format!("{path}.bufferView"), view, self.buffer_views.len(), "bufferViews")?;
        let view_length = self.buffer_views[view].byte_length;
        let end = len.and_then(|len| len.checked_add(offset));
        if !end.is_some_and(|end| end <= view_length) {
            return Err(VgltfError::schema(
                path,
                format!("block at offset {offset} overruns view {view} ({view_length} bytes)"),
            ));
        }
        Ok(())
    }

    fn validate_materials(&self) -> Result<()> {
        for (i, material) in self.materials.iter().enumerate() {
            let path = format!("materials[{i}]");
            if AlphaMode::parse(&material.alpha_mode).is_none() {
                return Err(VgltfError::schema(
                    format!("{path}.alphaMode"),
                    format!("invalid alpha mode {:?}", material.alpha_mode),
                ));
            }
            for (field, texture) in material.texture_refs() {
                check_ref(format!("{path}.{field}.index"), texture, self.textures.len(), "textures")?;
            }
        }
        Ok(())
    }

    fn validate_textures(&self) -> Result<()> {
        for (i, texture) in self.textures.iter().enumerate() {
            if let Some(sampler) = texture.sampler {
                check_ref(format!("textures[{i}].sampler"), sampler, self.samplers.len(), "samplers")?;
            }
            if let Some(source) = texture.source {
                check_ref(format!("textures[{i}].source"), source, self.images.len(), "images")?;
            }
        }
        for (i, image) in self.images.iter().enumerate() {
            if let ImageSource::BufferView(view) = image.source() {
                check_ref(format!("images[{i}].bufferView"), *view, self.buffer_views.len(), "bufferViews")?;
            }
        }
        for (i, sampler) in self.samplers.iter().enumerate() {
            let path = format!("samplers[{i}]");
            check_enum(format!("{path}.magFilter"), sampler.mag_filter, &MAG_FILTERS)?;
            check_enum(format!("{path}.minFilter"), sampler.min_filter, &MIN_FILTERS)?;
            check_enum(format!("{path}.wrapS"), Some(sampler.wrap_s), &WRAP_MODES)?;
            check_enum(format!("{path}.wrapT"), Some(sampler.wrap_t), &WRAP_MODES)?;
        }
        Ok(())
    }

    fn validate_skins_and_animations(&self) -> Result<()> {
        for (i, skin) in self.skins.iter().enumerate() {
            let path = format!("skins[{i}]");
            check_min_items(format!("{path}.joints"), skin.joints.len())?;
            for (j, &joint) in skin.joints.iter().enumerate() {
                check_ref(format!("{path}.joints[{j}]"), joint, self.nodes.len(), "nodes")?;
            }
            if let Some(skeleton) = skin.skeleton {
                check_ref(format!("{path}.skeleton"), skeleton, self.nodes.len(), "nodes")?;
            }
            if let Some(ibm) = skin.inverse_bind_matrices {
                check_ref(format!("{path}.inverseBindMatrices"), ibm, self.accessors.len(), "accessors")?;
            }
        }
        for (i, animation) in self.animations.iter().enumerate() {
            let path = format!("animations[{i}]");
            check_min_items(format!("{path}.channels"), animation.channels.len())?;
            check_min_items(format!("{path}.samplers"), animation.samplers.len())?;
            for (c, channel) in animation.channels.iter().enumerate() {
                check_ref(
                    format!("{path}.channels[{c}].sampler"),
                    channel.sampler,
                    animation.samplers.len(),
                    "samplers",
                )?;
                if let Some(node) = channel.target.node {
                    check_ref(format!("{path}.channels[{c}].target.node"), node, self.nodes.len(), "nodes")?;
                }
            }
            for (s, sampler) in animation.samplers.iter().enumerate() {
                check_ref(format!("{path}.samplers[{s}].input"), sampler.input, self.accessors.len(), "accessors")?;
                check_ref(format!("{path}.samplers[{s}].output"), sampler.output, self.accessors.len(), "accessors")?;
            }
        }
        Ok(())
    }

    /// Reject cycles in the `children` graph with an explicit-stack DFS.
    fn validate_node_graph(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnPath,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        for start in 0..self.nodes.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            // (node, next child position)
            let mut stack = vec![(start, 0usize)];
            marks[start] = Mark::OnPath;
            while let Some((node, next)) = stack.last_mut() {
                let children = &self.nodes[*node].children;
                if let Some(&child) = children.get(*next) {
                    *next += 1;
                    let mark = marks[child];
                    match mark {
                        Mark::OnPath => {
                            return Err(VgltfError::schema(
                                format!("nodes[{}].children", *node),
                                format!("node {child} is its own ancestor"),
                            ));
                        }
                        Mark::Unvisited => {
                            marks[child] = Mark::OnPath;
                            stack.push((child, 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[*node] = Mark::Done;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn check_ref(path: impl Into<String>, index: usize, len: usize, target: &str) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(VgltfError::reference(
            path,
            format!("index {index} out of bounds ({target} has {len})"),
        ))
    }
}

fn check_min_items(path: impl Into<String>, len: usize) -> Result<()> {
    if len == 0 {
        Err(VgltfError::schema(path, "expected at least 1 item"))
    } else {
        Ok(())
    }
}

fn check_min_bytes(path: impl Into<String>, len: usize) -> Result<()> {
    if len == 0 {
        Err(VgltfError::schema(path, "expected at least 1 byte"))
    } else {
        Ok(())
    }
}

fn check_enum(path: impl Into<String>, value: Option<u32>, allowed: &[u32]) -> Result<()> {
    match value {
        Some(v) if !allowed.contains(&v) => {
            Err(VgltfError::schema(path, format!("invalid value {v}")))
        }
        _ => Ok(()),
    }
}
