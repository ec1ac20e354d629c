//! Lazy, memoized access to the binary resources a document references.
//!
//! The store never performs I/O: buffer 0 comes from the container payload,
//! data URIs are decoded in place, and any other URI must be handed in with
//! [`ResourcesStore::with_external`].

use std::collections::HashMap;
use std::ops::{Deref, Range};
use std::rc::Rc;

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::trace;

use crate::container::GltfContainer;
use crate::error::{Result, VgltfError};
use crate::schema::{
    Accessor, AccessorType, ComponentType, ElementLayout, Gltf, ImageSource, MAX_UNBACKED_ACCESSOR_BYTES,
};

/// A shared, zero-copy window into decoded bytes.
#[derive(Debug, Clone)]
pub struct ByteSlice {
    bytes: Rc<[u8]>,
    range: Range<usize>,
}

impl ByteSlice {
    fn whole(bytes: Rc<[u8]>) -> Self {
        let range = 0..bytes.len();
        Self { bytes, range }
    }
}

impl From<Vec<u8>> for ByteSlice {
    fn from(bytes: Vec<u8>) -> Self {
        Self::whole(bytes.into())
    }
}

impl Deref for ByteSlice {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes[self.range.clone()]
    }
}

impl PartialEq for ByteSlice {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

/// Encoded image bytes with their MIME type.
///
/// `bytes` is `None` for an external URI the caller did not supply; the
/// collaborator resolves `uri` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    pub mime_type: Option<String>,
    pub bytes: Option<ByteSlice>,
    pub uri: Option<String>,
}

/// Accessor contents, de-strided into tightly packed little-endian elements.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorData {
    pub index: usize,
    pub component_type: ComponentType,
    pub accessor_type: AccessorType,
    pub count: usize,
    pub normalized: bool,
    pub bytes: Vec<u8>,
}

/// Memoizing resolver for buffers, buffer views, images and accessors.
#[derive(Debug)]
pub struct ResourcesStore {
    gltf: Gltf,
    stored: Option<Rc<[u8]>>,
    external: HashMap<String, Rc<[u8]>>,
    buffers: HashMap<usize, Rc<[u8]>>,
    images: HashMap<usize, Rc<ImageResource>>,
    accessors: HashMap<usize, Rc<AccessorData>>,
}

impl ResourcesStore {
    /// Take ownership of a decoded container.
    pub fn new(container: GltfContainer) -> Self {
        Self {
            gltf: container.gltf,
            stored: container.buffer.map(|b| Rc::from(b.payload)),
            external: HashMap::new(),
            buffers: HashMap::new(),
            images: HashMap::new(),
            accessors: HashMap::new(),
        }
    }

    /// Supply bytes the caller loaded for a non-data URI.
    pub fn with_external(mut self, uri: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.external.insert(uri.into(), Rc::from(bytes));
        self
    }

    pub fn gltf(&self) -> &Gltf {
        &self.gltf
    }

    /// Decoded bytes of buffer `index`.
    pub fn buffer(&mut self, index: usize) -> Result<Rc<[u8]>> {
        if let Some(hit) = self.buffers.get(&index) {
            return Ok(Rc::clone(hit));
        }
        let path = format!("buffers[{index}]");
        let buffer = self
            .gltf
            .buffers
            .get(index)
            .ok_or_else(|| VgltfError::reference(&path, "no such buffer"))?;

        let bytes: Rc<[u8]> = match &buffer.uri {
            None if index == 0 => self
                .stored
                .clone()
                .ok_or_else(|| VgltfError::reference(&path, "no uri and no stored payload"))?,
            None => return Err(VgltfError::reference(&path, "only buffer 0 may omit its uri")),
            Some(uri) if uri.starts_with("data:") => Rc::from(decode_data_uri(uri)?.1),
            Some(uri) => self.external.get(uri).cloned().ok_or_else(|| {
                VgltfError::reference(&path, format!("external resource {uri:?} was not supplied"))
            })?,
        };
        if bytes.len() < buffer.byte_length {
            return Err(VgltfError::reference(
                path,
                format!("holds {} bytes but declares {}", bytes.len(), buffer.byte_length),
            ));
        }

        trace!(index, len = bytes.len(), "loaded buffer");
        self.buffers.insert(index, Rc::clone(&bytes));
        Ok(bytes)
    }

    /// Bytes of buffer view `index`.
    pub fn buffer_view(&mut self, index: usize) -> Result<ByteSlice> {
        let path = format!("bufferViews[{index}]");
        let view = self
            .gltf
            .buffer_views
            .get(index)
            .ok_or_else(|| VgltfError::reference(&path, "no such buffer view"))?;
        let (offset, length) = (view.byte_offset, view.byte_length);
        let range = view.range();
        let buffer_index = view.buffer;
        let bytes = self.buffer(buffer_index)?;
        match range {
            Some(range) if range.end <= bytes.len() => Ok(ByteSlice { bytes, range }),
            _ => Err(VgltfError::reference(
                path,
                format!(
                    "{length} bytes at offset {offset} exceed buffer {buffer_index} ({} bytes)",
                    bytes.len()
                ),
            )),
        }
    }

    /// Encoded bytes of image `index`.
    pub fn image(&mut self, index: usize) -> Result<Rc<ImageResource>> {
        if let Some(hit) = self.images.get(&index) {
            return Ok(Rc::clone(hit));
        }
        let image = self
            .gltf
            .images
            .get(index)
            .ok_or_else(|| VgltfError::reference(format!("images[{index}]"), "no such image"))?;
        let mime_type = image.mime_type.clone();

        let resource = match image.source().clone() {
            ImageSource::BufferView(view) => ImageResource {
                mime_type,
                bytes: Some(self.buffer_view(view)?),
                uri: None,
            },
            ImageSource::Uri(uri) if uri.starts_with("data:") => {
                let (media_type, bytes) = decode_data_uri(&uri)?;
                ImageResource {
                    mime_type: mime_type.or(media_type),
                    bytes: Some(ByteSlice::from(bytes)),
                    uri: None,
                }
            }
            ImageSource::Uri(uri) => ImageResource {
                mime_type,
                bytes: self.external.get(&uri).cloned().map(ByteSlice::whole),
                uri: Some(uri),
            },
        };

        let resource = Rc::new(resource);
        self.images.insert(index, Rc::clone(&resource));
        Ok(resource)
    }

    /// Packed contents of accessor `index`, with sparse substitution applied.
    pub fn accessor(&mut self, index: usize) -> Result<Rc<AccessorData>> {
        if let Some(hit) = self.accessors.get(&index) {
            return Ok(Rc::clone(hit));
        }
        let path = format!("accessors[{index}]");
        let accessor = self
            .gltf
            .accessors
            .get(index)
            .cloned()
            .ok_or_else(|| VgltfError::reference(&path, "no such accessor"))?;
        let (component_type, accessor_type) = typed(&accessor, &path)?;
        let layout = accessor_type.layout(component_type);
        let element_size = layout.packed_size();

        let mut bytes = match accessor.buffer_view {
            None => {
                let size = accessor
                    .byte_size()
                    .filter(|&n| n <= MAX_UNBACKED_ACCESSOR_BYTES)
                    .ok_or_else(|| {
                        VgltfError::schema(
                            format!("{path}.count"),
                            format!("{} elements without a buffer view are too many", accessor.count),
                        )
                    })?;
                vec![0u8; size]
            }
            Some(view_index) => {
                let stride = self.gltf.buffer_views.get(view_index).and_then(|v| v.byte_stride);
                let view = self.buffer_view(view_index)?;
                let stride = stride.unwrap_or(layout.stored_size());
                pack_elements(&view, accessor.byte_offset, accessor.count, stride, layout).ok_or_else(|| {
                    VgltfError::reference(&path, format!("elements overrun buffer view {view_index}"))
                })?
            }
        };

        if let Some(sparse) = &accessor.sparse {
            let index_type = ComponentType::from_gl(sparse.indices.component_type)
                .filter(|c| c.is_index())
                .ok_or_else(|| {
                    VgltfError::schema(format!("{path}.sparse.indices.componentType"), "invalid index type")
                })?;
            let index_view = self.buffer_view(sparse.indices.buffer_view)?;
            let value_view = self.buffer_view(sparse.values.buffer_view)?;

            let index_bytes = sparse
                .count
                .checked_mul(index_type.size())
                .and_then(|len| index_view.get(sparse.indices.byte_offset..sparse.indices.byte_offset.checked_add(len)?))
                .ok_or_else(|| VgltfError::reference(format!("{path}.sparse.indices"), "indices overrun their view"))?;
            let values = pack_elements(
                &value_view,
                sparse.values.byte_offset,
                sparse.count,
                layout.stored_size(),
                layout,
            )
            .ok_or_else(|| VgltfError::reference(format!("{path}.sparse.values"), "values overrun their view"))?;

            for (k, target) in decode_indices(index_bytes, index_type).into_iter().enumerate() {
                let target = target as usize;
                if target >= accessor.count {
                    return Err(VgltfError::reference(
                        format!("{path}.sparse.indices"),
                        format!("index {target} out of bounds ({} elements)", accessor.count),
                    ));
                }
                bytes[target * element_size..(target + 1) * element_size]
                    .copy_from_slice(&values[k * element_size..(k + 1) * element_size]);
            }
        }

        trace!(index, count = accessor.count, "loaded accessor");
        let data = Rc::new(AccessorData {
            index,
            component_type,
            accessor_type,
            count: accessor.count,
            normalized: accessor.normalized,
            bytes,
        });
        self.accessors.insert(index, Rc::clone(&data));
        Ok(data)
    }
}

/// Copy `count` elements starting at `offset` out of `view`, dropping the
/// gaps between strided elements and the padding after matrix columns.
///
/// Returns `None` when the elements do not fit inside `view`.
fn pack_elements(view: &[u8], offset: usize, count: usize, stride: usize, layout: ElementLayout) -> Option<Vec<u8>> {
    if count == 0 {
        return Some(Vec::new());
    }
    let end = (count - 1)
        .checked_mul(stride)?
        .checked_add(layout.stored_size())?
        .checked_add(offset)?;
    if end > view.len() {
        return None;
    }

    let mut packed = Vec::with_capacity(count * layout.packed_size());
    if !layout.is_padded() && stride == layout.stored_size() {
        packed.extend_from_slice(&view[offset..end]);
        return Some(packed);
    }
    for i in 0..count {
        let start = offset + i * stride;
        for column in 0..layout.columns {
            let at = start + column * layout.column_stride;
            packed.extend_from_slice(&view[at..at + layout.column_size]);
        }
    }
    Some(packed)
}

fn typed(accessor: &Accessor, path: &str) -> Result<(ComponentType, AccessorType)> {
    let component = accessor.component().ok_or_else(|| {
        VgltfError::schema(format!("{path}.componentType"), format!("invalid component type {}", accessor.component_type))
    })?;
    let element = accessor.element().ok_or_else(|| {
        VgltfError::schema(format!("{path}.type"), format!("invalid accessor type {:?}", accessor.accessor_type))
    })?;
    Ok((component, element))
}

/// Split a base64 data URI into its media type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| VgltfError::Unsupported(format!("not a data URI: {uri:.32}")))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| VgltfError::Unsupported("data URI without payload separator".into()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| VgltfError::Unsupported("only base64 data URIs are supported".into()))?;
    let media_type = (!media_type.is_empty()).then(|| media_type.to_string());
    Ok((media_type, STANDARD.decode(data)?))
}

fn decode_indices(bytes: &[u8], component: ComponentType) -> Vec<u32> {
    match component {
        ComponentType::UnsignedByte => bytes.iter().map(|&b| b as u32).collect(),
        ComponentType::UnsignedShort => bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
            .collect(),
        _ => bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    }
}

impl AccessorData {
    fn mismatch(&self, expected: &str) -> VgltfError {
        VgltfError::schema(
            format!("accessors[{}]", self.index),
            format!(
                "expected {expected}, found {} of {:?}",
                self.accessor_type.as_str(),
                self.component_type
            ),
        )
    }

    /// Every component as `f32`, normalized when the accessor says so.
    pub fn read_f32(&self) -> Vec<f32> {
        if self.normalized {
            self.read_normalized_f32()
        } else {
            self.components().map(|(raw, _)| raw).collect()
        }
    }

    /// Every component mapped to its normalized range (`[0, 1]` or `[-1, 1]`).
    /// Float components pass through.
    pub fn read_normalized_f32(&self) -> Vec<f32> {
        self.components().map(|(_, normalized)| normalized).collect()
    }

    pub fn read_vec2(&self) -> Result<Vec<[f32; 2]>> {
        self.read_vectors::<2>(AccessorType::Vec2)
    }

    pub fn read_vec3(&self) -> Result<Vec<[f32; 3]>> {
        self.read_vectors::<3>(AccessorType::Vec3)
    }

    pub fn read_vec4(&self) -> Result<Vec<[f32; 4]>> {
        self.read_vectors::<4>(AccessorType::Vec4)
    }

    fn read_vectors<const N: usize>(&self, expected: AccessorType) -> Result<Vec<[f32; N]>> {
        if self.accessor_type != expected {
            return Err(self.mismatch(expected.as_str()));
        }
        Ok(self
            .read_f32()
            .chunks_exact(N)
            .map(|c| {
                let mut out = [0.0; N];
                out.copy_from_slice(c);
                out
            })
            .collect())
    }

    /// Scalar unsigned integer indices widened to `u32`.
    pub fn read_indices(&self) -> Result<Vec<u32>> {
        if self.accessor_type != AccessorType::Scalar || !self.component_type.is_index() {
            return Err(self.mismatch("SCALAR unsigned integer indices"));
        }
        Ok(decode_indices(&self.bytes, self.component_type))
    }

    /// (raw value, normalized value) per component.
    fn components(&self) -> Box<dyn Iterator<Item = (f32, f32)> + '_> {
        let bytes = &self.bytes;
        match self.component_type {
            ComponentType::Byte => Box::new(bytes.iter().map(|&b| {
                let v = b as i8 as f32;
                (v, (v / 127.0).max(-1.0))
            })),
            ComponentType::UnsignedByte => Box::new(bytes.iter().map(|&b| (b as f32, b as f32 / 255.0))),
            ComponentType::Short => Box::new(bytes.chunks_exact(2).map(|c| {
                let v = i16::from_le_bytes([c[0], c[1]]) as f32;
                (v, (v / 32767.0).max(-1.0))
            })),
            ComponentType::UnsignedShort => Box::new(bytes.chunks_exact(2).map(|c| {
                let v = u16::from_le_bytes([c[0], c[1]]) as f32;
                (v, v / 65535.0)
            })),
            ComponentType::UnsignedInt => Box::new(bytes.chunks_exact(4).map(|c| {
                let v = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                (v as f32, (v as f64 / u32::MAX as f64) as f32)
            })),
            ComponentType::Float => Box::new(bytes.chunks_exact(4).map(|c| {
                let v = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                (v, v)
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AccessorSparse, Buffer, BufferView, Extensions, Image, MimeType, SparseIndices, SparseValues};

    fn view(offset: usize, length: usize, stride: Option<usize>) -> BufferView {
        BufferView {
            buffer: 0,
            byte_offset: offset,
            byte_length: length,
            byte_stride: stride,
            target: None,
            name: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: Default::default(),
        }
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_strided_accessor_is_packed() {
        // Two VEC3 positions interleaved with a 4-byte pad per element.
        let mut payload = floats(&[1.0, 2.0, 3.0]);
        payload.extend_from_slice(&[0xAA; 4]);
        payload.extend(floats(&[4.0, 5.0, 6.0]));
        payload.extend_from_slice(&[0xAA; 4]);

        let mut gltf = Gltf::new();
        gltf.buffers.push(Buffer::stored(payload.len()));
        gltf.buffer_views.push(view(0, 32, Some(16)));
        gltf.add_accessor(Accessor::new(0, ComponentType::Float, AccessorType::Vec3, 2));

        let mut store = ResourcesStore::new(GltfContainer::new(gltf).with_payload(payload));
        let data = store.accessor(0).unwrap();
        assert_eq!(data.bytes.len(), 24);
        assert_eq!(data.read_vec3().unwrap(), vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert!(data.read_vec2().is_err());
        assert!(Rc::ptr_eq(&data, &store.accessor(0).unwrap()));
    }

    #[test]
    fn test_zero_filled_and_sparse() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[1, 0, 3, 0]); // u16 indices 1, 3
        payload.extend(floats(&[7.0, 9.0]));

        let mut gltf = Gltf::new();
        gltf.buffers.push(Buffer::stored(payload.len()));
        gltf.buffer_views.push(view(0, 4, None));
        gltf.buffer_views.push(view(4, 8, None));
        let mut accessor = Accessor::new(0, ComponentType::Float, AccessorType::Scalar, 4);
        accessor.buffer_view = None;
        accessor.sparse = Some(AccessorSparse {
            count: 2,
            indices: SparseIndices {
                buffer_view: 0,
                byte_offset: 0,
                component_type: ComponentType::UnsignedShort as u32,
                unknown: Default::default(),
            },
            values: SparseValues {
                buffer_view: 1,
                byte_offset: 0,
                unknown: Default::default(),
            },
            unknown: Default::default(),
        });
        gltf.add_accessor(accessor);

        let mut store = ResourcesStore::new(GltfContainer::new(gltf).with_payload(payload));
        assert_eq!(store.accessor(0).unwrap().read_f32(), vec![0.0, 7.0, 0.0, 9.0]);
    }

    #[test]
    fn test_indices_and_normalization() {
        let data = AccessorData {
            index: 0,
            component_type: ComponentType::UnsignedShort,
            accessor_type: AccessorType::Scalar,
            count: 3,
            normalized: false,
            bytes: vec![0, 0, 1, 0, 255, 255],
        };
        assert_eq!(data.read_indices().unwrap(), vec![0, 1, 65535]);
        assert_eq!(data.read_normalized_f32(), vec![0.0, 1.0 / 65535.0, 1.0]);

        let colors = AccessorData {
            index: 1,
            component_type: ComponentType::UnsignedByte,
            accessor_type: AccessorType::Vec4,
            count: 1,
            normalized: true,
            bytes: vec![255, 0, 255, 0],
        };
        assert_eq!(colors.read_vec4().unwrap(), vec![[1.0, 0.0, 1.0, 0.0]]);
        assert!(colors.read_indices().is_err());

        let signed = AccessorData {
            index: 2,
            component_type: ComponentType::Byte,
            accessor_type: AccessorType::Scalar,
            count: 2,
            normalized: true,
            bytes: vec![0x80, 0x7F],
        };
        assert_eq!(signed.read_f32(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_data_uri_buffer_and_images() {
        let mut gltf = Gltf::new();
        gltf.buffers.push(Buffer {
            uri: Some(format!("data:application/octet-stream;base64,{}", STANDARD.encode([5u8, 6, 7, 8]))),
            ..Buffer::stored(4)
        });
        gltf.buffer_views.push(view(0, 4, None));
        gltf.add_image(Image::from_buffer_view(0, MimeType::ImagePng));
        gltf.add_image(Image::from_uri(format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpg"))));
        gltf.add_image(Image::from_uri("textures/skin.png"));
        gltf.add_image(Image::from_uri("textures/eyes.png"));

        let mut store = ResourcesStore::new(GltfContainer::new(gltf)).with_external("textures/eyes.png", b"eyes".to_vec());

        let packed = store.image(0).unwrap();
        assert_eq!(packed.mime_type.as_deref(), Some("image/png"));
        assert_eq!(packed.bytes.as_deref(), Some(&[5u8, 6, 7, 8][..]));

        let inline = store.image(1).unwrap();
        assert_eq!(inline.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(inline.bytes.as_deref(), Some(&b"jpg"[..]));

        let unresolved = store.image(2).unwrap();
        assert!(unresolved.bytes.is_none());
        assert_eq!(unresolved.uri.as_deref(), Some("textures/skin.png"));

        let supplied = store.image(3).unwrap();
        assert_eq!(supplied.bytes.as_deref(), Some(&b"eyes"[..]));

        assert!(Rc::ptr_eq(&packed, &store.image(0).unwrap()));
    }

    #[test]
    fn test_missing_resources_are_reference_errors() {
        let mut gltf = Gltf::new();
        gltf.buffers.push(Buffer::stored(4));
        gltf.buffers.push(Buffer {
            uri: Some("external.bin".into()),
            ..Buffer::stored(4)
        });
        let mut store = ResourcesStore::new(GltfContainer::new(gltf));
        assert!(matches!(store.buffer(0), Err(VgltfError::Reference { .. })));
        assert!(matches!(store.buffer(1), Err(VgltfError::Reference { .. })));
        assert!(matches!(store.buffer(2), Err(VgltfError::Reference { .. })));
        assert!(matches!(store.accessor(0), Err(VgltfError::Reference { .. })));
    }

    #[test]
    fn test_data_uri_forms() {
        assert_eq!(decode_data_uri("data:;base64,AQI=").unwrap(), (None, vec![1, 2]));
        assert!(matches!(
            decode_data_uri("data:text/plain,hello"),
            Err(VgltfError::Unsupported(_))
        ));
        assert!(matches!(
            decode_data_uri("data:application/octet-stream;base64,!!"),
            Err(VgltfError::Base64(_))
        ));
    }

    #[test]
    fn test_matrix_column_padding_is_dropped() {
        // One MAT2 of unsigned bytes: columns [1, 2] and [3, 4], each padded to 4 bytes.
        let payload = vec![1, 2, 0xEE, 0xEE, 3, 4, 0xEE, 0xEE];
        let mut gltf = Gltf::new();
        gltf.buffers.push(Buffer::stored(payload.len()));
        gltf.buffer_views.push(view(0, 8, None));
        gltf.add_accessor(Accessor::new(0, ComponentType::UnsignedByte, AccessorType::Mat2, 1));

        let mut store = ResourcesStore::new(GltfContainer::new(gltf).with_payload(payload));
        let data = store.accessor(0).unwrap();
        assert_eq!(data.bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_overflowing_ranges_are_errors() {
        let mut gltf = Gltf::new();
        gltf.buffers.push(Buffer::stored(12));
        gltf.buffer_views.push(view(usize::MAX, 2, None));
        gltf.buffer_views.push(view(0, 12, None));
        gltf.add_accessor(Accessor::new(1, ComponentType::Float, AccessorType::Vec3, usize::MAX / 8));
        let mut unbacked = Accessor::new(0, ComponentType::Float, AccessorType::Mat4, usize::MAX);
        unbacked.buffer_view = None;
        gltf.add_accessor(unbacked);

        let mut store = ResourcesStore::new(GltfContainer::new(gltf).with_payload(vec![0; 12]));
        assert!(matches!(store.buffer_view(0), Err(VgltfError::Reference { .. })));
        assert!(matches!(store.accessor(0), Err(VgltfError::Reference { .. })));
        assert!(matches!(store.accessor(1), Err(VgltfError::SchemaViolation { .. })));
    }
}
