//! Packing binary payloads into a single buffer with aligned views.

use crate::schema::{BufferTarget, BufferView, ComponentType, Extensions};

/// How a view's bytes will be consumed, which fixes its alignment and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewUsage {
    /// Opaque bytes such as encoded images.
    Raw,
    /// Vertex attribute data.
    Vertex {
        component: ComponentType,
        stride: Option<usize>,
    },
    /// Index data.
    Index { component: ComponentType },
}

impl ViewUsage {
    /// Required start alignment of the view.
    pub fn alignment(&self) -> usize {
        match self {
            Self::Raw => 4,
            Self::Vertex { component, .. } => component.size().max(4),
            Self::Index { component } => component.size(),
        }
    }

    fn target(&self) -> Option<BufferTarget> {
        match self {
            Self::Raw => None,
            Self::Vertex { .. } => Some(BufferTarget::ArrayBuffer),
            Self::Index { .. } => Some(BufferTarget::ElementArrayBuffer),
        }
    }

    fn stride(&self) -> Option<usize> {
        match self {
            Self::Vertex { stride, .. } => *stride,
            _ => None,
        }
    }
}

/// Append-only builder for buffer 0 and its views.
#[derive(Debug, Default, Clone)]
pub struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<BufferView>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` as a new view and return the view index.
    ///
    /// The write offset is zero-padded to the usage's alignment first.
    pub fn add_view(&mut self, bytes: &[u8], usage: ViewUsage) -> usize {
        align_buffer(&mut self.data, usage.alignment());
        let byte_offset = self.data.len();
        self.data.extend_from_slice(bytes);

        let index = self.views.len();
        self.views.push(BufferView {
            buffer: 0,
            byte_offset,
            byte_length: bytes.len(),
            byte_stride: usage.stride(),
            target: usage.target().map(|t| t as u32),
            name: None,
            extensions: Extensions::new(),
            extras: None,
            unknown: Default::default(),
        });
        index
    }

    /// Packed bytes (padded to 4) and their views. Calling it twice yields
    /// identical results.
    pub fn build_bytes(&self) -> (Vec<u8>, Vec<BufferView>) {
        let mut bytes = self.data.clone();
        align_buffer(&mut bytes, 4);
        (bytes, self.views.clone())
    }

    /// Bytes written so far, excluding trailing padding.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn views(&self) -> &[BufferView] {
        &self.views
    }
}

/// Zero-pad `buffer` to a multiple of `alignment`.
pub(crate) fn align_buffer(buffer: &mut Vec<u8>, alignment: usize) {
    let rem = buffer.len() % alignment;
    if rem != 0 {
        buffer.resize(buffer.len() + alignment - rem, 0);
    }
}

/// Number of padding bytes needed to reach a multiple of 4.
pub(crate) fn padding_to_4(len: usize) -> usize {
    (4 - len % 4) % 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_alignment_and_targets() {
        let mut builder = BufferBuilder::new();
        let raw = builder.add_view(&[1, 2, 3], ViewUsage::Raw);
        let index = builder.add_view(
            &[0, 0, 1, 0, 2, 0],
            ViewUsage::Index {
                component: ComponentType::UnsignedShort,
            },
        );
        let vertex = builder.add_view(
            &[0u8; 12],
            ViewUsage::Vertex {
                component: ComponentType::Float,
                stride: Some(12),
            },
        );

        let (bytes, views) = builder.build_bytes();
        assert_eq!(views[raw].byte_offset, 0);
        assert_eq!(views[raw].target, None);
        assert_eq!(views[index].byte_offset, 4);
        assert_eq!(views[index].target, Some(34963));
        assert_eq!(views[vertex].byte_offset, 12);
        assert_eq!(views[vertex].byte_stride, Some(12));
        assert_eq!(views[vertex].target, Some(34962));
        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[3], 0);
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut builder = BufferBuilder::new();
        builder.add_view(b"abcde", ViewUsage::Raw);
        assert_eq!(builder.build_bytes(), builder.build_bytes());
        assert_eq!(builder.len(), 5);
        assert_eq!(builder.build_bytes().0.len(), 8);
    }

    #[test]
    fn test_empty_builder() {
        let builder = BufferBuilder::new();
        assert!(builder.is_empty());
        let (bytes, views) = builder.build_bytes();
        assert!(bytes.is_empty());
        assert!(views.is_empty());
    }

    fn usage_strategy() -> impl Strategy<Value = ViewUsage> {
        let component = prop_oneof![
            Just(ComponentType::UnsignedByte),
            Just(ComponentType::UnsignedShort),
            Just(ComponentType::UnsignedInt),
            Just(ComponentType::Float),
        ];
        component.prop_flat_map(|component| {
            prop_oneof![
                Just(ViewUsage::Raw),
                Just(ViewUsage::Vertex { component, stride: None }),
                Just(ViewUsage::Index { component }),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_views_are_aligned_and_disjoint(
            parts in proptest::collection::vec(
                (proptest::collection::vec(any::<u8>(), 0..40), usage_strategy()),
                1..12,
            )
        ) {
            let mut builder = BufferBuilder::new();
            for (bytes, usage) in &parts {
                builder.add_view(bytes, *usage);
            }
            let (bytes, views) = builder.build_bytes();
            prop_assert_eq!(bytes.len() % 4, 0);

            let mut previous_end = 0;
            for ((payload, usage), view) in parts.iter().zip(&views) {
                prop_assert_eq!(view.byte_offset % usage.alignment(), 0);
                prop_assert!(view.byte_offset >= previous_end);
                prop_assert_eq!(&bytes[view.range().unwrap()], payload.as_slice());
                previous_end = view.byte_offset + view.byte_length;
            }
        }
    }
}
