//! Typed views over raw glTF wire values.

/// Sampler wrap mode: CLAMP_TO_EDGE.
pub const WRAP_CLAMP_TO_EDGE: u32 = 33071;
/// Sampler wrap mode: MIRRORED_REPEAT.
pub const WRAP_MIRRORED_REPEAT: u32 = 33648;
/// Sampler wrap mode: REPEAT.
pub const WRAP_REPEAT: u32 = 10497;

/// Sampler filter: NEAREST.
pub const FILTER_NEAREST: u32 = 9728;
/// Sampler filter: LINEAR.
pub const FILTER_LINEAR: u32 = 9729;
/// Sampler min filter: NEAREST_MIPMAP_NEAREST.
pub const FILTER_NEAREST_MIPMAP_NEAREST: u32 = 9984;
/// Sampler min filter: LINEAR_MIPMAP_NEAREST.
pub const FILTER_LINEAR_MIPMAP_NEAREST: u32 = 9985;
/// Sampler min filter: NEAREST_MIPMAP_LINEAR.
pub const FILTER_NEAREST_MIPMAP_LINEAR: u32 = 9986;
/// Sampler min filter: LINEAR_MIPMAP_LINEAR.
pub const FILTER_LINEAR_MIPMAP_LINEAR: u32 = 9987;

pub(crate) const MAG_FILTERS: [u32; 2] = [FILTER_NEAREST, FILTER_LINEAR];
pub(crate) const MIN_FILTERS: [u32; 6] = [
    FILTER_NEAREST,
    FILTER_LINEAR,
    FILTER_NEAREST_MIPMAP_NEAREST,
    FILTER_LINEAR_MIPMAP_NEAREST,
    FILTER_NEAREST_MIPMAP_LINEAR,
    FILTER_LINEAR_MIPMAP_LINEAR,
];
pub(crate) const WRAP_MODES: [u32; 3] = [WRAP_CLAMP_TO_EDGE, WRAP_MIRRORED_REPEAT, WRAP_REPEAT];

/// Accessor component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ComponentType {
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    UnsignedInt = 5125,
    Float = 5126,
}

impl ComponentType {
    /// Parse a GL enum value.
    pub fn from_gl(value: u32) -> Option<Self> {
        match value {
            5120 => Some(Self::Byte),
            5121 => Some(Self::UnsignedByte),
            5122 => Some(Self::Short),
            5123 => Some(Self::UnsignedShort),
            5125 => Some(Self::UnsignedInt),
            5126 => Some(Self::Float),
            _ => None,
        }
    }

    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }

    /// Whether this type may be used for indices.
    pub fn is_index(self) -> bool {
        matches!(
            self,
            Self::UnsignedByte | Self::UnsignedShort | Self::UnsignedInt
        )
    }
}

/// Accessor element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    /// Parse the JSON spelling (`"VEC3"`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SCALAR" => Some(Self::Scalar),
            "VEC2" => Some(Self::Vec2),
            "VEC3" => Some(Self::Vec3),
            "VEC4" => Some(Self::Vec4),
            "MAT2" => Some(Self::Mat2),
            "MAT3" => Some(Self::Mat3),
            "MAT4" => Some(Self::Mat4),
            _ => None,
        }
    }

    /// The JSON spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }

    /// Number of components per element.
    pub fn component_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    /// How one element of this type is laid out in a buffer view.
    pub fn layout(self, component: ComponentType) -> ElementLayout {
        let size = component.size();
        match self {
            Self::Mat2 | Self::Mat3 | Self::Mat4 => {
                let rows = match self {
                    Self::Mat2 => 2,
                    Self::Mat3 => 3,
                    _ => 4,
                };
                let column_size = rows * size;
                ElementLayout {
                    columns: rows,
                    column_size,
                    column_stride: column_size.next_multiple_of(4),
                }
            }
            _ => ElementLayout {
                columns: 1,
                column_size: self.component_count() * size,
                column_stride: self.component_count() * size,
            },
        }
    }
}

/// Byte layout of one accessor element inside a buffer view.
///
/// Matrix columns start on 4-byte boundaries, so MAT2 and MAT3 elements of
/// 1- and 2-byte components carry padding after every column. Other types
/// are a single unpadded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
    pub columns: usize,
    /// Bytes of data per column.
    pub column_size: usize,
    /// Bytes per column including padding.
    pub column_stride: usize,
}

impl ElementLayout {
    /// Size of the element with padding removed.
    pub fn packed_size(&self) -> usize {
        self.columns * self.column_size
    }

    /// Size of the element as stored, padding included.
    pub fn stored_size(&self) -> usize {
        self.columns * self.column_stride
    }

    pub fn is_padded(&self) -> bool {
        self.column_size != self.column_stride
    }
}

/// Primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PrimitiveMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl PrimitiveMode {
    /// Parse a wire value.
    pub fn from_gl(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::LineLoop),
            3 => Some(Self::LineStrip),
            4 => Some(Self::Triangles),
            5 => Some(Self::TriangleStrip),
            6 => Some(Self::TriangleFan),
            _ => None,
        }
    }
}

/// Buffer view binding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BufferTarget {
    ArrayBuffer = 34962,
    ElementArrayBuffer = 34963,
}

impl BufferTarget {
    /// Parse a GL enum value.
    pub fn from_gl(value: u32) -> Option<Self> {
        match value {
            34962 => Some(Self::ArrayBuffer),
            34963 => Some(Self::ElementArrayBuffer),
            _ => None,
        }
    }
}

/// Material alpha mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPAQUE" => Some(Self::Opaque),
            "MASK" => Some(Self::Mask),
            "BLEND" => Some(Self::Blend),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "OPAQUE",
            Self::Mask => "MASK",
            Self::Blend => "BLEND",
        }
    }
}

/// Image MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    ImagePng,
    ImageJpeg,
    ImageKtx2,
    ImageWebp,
}

impl MimeType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image/png" => Some(Self::ImagePng),
            "image/jpeg" => Some(Self::ImageJpeg),
            "image/ktx2" => Some(Self::ImageKtx2),
            "image/webp" => Some(Self::ImageWebp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImagePng => "image/png",
            Self::ImageJpeg => "image/jpeg",
            Self::ImageKtx2 => "image/ktx2",
            Self::ImageWebp => "image/webp",
        }
    }
}
