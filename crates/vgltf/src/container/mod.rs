//! Document plus binary payload, in GLB or bare JSON form.

mod glb;

pub use glb::{parse_glb, write_glb, GlbChunks, CHUNK_BIN, CHUNK_JSON, GLB_MAGIC, GLB_VERSION};

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, warn};

use crate::error::{Result, VgltfError};
use crate::options::ContainerOptions;
use crate::schema::Gltf;

/// Prefix of the data URI used for an embedded buffer.
pub const OCTET_STREAM_DATA_URI: &str = "data:application/octet-stream;base64,";

/// Bytes of buffer 0 when it lives in the container instead of at a URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredBuffer {
    pub payload: Vec<u8>,
}

/// A glTF document and its stored binary payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GltfContainer {
    pub gltf: Gltf,
    pub buffer: Option<StoredBuffer>,
}

/// Encoding of a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Glb,
    Json,
}

impl ContainerKind {
    /// Sniff the container kind from leading bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if glb::has_glb_magic(data) {
            return Some(Self::Glb);
        }
        let text = std::str::from_utf8(data).ok()?;
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with('{') && trimmed.contains("\"asset\"") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

impl GltfContainer {
    pub fn new(gltf: Gltf) -> Self {
        Self { gltf, buffer: None }
    }

    /// Attach the payload backing the uri-less buffer 0.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.buffer = Some(StoredBuffer { payload });
        self
    }

    /// Stored payload bytes, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        self.buffer.as_ref().map(|b| b.payload.as_slice())
    }

    /// Decode either form, chosen by [`ContainerKind::detect`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match ContainerKind::detect(data) {
            Some(ContainerKind::Glb) => Self::from_glb(data),
            Some(ContainerKind::Json) => Self::from_json(data),
            None => Err(VgltfError::container("neither GLB nor glTF JSON")),
        }
    }

    /// Decode and validate a GLB file.
    pub fn from_glb(data: &[u8]) -> Result<Self> {
        let container = Self::from_glb_unchecked(data)?;
        container.gltf.validate()?;
        Ok(container)
    }

    /// Decode a GLB file without running [`Gltf::validate`].
    ///
    /// Framing and the buffer 0 / BIN chunk agreement are still checked.
    pub fn from_glb_unchecked(data: &[u8]) -> Result<Self> {
        let chunks = parse_glb(data)?;
        let gltf: Gltf = serde_json::from_slice(chunks.json).map_err(VgltfError::from_deserialize)?;

        let stored = gltf.buffers.first().filter(|b| b.uri.is_none());
        let buffer = match (stored, chunks.bin) {
            (Some(buffer), Some(bin)) => {
                if buffer.byte_length > bin.len() {
                    return Err(VgltfError::container(format!(
                        "buffer 0 declares {} bytes but the BIN chunk holds {}",
                        buffer.byte_length,
                        bin.len()
                    )));
                }
                Some(StoredBuffer {
                    payload: bin[..buffer.byte_length].to_vec(),
                })
            }
            (Some(_), None) => {
                return Err(VgltfError::container(
                    "buffer 0 has no uri and the file has no BIN chunk",
                ))
            }
            (None, Some(bin)) => {
                warn!(bin_len = bin.len(), "ignoring BIN chunk not referenced by any buffer");
                None
            }
            (None, None) => None,
        };

        debug!(
            json_len = chunks.json.len(),
            bin_len = buffer.as_ref().map_or(0, |b| b.payload.len()),
            "decoded GLB"
        );
        Ok(Self { gltf, buffer })
    }

    /// Decode and validate a bare glTF JSON document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let container = Self::from_json_unchecked(data)?;
        container.gltf.validate()?;
        Ok(container)
    }

    /// Decode a bare glTF JSON document without validation.
    ///
    /// Data URIs stay in place; the resource store decodes them on demand.
    pub fn from_json_unchecked(data: &[u8]) -> Result<Self> {
        let gltf: Gltf = serde_json::from_slice(data).map_err(VgltfError::from_deserialize)?;
        debug!(json_len = data.len(), "decoded glTF JSON");
        Ok(Self { gltf, buffer: None })
    }

    /// Encode as GLB.
    pub fn to_glb(&self) -> Result<Vec<u8>> {
        self.check_payload()?;
        let json = serde_json::to_vec(&self.gltf)?;
        let payload = self.payload().filter(|p| !p.is_empty());
        let glb = write_glb(&json, payload)?;
        debug!(
            json_len = json.len(),
            bin_len = payload.map_or(0, <[u8]>::len),
            total = glb.len(),
            "encoded GLB"
        );
        Ok(glb)
    }

    /// Encode as bare JSON, embedding the payload as a base64 data URI on
    /// buffer 0.
    pub fn to_json(&self, options: &ContainerOptions) -> Result<Vec<u8>> {
        self.check_payload()?;
        let mut gltf = self.gltf.clone();
        if let Some(payload) = self.payload().filter(|p| !p.is_empty()) {
            if let Some(buffer) = gltf.buffers.first_mut() {
                buffer.uri = Some(format!("{OCTET_STREAM_DATA_URI}{}", STANDARD.encode(payload)));
            }
        }
        let json = if options.pretty {
            serde_json::to_vec_pretty(&gltf)?
        } else {
            serde_json::to_vec(&gltf)?
        };
        debug!(json_len = json.len(), "encoded glTF JSON");
        Ok(json)
    }

    /// The payload must back a uri-less buffer 0 exactly.
    fn check_payload(&self) -> Result<()> {
        let stored = self.gltf.buffers.first().filter(|b| b.uri.is_none());
        let payload = self.payload().filter(|p| !p.is_empty());
        match (stored, payload) {
            (Some(buffer), Some(payload)) if buffer.byte_length != payload.len() => {
                Err(VgltfError::container(format!(
                    "buffer 0 declares {} bytes but the payload holds {}",
                    buffer.byte_length,
                    payload.len()
                )))
            }
            (Some(_), None) => Err(VgltfError::container(
                "buffer 0 has no uri and there is no payload",
            )),
            (None, Some(_)) => Err(VgltfError::container(
                "payload present but no uri-less buffer 0 describes it",
            )),
            _ => Ok(()),
        }
    }
}
