//! GLB binary framing: a 12-byte header followed by a JSON chunk and an
//! optional BIN chunk.

use tracing::warn;

use crate::buffer::padding_to_4;
use crate::error::{Result, VgltfError};

/// GLB magic number.
pub const GLB_MAGIC: u32 = 0x46546C67; // "glTF" in little-endian
/// GLB version 2.
pub const GLB_VERSION: u32 = 2;
/// JSON chunk type.
pub const CHUNK_JSON: u32 = 0x4E4F534A; // "JSON" in little-endian
/// Binary chunk type.
pub const CHUNK_BIN: u32 = 0x004E4942; // "BIN\0" in little-endian

pub(crate) const HEADER_LEN: usize = 12;
pub(crate) const CHUNK_HEADER_LEN: usize = 8;

/// Raw chunk bodies of a GLB file, padding included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbChunks<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

/// Whether `data` starts with the GLB magic.
pub fn has_glb_magic(data: &[u8]) -> bool {
    data.len() >= 4 && read_u32(data, 0) == GLB_MAGIC
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Split a GLB file into its chunks.
///
/// Bytes past the header's declared length are ignored.
pub fn parse_glb(data: &[u8]) -> Result<GlbChunks<'_>> {
    if data.len() < HEADER_LEN {
        return Err(VgltfError::container(format!(
            "GLB file too short ({} bytes)",
            data.len()
        )));
    }

    let magic = read_u32(data, 0);
    let version = read_u32(data, 4);
    let length = read_u32(data, 8) as usize;

    if magic != GLB_MAGIC {
        return Err(VgltfError::container(format!("invalid GLB magic {magic:#010x}")));
    }
    if version != GLB_VERSION {
        return Err(VgltfError::container(format!(
            "GLB version {version} not supported"
        )));
    }
    if length < HEADER_LEN || length > data.len() {
        return Err(VgltfError::container(format!(
            "GLB declares {length} bytes but {} are available",
            data.len()
        )));
    }

    let data = &data[..length];
    let mut json = None;
    let mut bin = None;
    let mut offset = HEADER_LEN;
    let mut chunk_index = 0;

    while offset < length {
        if offset + CHUNK_HEADER_LEN > length {
            return Err(VgltfError::container(format!(
                "chunk {chunk_index} header at byte {offset} overruns the file"
            )));
        }
        let chunk_length = read_u32(data, offset) as usize;
        let chunk_type = read_u32(data, offset + 4);
        let body = offset + CHUNK_HEADER_LEN;
        if chunk_length > length - body {
            return Err(VgltfError::container(format!(
                "chunk {chunk_index} ({chunk_length} bytes at byte {body}) overruns the file"
            )));
        }
        let chunk = &data[body..body + chunk_length];

        match (chunk_index, chunk_type) {
            (0, CHUNK_JSON) => json = Some(chunk),
            (0, other) => {
                return Err(VgltfError::container(format!(
                    "first chunk must be JSON, found {other:#010x}"
                )))
            }
            (1, CHUNK_BIN) => bin = Some(chunk),
            (1, other) => {
                return Err(VgltfError::container(format!(
                    "second chunk must be BIN, found {other:#010x}"
                )))
            }
            (_, CHUNK_JSON) | (_, CHUNK_BIN) => {
                return Err(VgltfError::container(format!(
                    "duplicate chunk of type {chunk_type:#010x} at index {chunk_index}"
                )))
            }
            (_, other) => {
                warn!(chunk_type = other, chunk_length, "skipping unknown GLB chunk");
            }
        }

        offset = body + chunk_length;
        chunk_index += 1;
    }

    let json = json.ok_or_else(|| VgltfError::container("GLB missing JSON chunk"))?;
    Ok(GlbChunks { json, bin })
}

/// Padded chunk lengths and total file length of a GLB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GlbLengths {
    total: u32,
    json: u32,
    bin: Option<u32>,
}

/// Lengths for a JSON chunk of `json_len` bytes and an optional BIN chunk.
/// Every length in a GLB header is a `u32`.
fn glb_lengths(json_len: usize, bin_len: Option<usize>) -> Result<GlbLengths> {
    let too_long = || {
        VgltfError::container(format!(
            "{json_len} JSON bytes and {} BIN bytes do not fit a GLB",
            bin_len.unwrap_or(0)
        ))
    };
    let padded = |len: usize| len.checked_add(padding_to_4(len));
    let fit = |len: usize| u32::try_from(len).map_err(|_| too_long());

    let json = padded(json_len).ok_or_else(too_long)?;
    let bin = match bin_len {
        Some(len) => Some(padded(len).ok_or_else(too_long)?),
        None => None,
    };
    let total = (HEADER_LEN + CHUNK_HEADER_LEN)
        .checked_add(json)
        .and_then(|n| match bin {
            Some(bin) => n.checked_add(CHUNK_HEADER_LEN)?.checked_add(bin),
            None => Some(n),
        })
        .ok_or_else(too_long)?;

    Ok(GlbLengths {
        total: fit(total)?,
        json: fit(json)?,
        bin: bin.map(fit).transpose()?,
    })
}

/// Frame a JSON document and optional binary payload as GLB.
///
/// JSON is padded with spaces and the payload with zeros to 4 bytes. No
/// BIN chunk is written for an absent or empty payload. Fails when the file
/// would exceed the 4 GiB a GLB header can describe.
pub fn write_glb(json: &[u8], bin: Option<&[u8]>) -> Result<Vec<u8>> {
    let bin = bin.filter(|b| !b.is_empty());
    let lengths = glb_lengths(json.len(), bin.map(<[u8]>::len))?;

    let mut output = Vec::with_capacity(lengths.total as usize);

    output.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    output.extend_from_slice(&GLB_VERSION.to_le_bytes());
    output.extend_from_slice(&lengths.total.to_le_bytes());

    output.extend_from_slice(&lengths.json.to_le_bytes());
    output.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    output.extend_from_slice(json);
    output.extend(std::iter::repeat(b' ').take(padding_to_4(json.len())));

    if let (Some(bin), Some(bin_length)) = (bin, lengths.bin) {
        output.extend_from_slice(&bin_length.to_le_bytes());
        output.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        output.extend_from_slice(bin);
        output.extend(std::iter::repeat(0u8).take(padding_to_4(bin.len())));
    }

    debug_assert_eq!(output.len(), lengths.total as usize);
    Ok(output)
}
