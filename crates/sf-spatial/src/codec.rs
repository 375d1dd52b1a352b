//! Wire layout of a spatial report.
//!
//! All fields are little-endian:
//!
//! ```text
//! u32 node_count
//! u32 timestep_count
//! u32 node_id            x node_count
//! f32 value              x timestep_count x node_count   (timestep-major)
//! ```

use crate::error::{SpatialError, SpatialResult};

pub(crate) const HEADER_LEN: usize = 8;
const WORD: usize = 4;

/// The two counts at the start of every report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub node_count: u32,
    pub timestep_count: u32,
}

impl Header {
    /// Bytes needed to hold the header, the id table and `timesteps` value blocks.
    ///
    /// `None` when the size does not fit in a `u64`.
    pub fn required_len(&self, timesteps: u32) -> Option<u64> {
        let row = u64::from(self.node_count).checked_mul(WORD as u64)?;
        let values = u64::from(timesteps).checked_mul(row)?;
        (HEADER_LEN as u64).checked_add(row)?.checked_add(values)
    }
}

/// Read the header of a report.
pub fn read_header(bytes: &[u8]) -> SpatialResult<Header> {
    if bytes.len() < HEADER_LEN {
        return Err(SpatialError::Truncated {
            needed: HEADER_LEN as u64,
            actual: bytes.len(),
        });
    }
    Ok(Header {
        node_count: word_at(bytes, 0),
        timestep_count: word_at(bytes, WORD),
    })
}

/// Node ids as stored in the file, in storage order.
///
/// The caller must have checked the buffer against [`Header::required_len`].
pub(crate) fn read_node_ids(bytes: &[u8], header: &Header) -> Vec<u32> {
    let end = HEADER_LEN + header.node_count as usize * WORD;
    bytes[HEADER_LEN..end]
        .chunks_exact(WORD)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// One timestep block of values, in node storage order.
pub(crate) fn read_row(bytes: &[u8], header: &Header, row: usize) -> Vec<f32> {
    let nodes = header.node_count as usize;
    let start = HEADER_LEN + nodes * WORD + row * nodes * WORD;
    bytes[start..start + nodes * WORD]
        .chunks_exact(WORD)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn word_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Write a report in the wire layout.
///
/// Every row must hold one value per node id; rows become timesteps in order.
///
/// # Panics
///
/// Panics if a row's length differs from `node_ids.len()`.
pub fn encode<R: AsRef<[f32]>>(node_ids: &[u32], rows: &[R]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + (node_ids.len() * (rows.len() + 1)) * WORD);
    out.extend_from_slice(&(node_ids.len() as u32).to_le_bytes());
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    for id in node_ids {
        out.extend_from_slice(&id.to_le_bytes());
    }
    for row in rows {
        let row = row.as_ref();
        assert_eq!(row.len(), node_ids.len(), "row width must match node count");
        for value in row {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}
