//! Box serialization helpers.
//!
//! Used to build synthetic files for tests and benchmarks.

use super::{BoxHeader, BoxType};
use bytes::{BufMut, BytesMut};

/// Serialize a box with a raw payload.
pub fn leaf(box_type: BoxType, payload: &[u8]) -> Vec<u8> {
    let header = BoxHeader::new(box_type, 0);
    let size = (header.header_size() + payload.len()) as u64;
    let mut buf = BytesMut::with_capacity(size as usize);
    BoxHeader::new(box_type, size).write_to(&mut buf);
    buf.put_slice(payload);
    buf.to_vec()
}

/// Serialize a container box from already serialized children.
pub fn container(box_type: BoxType, children: &[Vec<u8>]) -> Vec<u8> {
    leaf(box_type, &children.concat())
}

/// Serialize an `ftyp` box.
pub fn ftyp_box(major_brand: &[u8; 4], minor_version: u32, compatible: &[[u8; 4]]) -> Vec<u8> {
    let mut payload = BytesMut::new();
    payload.put_slice(major_brand);
    payload.put_u32(minor_version);
    for brand in compatible {
        payload.put_slice(brand);
    }
    leaf(BoxType::FTYP, &payload)
}

/// Serialize an `stco` box.
pub fn stco_box(offsets: &[u32]) -> Vec<u8> {
    let mut payload = BytesMut::with_capacity(8 + offsets.len() * 4);
    payload.put_u32(0); // version/flags
    payload.put_u32(offsets.len() as u32);
    for &offset in offsets {
        payload.put_u32(offset);
    }
    leaf(BoxType::STCO, &payload)
}

/// Serialize a `co64` box.
pub fn co64_box(offsets: &[u64]) -> Vec<u8> {
    let mut payload = BytesMut::with_capacity(8 + offsets.len() * 8);
    payload.put_u32(0); // version/flags
    payload.put_u32(offsets.len() as u32);
    for &offset in offsets {
        payload.put_u64(offset);
    }
    leaf(BoxType::CO64, &payload)
}

/// Serialize a minimal track whose sample table holds `table`.
pub fn track_with_table(table: Vec<u8>) -> Vec<u8> {
    container(
        BoxType::TRAK,
        &[
            leaf(BoxType::TKHD, &[0u8; 84]),
            container(
                BoxType::MDIA,
                &[
                    leaf(BoxType::MDHD, &[0u8; 24]),
                    container(
                        BoxType::MINF,
                        &[container(
                            BoxType::STBL,
                            &[leaf(BoxType::STSD, &[0u8; 8]), table],
                        )],
                    ),
                ],
            ),
        ],
    )
}
