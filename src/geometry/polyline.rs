//! # Encoded Route Geometry
//!
//! Decoder (and matching encoder) for the compact ASCII polyline format used
//! by routing providers: every value is a signed delta from the previous
//! point, scaled by `1e5`, zig-zag folded, split into 5-bit groups with `0x20`
//! as the continuation bit and offset by 63 into printable ASCII. Latitude and
//! longitude values alternate.
//!
//! Decoding is pure and bounded by the input length: a truncated group or a
//! latitude without its longitude is reported as [`GeometryError`] instead of
//! reading past the end.

use super::Coordinate;

const SCALE: f64 = 1e5;
const OFFSET: u8 = 63;
const CONTINUATION: u64 = 0x20;
const PAYLOAD_MASK: u64 = 0x1f;
/// Largest group shift that still lands inside the 64-bit accumulator.
const MAX_SHIFT: u32 = 60;

/// Errors produced while decoding an encoded route.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Malformed geometry at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
}

/// Decodes an encoded route into its ordered coordinates.
///
/// `None` and the empty string both decode to an empty route.
pub fn decode(encoded: Option<&str>) -> Result<Vec<Coordinate>, GeometryError> {
    let bytes = match encoded {
        Some(text) if !text.is_empty() => text.as_bytes(),
        _ => return Ok(Vec::new()),
    };

    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        if index >= bytes.len() {
            return Err(GeometryError::Malformed {
                offset: index,
                reason: "latitude without longitude",
            });
        }
        lng = accumulate(lng, bytes, &mut index)?;
        points.push(Coordinate::new(lat as f64 / SCALE, lng as f64 / SCALE));
    }

    Ok(points)
}

fn accumulate(total: i64, bytes: &[u8], index: &mut usize) -> Result<i64, GeometryError> {
    let start = *index;
    let delta = next_value(bytes, index)?;
    total.checked_add(delta).ok_or(GeometryError::Malformed {
        offset: start,
        reason: "value overflows accumulator",
    })
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, GeometryError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(GeometryError::Malformed {
                offset: *index,
                reason: "continuation bit never cleared",
            });
        };
        if !(OFFSET..=126).contains(&byte) {
            return Err(GeometryError::Malformed {
                offset: *index,
                reason: "byte outside encoding alphabet",
            });
        }
        let group = u64::from(byte - OFFSET);
        // At the last shift only four payload bits still fit.
        if shift > MAX_SHIFT || (shift == MAX_SHIFT && group & PAYLOAD_MASK > 0xf) {
            return Err(GeometryError::Malformed {
                offset: *index,
                reason: "value overflows accumulator",
            });
        }
        *index += 1;

        result |= (group & PAYLOAD_MASK) << shift;
        shift += 5;

        if group < CONTINUATION {
            break;
        }
    }

    // zig-zag: low bit carries the sign
    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 == 1 { !magnitude } else { magnitude })
}

/// Encodes coordinates with the same scheme [`decode`] reads.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * SCALE).round() as i64;
        let lng = (point.lng * SCALE).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn push_value(out: &mut String, delta: i64) {
    let mut value = if delta < 0 {
        !((delta as u64) << 1)
    } else {
        (delta as u64) << 1
    };

    while value >= CONTINUATION {
        out.push(char::from((((value & PAYLOAD_MASK) | CONTINUATION) as u8) + OFFSET));
        value >>= 5;
    }
    out.push(char::from(value as u8 + OFFSET));
}
