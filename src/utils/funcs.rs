use std::ops::Range;

use bytes::{Buf, Bytes};
use chrono::{DateTime, NaiveDateTime};

use super::{MRErrKind, MRError};

const WINDOWS_TICK: u64 = 10_000_000;
const SEC_TO_UNIX_EPOCH: u64 = 11_644_473_600;

pub fn sub_bytes(bs: &Bytes, range: Range<usize>) -> Result<Bytes, MRError> {
    if range.start > range.end || range.end > bs.len() {
        return Err(MRError::new_with_kind("Out of range", MRErrKind::OutOfByteRange));
    }
    Ok(bs.slice(range))
}

pub fn get_u16_le(bs: &Bytes, at: usize) -> Result<u16, MRError> {
    Ok(sub_bytes(bs, at..at + 2)?.get_u16_le())
}

pub fn get_i16_le(bs: &Bytes, at: usize) -> Result<i16, MRError> {
    Ok(sub_bytes(bs, at..at + 2)?.get_i16_le())
}

pub fn get_u32_le(bs: &Bytes, at: usize) -> Result<u32, MRError> {
    Ok(sub_bytes(bs, at..at + 4)?.get_u32_le())
}

pub fn get_i32_le(bs: &Bytes, at: usize) -> Result<i32, MRError> {
    Ok(sub_bytes(bs, at..at + 4)?.get_i32_le())
}

pub fn get_u64_le(bs: &Bytes, at: usize) -> Result<u64, MRError> {
    Ok(sub_bytes(bs, at..at + 8)?.get_u64_le())
}

/// Seconds since the unix epoch for a 100ns tick count since 1601-01-01.
/// None for instants before 1970.
pub fn ticks_to_unix_seconds(ticks: u64) -> Option<u64> {
    let s = ticks / WINDOWS_TICK;
    if s < SEC_TO_UNIX_EPOCH {
        return None;
    }
    Some(s - SEC_TO_UNIX_EPOCH)
}

pub fn ticks_to_datetime(ticks: u64) -> Option<NaiveDateTime> {
    let secs = ticks_to_unix_seconds(ticks)?;
    let secs = i64::try_from(secs).ok()?;
    DateTime::from_timestamp(secs, 0).map(|d| d.naive_utc())
}

pub fn utf16le_to_string(bs: &[u8]) -> String {
    let units = bs
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|u| *u != 0)
        .collect::<Vec<u16>>();
    String::from_utf16_lossy(&units)
}

pub fn latin1_to_string(bs: &[u8]) -> String {
    bs.iter().map(|b| *b as char).collect()
}
