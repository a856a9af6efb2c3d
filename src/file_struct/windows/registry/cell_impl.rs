use bytes::Bytes;
use log::debug;

use crate::utils::{file::HiveSource, funcs::get_i32_le, CellError, MRErrKind, MRError};

use super::{CellLength, HiveBinCell, CELL_PREFIX_SIZE};

impl CellLength {
    pub fn decode(raw: i32) -> CellLength {
        if raw < 0 {
            CellLength::Allocated(-(raw as i64) - CELL_PREFIX_SIZE as i64)
        } else {
            CellLength::Free(raw as u32)
        }
    }

    /// Payload length of an allocated cell, checked against `0 < len <= max`.
    pub fn allocated_size(&self, max: usize) -> Result<usize, MRError> {
        match *self {
            CellLength::Free(len) => Err(MRError::new_with_kind(
                &format!("free cell of {} bytes where an allocated cell was expected", len),
                MRErrKind::Cell(CellError::FreeCell),
            )),
            CellLength::Allocated(real) if real <= 0 || real > max as i64 => Err(MRError::new_with_kind(
                &format!("cell size {} out of range (max {})", real, max),
                MRErrKind::Cell(CellError::SizeOutOfRange),
            )),
            CellLength::Allocated(real) => Ok(real as usize),
        }
    }
}

impl HiveBinCell {
    /// Reads the allocated cell whose payload starts at `offset` (the
    /// length field sits just before it).
    pub fn read<S: HiveSource>(file: &S, offset: usize, max_size: usize) -> Result<HiveBinCell, MRError> {
        let len_at = offset.checked_sub(CELL_PREFIX_SIZE)
            .ok_or_else(|| MRError::new_with_kind("Cell offset before start of file", MRErrKind::OutOfByteRange))?;
        let raw = get_i32_le(&Bytes::from(file.read_n(len_at, CELL_PREFIX_SIZE)?), 0)?;
        let size = CellLength::decode(raw).allocated_size(max_size)?;
        let data = file.read_n(offset, size)?;
        debug!("cell at {:#x}: {} bytes", offset, size);
        Ok(Self {
            offset_of_file: offset,
            declared: raw,
            data: Bytes::from(data),
        })
    }

    pub fn get_offset(&self) -> usize {
        self.offset_of_file
    }

    pub fn get_declared(&self) -> i32 {
        self.declared
    }

    pub fn len_real(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    pub fn signature(&self) -> &[u8] {
        &self.data[..self.data.len().min(2)]
    }
}
