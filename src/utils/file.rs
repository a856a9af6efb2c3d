use std::{cell::RefCell, fs::File, io::{BufReader, Read, Seek, SeekFrom}, ops::Range, path::Path};

use bytes::Bytes;

use super::{CellError, MRErrKind, MRError};

/// Random-access byte source. Every read names its absolute position,
/// so no caller depends on a shared cursor.
pub trait HiveSource {
    fn read_n(&self, addr: usize, n: usize) -> Result<Vec<u8>, MRError>;

    fn size(&self) -> Result<usize, MRError>;

    fn read_range(&self, range: Range<usize>) -> Result<Vec<u8>, MRError> {
        self.read_n(range.start, range.end.saturating_sub(range.start))
    }
}

#[derive(Debug)]
pub struct MRFile {
    path    : String,
    reader  : RefCell<BufReader<File>>
}

impl MRFile {
    pub fn new<P>(p: P) -> Result<MRFile,MRError>
    where P: AsRef<Path> + ToString {
        let s = p.to_string();
        let f = File::open(p).map_err(MRError::from_io)?;
        Ok(MRFile {
            path: s,
            reader: RefCell::new(BufReader::new(f)),
        })
    }

    pub fn get_path(&self) -> &str {
        &self.path
    }
}

impl HiveSource for MRFile {
    fn read_n(&self, addr: usize, n: usize) -> Result<Vec<u8>,MRError> {
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(addr as u64)).map_err(MRError::from_io)?;
        let mut result = vec![0u8;n];
        reader.read_exact(&mut result).map_err(MRError::from_io)?;
        Ok(result)
    }

    fn size(&self) -> Result<usize, MRError> {
        let reader = self.reader.borrow();
        let meta = reader.get_ref().metadata().map_err(MRError::from_io)?;
        Ok(meta.len() as usize)
    }
}

/// Hive image held in memory.
#[derive(Debug, Clone)]
pub struct MemFile {
    data    : Bytes
}

impl MemFile {
    pub fn new<B: Into<Bytes>>(data: B) -> MemFile {
        MemFile { data: data.into() }
    }
}

impl HiveSource for MemFile {
    fn read_n(&self, addr: usize, n: usize) -> Result<Vec<u8>, MRError> {
        let end = addr.checked_add(n);
        match end {
            Some(end) if end <= self.data.len() => Ok(self.data[addr..end].to_vec()),
            _ => Err(MRError::new_with_kind(
                &format!("short read of {} bytes at {:#x}", n, addr),
                MRErrKind::Cell(CellError::TruncatedRead),
            )),
        }
    }

    fn size(&self) -> Result<usize, MRError> {
        Ok(self.data.len())
    }
}
