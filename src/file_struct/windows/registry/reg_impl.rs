use std::path::Path;

use bytes::Bytes;
use log::{debug, info, warn};

use crate::utils::{
    file::{HiveSource, MRFile},
    funcs::{get_i32_le, get_u32_le, get_u64_le, sub_bytes, utf16le_to_string},
    CellError, HeaderError, MRErrKind, MRError, RootError,
};

use super::{
    CellLength, HiveBin, HiveBinCell, HiveOptions, HiveVersion, KeyWalker, RegFile, RegFileHeader,
    RegNamedKey, RegSubKeyList, RootStrategy, CELL_PREFIX_SIZE, CHECKSUM_OFFSET, HBIN_HEADER_SIZE,
    HBIN_PAGE_SIZE, HBIN_SIGN, HEADER_BLOCK_SIZE, HEADER_SIZE, NK_SIGN, REGF_SIGN,
};

/// Absolute file position of the payload of the cell at relative offset `off`.
pub fn resolve_offset(off: u32) -> usize {
    off as usize + HEADER_BLOCK_SIZE + CELL_PREFIX_SIZE
}

impl RegFileHeader {
    /// XOR of the little-endian words in front of the checksum field.
    pub fn checksum(bs: &[u8]) -> u32 {
        bs[..CHECKSUM_OFFSET.min(bs.len())]
            .chunks_exact(4)
            .fold(0u32, |acc, w| acc ^ u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
    }

    /// Checks signature and checksum, then decodes the header fields.
    pub fn validate(bs: Bytes) -> Result<RegFileHeader, MRError> {
        if bs.len() < HEADER_SIZE {
            return Err(MRError::new_with_kind(
                &format!("header is {} bytes, need {}", bs.len(), HEADER_SIZE),
                MRErrKind::Header(HeaderError::Truncated),
            ));
        }
        if &bs[0..4] != REGF_SIGN {
            return Err(MRError::new_with_kind("Invalid header", MRErrKind::Header(HeaderError::BadSignature)));
        }
        let stored = get_u32_le(&bs, CHECKSUM_OFFSET)?;
        let computed = Self::checksum(&bs);
        if stored != computed {
            return Err(MRError::new_with_kind(
                &format!("Bad checksum: stored {:#010x}, computed {:#010x}", stored, computed),
                MRErrKind::Header(HeaderError::BadChecksum),
            ));
        }
        Self::from_bytes(bs)
    }

    pub fn from_bytes(bs: Bytes) -> Result<RegFileHeader,MRError> {
        let sign = sub_bytes(&bs,0..4)?.to_vec();
        let primary_seq_num = get_u32_le(&bs, 4)?;
        let second_seq_num = get_u32_le(&bs, 8)?;
        let last_modify = get_u64_le(&bs, 12)?;
        let version = HiveVersion {
            major: get_u32_le(&bs, 20)?,
            minor: get_u32_le(&bs, 24)?,
            release: get_u32_le(&bs, 28)?,
            build: get_u32_le(&bs, 32)?,
        };
        let root_key_offset = get_u32_le(&bs, 36)?;
        let hive_bins_data_size = get_u32_le(&bs, 40)?;
        let clustering_factor = get_u32_le(&bs, 44)?;
        let file_name = utf16le_to_string(&sub_bytes(&bs, 48..112)?);
        let checksum = get_u32_le(&bs, CHECKSUM_OFFSET)?;
        Ok(Self {
            sign,
            primary_seq_num,
            second_seq_num,
            last_modify,
            version,
            root_key_offset,
            hive_bins_data_size,
            clustering_factor,
            file_name,
            checksum,
        })
    }

    pub fn get_sequence_numbers(&self) -> (u32, u32) {
        (self.primary_seq_num, self.second_seq_num)
    }

    /// Both update counters agree, i.e. the last write completed.
    pub fn is_clean(&self) -> bool {
        self.primary_seq_num == self.second_seq_num
    }

    pub fn get_last_modify(&self) -> u64 {
        self.last_modify
    }

    pub fn get_version(&self) -> &HiveVersion {
        &self.version
    }

    pub fn get_root_key_offset(&self) -> u32 {
        self.root_key_offset
    }

    pub fn get_hive_bins_data_size(&self) -> u32 {
        self.hive_bins_data_size
    }

    pub fn get_clustering_factor(&self) -> u32 {
        self.clustering_factor
    }

    pub fn get_file_name(&self) -> &str {
        &self.file_name
    }

    pub fn get_checksum(&self) -> u32 {
        self.checksum
    }

    pub fn get_signature(&self) -> &[u8] {
        &self.sign
    }
}

impl HiveBin {
    pub fn new<S: HiveSource>(file: &S, offset: usize) -> Result<HiveBin, MRError> {
        let bs = Bytes::from(file.read_n(offset, HBIN_HEADER_SIZE)?);
        let sign = sub_bytes(&bs,0..4)?.to_vec();
        if sign != HBIN_SIGN {
            return Err(MRError::new("Not a valid Hive bin"));
        }
        Ok(Self {
            sign,
            offset: get_u32_le(&bs, 4)?,
            size: get_u32_le(&bs, 8)?,
            last_modify: get_u64_le(&bs, 20)?,
            offset_of_file: offset,
        })
    }

    pub fn get_signature(&self) -> &[u8] {
        &self.sign
    }

    /// Offset of this bin relative to the first one.
    pub fn get_offset(&self) -> u32 {
        self.offset
    }

    pub fn get_size(&self) -> u32 {
        self.size
    }

    pub fn get_next_offset(&self) -> u32 {
        self.offset.wrapping_add(self.size)
    }

    pub fn get_last_modify(&self) -> u64 {
        self.last_modify
    }

    pub fn get_offset_of_file(&self) -> usize {
        self.offset_of_file
    }
}

impl RegFile<MRFile> {
    pub fn open<P>(f: P, options: HiveOptions) -> Result<RegFile<MRFile>, MRError>
    where P: AsRef<Path> + ToString {
        let mr_file = MRFile::new(f)?;
        info!("opened hive {}", mr_file.get_path());
        Self::from_source(mr_file, options)
    }
}

impl<S: HiveSource> RegFile<S> {
    pub fn from_source(file: S, options: HiveOptions) -> Result<RegFile<S>, MRError> {
        let bs = match file.read_n(0, HEADER_SIZE) {
            Ok(bs) => bs,
            Err(e) if e.is_kind(MRErrKind::Cell(CellError::TruncatedRead)) => {
                return Err(MRError::new_with_kind(
                    "file too small for a hive header",
                    MRErrKind::Header(HeaderError::Truncated),
                ));
            }
            Err(e) => return Err(e),
        };
        let header = RegFileHeader::validate(Bytes::from(bs))?;
        debug!(
            "header ok: version {}.{}, root at {:#x}",
            header.version.major, header.version.minor, header.root_key_offset
        );
        Ok(Self {
            header,
            file,
            options,
        })
    }

    pub fn get_header(&self) -> &RegFileHeader {
        &self.header
    }

    pub fn get_options(&self) -> &HiveOptions {
        &self.options
    }

    /// Allocated cell whose payload starts at the absolute `offset`.
    pub fn read_cell(&self, offset: usize) -> Result<HiveBinCell, MRError> {
        HiveBinCell::read(&self.file, offset, self.options.max_cell_size)
    }

    pub fn read_key(&self, offset: u32) -> Result<RegNamedKey, MRError> {
        let cell = self.read_cell(resolve_offset(offset))?;
        RegNamedKey::from_bytes(cell.into_data(), offset)
    }

    pub fn read_subkey_list(&self, offset: u32) -> Result<RegSubKeyList, MRError> {
        let cell = self.read_cell(resolve_offset(offset))?;
        RegSubKeyList::from_bytes(cell.into_data())
    }

    pub fn read_hive_bin(&self, offset: usize) -> Result<HiveBin, MRError> {
        HiveBin::new(&self.file, offset)
    }

    /// Scans cells from the first hbin until an nk record flagged as root
    /// turns up. Free cells are stepped over by their own length.
    pub fn locate_root(&self) -> Result<RegNamedKey, MRError> {
        let size = self.file.size()?;
        let mut pos = HEADER_BLOCK_SIZE;
        loop {
            if pos % HBIN_PAGE_SIZE == 0 {
                if let Ok(bin) = self.read_hive_bin(pos) {
                    debug!("hbin at {:#x}, size {:#x}", pos, bin.get_size());
                    pos += HBIN_HEADER_SIZE;
                }
            }
            if pos + CELL_PREFIX_SIZE > size {
                return Err(MRError::new_with_kind(
                    "reached end of file without finding the root key",
                    MRErrKind::Root(RootError::RootNotFound),
                ));
            }

            let raw = get_i32_le(&Bytes::from(self.file.read_n(pos, CELL_PREFIX_SIZE)?), 0)?;
            match CellLength::decode(raw) {
                CellLength::Free(len) => {
                    if (len as usize) < CELL_PREFIX_SIZE {
                        return Err(MRError::new_with_kind(
                            &format!("free cell at {:#x} has length {}", pos, len),
                            MRErrKind::Root(RootError::Corrupt),
                        ));
                    }
                    debug!("skipping free cell at {:#x} ({} bytes)", pos, len);
                    pos += len as usize;
                }
                allocated => {
                    let real = allocated.allocated_size(self.options.max_cell_size).map_err(|e| {
                        MRError::new_with_kind(&format!("cell at {:#x}: {}", pos, e), MRErrKind::Root(RootError::Corrupt))
                    })?;
                    let data = Bytes::from(self.file.read_n(pos + CELL_PREFIX_SIZE, real)?);
                    if data.starts_with(NK_SIGN) {
                        match RegNamedKey::from_bytes(data, (pos - HEADER_BLOCK_SIZE) as u32) {
                            Ok(key) if key.is_root() => {
                                info!("root key {:?} at {:#x}", key.get_name(), key.get_offset());
                                return Ok(key);
                            }
                            Ok(_) => {}
                            // value data or class names may start with "nk" too
                            Err(e) => debug!("cell at {:#x} is not a key node: {}", pos, e),
                        }
                    }
                    pos += CELL_PREFIX_SIZE + real;
                }
            }
        }
    }

    /// Root key according to the configured strategy.
    pub fn root_key(&self) -> Result<RegNamedKey, MRError> {
        match self.options.root_strategy {
            RootStrategy::Scan => self.locate_root(),
            RootStrategy::Header => match self.read_key(self.header.root_key_offset) {
                Ok(key) if key.is_root() => Ok(key),
                Ok(key) => {
                    warn!("header root cell {:#x} is not flagged as root (flags {:#x}), scanning",
                        key.get_offset(), key.get_flags());
                    self.locate_root()
                }
                Err(e) => {
                    warn!("header root cell {:#x} unreadable ({}), scanning", self.header.root_key_offset, e);
                    self.locate_root()
                }
            },
        }
    }

    pub fn walk(&self, key: RegNamedKey, depth: usize) -> KeyWalker<'_, S> {
        KeyWalker::new(self, key, depth)
    }

    pub fn walk_from_root(&self) -> Result<KeyWalker<'_, S>, MRError> {
        Ok(self.walk(self.root_key()?, 0))
    }
}
