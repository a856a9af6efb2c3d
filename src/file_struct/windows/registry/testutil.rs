//! Synthetic hive images for tests.

use super::{
    reg_impl::resolve_offset, RegFileHeader, CELL_PREFIX_SIZE, CHECKSUM_OFFSET, HBIN_HEADER_SIZE,
    HBIN_PAGE_SIZE, HBIN_SIGN, HEADER_BLOCK_SIZE, NK_FIXED_SIZE, NK_ROOT, NK_SIGN, NO_OFFSET, REGF_SIGN,
};

/// nk payload with an ASCII name.
pub fn nk_record(name: &str, flags: u16, parent: u32, subkeys: u32, subkeys_offset: u32) -> Vec<u8> {
    let mut v = vec![0u8; NK_FIXED_SIZE];
    v[0..2].copy_from_slice(NK_SIGN);
    v[0x2..0x4].copy_from_slice(&flags.to_le_bytes());
    v[0x4..0xc].copy_from_slice(&128_920_424_540_000_000u64.to_le_bytes());
    v[0x10..0x14].copy_from_slice(&parent.to_le_bytes());
    v[0x14..0x18].copy_from_slice(&subkeys.to_le_bytes());
    v[0x1c..0x20].copy_from_slice(&subkeys_offset.to_le_bytes());
    v[0x20..0x24].copy_from_slice(&NO_OFFSET.to_le_bytes());
    v[0x28..0x2c].copy_from_slice(&NO_OFFSET.to_le_bytes());
    v[0x2c..0x30].copy_from_slice(&0x78u32.to_le_bytes());
    v[0x30..0x34].copy_from_slice(&NO_OFFSET.to_le_bytes());
    v[0x48..0x4a].copy_from_slice(&(name.len() as u16).to_le_bytes());
    v.extend_from_slice(name.as_bytes());
    v
}

pub fn hash_list_record(sign: &[u8; 2], offsets: &[u32]) -> Vec<u8> {
    let mut v = sign.to_vec();
    v.extend_from_slice(&(offsets.len() as u16).to_le_bytes());
    for off in offsets {
        v.extend_from_slice(&off.to_le_bytes());
        v.extend_from_slice(b"hash");
    }
    v
}

/// "ri" / "li" payload.
pub fn list_record(sign: &[u8; 2], offsets: &[u32]) -> Vec<u8> {
    let mut v = sign.to_vec();
    v.extend_from_slice(&(offsets.len() as u16).to_le_bytes());
    for off in offsets {
        v.extend_from_slice(&off.to_le_bytes());
    }
    v
}

/// Builds a base block plus one hbin holding the appended cells.
/// Offsets handed out are relative to the hbin start, as stored on disk.
pub struct HiveBuilder {
    data        : Vec<u8>,
    root        : u32,
    file_name   : String
}

impl HiveBuilder {
    pub fn new() -> HiveBuilder {
        HiveBuilder {
            data: vec![0u8; HBIN_HEADER_SIZE],
            root: 0x20,
            file_name: String::new(),
        }
    }

    /// Header plus a lone root key named "ROOT".
    pub fn minimal() -> HiveBuilder {
        let mut b = HiveBuilder::new();
        let root = b.cell(&nk_record("ROOT", NK_ROOT, 0, 0, NO_OFFSET));
        b.set_root(root);
        b
    }

    pub fn set_root(&mut self, root: u32) {
        self.root = root;
    }

    pub fn set_file_name(&mut self, name: &str) {
        self.file_name = name.to_string();
    }

    pub fn raw_cell(&mut self, declared: i32, payload: &[u8]) -> u32 {
        let at = self.data.len() as u32;
        self.data.extend_from_slice(&declared.to_le_bytes());
        self.data.extend_from_slice(payload);
        at
    }

    /// Allocated cell, padded to 8 bytes like the real allocator does.
    pub fn cell(&mut self, payload: &[u8]) -> u32 {
        let total = (payload.len() + CELL_PREFIX_SIZE + 7) & !7;
        let mut padded = payload.to_vec();
        padded.resize(total - CELL_PREFIX_SIZE, 0);
        self.raw_cell(-(total as i32), &padded)
    }

    pub fn free_cell(&mut self, total: usize) -> u32 {
        self.raw_cell(total as i32, &vec![0u8; total - CELL_PREFIX_SIZE])
    }

    /// Allocated cell of zeroes, to be written later with [`HiveBuilder::fill`].
    pub fn reserve(&mut self, len: usize) -> u32 {
        self.cell(&vec![0u8; len])
    }

    pub fn fill(&mut self, at: u32, payload: &[u8]) {
        let start = resolve_offset(at) - HEADER_BLOCK_SIZE;
        self.data[start..start + payload.len()].copy_from_slice(payload);
    }

    /// Free cell spanning up to relative offset `to`.
    pub fn pad_to(&mut self, to: u32) {
        let gap = to as usize - self.data.len();
        if gap > 0 {
            self.free_cell(gap);
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bins = self.data.clone();
        let bin_size = ((bins.len() + HBIN_PAGE_SIZE - 1) / HBIN_PAGE_SIZE).max(1) * HBIN_PAGE_SIZE;
        let tail = bin_size - bins.len();
        bins[0..4].copy_from_slice(HBIN_SIGN);
        bins[8..12].copy_from_slice(&(bin_size as u32).to_le_bytes());
        if tail >= 8 {
            bins.extend_from_slice(&(tail as i32).to_le_bytes());
        }
        bins.resize(bin_size, 0);

        let mut header = vec![0u8; HEADER_BLOCK_SIZE];
        header[0..4].copy_from_slice(REGF_SIGN);
        header[4..8].copy_from_slice(&7u32.to_le_bytes());
        header[8..12].copy_from_slice(&7u32.to_le_bytes());
        header[12..20].copy_from_slice(&128_920_424_540_000_000u64.to_le_bytes());
        header[20..24].copy_from_slice(&1u32.to_le_bytes());
        header[24..28].copy_from_slice(&5u32.to_le_bytes());
        header[32..36].copy_from_slice(&1u32.to_le_bytes());
        header[36..40].copy_from_slice(&self.root.to_le_bytes());
        header[40..44].copy_from_slice(&(bin_size as u32).to_le_bytes());
        header[44..48].copy_from_slice(&1u32.to_le_bytes());
        let name: Vec<u8> = self.file_name.encode_utf16().take(31).flat_map(|u| u.to_le_bytes()).collect();
        header[48..48 + name.len()].copy_from_slice(&name);
        let sum = RegFileHeader::checksum(&header);
        header[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&sum.to_le_bytes());

        header.extend_from_slice(&bins);
        header
    }
}
