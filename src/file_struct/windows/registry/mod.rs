//! Offline registry hive (regf) reader.
//!
//! File layout:
//! ```text
//! +0x0000  base block, one page, "regf" + checksum over the first 0x1FC bytes
//! +0x1000  hbin pages, each "hbin" + 0x20 byte header, followed by cells
//!          cell = | i32 length | payload ... |
//!          allocated cells store a negative length
//! ```
//! Offsets stored inside records are relative to +0x1000 and point at a
//! cell's length field; see [`resolve_offset`].

use bytes::Bytes;

use crate::utils::file::{HiveSource, MRFile};

pub mod reg_impl;
pub mod cell_impl;
pub mod key_impl;
pub mod walk_impl;

#[cfg(test)]
pub(crate) mod testutil;

pub use reg_impl::resolve_offset;

pub const REGF_SIGN: &[u8; 4] = b"regf";
pub const HBIN_SIGN: &[u8; 4] = b"hbin";
pub const NK_SIGN: &[u8; 2] = b"nk";
pub const LH_SIGN: &[u8; 2] = b"lh";
pub const LF_SIGN: &[u8; 2] = b"lf";
pub const RI_SIGN: &[u8; 2] = b"ri";
pub const LI_SIGN: &[u8; 2] = b"li";

/// Size of the base block preceding the first hbin.
pub const HEADER_BLOCK_SIZE: usize = 0x1000;
/// Bytes of the base block covered by the checksum, plus the checksum itself.
pub const HEADER_SIZE: usize = 0x200;
pub const CHECKSUM_OFFSET: usize = 0x1FC;
pub const HBIN_PAGE_SIZE: usize = 0x1000;
pub const HBIN_HEADER_SIZE: usize = 0x20;
pub const CELL_PREFIX_SIZE: usize = 4;
/// Fixed part of an nk record, up to the name.
pub const NK_FIXED_SIZE: usize = 0x4C;

pub const NK_ROOT: u16 = 0x2c;
pub const NK_NODE: u16 = 0x20;
pub const NK_LINK: u16 = 0x10;
pub const KEY_COMP_NAME: u16 = 0x20;

pub const NO_OFFSET: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveVersion {
    pub major       : u32,
    pub minor       : u32,
    pub release     : u32,
    pub build       : u32
}

#[derive(Debug, Clone)]
pub struct RegFileHeader {
    sign                : Vec<u8>,
    primary_seq_num     : u32,
    second_seq_num      : u32,
    last_modify         : u64,
    version             : HiveVersion,
    root_key_offset     : u32,
    hive_bins_data_size : u32,
    clustering_factor   : u32,
    file_name           : String,
    checksum            : u32
}

#[derive(Debug, Clone)]
pub struct HiveBin {
    sign                : Vec<u8>,
    offset              : u32,
    size                : u32,
    last_modify         : u64,
    offset_of_file      : usize
}

/// Decoded value of a cell's length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLength {
    /// Payload length, `-length - 4`. May be out of range on corrupt input.
    Allocated(i64),
    /// Whole span of a free cell including its length field.
    Free(u32)
}

#[derive(Debug, Clone)]
pub struct HiveBinCell {
    offset_of_file      : usize,
    declared            : i32,
    data                : Bytes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKeyType {
    Root,
    Node,
    Link,
    Other(u16)
}

#[derive(Debug, Clone)]
pub struct RegNamedKey {
    sign                        : [u8;2],
    flags                       : u16,
    last_written_time           : u64,
    parent_key_offset           : u32,
    subkeys_num                 : u32,
    volatile_subkeys_num        : u32,
    subkeys_list_offset         : u32,
    volatile_subkeys_list_offset: u32,
    number_of_values            : u32,
    values_list_offset          : u32,
    security_key_offset         : u32,
    class_name_offset           : u32,
    key_name_size               : u16,
    class_name_size             : u16,
    key_name                    : Vec<u8>,
    offset                      : u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashEntry {
    pub offset  : u32,
    pub hash    : [u8;4]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegSubKeyList {
    /// "lh" / "lf"
    HashList { sign: [u8;2], entries: Vec<HashEntry> },
    /// "ri", offsets of further lists
    IndexOfIndexes(Vec<u32>),
    /// "li", offsets of nk cells
    LegacyList(Vec<u32>)
}

/// Subkey count on a key node disagrees with its directly referenced list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralAnomaly {
    pub key_offset      : u32,
    pub key_name        : String,
    pub declared        : u32,
    pub found           : u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStrategy {
    Scan,
    Header
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    Abort,
    SkipSubtree
}

#[derive(Debug, Clone)]
pub struct HiveOptions {
    pub root_strategy   : RootStrategy,
    pub max_cell_size   : usize,
    pub max_depth       : usize,
    pub on_error        : ErrorPolicy
}

impl Default for HiveOptions {
    fn default() -> Self {
        Self {
            root_strategy: RootStrategy::Scan,
            max_cell_size: HBIN_PAGE_SIZE,
            max_depth: 512,
            on_error: ErrorPolicy::Abort,
        }
    }
}

pub struct RegFile<S: HiveSource = MRFile> {
    header  : RegFileHeader,
    file    : S,
    options : HiveOptions
}

#[derive(Debug, Clone)]
pub enum WalkItem {
    Key { depth: usize, key: RegNamedKey },
    Anomaly(StructuralAnomaly)
}

enum WalkTask {
    Decoded { key: RegNamedKey, depth: usize },
    Key { offset: u32, depth: usize },
    /// `parent` is set for a list referenced straight from a key node
    List { offset: u32, depth: usize, parent: Option<(u32, String, u32)> }
}

/// Depth-first, pre-order walk over a key and its descendants.
/// Holds offsets only; every node is read from the source when reached.
pub struct KeyWalker<'a, S: HiveSource> {
    hive    : &'a RegFile<S>,
    stack   : Vec<WalkTask>,
    done    : bool
}
