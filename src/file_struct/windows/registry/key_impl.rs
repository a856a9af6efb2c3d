use bytes::Bytes;
use log::debug;

use crate::utils::{
    funcs::{get_i16_le, get_u16_le, get_u32_le, get_u64_le, latin1_to_string, sub_bytes, utf16le_to_string},
    DecodeError, MRErrKind, MRError,
};

use super::{
    HashEntry, NamedKeyType, RegNamedKey, RegSubKeyList, KEY_COMP_NAME, LF_SIGN, LH_SIGN, LI_SIGN,
    NK_FIXED_SIZE, NK_LINK, NK_NODE, NK_ROOT, NK_SIGN, NO_OFFSET, RI_SIGN,
};

fn decode_err(msg: &str, e: DecodeError) -> MRError {
    MRError::new_with_kind(msg, MRErrKind::Decode(e))
}

impl NamedKeyType {
    pub fn from_flags(flags: u16) -> NamedKeyType {
        match flags {
            NK_ROOT => NamedKeyType::Root,
            NK_NODE => NamedKeyType::Node,
            NK_LINK => NamedKeyType::Link,
            other => NamedKeyType::Other(other),
        }
    }
}

impl RegNamedKey {
    /// Decodes an nk record from a cell payload.
    ///
    /// The name length is a field of the fixed prefix, so the prefix is
    /// decoded first and the name is then sliced out of the payload once
    /// its true size is known. A payload shorter than prefix + name is an
    /// error rather than a short name.
    pub fn from_bytes(bs: Bytes, offset: u32) -> Result<RegNamedKey, MRError> {
        if bs.len() < NK_FIXED_SIZE {
            return Err(decode_err(
                &format!("nk record at {:#x} is {} bytes, shorter than its fixed part", offset, bs.len()),
                DecodeError::ShortRecord,
            ));
        }
        let prefix = sub_bytes(&bs, 0..NK_FIXED_SIZE)?;
        if &prefix[0..2] != NK_SIGN {
            return Err(decode_err(
                &format!("cell at {:#x} is not an nk record", offset),
                DecodeError::NotAKeyNode,
            ));
        }
        let key_name_size = get_u16_le(&prefix, 0x48)?;
        let full_size = NK_FIXED_SIZE + key_name_size as usize;
        if full_size > bs.len() {
            return Err(decode_err(
                &format!("nk at {:#x} declares a {} byte name but only {} bytes follow",
                    offset, key_name_size, bs.len() - NK_FIXED_SIZE),
                DecodeError::NameLengthMismatch,
            ));
        }
        let key_name = sub_bytes(&bs, NK_FIXED_SIZE..full_size)?.to_vec();

        Ok(Self {
            sign: [prefix[0], prefix[1]],
            flags: get_u16_le(&prefix, 0x2)?,
            last_written_time: get_u64_le(&prefix, 0x4)?,
            parent_key_offset: get_u32_le(&prefix, 0x10)?,
            subkeys_num: get_u32_le(&prefix, 0x14)?,
            volatile_subkeys_num: get_u32_le(&prefix, 0x18)?,
            subkeys_list_offset: get_u32_le(&prefix, 0x1c)?,
            volatile_subkeys_list_offset: get_u32_le(&prefix, 0x20)?,
            number_of_values: get_u32_le(&prefix, 0x24)?,
            values_list_offset: get_u32_le(&prefix, 0x28)?,
            security_key_offset: get_u32_le(&prefix, 0x2c)?,
            class_name_offset: get_u32_le(&prefix, 0x30)?,
            key_name_size,
            class_name_size: get_u16_le(&prefix, 0x4a)?,
            key_name,
            offset,
        })
    }

    pub fn get_type(&self) -> NamedKeyType {
        NamedKeyType::from_flags(self.flags)
    }

    pub fn is_root(&self) -> bool {
        self.get_type() == NamedKeyType::Root
    }

    /// True when there is no subkey list to follow.
    pub fn is_leaf(&self) -> bool {
        self.subkeys_num == 0 || self.subkeys_list_offset == 0 || self.subkeys_list_offset == NO_OFFSET
    }

    pub fn get_name(&self) -> String {
        if self.flags & KEY_COMP_NAME != 0 {
            latin1_to_string(&self.key_name)
        } else {
            utf16le_to_string(&self.key_name)
        }
    }

    pub fn get_name_bytes(&self) -> &[u8] {
        &self.key_name
    }

    pub fn get_signature(&self) -> &[u8;2] {
        &self.sign
    }

    pub fn get_flags(&self) -> u16 {
        self.flags
    }

    pub fn get_last_written_time(&self) -> u64 {
        self.last_written_time
    }

    pub fn get_parent_offset(&self) -> u32 {
        self.parent_key_offset
    }

    pub fn get_subkeys_num(&self) -> u32 {
        self.subkeys_num
    }

    pub fn get_volatile_subkeys_num(&self) -> u32 {
        self.volatile_subkeys_num
    }

    pub fn get_subkeys_list_offset(&self) -> u32 {
        self.subkeys_list_offset
    }

    pub fn get_volatile_subkeys_list_offset(&self) -> u32 {
        self.volatile_subkeys_list_offset
    }

    pub fn get_values_num(&self) -> u32 {
        self.number_of_values
    }

    pub fn get_values_list_offset(&self) -> u32 {
        self.values_list_offset
    }

    pub fn get_security_offset(&self) -> u32 {
        self.security_key_offset
    }

    pub fn get_class_name_offset(&self) -> u32 {
        self.class_name_offset
    }

    pub fn get_class_name_size(&self) -> u16 {
        self.class_name_size
    }

    pub fn get_key_name_size(&self) -> u16 {
        self.key_name_size
    }

    /// Relative offset this key was read from.
    pub fn get_offset(&self) -> u32 {
        self.offset
    }
}

impl RegSubKeyList {
    pub fn from_bytes(bs: Bytes) -> Result<RegSubKeyList, MRError> {
        if bs.len() < 4 {
            return Err(decode_err("subkey list shorter than its header", DecodeError::ShortRecord));
        }
        let sign = [bs[0], bs[1]];
        let entry_size = match &sign {
            LH_SIGN | LF_SIGN => 8,
            RI_SIGN | LI_SIGN => 4,
            _ => {
                return Err(decode_err(
                    &format!("unknown subkey list type {:?}", String::from_utf8_lossy(&sign)),
                    DecodeError::UnknownIndexKind,
                ));
            }
        };

        let count = get_i16_le(&bs, 2)?;
        if count < 0 {
            return Err(decode_err(
                &format!("negative entry count {}", count),
                DecodeError::InvalidCount,
            ));
        }
        let count = count as usize;
        let end = 4 + count * entry_size;
        if end > bs.len() {
            return Err(decode_err(
                &format!("{} entries do not fit in a {} byte list", count, bs.len()),
                DecodeError::ShortRecord,
            ));
        }
        debug!("{} list with {} entries", String::from_utf8_lossy(&sign), count);

        let list = if entry_size == 8 {
            let mut entries = Vec::with_capacity(count);
            for at in (4..end).step_by(8) {
                entries.push(HashEntry {
                    offset: get_u32_le(&bs, at)?,
                    hash: [bs[at + 4], bs[at + 5], bs[at + 6], bs[at + 7]],
                });
            }
            RegSubKeyList::HashList { sign, entries }
        } else {
            let mut offsets = Vec::with_capacity(count);
            for at in (4..end).step_by(4) {
                offsets.push(get_u32_le(&bs, at)?);
            }
            if &sign == RI_SIGN {
                RegSubKeyList::IndexOfIndexes(offsets)
            } else {
                RegSubKeyList::LegacyList(offsets)
            }
        };
        Ok(list)
    }

    pub fn len(&self) -> usize {
        match self {
            RegSubKeyList::HashList { entries, .. } => entries.len(),
            RegSubKeyList::IndexOfIndexes(v) | RegSubKeyList::LegacyList(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offsets in on-disk order. For "ri" these are further lists, otherwise nk cells.
    pub fn offsets(&self) -> Vec<u32> {
        match self {
            RegSubKeyList::HashList { entries, .. } => entries.iter().map(|e| e.offset).collect(),
            RegSubKeyList::IndexOfIndexes(v) | RegSubKeyList::LegacyList(v) => v.clone(),
        }
    }
}
