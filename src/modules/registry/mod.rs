use std::path;

use crate::{
    file_struct::windows::registry::{HiveOptions, RegFile},
    utils::{file::{HiveSource, MRFile}, funcs::ticks_to_datetime, MRError},
};

pub mod print_tree;
pub mod print_header;

pub struct RegistryModule<S: HiveSource = MRFile> {
    hive    : RegFile<S>,
    file    : String
}

impl RegistryModule<MRFile> {
    pub fn new<P>(file: P, options: HiveOptions) -> Result<RegistryModule<MRFile>, MRError>
    where P: AsRef<path::Path> + ToString {
        let s = file.to_string();
        let hive = RegFile::open(file, options)?;
        Ok(Self {
            hive,
            file: s,
        })
    }
}

impl<S: HiveSource> RegistryModule<S> {
    pub fn from_hive(hive: RegFile<S>, name: &str) -> RegistryModule<S> {
        Self {
            hive,
            file: name.to_string(),
        }
    }

    pub fn get_hive(&self) -> &RegFile<S> {
        &self.hive
    }

    pub fn get_file(&self) -> &str {
        &self.file
    }
}

pub(crate) fn format_time(ticks: u64) -> String {
    match ticks_to_datetime(ticks) {
        Some(t) => format!("{} UTC", t.format("%a %b %e %H:%M:%S %Y")),
        None => format!("invalid time ({:#x})", ticks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(128_920_424_540_000_000), "Tue Jul 14 10:54:14 2009 UTC");
        assert_eq!(format_time(5), "invalid time (0x5)");
    }
}
