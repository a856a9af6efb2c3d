use std::io::{self, Write};

use crate::utils::{file::HiveSource, MRError};

use super::{format_time, RegistryModule};

impl<S: HiveSource> RegistryModule<S> {
    pub fn print_header(&self) -> Result<(), MRError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_header(&mut out)
    }

    pub fn write_header<W: Write>(&self, out: &mut W) -> Result<(), MRError> {
        let header = self.get_hive().get_header();
        let (primary, secondary) = header.get_sequence_numbers();
        let version = header.get_version();
        let lines = [
            format!("file: {}", self.get_file()),
            format!("\tname: {}", header.get_file_name()),
            format!("\tversion: {}.{}.{}.{}", version.major, version.minor, version.release, version.build),
            format!("\tsequence numbers: {} / {}{}", primary, secondary,
                if header.is_clean() { "" } else { " (dirty)" }),
            format!("\tlast modification time: {}", format_time(header.get_last_modify())),
            format!("\troot cell offset: {:#x}", header.get_root_key_offset()),
            format!("\thive bins data size: {:#x}", header.get_hive_bins_data_size()),
            format!("\tclustering factor: {}", header.get_clustering_factor()),
            format!("\tchecksum: {:#010x}", header.get_checksum()),
        ];
        for line in lines {
            writeln!(out, "{}", line).map_err(MRError::from_io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::file_struct::windows::registry::{testutil::HiveBuilder, HiveOptions, RegFile};
    use crate::modules::registry::RegistryModule;
    use crate::utils::file::MemFile;

    #[test]
    fn header_dump() {
        let mut b = HiveBuilder::minimal();
        b.set_file_name("SYSTEM");
        let hive = RegFile::from_source(MemFile::new(b.build()), HiveOptions::default()).unwrap();
        let m = RegistryModule::from_hive(hive, "SYSTEM.hiv");
        let mut out = Vec::new();
        m.write_header(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("file: SYSTEM.hiv\n\tname: SYSTEM\n\tversion: 1.5.0.1\n"));
        assert!(text.contains("\tsequence numbers: 7 / 7\n"));
        assert!(text.contains("\troot cell offset: 0x20\n"));
        assert!(text.contains("\thive bins data size: 0x1000\n\tclustering factor: 1\n"));
    }
}
