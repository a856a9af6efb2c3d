use std::io::{self, Write};

use colored::Colorize;

use crate::{
    file_struct::windows::registry::{ErrorPolicy, RegNamedKey, WalkItem},
    utils::{file::HiveSource, MRError},
};

use super::{format_time, RegistryModule};

pub fn format_key_name(key: &RegNamedKey, depth: usize) -> String {
    format!("{}{}", " ".repeat(depth), key.get_name())
}

pub fn format_key_info(key: &RegNamedKey) -> String {
    format!(
        "{}: type {:#x} parent {:#x}, {} subkeys at {:#x}, {} values at {:#x}, security descriptor at {:#x}, name {}",
        String::from_utf8_lossy(key.get_signature()),
        key.get_flags(),
        key.get_parent_offset(),
        key.get_subkeys_num(),
        key.get_subkeys_list_offset(),
        key.get_values_num(),
        key.get_values_list_offset(),
        key.get_security_offset(),
        key.get_name()
    )
}

/// Totals of one tree dump.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub keys        : usize,
    pub anomalies   : usize,
    pub errors      : usize
}

impl<S: HiveSource> RegistryModule<S> {
    pub fn print_tree(&self, full: bool) -> Result<TreeStats, MRError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_tree(&mut out, full)
    }

    /// Writes every key under the root, indented one space per level.
    /// With `full`, each key is followed by its record fields and time.
    /// The first error ends the dump unless the hive was opened with
    /// `ErrorPolicy::SkipSubtree`, in which case errors are printed inline.
    pub fn write_tree<W: Write>(&self, out: &mut W, full: bool) -> Result<TreeStats, MRError> {
        let hive = self.get_hive();
        writeln!(out, "Last modification time: {}", format_time(hive.get_header().get_last_modify()))
            .map_err(MRError::from_io)?;

        let mut stats = TreeStats::default();
        for item in hive.walk_from_root()? {
            match item {
                Ok(WalkItem::Key { depth, key }) => {
                    stats.keys += 1;
                    writeln!(out, "{}", format_key_name(&key, depth)).map_err(MRError::from_io)?;
                    if full {
                        writeln!(out, "{}{}", " ".repeat(depth), format_key_info(&key)).map_err(MRError::from_io)?;
                        writeln!(out, "{}Last modification time: {}", " ".repeat(depth), format_time(key.get_last_written_time()))
                            .map_err(MRError::from_io)?;
                    }
                }
                Ok(WalkItem::Anomaly(a)) => {
                    stats.anomalies += 1;
                    writeln!(out, "{} {}", "WARN:".yellow(), a).map_err(MRError::from_io)?;
                }
                Err(e) if hive.get_options().on_error == ErrorPolicy::Abort => {
                    out.flush().map_err(MRError::from_io)?;
                    return Err(e);
                }
                Err(e) => {
                    stats.errors += 1;
                    writeln!(out, "{} {}", "[Error]:".bright_red(), e).map_err(MRError::from_io)?;
                }
            }
        }
        out.flush().map_err(MRError::from_io)?;
        Ok(stats)
    }
}
