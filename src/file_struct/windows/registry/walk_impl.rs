use log::{error, warn};

use crate::utils::{file::HiveSource, DecodeError, MRErrKind, MRError};

use super::{
    ErrorPolicy, KeyWalker, RegFile, RegNamedKey, RegSubKeyList, StructuralAnomaly, WalkItem, WalkTask,
};

impl<'a, S: HiveSource> KeyWalker<'a, S> {
    pub fn new(hive: &'a RegFile<S>, key: RegNamedKey, depth: usize) -> KeyWalker<'a, S> {
        Self {
            hive,
            stack: vec![WalkTask::Decoded { key, depth }],
            done: false,
        }
    }

    fn enter(&mut self, key: RegNamedKey, depth: usize) -> Result<WalkItem, MRError> {
        if depth > self.hive.get_options().max_depth {
            return Err(MRError::new_with_kind(
                &format!("key {:#x} nested deeper than {}", key.get_offset(), self.hive.get_options().max_depth),
                MRErrKind::Decode(DecodeError::DepthExceeded),
            ));
        }
        if !key.is_leaf() {
            self.stack.push(WalkTask::List {
                offset: key.get_subkeys_list_offset(),
                depth: depth + 1,
                parent: Some((key.get_offset(), key.get_name(), key.get_subkeys_num())),
            });
        }
        Ok(WalkItem::Key { depth, key })
    }

    fn push_keys(&mut self, offsets: Vec<u32>, depth: usize) {
        self.stack.extend(offsets.into_iter().rev().map(|offset| WalkTask::Key { offset, depth }));
    }

    fn step(&mut self, task: WalkTask) -> Result<Option<WalkItem>, MRError> {
        match task {
            WalkTask::Decoded { key, depth } => self.enter(key, depth).map(Some),
            WalkTask::Key { offset, depth } => {
                let key = self.hive.read_key(offset)?;
                self.enter(key, depth).map(Some)
            }
            WalkTask::List { offset, depth, parent: Some((key_offset, key_name, declared)) } => {
                let list = self.hive.read_subkey_list(offset)?;
                match list {
                    RegSubKeyList::IndexOfIndexes(lists) => {
                        self.stack.extend(lists.into_iter().rev().map(|offset| WalkTask::List {
                            offset,
                            depth,
                            parent: None,
                        }));
                        Ok(None)
                    }
                    list => {
                        let found = list.len() as u32;
                        self.push_keys(list.offsets(), depth);
                        if found != declared {
                            let anomaly = StructuralAnomaly {
                                key_offset,
                                key_name,
                                declared,
                                found,
                            };
                            warn!("{}", anomaly);
                            return Ok(Some(WalkItem::Anomaly(anomaly)));
                        }
                        Ok(None)
                    }
                }
            }
            WalkTask::List { offset, depth, parent: None } => {
                let list = self.hive.read_subkey_list(offset).map_err(|e| {
                    if e.is_kind(MRErrKind::Decode(DecodeError::UnknownIndexKind)) {
                        MRError::new_with_kind(
                            &format!("unknown subentry of ri list at {:#x}", offset),
                            MRErrKind::Decode(DecodeError::UnknownSubentryKind),
                        )
                    } else {
                        e
                    }
                })?;
                match list {
                    RegSubKeyList::IndexOfIndexes(_) => Err(MRError::new_with_kind(
                        &format!("ri list at {:#x} nested inside another ri list", offset),
                        MRErrKind::Decode(DecodeError::UnknownSubentryKind),
                    )),
                    list => {
                        self.push_keys(list.offsets(), depth);
                        Ok(None)
                    }
                }
            }
        }
    }
}

impl<'a, S: HiveSource> Iterator for KeyWalker<'a, S> {
    type Item = Result<WalkItem, MRError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let task = match self.stack.pop() {
                Some(t) => t,
                None => {
                    self.done = true;
                    break;
                }
            };
            match self.step(task) {
                Ok(Some(item)) => return Some(Ok(item)),
                Ok(None) => continue,
                Err(e) => {
                    error!("{}", e);
                    if self.hive.get_options().on_error == ErrorPolicy::Abort {
                        self.done = true;
                        self.stack.clear();
                    }
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl std::fmt::Display for StructuralAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "number of subkeys does not match, {} != {} (key {:?} at {:#x})",
            self.declared, self.found, self.key_name, self.key_offset
        )
    }
}
