use std::{error::Error, fmt::Display};

pub mod error;
pub mod funcs;
pub mod file;
pub mod log;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    BadSignature,
    BadChecksum,
    Truncated
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    /// Non-negative length field where an allocated cell was required
    FreeCell,
    SizeOutOfRange,
    TruncatedRead
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnknownIndexKind,
    UnknownSubentryKind,
    InvalidCount,
    NameLengthMismatch,
    NotAKeyNode,
    ShortRecord,
    DepthExceeded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootError {
    RootNotFound,
    Corrupt
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MRErrKind {
    None,
    Io,
    OutOfByteRange,
    Header(HeaderError),
    Cell(CellError),
    Decode(DecodeError),
    Root(RootError)
}

impl Default for MRErrKind {
    fn default() -> Self {
        Self::None
    }
}

impl Display for MRErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Io => write!(f, "IoError"),
            Self::OutOfByteRange => write!(f, "OutOfByteRange"),
            Self::Header(e) => write!(f, "HeaderError::{:?}", e),
            Self::Cell(e) => write!(f, "CellError::{:?}", e),
            Self::Decode(e) => write!(f, "DecodeError::{:?}", e),
            Self::Root(e) => write!(f, "RootError::{:?}", e),
        }
    }
}


#[derive(Debug, Default)]
pub struct MRError {
    detail  : Option<String>,
    err     : Option<Box<dyn Error>>,
    kind    : MRErrKind
}
