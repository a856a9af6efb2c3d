use std::{error::Error, fmt, io};

use super::{CellError, MRErrKind, MRError};


impl MRError {
    pub fn new(msg: &str) -> MRError{
        MRError {
            detail: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn new_with_kind(msg: &str, kind: MRErrKind) -> MRError {
        MRError {
            detail: Some(msg.to_string()),
            kind,
            ..Default::default()
        }
    }

    /// Wraps an io error, turning a short read into `CellError::TruncatedRead`.
    pub fn from_io(err: io::Error) -> MRError {
        let kind = match err.kind() {
            io::ErrorKind::UnexpectedEof => MRErrKind::Cell(CellError::TruncatedRead),
            _ => MRErrKind::Io
        };
        MRError {
            detail: None,
            err: Some(Box::new(err)),
            kind,
        }
    }

    pub fn is_kind(&self, kind: MRErrKind) -> bool {
        self.kind == kind
    }
}


impl fmt::Display for MRError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(detail) = &self.detail {
            return write!(f, "{}: {}", self.kind, detail)
        }

        if let Some(err) = &self.err {
            return write!(f, "{}: {}", self.kind, err)
        }

        write!(f, "{}: Nothing", self.kind)
    }
}

impl Error for MRError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.err.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::utils::HeaderError;

    #[test]
    fn unexpected_eof_maps_to_truncated_read() {
        let e = MRError::from_io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(e.is_kind(MRErrKind::Cell(CellError::TruncatedRead)));

        let e = MRError::from_io(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(e.is_kind(MRErrKind::Io));
    }

    #[test]
    fn display_carries_kind_and_detail() {
        let e = MRError::new_with_kind("Bad checksum", MRErrKind::Header(HeaderError::BadChecksum));
        assert_eq!(e.to_string(), "HeaderError::BadChecksum: Bad checksum");
    }
}
