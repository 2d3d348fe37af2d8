use std::{ffi::OsStr, path::PathBuf};

/// A file path, or `-` for the standard stream of the direction it is used in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOrStd {
    Path(PathBuf),
    StdStream,
}

impl From<&OsStr> for PathOrStd {
    fn from(value: &OsStr) -> Self {
        if value == "-" {
            Self::StdStream
        } else {
            Self::Path(value.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_is_the_std_stream() {
        assert_eq!(PathOrStd::from(OsStr::new("-")), PathOrStd::StdStream);
        assert_eq!(
            PathOrStd::from(OsStr::new("out.txt")),
            PathOrStd::Path(PathBuf::from("out.txt"))
        );
    }
}
