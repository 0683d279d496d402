//! Instance formats and compression schemes, detected from file names

use std::path::Path;

/// Problem format of an instance file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceFormat {
    /// DIMACS CNF (`.cnf`, `.wecnf`)
    Cnf,
    /// Weighted (MaxSAT) CNF (`.wcnf`)
    Wcnf,
    /// Pseudo-Boolean (`.opb`)
    Opb,
    /// Quantified CNF (`.qcnf`, `.qdimacs`)
    Qbf,
}

impl InstanceFormat {
    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceFormat::Cnf => "cnf",
            InstanceFormat::Wcnf => "wcnf",
            InstanceFormat::Opb => "opb",
            InstanceFormat::Qbf => "qbf",
        }
    }

    /// Parse a format from its name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cnf" => Some(InstanceFormat::Cnf),
            "wcnf" => Some(InstanceFormat::Wcnf),
            "opb" => Some(InstanceFormat::Opb),
            "qbf" | "qcnf" | "qdimacs" => Some(InstanceFormat::Qbf),
            _ => None,
        }
    }

    /// Detect the format from a file name, looking through a compression suffix
    ///
    /// `foo.cnf.xz` is detected as [`InstanceFormat::Cnf`].
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = if Compression::from_path(path) == Compression::None {
            path.extension()
        } else {
            path.file_stem().map(Path::new).and_then(Path::extension)
        };

        match ext?.to_str()? {
            "cnf" | "wecnf" => Some(InstanceFormat::Cnf),
            "wcnf" => Some(InstanceFormat::Wcnf),
            "opb" => Some(InstanceFormat::Opb),
            "qcnf" | "qdimacs" => Some(InstanceFormat::Qbf),
            _ => None,
        }
    }
}

/// Compression scheme of an instance file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Plain text
    None,
    /// gzip (`.gz`)
    Gzip,
    /// xz container (`.xz`)
    Xz,
    /// Legacy lzma-alone stream (`.lzma`)
    Lzma,
    /// bzip2 (`.bz2`)
    Bzip2,
}

impl Compression {
    /// Detect the compression scheme from the last extension of a file name
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("xz") => Compression::Xz,
            Some("lzma") => Compression::Lzma,
            Some("bz2") => Compression::Bzip2,
            _ => Compression::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_plain_extension() {
        assert_eq!(InstanceFormat::from_path(Path::new("a.cnf")), Some(InstanceFormat::Cnf));
        assert_eq!(InstanceFormat::from_path(Path::new("a.wecnf")), Some(InstanceFormat::Cnf));
        assert_eq!(InstanceFormat::from_path(Path::new("a.wcnf")), Some(InstanceFormat::Wcnf));
        assert_eq!(InstanceFormat::from_path(Path::new("a.opb")), Some(InstanceFormat::Opb));
        assert_eq!(InstanceFormat::from_path(Path::new("a.qdimacs")), Some(InstanceFormat::Qbf));
        assert_eq!(InstanceFormat::from_path(Path::new("a.txt")), None);
    }

    #[test]
    fn test_format_looks_through_compression() {
        assert_eq!(InstanceFormat::from_path(Path::new("dir/a.cnf.xz")), Some(InstanceFormat::Cnf));
        assert_eq!(InstanceFormat::from_path(Path::new("a.wcnf.gz")), Some(InstanceFormat::Wcnf));
        assert_eq!(InstanceFormat::from_path(Path::new("a.qcnf.bz2")), Some(InstanceFormat::Qbf));
        assert_eq!(InstanceFormat::from_path(Path::new("a.gz")), None);
    }

    #[test]
    fn test_compression_detection() {
        assert_eq!(Compression::from_path(Path::new("a.cnf")), Compression::None);
        assert_eq!(Compression::from_path(Path::new("a.cnf.gz")), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("a.cnf.xz")), Compression::Xz);
        assert_eq!(Compression::from_path(Path::new("a.cnf.lzma")), Compression::Lzma);
        assert_eq!(Compression::from_path(Path::new("a.cnf.bz2")), Compression::Bzip2);
    }

    #[test]
    fn test_parse_round_trip() {
        for format in [InstanceFormat::Cnf, InstanceFormat::Wcnf, InstanceFormat::Opb, InstanceFormat::Qbf] {
            assert_eq!(InstanceFormat::parse(format.as_str()), Some(format));
        }
        assert_eq!(InstanceFormat::parse("QDIMACS"), Some(InstanceFormat::Qbf));
        assert_eq!(InstanceFormat::parse("sat"), None);
    }
}
