//! Canonical instance hashes (`gbdhash`)
//!
//! The MD5 of a whitespace- and comment-normalized rendering of the instance.
//! Two files that differ only in comments, header or layout hash equally.
//! [`isohash`] is coarser: it only sees the literal degree sequence, so it is
//! also invariant under variable renaming and polarity flips.

use crate::{InstanceReader, TrackedVec};
use gbd_domain::{ExtractError, InstanceFormat, MemoryScope, Untracked};
use std::path::Path;

/// Incrementally rendered normalized text
struct Digest(md5::Context);

impl Digest {
    fn new() -> Self {
        Digest(md5::Context::new())
    }

    fn put(&mut self, text: &str) {
        self.0.consume(text.as_bytes());
    }

    fn finish(self) -> String {
        format!("{:x}", self.0.compute())
    }
}

fn unexpected_eof(reader: &InstanceReader) -> ExtractError {
    ExtractError::Parse {
        line: reader.line(),
        message: "unexpected end of input".to_string(),
    }
}

/// Render literals up to and including the terminating `0`
fn put_literals(reader: &mut InstanceReader, digest: &mut Digest) -> Result<(), ExtractError> {
    while let Some(token) = reader.read_number_token()? {
        if token == "0" {
            break;
        }
        digest.put(&token);
        digest.put(" ");
    }
    digest.put("0");
    Ok(())
}

/// Hash of a DIMACS clause file, optionally with quantifier or weight prefixes
fn dimacs_hash(path: &Path, format: InstanceFormat) -> Result<String, ExtractError> {
    let mut reader = InstanceReader::open(path)?;
    let mut digest = Digest::new();
    let mut first = true;

    while reader.skip_whitespace()? {
        match reader.peek()? {
            Some(b'c') | Some(b'p') => {
                reader.skip_line()?;
                continue;
            }
            Some(quantifier @ (b'e' | b'a')) if format == InstanceFormat::Qbf => {
                if !first {
                    digest.put(" ");
                }
                digest.put(if quantifier == b'e' { "e " } else { "a " });
                reader.skip()?;
            }
            Some(b'h') if format == InstanceFormat::Wcnf => {
                if !first {
                    digest.put(" ");
                }
                digest.put("h ");
                reader.skip()?;
            }
            _ => {
                if !first {
                    digest.put(" ");
                }
                if format == InstanceFormat::Wcnf {
                    let weight = reader
                        .read_number_token()?
                        .ok_or_else(|| unexpected_eof(&reader))?;
                    digest.put(&weight);
                    digest.put(" ");
                }
            }
        }
        put_literals(&mut reader, &mut digest)?;
        first = false;
    }

    Ok(digest.finish())
}

/// Hash of a DIMACS CNF file
pub fn cnf_hash(path: &Path) -> Result<String, ExtractError> {
    dimacs_hash(path, InstanceFormat::Cnf)
}

/// Hash of a QDIMACS file; quantifier lines are part of the hash
pub fn qbf_hash(path: &Path) -> Result<String, ExtractError> {
    dimacs_hash(path, InstanceFormat::Qbf)
}

/// Hash of a WCNF file; weights (or `h`) are part of the hash
pub fn wcnf_hash(path: &Path) -> Result<String, ExtractError> {
    dimacs_hash(path, InstanceFormat::Wcnf)
}

fn is_relation(byte: u8) -> bool {
    matches!(byte, b'>' | b'<' | b'=')
}

/// Hash of a pseudo-Boolean (OPB) file
pub fn opb_hash(path: &Path) -> Result<String, ExtractError> {
    let mut reader = InstanceReader::open(path)?;
    let mut digest = Digest::new();

    while reader.skip_whitespace()? {
        match reader.peek()? {
            Some(b'*') => {
                if !reader.skip_line()? {
                    break;
                }
                continue;
            }
            Some(b'm') => {
                digest.put("min:");
                reader.skip_string("min:")?;
                loop {
                    if !reader.skip_whitespace()? {
                        return Err(unexpected_eof(&reader));
                    }
                    match reader.peek()? {
                        Some(b';') => break,
                        Some(b'x') => {
                            digest.put(" x");
                            reader.skip()?;
                        }
                        _ => digest.put(" "),
                    }
                    let number = reader
                        .read_number_token()?
                        .ok_or_else(|| unexpected_eof(&reader))?;
                    digest.put(&number);
                }
                digest.put(";");
            }
            _ => {
                loop {
                    if !reader.skip_whitespace()? {
                        return Err(unexpected_eof(&reader));
                    }
                    match reader.peek()? {
                        Some(byte) if is_relation(byte) => break,
                        Some(b'x') => {
                            digest.put("x");
                            reader.skip()?;
                        }
                        _ => {}
                    }
                    let number = reader
                        .read_number_token()?
                        .ok_or_else(|| unexpected_eof(&reader))?;
                    digest.put(&number);
                    digest.put(" ");
                }
                while let Some(byte) = reader.peek()? {
                    if !is_relation(byte) {
                        break;
                    }
                    digest.put(if byte == b'>' { ">" } else if byte == b'<' { "<" } else { "=" });
                    reader.skip()?;
                }
                let rhs = reader
                    .read_number_token()?
                    .ok_or_else(|| unexpected_eof(&reader))?;
                digest.put(" ");
                digest.put(&rhs);
                digest.put(";");
                reader.skip_whitespace()?;
            }
        }
        if reader.peek()? == Some(b';') {
            reader.skip()?;
        }
    }

    Ok(digest.finish())
}

/// Hash `path` as an instance of `format`
pub fn gbdhash(path: &Path, format: InstanceFormat) -> Result<String, ExtractError> {
    match format {
        InstanceFormat::Cnf => cnf_hash(path),
        InstanceFormat::Wcnf => wcnf_hash(path),
        InstanceFormat::Opb => opb_hash(path),
        InstanceFormat::Qbf => qbf_hash(path),
    }
}

/// Hash `path` with the format detected from its file name
pub fn identify(path: &Path) -> Result<String, ExtractError> {
    let format = InstanceFormat::from_path(path).ok_or_else(|| {
        ExtractError::UnsupportedFormat(path.display().to_string())
    })?;
    tracing::debug!("Hashing {} as {}", path.display(), format.as_str());
    gbdhash(path, format)
}

/// Hash of the sorted literal degree sequence of a CNF file
pub fn isohash(path: &Path) -> Result<String, ExtractError> {
    isohash_scoped(path, &Untracked)
}

/// [`isohash`] with its per-variable table charged against `scope`
///
/// Each variable contributes its pair of occurrence counts, smaller count
/// first. Variables below the largest one that never occur count as `0 0`.
pub fn isohash_scoped(path: &Path, scope: &dyn MemoryScope) -> Result<String, ExtractError> {
    let mut degrees: TrackedVec<(u32, u32)> = TrackedVec::new(scope);
    let mut reader = InstanceReader::open(path)?;
    let mut clause = Vec::new();
    while reader.read_clause(&mut clause)? {
        for lit in &clause {
            let slot = lit.var() as usize - 1;
            if slot >= degrees.len() {
                degrees.resize(slot + 1, (0, 0))?;
            }
            let (neg, pos) = &mut degrees[slot];
            if lit.is_negative() {
                *neg = neg.saturating_add(1);
            } else {
                *pos = pos.saturating_add(1);
            }
        }
    }

    for (neg, pos) in degrees.iter_mut() {
        if *pos < *neg {
            std::mem::swap(pos, neg);
        }
    }
    degrees.sort_unstable();

    let mut digest = Digest::new();
    for (low, high) in degrees.iter() {
        digest.put(&format!("{} {} ", low, high));
    }
    tracing::debug!("Isohashed {} variables of {}", degrees.len(), path.display());
    Ok(digest.finish())
}
