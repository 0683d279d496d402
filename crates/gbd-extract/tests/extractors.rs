//! Integration tests for the feature extractors and the instance reader

use bzip2::write::BzEncoder;
use bzip2::Compression as BzLevel;
use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use gbd_domain::{ExtractError, Extractor, MemoryScope, TerminationRequest};
use gbd_extract::{extract_record, CnfBaseFeatures, OpbBaseFeatures, WcnfBaseFeatures};
use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xz2::stream::{LzmaOptions, Stream};
use xz2::write::XzEncoder;

const SMALL_CNF: &str = "c small\np cnf 3 3\n1 2 0\n-1 -2 3 0\n-3 0\n";

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn write_gz(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), GzLevel::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn write_xz(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut encoder = XzEncoder::new(fs::File::create(&path).unwrap(), 6);
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn write_lzma(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    let options = LzmaOptions::new_preset(6).unwrap();
    let stream = Stream::new_lzma_encoder(&options).unwrap();
    let mut encoder = XzEncoder::new_stream(fs::File::create(&path).unwrap(), stream);
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn write_bz2(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut encoder = BzEncoder::new(fs::File::create(&path).unwrap(), BzLevel::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn close(a: Option<f64>, b: f64) -> bool {
    a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
}

#[test]
fn test_cnf_feature_values() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "small.cnf", SMALL_CNF);
    let record = extract_record::<CnfBaseFeatures>(&path).unwrap();

    assert_eq!(record.len(), 56);
    assert_eq!(record.get("clauses"), Some(3.0));
    assert_eq!(record.get("variables"), Some(3.0));
    assert_eq!(record.get("cls1"), Some(1.0));
    assert_eq!(record.get("cls2"), Some(1.0));
    assert_eq!(record.get("cls3"), Some(1.0));
    assert_eq!(record.get("cls10p"), Some(0.0));
    assert_eq!(record.get("horn"), Some(2.0));
    assert_eq!(record.get("invhorn"), Some(2.0));
    assert_eq!(record.get("positive"), Some(1.0));
    assert_eq!(record.get("negative"), Some(1.0));
    assert!(close(record.get("hornvars_mean"), 1.0));
    assert!(close(record.get("hornvars_entropy"), 0.0));
    assert!(close(record.get("vcg_vdegree_mean"), 2.0));
    assert!(close(record.get("vcg_cdegree_mean"), 2.0));
    assert!(close(record.get("vg_degree_mean"), 14.0 / 3.0));
    assert!(close(record.get("cg_degree_mean"), 4.0));
    assert!(close(record.get("cg_degree_max"), 6.0));
}

#[test]
fn test_gzip_is_transparent() {
    let dir = TempDir::new().unwrap();
    let plain = write(&dir, "small.cnf", SMALL_CNF);
    let packed = write_gz(&dir, "small.cnf.gz", SMALL_CNF);

    let a = extract_record::<CnfBaseFeatures>(&plain).unwrap();
    let b = extract_record::<CnfBaseFeatures>(&packed).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        gbd_extract::hash::identify(&plain).unwrap(),
        gbd_extract::hash::identify(&packed).unwrap()
    );
}

#[test]
fn test_xz_lzma_and_bzip2_are_transparent() {
    let dir = TempDir::new().unwrap();
    let plain = write(&dir, "small.cnf", SMALL_CNF);
    let xz = write_xz(&dir, "small.cnf.xz", SMALL_CNF);
    let lzma = write_lzma(&dir, "small.cnf.lzma", SMALL_CNF);
    let bz2 = write_bz2(&dir, "small.cnf.bz2", SMALL_CNF);

    let expected = extract_record::<CnfBaseFeatures>(&plain).unwrap();
    let expected_hash = gbd_extract::hash::identify(&plain).unwrap();
    for packed in [&xz, &lzma, &bz2] {
        assert_eq!(extract_record::<CnfBaseFeatures>(packed).unwrap(), expected);
        assert_eq!(gbd_extract::hash::identify(packed).unwrap(), expected_hash);
    }
}

#[test]
fn test_corrupt_xz_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "small.cnf.xz", SMALL_CNF);
    let err = extract_record::<CnfBaseFeatures>(&path).unwrap_err();
    assert!(matches!(err, ExtractError::Io(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = extract_record::<CnfBaseFeatures>(Path::new("/nonexistent/x.cnf")).unwrap_err();
    assert!(matches!(err, ExtractError::Io(_)));
}

#[test]
fn test_wcnf_formats_agree() {
    let dir = TempDir::new().unwrap();
    let old = write(
        &dir,
        "old.wcnf",
        "c old format\np wcnf 3 4 100\n100 1 2 0\n100 -1 -2 3 0\n5 -3 0\n7 2 3 0\n",
    );
    let new = write(&dir, "new.wcnf", "c new format\nh 1 2 0\nh -1 -2 3 0\n5 -3 0\n7 2 3 0\n");

    let a = extract_record::<WcnfBaseFeatures>(&old).unwrap();
    let b = extract_record::<WcnfBaseFeatures>(&new).unwrap();
    assert_eq!(a, b);

    assert_eq!(a.len(), 73);
    assert_eq!(a.get("h_clauses"), Some(2.0));
    assert_eq!(a.get("variables"), Some(3.0));
    assert_eq!(a.get("s_clauses"), Some(2.0));
    assert_eq!(a.get("s_weight_sum"), Some(12.0));
    assert_eq!(a.get("s_cls1"), Some(1.0));
    assert_eq!(a.get("s_cls2"), Some(1.0));
    assert!(close(a.get("s_weight_mean"), 6.0));
    assert!(close(a.get("h_vcg_cdegree_mean"), 2.5));
}

#[test]
fn test_bad_wcnf_header() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.wcnf", "p cnf 3 1\n1 2 0\n");
    let err = extract_record::<WcnfBaseFeatures>(&path).unwrap_err();
    assert!(matches!(err, ExtractError::Parse { line: 1, .. }));
}

#[test]
fn test_names_align_with_features() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "empty.cnf", "p cnf 0 0\n");
    let record = extract_record::<CnfBaseFeatures>(&path).unwrap();
    assert_eq!(record.len(), CnfBaseFeatures::names().len());
    assert!(record.values.iter().all(|v| *v == 0.0));
}

#[test]
fn test_opb_feature_values() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "small.opb",
        "* #variable= 3 #constraint= 5\n\
         min: +1 x1 -2 x2 +3 x3 ;\n\
         +1 x1 +1 x2 >= 1 ;\n\
         +2 x1 +2 x2 +2 x3 >= 4 ;\n\
         +1 x1 +2 ~x3 = 3 ;\n\
         +3 x2 +1 x3 <= 1 ;\n\
         +1 x1 >= 2 ;\n",
    );
    let record = extract_record::<OpbBaseFeatures>(&path).unwrap();

    assert_eq!(record.len(), 17);
    assert_eq!(record.len(), OpbBaseFeatures::names().len());
    assert_eq!(record.get("constraints"), Some(5.0));
    assert_eq!(record.get("variables"), Some(3.0));
    assert_eq!(record.get("clauses"), Some(1.0));
    assert_eq!(record.get("cards_ge"), Some(2.0));
    assert_eq!(record.get("cards_eq"), Some(0.0));
    assert_eq!(record.get("pbs_ge"), Some(1.0));
    assert_eq!(record.get("pbs_eq"), Some(1.0));
    assert_eq!(record.get("assignments"), Some(1.0));
    assert_eq!(record.get("trivially_unsat"), Some(1.0));
    assert_eq!(record.get("obj_terms"), Some(3.0));
    assert_eq!(record.get("obj_max_val"), Some(4.0));
    assert_eq!(record.get("obj_min_val"), Some(-2.0));
    assert!(close(record.get("obj_coeffs_mean"), 2.0 / 3.0));
    assert_eq!(record.get("obj_coeffs_min"), Some(-2.0));
    assert_eq!(record.get("obj_coeffs_max"), Some(3.0));
}

/// Scope that refuses once more than `limit` bytes are live
struct Ceiling {
    limit: usize,
    live: Cell<usize>,
    peak: Cell<usize>,
}

impl MemoryScope for Ceiling {
    fn on_alloc(&self, bytes: usize) -> Result<(), TerminationRequest> {
        let next = self.live.get() + bytes;
        if next > self.limit {
            return Err(TerminationRequest { requested: bytes, needed: next });
        }
        self.live.set(next);
        self.peak.set(self.peak.get().max(next));
        Ok(())
    }

    fn on_dealloc(&self, bytes: usize) {
        self.live.set(self.live.get() - bytes);
    }
}

fn chain_cnf(vars: usize) -> String {
    let mut text = format!("p cnf {} {}\n", vars, vars - 1);
    for v in 1..vars {
        text.push_str(&format!("-{} {} 0\n", v, v + 1));
    }
    text
}

#[test]
fn test_extractor_memory_is_tracked_and_released() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "chain.cnf", &chain_cnf(2000));
    let scope = Ceiling { limit: usize::MAX, live: Cell::new(0), peak: Cell::new(0) };

    let mut extractor = CnfBaseFeatures::new(&path);
    extractor.extract(&scope).unwrap();
    assert_eq!(scope.live.get(), 0);
    // Two per-variable tables of u32 alone exceed 16 KB.
    assert!(scope.peak.get() > 16_000);
}

#[test]
fn test_refused_allocation_aborts_extraction() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "chain.cnf", &chain_cnf(2000));
    let scope = Ceiling { limit: 4096, live: Cell::new(0), peak: Cell::new(0) };

    let mut extractor = CnfBaseFeatures::new(&path);
    let err = extractor.extract(&scope).unwrap_err();
    assert!(err.is_termination());
    assert!(err.termination().unwrap().needed > 4096);
    assert_eq!(scope.live.get(), 0);
    assert!(extractor.features().is_empty());
}
