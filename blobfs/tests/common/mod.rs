//! Shared helpers for blobfs integration tests.
//!
//! Provides an instrumented bucket that counts calls and injects faults, and
//! a conformance walker that checks a filesystem view end to end.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use blobfs::{
    Attributes, BlobFs, Bucket, BucketError, BucketFuture, ListOptions, ListPage, MemoryBucket,
};

/// Install a test logger once. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Bucket operations that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exists,
    Attributes,
    ReadAll,
    ListPage,
}

#[derive(Default)]
struct Counts {
    exists: AtomicUsize,
    attributes: AtomicUsize,
    read_all: AtomicUsize,
    list_page: AtomicUsize,
}

/// After `skip` successful calls, the next `times` calls fail.
#[derive(Clone, Copy)]
struct FaultPlan {
    skip: usize,
    times: usize,
}

/// A [`MemoryBucket`] wrapper that counts calls per operation and can inject
/// I/O failures.
#[derive(Clone, Default)]
pub struct InstrumentedBucket {
    inner: MemoryBucket,
    counts: Arc<Counts>,
    faults: Arc<Mutex<HashMap<Op, FaultPlan>>>,
}

impl InstrumentedBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(keys: &[(&str, &[u8])]) -> Self {
        let bucket = Self::new();
        for (key, data) in keys {
            bucket.insert(key, data);
        }
        bucket
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.inner.insert(key, data.to_vec());
    }

    pub fn calls(&self, op: Op) -> usize {
        let counter = match op {
            Op::Exists => &self.counts.exists,
            Op::Attributes => &self.counts.attributes,
            Op::ReadAll => &self.counts.read_all,
            Op::ListPage => &self.counts.list_page,
        };
        counter.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        [Op::Exists, Op::Attributes, Op::ReadAll, Op::ListPage]
            .into_iter()
            .map(|op| self.calls(op))
            .sum()
    }

    /// Let `skip` calls of `op` through, then fail the following `times`.
    pub fn fail(&self, op: Op, skip: usize, times: usize) {
        self.faults
            .lock()
            .unwrap()
            .insert(op, FaultPlan { skip, times });
    }

    fn record(&self, op: Op) -> bool {
        let counter = match op {
            Op::Exists => &self.counts.exists,
            Op::Attributes => &self.counts.attributes,
            Op::ReadAll => &self.counts.read_all,
            Op::ListPage => &self.counts.list_page,
        };
        counter.fetch_add(1, Ordering::SeqCst);

        let mut faults = self.faults.lock().unwrap();
        let Some(plan) = faults.get_mut(&op) else {
            return false;
        };
        if plan.skip > 0 {
            plan.skip -= 1;
            false
        } else if plan.times > 0 {
            plan.times -= 1;
            true
        } else {
            false
        }
    }
}

fn injected<T: Send + 'static>(op: Op) -> BucketFuture<T> {
    Box::pin(async move {
        Err(BucketError::Io(io::Error::other(format!(
            "injected {op:?} fault"
        ))))
    })
}

impl Bucket for InstrumentedBucket {
    fn exists(&self, key: &str) -> BucketFuture<bool> {
        if self.record(Op::Exists) {
            return injected(Op::Exists);
        }
        self.inner.exists(key)
    }

    fn attributes(&self, key: &str) -> BucketFuture<Attributes> {
        if self.record(Op::Attributes) {
            return injected(Op::Attributes);
        }
        self.inner.attributes(key)
    }

    fn read_all(&self, key: &str) -> BucketFuture<Vec<u8>> {
        if self.record(Op::ReadAll) {
            return injected(Op::ReadAll);
        }
        self.inner.read_all(key)
    }

    fn list_page(
        &self,
        options: &ListOptions,
        page_token: Option<String>,
        page_size: usize,
    ) -> BucketFuture<ListPage> {
        if self.record(Op::ListPage) {
            return injected(Op::ListPage);
        }
        self.inner.list_page(options, page_token, page_size)
    }
}

/// Read a file to the end with a fixed-size buffer.
pub fn read_with_buffer(file: &mut impl Read, buf_size: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; buf_size];
    let mut out = Vec::new();
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buf[..n]);
    }
}

/// Walk the whole tree from the root and check that it is self-consistent
/// and contains exactly `expected` files.
///
/// For every directory, a full listing must equal a one-at-a-time listing,
/// names must be unique, and every entry's kind must agree with `stat` and
/// `open`. For every file, the bytes read must match the reported size and
/// `seek` must land where asked.
pub fn check_fs(fs: &BlobFs, expected: &[&str]) -> Result<(), String> {
    let mut found = BTreeSet::new();
    walk(fs, ".", &mut found)?;

    let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
    if found != expected {
        return Err(format!("expected files {expected:?}, found {found:?}"));
    }
    Ok(())
}

fn walk(fs: &BlobFs, dir: &str, found: &mut BTreeSet<String>) -> Result<(), String> {
    let mut handle = fs.open(dir).map_err(|e| e.to_string())?;
    // `is_dir` may guess from an extension; `stat` does not.
    if !handle.stat().map_err(|e| e.to_string())?.is_dir() {
        return Err(format!("{dir}: opened as directory but stat says file"));
    }
    let full = handle.read_dir(-1).map_err(|e| e.to_string())?;
    if !full.exhausted {
        return Err(format!("{dir}: read_dir(-1) did not report exhaustion"));
    }
    let names: Vec<String> = full.entries.iter().map(|e| e.name().to_owned()).collect();

    let mut paged = fs.open(dir).map_err(|e| e.to_string())?;
    let mut paged_names = Vec::new();
    loop {
        let batch = paged.read_dir(1).map_err(|e| e.to_string())?;
        paged_names.extend(batch.entries.iter().map(|e| e.name().to_owned()));
        if batch.exhausted {
            break;
        }
    }
    if names != paged_names {
        return Err(format!("{dir}: full listing {names:?} != paged {paged_names:?}"));
    }

    let unique: BTreeSet<&String> = names.iter().collect();
    if unique.len() != names.len() {
        return Err(format!("{dir}: duplicate entries in {names:?}"));
    }

    for entry in full.entries {
        let path = entry.path().to_owned();
        let info = entry.info().map_err(|e| e.to_string())?;
        if info.is_dir() != entry.is_dir() {
            return Err(format!("{path}: entry kind disagrees with stat"));
        }
        if info.name() != entry.name() {
            return Err(format!("{path}: stat name {:?} != {:?}", info.name(), entry.name()));
        }

        if entry.is_dir() {
            walk(fs, &path, found)?;
            continue;
        }

        let mut file = fs.open(&path).map_err(|e| e.to_string())?;
        let data = read_with_buffer(&mut file, 3).map_err(|e| e.to_string())?;
        if data.len() as u64 != info.size() {
            return Err(format!("{path}: read {} bytes, stat says {}", data.len(), info.size()));
        }
        if !data.is_empty() {
            let mid = data.len() as u64 / 2;
            let pos = file.seek(SeekFrom::Start(mid)).map_err(|e| e.to_string())?;
            let rest = read_with_buffer(&mut file, 5).map_err(|e| e.to_string())?;
            if pos != mid || rest != data[mid as usize..] {
                return Err(format!("{path}: seek to {mid} returned wrong suffix"));
            }
        }
        found.insert(path);
    }
    Ok(())
}
