use std::cell::OnceCell;
use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom};
use std::time::SystemTime;

use crate::blobfs::BlobFs;
use crate::error::{BlobFsError, BucketError};
use crate::listing::ListIterator;
use crate::path;
use crate::poll::block_on;
use crate::provider::ListOptions;

/// Classification of a logical path against the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An object exists under the exact key.
    File,
    /// No exact object, but at least one key lives below `path + "/"`.
    Directory,
    /// Neither.
    NotExist,
}

/// The type bits of a node: a plain file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    File,
    Directory,
}

impl FileType {
    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }

    pub fn is_file(self) -> bool {
        self == FileType::File
    }
}

/// Snapshot of a node's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    name: String,
    size: u64,
    mod_time: Option<SystemTime>,
    file_type: FileType,
}

impl FileInfo {
    fn directory(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            size: 0,
            mod_time: None,
            file_type: FileType::Directory,
        }
    }

    /// Base name of the node (`"hello.go"`, not `"a/b/hello.go"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes; zero for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time; directories carry none.
    pub fn mod_time(&self) -> Option<SystemTime> {
        self.mod_time
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }
}

/// A batch of entries produced by [`BlobFile::read_dir`].
#[derive(Debug)]
pub struct DirBatch {
    pub entries: Vec<DirEntry>,
    /// The listing has no entries left after this batch.
    pub exhausted: bool,
}

/// An open file or directory.
///
/// Attributes, contents and the directory cursor are fetched lazily on first
/// use and then kept for the lifetime of the handle, so a handle reflects a
/// single snapshot of the bucket.
///
/// A handle is meant to be used by one caller at a time. It is `Send` but not
/// `Sync`, and offers no internal locking.
pub struct BlobFile {
    fs: BlobFs,
    name: String,
    kind: OnceCell<NodeKind>,
    info: OnceCell<FileInfo>,
    contents: OnceCell<Vec<u8>>,
    offset: u64,
    iter: Option<ListIterator>,
    /// Entries collected by a `read_dir` call that then hit a listing error.
    carry: VecDeque<DirEntry>,
}

impl std::fmt::Debug for BlobFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobFile")
            .field("name", &self.name)
            .field("kind", &self.kind.get())
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl BlobFile {
    pub(crate) fn new(fs: BlobFs, name: String, kind: Option<NodeKind>) -> Self {
        let cell = OnceCell::new();
        if let Some(kind) = kind {
            let _ = cell.set(kind);
        }
        Self {
            fs,
            name,
            kind: cell,
            info: OnceCell::new(),
            contents: OnceCell::new(),
            offset: 0,
            iter: None,
            carry: VecDeque::new(),
        }
    }

    /// Base name of the node. The root is named `"."`.
    pub fn name(&self) -> &str {
        path::base_name(&self.name)
    }

    /// Full logical path the handle was opened with.
    pub fn path(&self) -> &str {
        &self.name
    }

    /// Describe the node.
    ///
    /// Looks up the object's attributes; if there is no object under the exact
    /// key, falls back to a one-entry prefix listing to detect a directory.
    /// The result is cached: later calls do not touch the bucket.
    pub fn stat(&self) -> Result<FileInfo, BlobFsError> {
        self.resolve_info("stat").cloned()
    }

    /// Size in bytes, resolving attributes on first use.
    pub fn size(&self) -> Result<u64, BlobFsError> {
        Ok(self.resolve_info("stat")?.size)
    }

    /// Modification time, resolving attributes on first use.
    pub fn mod_time(&self) -> Result<Option<SystemTime>, BlobFsError> {
        Ok(self.resolve_info("stat")?.mod_time)
    }

    /// Report whether the node is a directory.
    ///
    /// Resolution order:
    /// 1. a path whose base name has an extension (`"app.js"`) is assumed to be
    ///    a file without asking the bucket. This is a heuristic, not a rule: a
    ///    directory prefix named like `"v1.2"` is reported as a non-directory
    ///    here even after `open` classified it, although `stat` and directory
    ///    entries report it correctly;
    /// 2. a kind already known for this handle (from `open`, a listing, or an
    ///    earlier lookup) is returned as is;
    /// 3. otherwise the bucket is asked (exact key, then prefix listing) and
    ///    the answer is remembered.
    pub fn is_dir(&self) -> Result<bool, BlobFsError> {
        if let Some(ext) = path::extension(&self.name) {
            log::trace!("{:?} has extension {ext:?}, assuming a file", self.name);
            return Ok(false);
        }
        if let Some(kind) = self.kind.get() {
            return Ok(*kind == NodeKind::Directory);
        }

        let kind = self
            .fs
            .classify(&self.name)
            .map_err(|err| BlobFsError::io("isdir", &self.name, err))?;
        Ok(*self.kind.get_or_init(|| kind) == NodeKind::Directory)
    }

    pub fn file_type(&self) -> Result<FileType, BlobFsError> {
        Ok(if self.is_dir()? {
            FileType::Directory
        } else {
            FileType::File
        })
    }

    /// Read the next entries of a directory.
    ///
    /// With `n <= 0` every remaining entry is returned and `exhausted` is
    /// always `true`. With `n > 0` at most `n` entries are returned; a batch
    /// that drains the listing sets `exhausted`, including a full batch that
    /// takes exactly the last entries, so the caller can tell "nothing
    /// remains" apart from a failure without another call.
    ///
    /// If the listing fails part way, the error is returned and the entries
    /// collected so far are kept; the next call returns them first and
    /// retries the failed page.
    ///
    /// Entries come in listing order and each one is a fresh handle whose
    /// kind is known from the listing.
    pub fn read_dir(&mut self, n: isize) -> Result<DirBatch, BlobFsError> {
        let limit = usize::try_from(n).ok().filter(|&n| n > 0);
        let full = |entries: &Vec<DirEntry>| limit.is_some_and(|limit| entries.len() >= limit);

        let mut entries = Vec::new();
        while !full(&entries) {
            match self.carry.pop_front() {
                Some(entry) => entries.push(entry),
                None => break,
            }
        }

        let fs = self.fs.clone();
        let iter = self.iter.get_or_insert_with(|| {
            let options = ListOptions::children(path::dir_prefix(&self.name));
            log::debug!("listing directory {:?}", options.prefix);
            ListIterator::new(fs.bucket().clone(), options, fs.page_size())
        });
        let prefix = iter.options().prefix.clone();

        loop {
            if full(&entries) {
                return Ok(DirBatch {
                    entries,
                    exhausted: self.carry.is_empty() && iter.is_drained(),
                });
            }

            match iter.next_entry() {
                Ok(Some(object)) => {
                    // A placeholder object named like the directory itself.
                    if object.key == prefix {
                        continue;
                    }
                    let kind = if object.is_dir || object.key.ends_with('/') {
                        NodeKind::Directory
                    } else {
                        NodeKind::File
                    };
                    let name = object.key.trim_end_matches('/').to_owned();
                    entries.push(DirEntry {
                        file: fs.handle(name, Some(kind)),
                    });
                }
                Ok(None) => {
                    return Ok(DirBatch {
                        entries,
                        exhausted: true,
                    });
                }
                Err(err) => {
                    log::debug!(
                        "listing {prefix:?} failed after {} entries: {err}",
                        entries.len()
                    );
                    self.carry.extend(entries);
                    return Err(BlobFsError::io("readdir", &self.name, err));
                }
            }
        }
    }

    /// Close the handle. Nothing is held open, so this always succeeds.
    pub fn close(self) -> Result<(), BlobFsError> {
        Ok(())
    }

    /// Resolve and cache the node's metadata.
    fn resolve_info(&self, op: &'static str) -> Result<&FileInfo, BlobFsError> {
        if let Some(info) = self.info.get() {
            return Ok(info);
        }

        let info = match self.kind.get() {
            Some(NodeKind::NotExist) => return Err(BlobFsError::not_found(op, &self.name)),
            Some(NodeKind::Directory) => FileInfo::directory(self.name()),
            _ => match block_on(self.fs.bucket().attributes(&self.name)) {
                Ok(attrs) => {
                    let _ = self.kind.set(NodeKind::File);
                    FileInfo {
                        name: self.name().to_owned(),
                        size: attrs.size,
                        mod_time: Some(attrs.mod_time),
                        file_type: FileType::File,
                    }
                }
                Err(BucketError::NotFound(_)) => {
                    log::debug!("no object at {:?}, checking for children", self.name);
                    let has_children = self
                        .fs
                        .has_children(&self.name)
                        .map_err(|err| BlobFsError::io(op, &self.name, err))?;
                    if !has_children {
                        let _ = self.kind.set(NodeKind::NotExist);
                        return Err(BlobFsError::not_found(op, &self.name));
                    }
                    let _ = self.kind.set(NodeKind::Directory);
                    FileInfo::directory(self.name())
                }
                Err(err) => return Err(BlobFsError::io(op, &self.name, err)),
            },
        };

        Ok(self.info.get_or_init(|| info))
    }

    /// The object's bytes, fetched in one round trip on first use.
    ///
    /// A failed fetch is not cached; the next call tries again.
    pub(crate) fn contents(&self, op: &'static str) -> Result<&[u8], BlobFsError> {
        if let Some(contents) = self.contents.get() {
            return Ok(contents);
        }
        log::debug!("fetching {:?}", self.name);
        let data = block_on(self.fs.bucket().read_all(&self.name))
            .map_err(|err| BlobFsError::bucket(op, &self.name, err))?;
        Ok(self.contents.get_or_init(|| data))
    }
}

impl Read for BlobFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let offset = self.offset;
        let n = {
            let contents = self.contents("read")?;
            let start = usize::try_from(offset)
                .unwrap_or(usize::MAX)
                .min(contents.len());
            let n = buf.len().min(contents.len() - start);
            buf[..n].copy_from_slice(&contents[start..start + n]);
            n
        };
        self.offset += n as u64;
        Ok(n)
    }
}

impl Seek for BlobFile {
    /// Move the cursor. Positions past the end are allowed and read as
    /// end-of-stream; `SeekFrom::End` resolves the size first.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.offset.checked_add_signed(delta),
            SeekFrom::End(delta) => self.resolve_info("seek")?.size.checked_add_signed(delta),
        };
        match target {
            Some(offset) => {
                self.offset = offset;
                Ok(offset)
            }
            None => Err(BlobFsError::invalid_argument(
                "seek",
                &self.name,
                format!("{pos:?} is out of range"),
            )
            .into()),
        }
    }
}

/// An entry produced by [`BlobFile::read_dir`].
#[derive(Debug)]
pub struct DirEntry {
    file: BlobFile,
}

impl DirEntry {
    /// Base name of the entry.
    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// Logical path of the entry, usable with [`BlobFs::open`].
    pub fn path(&self) -> &str {
        self.file.path()
    }

    pub fn is_dir(&self) -> bool {
        self.file.kind.get() == Some(&NodeKind::Directory)
    }

    pub fn file_type(&self) -> FileType {
        if self.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        }
    }

    /// Metadata of the entry, fetched now rather than at listing time.
    pub fn info(&self) -> Result<FileInfo, BlobFsError> {
        self.file.stat()
    }

    /// The handle behind this entry, ready for reading or further listing.
    pub fn into_file(self) -> BlobFile {
        self.file
    }
}
