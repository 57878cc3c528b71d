use std::sync::Arc;

use crate::error::{BlobFsError, BucketError};
use crate::file::{BlobFile, DirEntry, FileInfo, NodeKind};
use crate::listing::DEFAULT_PAGE_SIZE;
use crate::path::{self, ROOT};
use crate::poll::block_on;
use crate::prefixed::PrefixedBucket;
use crate::provider::{Bucket, ListOptions};

/// Version tag of the asset layout currently in use.
///
/// Assets live under `"v1/<sub-path>/"` in the bucket.
pub const V1: &str = "v1";

/// Read-only filesystem view over a flat bucket.
///
/// Paths are resolved under the key prefix `"<version>/<prefix>/"`. `open`
/// validates a path and classifies it as a file (an object exists under the
/// exact key) or a directory (some key starts with `path + "/"`) before
/// handing out a [`BlobFile`].
///
/// `Clone` is cheap (Arc internals). Thread-safe (`Send + Sync`); the handles
/// it returns are not.
///
/// # Example
///
/// ```ignore
/// let bucket = MemoryBucket::new();
/// bucket.insert("v1/site/index.html", html);
///
/// let fs = BlobFs::new(V1, "site", bucket)?;
/// let mut file = fs.open("index.html")?;
/// let mut body = Vec::new();
/// file.read_to_end(&mut body)?;
/// ```
#[derive(Clone)]
pub struct BlobFs {
    inner: Arc<BlobFsInner>,
}

struct BlobFsInner {
    /// The bucket as handed in, without any prefix applied.
    root: Arc<dyn Bucket>,
    prefix: String,
    /// `root` wrapped so that keys are relative to `prefix`.
    bucket: Arc<dyn Bucket>,
    page_size: usize,
}

impl std::fmt::Debug for BlobFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobFs")
            .field("prefix", &self.inner.prefix)
            .field("page_size", &self.inner.page_size)
            .finish_non_exhaustive()
    }
}

impl BlobFs {
    /// Create a filesystem rooted at `"<version>/<prefix>/"` in `bucket`.
    ///
    /// A trailing slash on `prefix` is ignored and empty parts are skipped, so
    /// `BlobFs::new("", "", bucket)` exposes the whole bucket.
    ///
    /// Fails with [`BlobFsError::InvalidPath`] if the combined prefix is not a
    /// valid path (for example if it contains `..`).
    pub fn new(version: &str, prefix: &str, bucket: impl Bucket) -> Result<Self, BlobFsError> {
        Self::with_shared_bucket(version, prefix, Arc::new(bucket))
    }

    /// Like [`new`](BlobFs::new), for a bucket that is already shared.
    pub fn with_shared_bucket(
        version: &str,
        prefix: &str,
        bucket: Arc<dyn Bucket>,
    ) -> Result<Self, BlobFsError> {
        let Some(root_prefix) = path::root_prefix(version, prefix) else {
            return Err(BlobFsError::invalid_path(
                "new",
                format!("{version}/{prefix}"),
            ));
        };
        log::debug!("blobfs rooted at {root_prefix:?}");
        Ok(Self::from_parts(bucket, root_prefix, DEFAULT_PAGE_SIZE))
    }

    fn from_parts(root: Arc<dyn Bucket>, prefix: String, page_size: usize) -> Self {
        let bucket: Arc<dyn Bucket> = Arc::new(PrefixedBucket::new(root.clone(), prefix.clone()));
        Self {
            inner: Arc::new(BlobFsInner {
                root,
                prefix,
                bucket,
                page_size,
            }),
        }
    }

    /// Use `page_size` entries per listing request when enumerating directories.
    pub fn with_page_size(self, page_size: usize) -> Self {
        Self::from_parts(
            self.inner.root.clone(),
            self.inner.prefix.clone(),
            page_size.max(1),
        )
    }

    /// Key prefix under which every path is resolved (empty or ending in `/`).
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    pub(crate) fn bucket(&self) -> &Arc<dyn Bucket> {
        &self.inner.bucket
    }

    /// Open the file or directory at `name`.
    ///
    /// `"."` (the root) always succeeds without touching the bucket. Any other
    /// path must be valid (see [`path::is_valid`]); it is then classified by
    /// an exact-key existence check followed, if needed, by a one-entry
    /// listing below `name + "/"`.
    pub fn open(&self, name: &str) -> Result<BlobFile, BlobFsError> {
        if name == ROOT {
            return Ok(self.handle(ROOT.to_owned(), Some(NodeKind::Directory)));
        }
        if !path::is_valid(name) {
            return Err(BlobFsError::invalid_path("open", name));
        }

        let kind = self
            .classify(name)
            .map_err(|err| BlobFsError::io("open", name, err))?;
        log::debug!("open {name:?}: {kind:?}");

        match kind {
            NodeKind::NotExist => Err(BlobFsError::not_found("open", name)),
            kind => Ok(self.handle(name.to_owned(), Some(kind))),
        }
    }

    /// Open `name` and describe it.
    pub fn stat(&self, name: &str) -> Result<FileInfo, BlobFsError> {
        self.open(name)?.stat()
    }

    /// Read the whole file at `name`.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>, BlobFsError> {
        let file = self.open(name)?;
        Ok(file.contents("read")?.to_vec())
    }

    /// List the directory at `name`, sorted by entry name.
    pub fn read_dir(&self, name: &str) -> Result<Vec<DirEntry>, BlobFsError> {
        let mut dir = self.open(name)?;
        let mut entries = dir.read_dir(-1)?.entries;
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }

    /// A filesystem rooted at the directory `dir` of this one.
    ///
    /// Existence of `dir` is not checked; opening paths in the returned view
    /// simply fails if nothing is stored below it.
    pub fn sub(&self, dir: &str) -> Result<BlobFs, BlobFsError> {
        if dir == ROOT {
            return Ok(self.clone());
        }
        if !path::is_valid(dir) {
            return Err(BlobFsError::invalid_path("sub", dir));
        }
        Ok(Self::from_parts(
            self.inner.root.clone(),
            format!("{}{dir}/", self.inner.prefix),
            self.inner.page_size,
        ))
    }

    /// Build a handle for `name`, optionally with its kind already known.
    ///
    /// Shared by `open` and directory enumeration so classification lives in
    /// one place.
    pub(crate) fn handle(&self, name: String, kind: Option<NodeKind>) -> BlobFile {
        BlobFile::new(self.clone(), name, kind)
    }

    /// Whether at least one key lives below `name` as a directory.
    pub(crate) fn has_children(&self, name: &str) -> Result<bool, BucketError> {
        let options = ListOptions::children(path::dir_prefix(name));
        let page = block_on(self.bucket().list_page(&options, None, 1))?;
        Ok(!page.objects.is_empty())
    }

    /// Two-stage classification: exact key first, then prefix listing.
    pub(crate) fn classify(&self, name: &str) -> Result<NodeKind, BucketError> {
        if block_on(self.bucket().exists(name))? {
            return Ok(NodeKind::File);
        }
        if self.has_children(name)? {
            return Ok(NodeKind::Directory);
        }
        Ok(NodeKind::NotExist)
    }
}
