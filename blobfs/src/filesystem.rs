use std::path::{Path, PathBuf};

use crate::error::BucketError;
use crate::listing::paginate;
use crate::provider::{Attributes, Bucket, BucketFuture, ListObject, ListOptions, ListPage};

/// Bucket backed by a directory on the local disk.
///
/// Every regular file below the root is an object whose key is its relative
/// path joined with `/`. Directories on disk are not objects themselves, just
/// as in a real object store. All I/O is blocking (`std::fs`) inside the
/// returned futures.
///
/// Keys are resolved by the filesystem layer, which rejects `..` segments
/// before they reach the bucket.
///
/// # Example
///
/// ```ignore
/// // ./bucket/v1/site/index.html is served as "index.html"
/// let fs = BlobFs::new(V1, "site", FileSystemBucket::new("./bucket"))?;
/// ```
pub struct FileSystemBucket {
    root: PathBuf,
}

impl FileSystemBucket {
    /// Create a bucket rooted at the given directory.
    ///
    /// The directory does not need to exist yet; a missing root behaves like
    /// an empty bucket.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

/// Collect every regular file below `dir`, keyed by its `/`-joined path
/// relative to the bucket root.
fn collect_objects(dir: &Path, key_prefix: &str, out: &mut Vec<ListObject>) -> Result<(), BucketError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(BucketError::Io(err)),
    };

    for entry in entries {
        let entry = entry.map_err(BucketError::Io)?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            log::warn!("skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        let key = format!("{key_prefix}{name}");
        // Follow symlinks, as `exists` and `attributes` do.
        let metadata = match std::fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("skipping dangling link {}", entry.path().display());
                continue;
            }
            Err(err) => return Err(BucketError::Io(err)),
        };
        if metadata.is_dir() {
            collect_objects(&entry.path(), &format!("{key}/"), out)?;
        } else if metadata.is_file() {
            out.push(ListObject {
                key,
                size: metadata.len(),
                mod_time: metadata.modified().ok(),
                is_dir: false,
            });
        }
    }
    Ok(())
}

impl Bucket for FileSystemBucket {
    fn exists(&self, key: &str) -> BucketFuture<bool> {
        let full_path = self.resolve(key);
        let empty = key.is_empty();
        Box::pin(async move { Ok(!empty && full_path.is_file()) })
    }

    fn attributes(&self, key: &str) -> BucketFuture<Attributes> {
        let full_path = self.resolve(key);
        let key = key.to_owned();
        Box::pin(async move {
            let metadata = std::fs::metadata(&full_path)?;
            if !metadata.is_file() {
                return Err(BucketError::NotFound(key));
            }
            Ok(Attributes {
                size: metadata.len(),
                mod_time: metadata.modified()?,
            })
        })
    }

    fn read_all(&self, key: &str) -> BucketFuture<Vec<u8>> {
        let full_path = self.resolve(key);
        let key = key.to_owned();
        Box::pin(async move {
            if !full_path.is_file() {
                return Err(BucketError::NotFound(key));
            }
            Ok(std::fs::read(full_path)?)
        })
    }

    fn list_page(
        &self,
        options: &ListOptions,
        page_token: Option<String>,
        page_size: usize,
    ) -> BucketFuture<ListPage> {
        // Only walk the deepest directory fully covered by the prefix.
        let walk_from = match options.prefix.rfind('/') {
            Some(pos) => options.prefix[..=pos].to_owned(),
            None => String::new(),
        };
        let dir = self.resolve(&walk_from);
        let options = options.clone();
        Box::pin(async move {
            let mut objects = Vec::new();
            collect_objects(&dir, &walk_from, &mut objects)?;
            objects.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(paginate(objects, &options, page_token.as_deref(), page_size))
        })
    }
}
