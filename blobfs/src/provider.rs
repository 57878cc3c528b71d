use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::SystemTime;

use crate::BucketError;

/// A boxed, `Send` future returning a `Result`.
///
/// All [`Bucket`] methods return this type. The filesystem layer drives them
/// to completion on the calling thread (see [`block_on`](crate::block_on)),
/// so backends may be genuinely asynchronous as long as they do not require
/// a specific runtime to be polled.
pub type BucketFuture<T> = Pin<Box<dyn Future<Output = Result<T, BucketError>> + Send>>;

/// Metadata stored alongside an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    /// Size of the object in bytes.
    pub size: u64,
    /// Last modification time reported by the store.
    pub mod_time: SystemTime,
}

/// Parameters of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only keys starting with this prefix are returned.
    pub prefix: String,
    /// When non-empty, keys sharing `prefix` up to the next occurrence of the
    /// delimiter are collapsed into a single directory entry whose key ends
    /// with the delimiter.
    pub delimiter: String,
}

impl ListOptions {
    /// Listing of the immediate children below `prefix`, grouped at `/`.
    pub fn children(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: "/".into(),
        }
    }
}

/// One entry of a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObject {
    /// Full key (relative to the bucket). Directory entries end with the delimiter.
    pub key: String,
    /// Object size; zero for directory entries.
    pub size: u64,
    /// Modification time; `None` for directory entries.
    pub mod_time: Option<SystemTime>,
    /// Whether this entry is a collapsed directory rather than an object.
    pub is_dir: bool,
}

/// A single page of listing results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ListObject>,
    /// Token for the following page, or `None` when this is the last page.
    pub next_page_token: Option<String>,
}

/// A flat, key-addressed object store.
///
/// Keys are opaque strings. There is no directory concept: directories are
/// emulated by the filesystem layer from prefix listings.
///
/// # Listing contract
///
/// [`list_page`](Bucket::list_page) returns keys in lexicographic order,
/// at most `page_size` entries per page. `page_token` is `None` for the first
/// page and the previous page's `next_page_token` afterwards. With a non-empty
/// delimiter, S3-style grouping applies: every key of the form
/// `prefix + a + delimiter + rest` is reported once as a directory entry with
/// key `prefix + a + delimiter`.
pub trait Bucket: Send + Sync + 'static {
    /// Check whether an object exists under exactly this key.
    fn exists(&self, key: &str) -> BucketFuture<bool>;

    /// Fetch the attributes of an object.
    ///
    /// Fails with [`BucketError::NotFound`] if no object has exactly this key.
    fn attributes(&self, key: &str) -> BucketFuture<Attributes>;

    /// Read the entire contents of an object.
    fn read_all(&self, key: &str) -> BucketFuture<Vec<u8>>;

    /// Fetch one page of a prefix listing.
    fn list_page(
        &self,
        options: &ListOptions,
        page_token: Option<String>,
        page_size: usize,
    ) -> BucketFuture<ListPage>;
}

impl<B: Bucket + ?Sized> Bucket for Arc<B> {
    fn exists(&self, key: &str) -> BucketFuture<bool> {
        (**self).exists(key)
    }

    fn attributes(&self, key: &str) -> BucketFuture<Attributes> {
        (**self).attributes(key)
    }

    fn read_all(&self, key: &str) -> BucketFuture<Vec<u8>> {
        (**self).read_all(key)
    }

    fn list_page(
        &self,
        options: &ListOptions,
        page_token: Option<String>,
        page_size: usize,
    ) -> BucketFuture<ListPage> {
        (**self).list_page(options, page_token, page_size)
    }
}
