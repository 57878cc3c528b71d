//! Read-only filesystem view over a flat object bucket.
//!
//! Object stores only know opaque keys: put, get, list, delete. This crate
//! presents such a bucket as a tree of files and directories with open,
//! stat, read, seek and directory listing, for consumers (static asset
//! servers and the like) that expect filesystem semantics.
//!
//! # Architecture
//!
//! - [`Bucket`] is the store interface: exact-key existence, attribute fetch,
//!   whole-object read and paginated delimiter listing. Methods return boxed
//!   futures ([`BucketFuture`]); the filesystem layer drives them on the
//!   calling thread with [`block_on`].
//! - [`BlobFs`] roots a bucket at `"<version>/<prefix>/"` and opens paths.
//!   A path is a *file* if an object exists under the exact key and a
//!   *directory* if some key starts with `path + "/"`.
//! - [`BlobFile`] is the open handle. It implements [`std::io::Read`] and
//!   [`std::io::Seek`], and fetches attributes, contents and listings lazily,
//!   caching each for its own lifetime.
//!
//! ```ignore
//! let bucket = FileSystemBucket::new("./bucket");
//! let fs = BlobFs::new(V1, "site", bucket)?;
//!
//! let mut root = fs.open(".")?;
//! for entry in root.read_dir(-1)?.entries {
//!     println!("{}{}", entry.name(), if entry.is_dir() { "/" } else { "" });
//! }
//! ```
//!
//! # Buckets
//!
//! - [`MemoryBucket`]: In-memory objects for tests and embedded assets
//! - [`FileSystemBucket`]: A local directory treated as a flat bucket
//! - [`PrefixedBucket`]: Roots another bucket under a key prefix
//!
//! Custom stores (S3, GCS, HTTP) implement [`Bucket`] directly; the
//! [`paginate`] helper implements delimiter grouping for stores that can only
//! enumerate keys.

mod blobfs;
mod error;
mod file;
mod filesystem;
mod listing;
mod memory;
pub mod path;
mod poll;
mod prefixed;
mod provider;

pub use blobfs::{BlobFs, V1};
pub use error::{BlobFsError, BucketError, ErrorKind};
pub use file::{BlobFile, DirBatch, DirEntry, FileInfo, FileType, NodeKind};
pub use filesystem::FileSystemBucket;
pub use listing::{DEFAULT_PAGE_SIZE, ListIterator, paginate};
pub use memory::MemoryBucket;
pub use poll::block_on;
pub use prefixed::PrefixedBucket;
pub use provider::{Attributes, Bucket, BucketFuture, ListObject, ListOptions, ListPage};
