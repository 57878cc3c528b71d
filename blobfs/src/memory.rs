use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::SystemTime;

use crate::error::BucketError;
use crate::listing::paginate;
use crate::provider::{Attributes, Bucket, BucketFuture, ListObject, ListOptions, ListPage};

#[derive(Clone)]
struct MemoryObject {
    data: Vec<u8>,
    mod_time: SystemTime,
}

type ObjectMap = BTreeMap<String, MemoryObject>;

/// In-memory bucket for tests and embedded assets.
///
/// Thread-safe and mutable even after a [`BlobFs`](crate::BlobFs) has been
/// built on top of it; clones share the same objects.
///
/// # Example
///
/// ```ignore
/// let bucket = MemoryBucket::new();
/// bucket.insert("v1/site/index.html", b"<html></html>".to_vec());
///
/// let fs = BlobFs::new(V1, "site", bucket)?;
/// let index = fs.read_file("index.html")?;
/// ```
#[derive(Clone, Default)]
pub struct MemoryBucket {
    objects: Arc<RwLock<ObjectMap>>,
}

impl MemoryBucket {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, stamping it with the current time.
    ///
    /// Overwrites any existing object with the same key.
    pub fn insert(&self, key: impl Into<String>, data: Vec<u8>) {
        self.insert_with_mod_time(key, data, SystemTime::now());
    }

    /// Store an object with an explicit modification time.
    pub fn insert_with_mod_time(&self, key: impl Into<String>, data: Vec<u8>, mod_time: SystemTime) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), MemoryObject { data, mod_time });
    }

    /// Remove an object, returning its data if it existed.
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .map(|object| object.data)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_lock(objects: &RwLock<ObjectMap>) -> Result<RwLockReadGuard<'_, ObjectMap>, BucketError> {
    objects
        .read()
        .map_err(|_| BucketError::Other("memory bucket lock poisoned".into()))
}

impl Bucket for MemoryBucket {
    fn exists(&self, key: &str) -> BucketFuture<bool> {
        let objects = self.objects.clone();
        let key = key.to_owned();
        Box::pin(async move { Ok(read_lock(&objects)?.contains_key(&key)) })
    }

    fn attributes(&self, key: &str) -> BucketFuture<Attributes> {
        let objects = self.objects.clone();
        let key = key.to_owned();
        Box::pin(async move {
            let map = read_lock(&objects)?;
            let object = map.get(&key).ok_or_else(|| BucketError::NotFound(key.clone()))?;
            Ok(Attributes {
                size: object.data.len() as u64,
                mod_time: object.mod_time,
            })
        })
    }

    fn read_all(&self, key: &str) -> BucketFuture<Vec<u8>> {
        let objects = self.objects.clone();
        let key = key.to_owned();
        Box::pin(async move {
            let map = read_lock(&objects)?;
            map.get(&key)
                .map(|object| object.data.clone())
                .ok_or(BucketError::NotFound(key))
        })
    }

    fn list_page(
        &self,
        options: &ListOptions,
        page_token: Option<String>,
        page_size: usize,
    ) -> BucketFuture<ListPage> {
        let objects = self.objects.clone();
        let options = options.clone();
        Box::pin(async move {
            let map = read_lock(&objects)?;
            let listed = map
                .range(options.prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(options.prefix.as_str()))
                .map(|(key, object)| ListObject {
                    key: key.clone(),
                    size: object.data.len() as u64,
                    mod_time: Some(object.mod_time),
                    is_dir: false,
                });
            Ok(paginate(listed, &options, page_token.as_deref(), page_size))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_on;
    use std::time::Duration;

    #[test]
    fn read_existing_object() {
        let bucket = MemoryBucket::new();
        bucket.insert("config.json", b"{}".to_vec());
        let result = block_on(bucket.read_all("config.json")).unwrap();
        assert_eq!(result, b"{}");
    }

    #[test]
    fn read_missing_object() {
        let bucket = MemoryBucket::new();
        let result = block_on(bucket.read_all("nope.txt"));
        assert!(matches!(result, Err(BucketError::NotFound(_))));
    }

    #[test]
    fn exists_is_exact() {
        let bucket = MemoryBucket::new();
        bucket.insert("dir/file.txt", vec![]);
        assert!(block_on(bucket.exists("dir/file.txt")).unwrap());
        assert!(!block_on(bucket.exists("dir")).unwrap());
        assert!(!block_on(bucket.exists("dir/")).unwrap());
    }

    #[test]
    fn attributes_report_size_and_time() {
        let bucket = MemoryBucket::new();
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        bucket.insert_with_mod_time("a.bin", vec![0; 42], stamp);

        let attrs = block_on(bucket.attributes("a.bin")).unwrap();
        assert_eq!(attrs.size, 42);
        assert_eq!(attrs.mod_time, stamp);
    }

    #[test]
    fn attributes_of_missing_object() {
        let bucket = MemoryBucket::new();
        bucket.insert("dir/a", vec![]);
        let result = block_on(bucket.attributes("dir"));
        assert!(matches!(result, Err(BucketError::NotFound(_))));
    }

    #[test]
    fn list_root_groups_directories() {
        let bucket = MemoryBucket::new();
        bucket.insert("a.txt", vec![]);
        bucket.insert("b/c.txt", vec![]);
        bucket.insert("b/d.txt", vec![]);

        let page = block_on(bucket.list_page(&ListOptions::children(""), None, 100)).unwrap();
        let keys: Vec<_> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "b/"]);
        assert!(!page.objects[0].is_dir);
        assert!(page.objects[1].is_dir);
    }

    #[test]
    fn list_empty_prefix_match() {
        let bucket = MemoryBucket::new();
        bucket.insert("a.txt", vec![]);
        let page =
            block_on(bucket.list_page(&ListOptions::children("nonexistent/"), None, 1)).unwrap();
        assert!(page.objects.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn remove_returns_data() {
        let bucket = MemoryBucket::new();
        bucket.insert("file.txt", b"data".to_vec());
        assert_eq!(bucket.remove("file.txt"), Some(b"data".to_vec()));
        assert!(bucket.remove("file.txt").is_none());
        assert!(bucket.is_empty());
    }

    #[test]
    fn clones_share_objects() {
        let bucket = MemoryBucket::new();
        let other = bucket.clone();
        other.insert("shared", vec![1]);
        assert_eq!(bucket.len(), 1);
    }
}
