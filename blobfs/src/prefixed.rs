use crate::provider::{Attributes, Bucket, BucketFuture, ListOptions, ListPage};

/// Bucket adapter that roots every key under a fixed prefix.
///
/// Keys passed in are relative; the prefix is prepended before calling the
/// inner bucket and stripped from listing results. Page tokens are passed
/// through untouched.
pub struct PrefixedBucket<B> {
    inner: B,
    prefix: String,
}

impl<B: Bucket> PrefixedBucket<B> {
    /// Wrap `inner` so that key `k` addresses `prefix + k`.
    ///
    /// `prefix` is used verbatim; it should be empty or end with `/`.
    pub fn new(inner: B, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl<B: Bucket> Bucket for PrefixedBucket<B> {
    fn exists(&self, key: &str) -> BucketFuture<bool> {
        self.inner.exists(&self.key(key))
    }

    fn attributes(&self, key: &str) -> BucketFuture<Attributes> {
        self.inner.attributes(&self.key(key))
    }

    fn read_all(&self, key: &str) -> BucketFuture<Vec<u8>> {
        self.inner.read_all(&self.key(key))
    }

    fn list_page(
        &self,
        options: &ListOptions,
        page_token: Option<String>,
        page_size: usize,
    ) -> BucketFuture<ListPage> {
        let rooted = ListOptions {
            prefix: self.key(&options.prefix),
            delimiter: options.delimiter.clone(),
        };
        let fut = self.inner.list_page(&rooted, page_token, page_size);
        let prefix = self.prefix.clone();
        Box::pin(async move {
            let mut page = fut.await?;
            for object in &mut page.objects {
                if let Some(rest) = object.key.strip_prefix(prefix.as_str()) {
                    object.key = rest.to_owned();
                }
            }
            Ok(page)
        })
    }
}
