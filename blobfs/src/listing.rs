use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::BucketError;
use crate::poll::block_on;
use crate::provider::{Bucket, ListObject, ListOptions, ListPage};

/// Page size used when enumerating directories.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Build one listing page out of a key-ordered sequence of plain objects.
///
/// Applies delimiter grouping and token-based pagination as described on
/// [`Bucket`]. Shared by the bundled bucket implementations; `objects` must be
/// sorted by key and may contain keys outside `options.prefix` (they are
/// skipped).
pub fn paginate(
    objects: impl IntoIterator<Item = ListObject>,
    options: &ListOptions,
    page_token: Option<&str>,
    page_size: usize,
) -> ListPage {
    let page_size = page_size.max(1);
    let mut page = ListPage::default();
    let mut last_dir: Option<String> = None;

    for object in objects {
        let Some(rest) = object.key.strip_prefix(options.prefix.as_str()) else {
            continue;
        };

        let split = if options.delimiter.is_empty() {
            None
        } else {
            rest.find(options.delimiter.as_str())
        };

        let entry = match split {
            Some(pos) => {
                let key = format!(
                    "{}{}",
                    options.prefix,
                    &rest[..pos + options.delimiter.len()]
                );
                // Keys sharing a directory prefix are contiguous in sorted order.
                if last_dir.as_deref() == Some(key.as_str()) {
                    continue;
                }
                last_dir = Some(key.clone());
                ListObject {
                    key,
                    size: 0,
                    mod_time: None,
                    is_dir: true,
                }
            }
            None => object,
        };

        if let Some(token) = page_token
            && entry.key.as_str() <= token
        {
            continue;
        }

        if page.objects.len() == page_size {
            page.next_page_token = page.objects.last().map(|o| o.key.clone());
            break;
        }
        page.objects.push(entry);
    }

    page
}

/// Resumable cursor over a paginated listing.
///
/// Fetches pages lazily. A failed page fetch leaves the cursor where it was,
/// so calling [`next_entry`](ListIterator::next_entry) again retries the same page.
pub struct ListIterator {
    bucket: Arc<dyn Bucket>,
    options: ListOptions,
    page_size: usize,
    buffered: VecDeque<ListObject>,
    next_token: Option<String>,
    done: bool,
}

impl ListIterator {
    pub fn new(bucket: Arc<dyn Bucket>, options: ListOptions, page_size: usize) -> Self {
        Self {
            bucket,
            options,
            page_size,
            buffered: VecDeque::new(),
            next_token: None,
            done: false,
        }
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    /// True once every page has been fetched and every entry handed out.
    /// Never touches the bucket.
    pub fn is_drained(&self) -> bool {
        self.done && self.buffered.is_empty()
    }

    /// Return the next listed entry, or `None` once the listing is exhausted.
    pub fn next_entry(&mut self) -> Result<Option<ListObject>, BucketError> {
        loop {
            if let Some(object) = self.buffered.pop_front() {
                return Ok(Some(object));
            }
            if self.done {
                return Ok(None);
            }

            log::trace!(
                "listing page of {:?} (token {:?})",
                self.options.prefix,
                self.next_token
            );
            let page = block_on(self.bucket.list_page(
                &self.options,
                self.next_token.clone(),
                self.page_size,
            ))?;
            self.done = page.next_page_token.is_none();
            self.next_token = page.next_page_token;
            self.buffered.extend(page.objects);
        }
    }
}
