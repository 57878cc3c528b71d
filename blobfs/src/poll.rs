use crate::error::BucketError;
use crate::provider::BucketFuture;

/// Drive a bucket future to completion on the calling thread.
///
/// The filesystem view is synchronous (it backs `std::io::Read` and
/// `std::io::Seek`), so every store call made by [`BlobFs`](crate::BlobFs)
/// and [`BlobFile`](crate::BlobFile) goes through here. Futures that need a
/// specific async runtime (for example tokio timers) must be spawned on that
/// runtime by the bucket implementation itself.
pub fn block_on<T>(fut: BucketFuture<T>) -> Result<T, BucketError> {
    pollster::block_on(fut)
}
