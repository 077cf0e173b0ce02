//! Staging memory pool.
//!
//! Producer threads copy variable-length payloads (shader source, mostly)
//! into a [`StagingBlock`] rented from a [`StagingMemoryPool`]. The block is
//! move-only: it travels inside the resource that owns it and comes back to
//! the pool through [`StagingMemoryPool::free`], which consumes it. A block
//! therefore cannot be returned twice or read after it has been returned.
//!
//! # Thread Safety
//!
//! The pool is `Send + Sync`. Blocks are typically acquired on producer
//! threads and freed on the context thread.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

/// A pooled byte buffer holding a payload of a fixed size.
pub struct StagingBlock {
    id: u64,
    data: Vec<u8>,
    size: usize,
}

impl StagingBlock {
    /// Pool-unique identifier of this rental.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Payload size in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.size
    }

    /// Capacity of the underlying allocation.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The payload bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// The payload bytes, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.size]
    }
}

impl std::fmt::Debug for StagingBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingBlock")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("capacity", &self.data.len())
            .finish()
    }
}

/// Counters describing pool traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StagingPoolStats {
    /// Blocks handed out since the pool was created.
    pub acquired: usize,
    /// Blocks returned since the pool was created.
    pub freed: usize,
    /// Bytes currently held for reuse.
    pub retained_bytes: usize,
}

impl StagingPoolStats {
    /// Blocks currently rented out.
    pub fn outstanding(&self) -> usize {
        self.acquired.saturating_sub(self.freed)
    }
}

/// Returned allocations, sorted by capacity, with their total size.
#[derive(Default)]
struct FreeList {
    blocks: Vec<Vec<u8>>,
    retained_bytes: usize,
}

impl FreeList {
    /// Remove the smallest allocation that fits `size` bytes.
    fn take_best_fit(&mut self, size: usize) -> Option<Vec<u8>> {
        let index = self.blocks.iter().position(|buf| buf.len() >= size)?;
        let buf = self.blocks.remove(index);
        self.retained_bytes -= buf.len();
        Some(buf)
    }

    fn insert(&mut self, buf: Vec<u8>) {
        let index = self.blocks.partition_point(|held| held.len() < buf.len());
        self.retained_bytes += buf.len();
        self.blocks.insert(index, buf);
    }
}

/// Thread-safe pool of reusable staging allocations.
pub struct StagingMemoryPool {
    free_list: Mutex<FreeList>,
    max_retained_bytes: usize,
    next_id: AtomicU64,
    acquired: AtomicUsize,
    freed: AtomicUsize,
}

impl StagingMemoryPool {
    /// Smallest allocation the pool makes.
    pub const MINIMUM_CAPACITY: usize = 128;

    /// Default upper bound on bytes kept for reuse.
    pub const DEFAULT_MAX_RETAINED_BYTES: usize = 16 * 1024 * 1024;

    /// Create a pool that retains up to [`Self::DEFAULT_MAX_RETAINED_BYTES`].
    pub fn new() -> Self {
        Self::with_max_retained_bytes(Self::DEFAULT_MAX_RETAINED_BYTES)
    }

    /// Create a pool that retains at most `max_retained_bytes` of freed memory.
    pub fn with_max_retained_bytes(max_retained_bytes: usize) -> Self {
        Self {
            free_list: Mutex::new(FreeList::default()),
            max_retained_bytes,
            next_id: AtomicU64::new(1),
            acquired: AtomicUsize::new(0),
            freed: AtomicUsize::new(0),
        }
    }

    /// Rent a zeroed block with room for `size` bytes.
    pub fn acquire(&self, size: usize) -> StagingBlock {
        // Counted before the block exists, so no reader sees its free first.
        self.acquired.fetch_add(1, Ordering::Release);

        let reused = self.free_list.lock().take_best_fit(size);
        let data = match reused {
            Some(mut buf) => {
                buf[..size].fill(0);
                buf
            }
            None => vec![0; size.max(Self::MINIMUM_CAPACITY)],
        };

        StagingBlock {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            data,
            size,
        }
    }

    /// Rent a block holding a copy of `bytes`.
    pub fn acquire_with(&self, bytes: &[u8]) -> StagingBlock {
        let mut block = self.acquire(bytes.len());
        block.as_mut_slice().copy_from_slice(bytes);
        block
    }

    /// Return a block to the pool.
    pub fn free(&self, block: StagingBlock) {
        self.freed.fetch_add(1, Ordering::Release);
        log::trace!(
            "StagingMemoryPool: freed block {} ({} bytes)",
            block.id,
            block.size
        );

        let mut free_list = self.free_list.lock();
        if free_list.retained_bytes + block.data.len() > self.max_retained_bytes {
            return;
        }
        free_list.insert(block.data);
    }

    /// Current pool counters.
    pub fn stats(&self) -> StagingPoolStats {
        // `freed` first: every free it counts has its acquire visible below.
        let freed = self.freed.load(Ordering::Acquire);
        let acquired = self.acquired.load(Ordering::Acquire);
        StagingPoolStats {
            acquired,
            freed,
            retained_bytes: self.free_list.lock().retained_bytes,
        }
    }
}

impl Default for StagingMemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StagingMemoryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingMemoryPool")
            .field("stats", &self.stats())
            .field("max_retained_bytes", &self.max_retained_bytes)
            .finish()
    }
}

static_assertions::assert_impl_all!(StagingMemoryPool: Send, Sync);
static_assertions::assert_impl_all!(StagingBlock: Send);
static_assertions::assert_not_impl_any!(StagingBlock: Clone);
