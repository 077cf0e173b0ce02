//! Disposal queue.
//!
//! Any thread may push a logically disposed resource; only the context
//! thread takes them out again, through
//! [`GlExecutor::drain_disposals`](crate::GlExecutor::drain_disposals).
//!
//! ```text
//! On dispose() (any thread):
//!   1. Don't touch the native object
//!   2. Push the resource handle onto the queue
//!
//! On drain (context thread):
//!   1. Swap the pending list out under the lock
//!   2. Destroy each resource once, outside the lock
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::DeferredResource;

/// Multi-producer, single-consumer queue of resources awaiting destruction.
pub struct DisposalQueue {
    pending: Mutex<Vec<DeferredResource>>,
    enqueued: AtomicUsize,
}

impl std::fmt::Debug for DisposalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalQueue")
            .field("pending_count", &self.pending_count())
            .field("total_enqueued", &self.total_enqueued())
            .finish()
    }
}

impl DisposalQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            enqueued: AtomicUsize::new(0),
        }
    }

    /// Queue a resource for destruction on the context thread.
    pub fn enqueue(&self, resource: DeferredResource) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().push(resource);
    }

    /// Take every pending resource, in enqueue order.
    pub(crate) fn take_pending(&self) -> Vec<DeferredResource> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Get the number of resources currently pending destruction.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Get the number of resources ever queued.
    pub fn total_enqueued(&self) -> usize {
        self.enqueued.load(Ordering::Relaxed)
    }
}

impl Default for DisposalQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Weak};

    use super::*;
    use crate::resources::Buffer;
    use crate::types::{BufferDescriptor, BufferUsage};

    fn detached_buffer(size: u32) -> DeferredResource {
        let desc = BufferDescriptor::new(size, BufferUsage::VERTEX);
        DeferredResource::Buffer(Arc::new(Buffer::new(Weak::new(), &desc)))
    }

    #[test]
    fn test_take_pending_empties_queue() {
        let queue = DisposalQueue::new();
        queue.enqueue(detached_buffer(4));
        queue.enqueue(detached_buffer(8));
        assert_eq!(queue.pending_count(), 2);

        let taken = queue.take_pending();
        assert_eq!(taken.len(), 2);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.total_enqueued(), 2);
    }

    #[test]
    fn test_concurrent_enqueue() {
        let queue = Arc::new(DisposalQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        queue.enqueue(detached_buffer(16));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.pending_count(), 400);
    }
}
