//! Lock-free work queue for distributing one batch of entries across workers

use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed set of work items claimed one at a time by competing workers.
///
/// Each item is handed out exactly once. The queue lives for a single batch;
/// workers exit when [`claim`](WorkQueue::claim) returns `None`.
pub struct WorkQueue<T> {
    items: Vec<T>,
    cursor: AtomicUsize,
}

impl<T> WorkQueue<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claim the next unprocessed item with its position in the batch
    pub fn claim(&self) -> Option<(usize, &T)> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.items.get(i).map(|item| (i, item))
    }

    /// Items not yet claimed
    pub fn remaining(&self) -> usize {
        self.items
            .len()
            .saturating_sub(self.cursor.load(Ordering::Relaxed))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn claims_in_order_then_exhausts() {
        let q = WorkQueue::new(vec!["a", "b"]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.claim(), Some((0, &"a")));
        assert_eq!(q.remaining(), 1);
        assert_eq!(q.claim(), Some((1, &"b")));
        assert_eq!(q.claim(), None);
        assert_eq!(q.claim(), None);
        assert_eq!(q.remaining(), 0);
    }

    #[test]
    fn empty_queue() {
        let q: WorkQueue<u8> = WorkQueue::new(vec![]);
        assert!(q.is_empty());
        assert_eq!(q.claim(), None);
    }

    #[test]
    fn concurrent_workers_claim_each_item_once() {
        let q = WorkQueue::new((0..1000).collect::<Vec<u32>>());
        let seen = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while let Some((_, v)) = q.claim() {
                        seen.lock().unwrap().push(*v);
                    }
                });
            }
        });
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..1000).collect::<Vec<u32>>());
    }
}
