//! In-memory priority queue with insertion-order tie-break.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::Task;

/// Wrapper to make Task orderable by priority (highest first) and FIFO within priority.
struct QueuedTask<T> {
    seq: u64,
    task: Task<T>,
}

impl<T> PartialEq for QueuedTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<T> Eq for QueuedTask<T> {}

impl<T> PartialOrd for QueuedTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueuedTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first
        match self.task.priority().cmp(&other.task.priority()) {
            // FIFO within same priority: lower sequence wins (reversed for max-heap)
            Ordering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

/// In-memory queue storing pending tasks using a priority heap.
/// This provides O(log n) push and O(log n) pop operations.
///
/// Sequence numbers keep increasing across [`PriorityQueue::clear`], so equal
/// priorities never compare equal.
pub struct PriorityQueue<T> {
    tasks: BinaryHeap<QueuedTask<T>>,
    next_seq: u64,
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Insert a task behind every queued task of the same priority.
    pub fn push(&mut self, task: Task<T>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        // O(log n) insertion
        self.tasks.push(QueuedTask { seq, task });
    }

    /// Remove and return the next task to dispatch.
    pub fn pop(&mut self) -> Option<Task<T>> {
        // O(log n) removal
        self.tasks.pop().map(|q| q.task)
    }

    /// Names in dispatch order, without removing anything.
    #[must_use]
    pub fn order(&self) -> Vec<String> {
        let mut entries: Vec<&QueuedTask<T>> = self.tasks.iter().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|q| q.task.name().to_owned()).collect()
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(name: &str, priority: i64) -> Task<()> {
        Task::new(name, || async { Ok(()) }).with_priority(priority)
    }

    fn drain(q: &mut PriorityQueue<()>) -> Vec<String> {
        std::iter::from_fn(|| q.pop().map(|t| t.name().to_owned())).collect()
    }

    #[test]
    fn test_priority_ordering() {
        let mut q = PriorityQueue::new();

        // Push in mixed order
        q.push(make_task("low", 1));
        q.push(make_task("critical", 10));
        q.push(make_task("normal", 2));
        q.push(make_task("high", 3));
        q.push(make_task("negative", -4));

        assert_eq!(
            drain(&mut q),
            ["critical", "high", "normal", "low", "negative"]
        );
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut q = PriorityQueue::new();

        q.push(make_task("a", 0));
        q.push(make_task("b", 0));
        q.push(make_task("urgent", 1));
        q.push(make_task("c", 0));

        assert_eq!(drain(&mut q), ["urgent", "a", "b", "c"]);
    }

    #[test]
    fn test_order_is_non_destructive() {
        let mut q = PriorityQueue::new();
        q.push(make_task("low", 1));
        q.push(make_task("high", 3));
        q.push(make_task("medium", 2));

        assert_eq!(q.order(), ["high", "medium", "low"]);
        assert_eq!(q.len(), 3);
        assert_eq!(drain(&mut q), ["high", "medium", "low"]);
    }

    #[test]
    fn test_sequence_survives_clear() {
        let mut q = PriorityQueue::new();
        q.push(make_task("old", 0));
        q.clear();
        assert!(q.is_empty());

        q.push(make_task("first", 0));
        q.push(make_task("second", 0));
        assert_eq!(drain(&mut q), ["first", "second"]);
    }

    #[test]
    fn test_empty_queue() {
        let mut q = PriorityQueue::<()>::new();
        assert!(q.pop().is_none());
        assert_eq!(q.len(), 0);
        assert!(q.order().is_empty());
    }
}
