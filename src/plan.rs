//! A time-ordered queue of pending work.
//!
//! `Queue<T, P>` holds items of type `T` (the `Context` stores boxed callbacks) keyed by an
//! `f64` time and a priority `P`. Ties are broken first by priority, then by insertion order,
//! which is what makes the hourly movement / transmission / end-of-day sequence well defined
//! when all three land on the same timestamp.
//!
//! Adding and removing are *O*(log(*n*)).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub struct Queue<T, P: Ord> {
    queue: BinaryHeap<Entry<T, P>>,
    next_id: u64,
}

impl<T, P: Ord> Queue<T, P> {
    #[must_use]
    pub fn new() -> Queue<T, P> {
        Queue {
            queue: BinaryHeap::new(),
            next_id: 0,
        }
    }

    /// Adds `data` at `time` with the given priority.
    pub fn add_plan(&mut self, time: f64, data: T, priority: P) {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push(Entry {
            time,
            priority,
            id,
            data,
        });
    }

    /// Drops every pending plan.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Removes and returns the earliest plan.
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        self.queue.pop().map(|entry| Plan {
            time: entry.time,
            data: entry.data,
        })
    }
}

impl<T, P: Ord> Default for Queue<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered by time, priority and insertion order only; the payload takes no part.
struct Entry<T, P: Ord> {
    time: f64,
    priority: P,
    id: u64,
    data: T,
}

impl<T, P: Ord> PartialEq for Entry<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T, P: Ord> Eq for Entry<T, P> {}

impl<T, P: Ord> PartialOrd for Entry<T, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// `BinaryHeap` is a max-heap, so every comparison is reversed.
impl<T, P: Ord> Ord for Entry<T, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.id.cmp(&other.id))
            .reverse()
    }
}

/// A plan popped off the queue.
pub struct Plan<T> {
    pub time: f64,
    pub data: T,
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::Queue;

    #[test]
    fn empty_queue() {
        let mut plan_queue = Queue::<(), ()>::new();
        assert!(plan_queue.get_next_plan().is_none());
    }

    #[test]
    fn plans_come_out_in_time_order() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1.0, 1, ());
        plan_queue.add_plan(3.0, 3, ());
        plan_queue.add_plan(2.0, 2, ());

        for expected in 1..=3 {
            let next_plan = plan_queue.get_next_plan().unwrap();
            assert_eq!(next_plan.time, f64::from(expected));
            assert_eq!(next_plan.data, expected);
        }
        assert!(plan_queue.get_next_plan().is_none());
    }

    #[test]
    fn same_time_same_priority_is_fifo() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1.0, 1, ());
        plan_queue.add_plan(1.0, 2, ());

        assert_eq!(plan_queue.get_next_plan().unwrap().data, 1);
        assert_eq!(plan_queue.get_next_plan().unwrap().data, 2);
    }

    #[test]
    fn same_time_lower_priority_first() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1.0, "late", 2);
        plan_queue.add_plan(1.0, "early", 0);
        plan_queue.add_plan(1.0, "middle", 1);

        assert_eq!(plan_queue.get_next_plan().unwrap().data, "early");
        assert_eq!(plan_queue.get_next_plan().unwrap().data, "middle");
        assert_eq!(plan_queue.get_next_plan().unwrap().data, "late");
    }

    #[test]
    fn clear_drops_everything() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1.0, 1, ());
        plan_queue.add_plan(2.0, 2, ());
        plan_queue.clear();
        assert!(plan_queue.get_next_plan().is_none());
    }
}
