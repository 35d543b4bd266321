//! Time-ordered, cancellable event queue.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use super::time::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    fire_at: SimTime,
    id: TimerId,
    payload: T,
}

// Ordered by fire time, then by insertion so equal deadlines stay FIFO.
impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at, self.id).cmp(&(other.fire_at, other.id))
    }
}

#[derive(Debug)]
pub struct EventQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    live: HashSet<TimerId>,
    next_id: u64,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashSet::new(),
            next_id: 0,
        }
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: SimTime, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        self.heap.push(Reverse(Entry { fire_at, id, payload }));
        id
    }

    /// Returns false if the timer already fired or was cancelled. Dead entries
    /// are dropped from the heap once they outnumber live ones.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.live.remove(&id);
        if removed && self.heap.len() > 2 * self.live.len() {
            let live = &self.live;
            self.heap.retain(|Reverse(e)| live.contains(&e.id));
        }
        removed
    }

    /// Heap entries including cancelled ones not yet discarded.
    pub fn backlog(&self) -> usize {
        self.heap.len()
    }

    /// Pops the earliest live entry due at or before `now`.
    pub fn pop_due(&mut self, now: SimTime) -> Option<(SimTime, TimerId, T)> {
        loop {
            let due = match self.heap.peek() {
                Some(Reverse(entry)) => entry.fire_at <= now,
                None => return None,
            };
            if !due {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            if self.live.remove(&entry.id) {
                return Some((entry.fire_at, entry.id, entry.payload));
            }
            // cancelled; keep draining
        }
    }

    pub fn next_deadline(&self) -> Option<SimTime> {
        self.heap
            .iter()
            .filter(|Reverse(e)| self.live.contains(&e.id))
            .map(|Reverse(e)| e.fire_at)
            .min()
    }

    /// Live entries in firing order.
    pub fn pending(&self) -> Vec<(SimTime, &T)> {
        let mut live: Vec<&Entry<T>> = self
            .heap
            .iter()
            .map(|Reverse(e)| e)
            .filter(|e| self.live.contains(&e.id))
            .collect();
        live.sort();
        live.into_iter().map(|e| (e.fire_at, &e.payload)).collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }
}
