use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Which end of the key range `pop` yields first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Smallest key first (repository scores)
    Ascending,
    /// Largest key first (tag creation timestamps)
    Descending,
}

/// Priority queue over items keyed by an `f64`. Equal keys pop in insertion order.
#[derive(Debug, Clone)]
pub struct RankingQueue<T> {
    heap: BinaryHeap<Ranked<T>>,
    order: Order,
    next_seq: u64,
}

impl<T> RankingQueue<T> {
    pub fn new(order: Order) -> Self {
        RankingQueue {
            heap: BinaryHeap::new(),
            order,
            next_seq: 0,
        }
    }

    pub fn ascending() -> Self {
        Self::new(Order::Ascending)
    }

    pub fn descending() -> Self {
        Self::new(Order::Descending)
    }

    pub fn push(&mut self, key: f64, item: T) {
        self.heap.push(Ranked {
            key,
            seq: self.next_seq,
            order: self.order,
            item,
        });
        self.next_seq += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|ranked| ranked.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Empty the queue in priority order
    pub fn drain_ordered(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.heap.len());
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }
}

#[derive(Debug, Clone)]
struct Ranked<T> {
    key: f64,
    seq: u64,
    order: Order,
    item: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    // BinaryHeap is a max-heap: the greatest element under this ordering pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_key = match self.order {
            Order::Ascending => other.key.total_cmp(&self.key),
            Order::Descending => self.key.total_cmp(&other.key),
        };
        by_key.then_with(|| other.seq.cmp(&self.seq))
    }
}
