//! Ordered queue of in-flight settings operations.
//!
//! Every operation owns a single-use slot. The background worker writes the
//! slot through a [`Completer`], and the draining side reads it through the
//! matching [`Completion`]. Slots are read strictly in the order they were
//! enqueued, whatever order the workers finish in.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, SyncSender};

use parking_lot::Mutex;
use tracing::trace;

use super::{SettingsError, SettingsTree};

/// What a finished operation hands over to the store.
pub type Outcome = Result<SettingsTree, SettingsError>;

/// Write half of a completion slot. Consumed by [`complete`](Self::complete).
///
/// Dropping a `Completer` without completing it (for example because the
/// worker panicked) makes the slot resolve to [`SettingsError::WorkerLost`].
#[derive(Debug)]
#[must_use = "an uncompleted slot resolves to WorkerLost"]
pub struct Completer {
    seq: u64,
    tx: SyncSender<Outcome>,
}

impl Completer {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn complete(self, outcome: Outcome) {
        // The receiver is only gone if the whole store was dropped.
        if self.tx.send(outcome).is_err() {
            trace!(seq = self.seq, "completion slot abandoned by its store");
        }
    }
}

/// Read half of a completion slot.
#[derive(Debug)]
pub struct Completion {
    seq: u64,
    rx: Receiver<Outcome>,
}

impl Completion {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Blocks until the slot is written.
    pub fn wait(self) -> Outcome {
        self.rx.recv().unwrap_or(Err(SettingsError::WorkerLost))
    }
}

fn slot(seq: u64) -> (Completer, Completion) {
    let (tx, rx) = mpsc::sync_channel(1);
    (Completer { seq, tx }, Completion { seq, rx })
}

#[derive(Debug, Default)]
struct QueueState {
    next_seq: u64,
    slots: VecDeque<Completion>,
}

#[derive(Debug, Default)]
pub struct PendingQueue {
    state: Mutex<QueueState>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fresh slot and returns its write half.
    ///
    /// Sequence numbers and queue positions are assigned under the same lock,
    /// so issue order is exactly queue order.
    pub fn enqueue(&self) -> Completer {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let (completer, completion) = slot(seq);
        state.slots.push_back(completion);
        completer
    }

    /// Takes every slot enqueued so far and yields their outcomes in order.
    ///
    /// The queue is emptied up front; slots enqueued while the returned
    /// iterator is being consumed belong to the next drain. Each call to
    /// `next` blocks until that slot has been written.
    pub fn drain_in_order(&self) -> Drain {
        let slots = std::mem::take(&mut self.state.lock().slots);
        Drain {
            slots: slots.into_iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator returned by [`PendingQueue::drain_in_order`].
#[derive(Debug)]
pub struct Drain {
    slots: std::collections::vec_deque::IntoIter<Completion>,
}

impl Iterator for Drain {
    type Item = (u64, Outcome);

    fn next(&mut self) -> Option<Self::Item> {
        let completion = self.slots.next()?;
        let seq = completion.seq();
        Some((seq, completion.wait()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl ExactSizeIterator for Drain {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;
    use std::time::Duration;

    fn tree(key: &str, value: i64) -> SettingsTree {
        let mut tree = SettingsTree::new();
        tree.insert(key.to_string(), json!(value));
        tree
    }

    #[test]
    fn test_drain_follows_enqueue_order_not_completion_order() {
        let queue = PendingQueue::new();
        let first = queue.enqueue();
        let second = queue.enqueue();
        let third = queue.enqueue();

        let slow = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            first.complete(Ok(tree("n", 1)));
        });
        third.complete(Ok(tree("n", 3)));
        second.complete(Ok(tree("n", 2)));

        let drained: Vec<_> = queue
            .drain_in_order()
            .map(|(seq, outcome)| (seq, outcome.unwrap()["n"].clone()))
            .collect();
        slow.join().unwrap();

        assert_eq!(drained, vec![(0, json!(1)), (1, json!(2)), (2, json!(3))]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dropped_completer_reports_worker_lost() {
        let queue = PendingQueue::new();
        drop(queue.enqueue());

        let outcomes: Vec<_> = queue.drain_in_order().collect();
        assert!(matches!(outcomes[..], [(0, Err(SettingsError::WorkerLost))]));
    }

    #[test]
    fn test_enqueue_during_drain_goes_to_next_drain() {
        let queue = PendingQueue::new();
        queue.enqueue().complete(Ok(tree("a", 1)));

        let mut drain = queue.drain_in_order();
        queue.enqueue().complete(Ok(tree("b", 2)));

        assert_eq!(drain.len(), 1);
        assert!(drain.next().is_some());
        assert!(drain.next().is_none());
        assert_eq!(queue.len(), 1);

        let (seq, outcome) = queue.drain_in_order().next().unwrap();
        assert_eq!(seq, 1);
        assert_eq!(outcome.unwrap()["b"], json!(2));
    }

    #[test]
    fn test_concurrent_enqueue_loses_nothing() {
        let queue = std::sync::Arc::new(PendingQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = std::sync::Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..25 {
                        queue.enqueue().complete(Ok(SettingsTree::new()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let seqs: Vec<u64> = queue.drain_in_order().map(|(seq, _)| seq).collect();
        assert_eq!(seqs, (0..200).collect::<Vec<_>>());
    }
}
