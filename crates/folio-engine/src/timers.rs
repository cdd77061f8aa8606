//! Deferred continuations
//!
//! A virtual-time queue: callers schedule work at an absolute due time and
//! drain whatever is due from `tick(now)`. Ties fire in scheduling order.

/// Min-ordered queue of continuations
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: Vec<Timer<T>>,
    next_seq: u64,
}

#[derive(Debug)]
struct Timer<T> {
    due: f64,
    seq: u64,
    task: T,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `task` at absolute time `due` (ms)
    pub fn schedule(&mut self, due: f64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Timer { due, seq, task });
    }

    /// Remove and return every task due at or before `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|t| t.due <= now);
        self.entries = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|t| t.task).collect()
    }

    /// Earliest due time
    pub fn next_due(&self) -> Option<f64> {
        self.entries.iter().map(|t| t.due).min_by(f64::total_cmp)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(300.0, "c");
        queue.schedule(100.0, "a");
        queue.schedule(100.0, "b");
        queue.schedule(900.0, "late");

        assert_eq!(queue.next_due(), Some(100.0));
        assert!(queue.drain_due(99.0).is_empty());
        assert_eq!(queue.drain_due(300.0), vec!["a", "b", "c"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_due(1000.0), vec!["late"]);
        assert!(queue.is_empty());
    }
}
