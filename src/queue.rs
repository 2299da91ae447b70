//! Blocking FIFO queue shared between the simulation and the pathfinding
//! workers.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Mutex + condvar FIFO. `pop` blocks until an item arrives; `try_pop_for`
/// gives up after a timeout so workers can poll their stop flag.
#[derive(Default)]
pub struct Queue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, value: T) {
        self.items
            .lock()
            .expect("queue mutex poisoned")
            .push_back(value);

        self.available.notify_one();
    }

    /// Block until an item is available.
    pub fn pop(&self) -> T {
        let mut items = self.items.lock().expect("queue mutex poisoned");

        loop {
            if let Some(value) = items.pop_front() {
                return value;
            }

            items = self.available.wait(items).expect("queue mutex poisoned");
        }
    }

    /// Wait up to `duration` for an item; `None` on timeout.
    pub fn try_pop_for(&self, duration: Duration) -> Option<T> {
        let mut items = self.items.lock().expect("queue mutex poisoned");

        if items.is_empty() {
            let (guard, result) = self
                .available
                .wait_timeout_while(items, duration, |items| items.is_empty())
                .expect("queue mutex poisoned");

            items = guard;

            if result.timed_out() && items.is_empty() {
                return None;
            }
        }

        items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn pops_in_fifo_order() {
        let queue = Queue::new();

        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop(), 1);
        assert_eq!(queue.pop(), 2);
        assert_eq!(queue.pop(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn timed_pop_times_out_when_empty() {
        let queue: Queue<u32> = Queue::new();

        assert_eq!(queue.try_pop_for(Duration::from_millis(10)), None);
    }

    #[test]
    fn timed_pop_wakes_on_push_from_other_thread() {
        let queue = Arc::new(Queue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.push(42);
            })
        };

        let value = queue.try_pop_for(Duration::from_secs(5));

        producer.join().unwrap();

        assert_eq!(value, Some(42));
    }

    #[test]
    fn blocking_pop_waits_for_producer() {
        let queue = Arc::new(Queue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.push("done");
            })
        };

        assert_eq!(queue.pop(), "done");

        producer.join().unwrap();
    }
}
