use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A continuation waiting for its resume time
#[derive(Debug)]
pub struct ScheduledContinuation<T> {
    pub resume_at: f64,
    pub sequence_num: u64,
    pub continuation: T,
}

impl<T> PartialEq for ScheduledContinuation<T> {
    fn eq(&self, other: &Self) -> bool {
        self.resume_at.total_cmp(&other.resume_at) == Ordering::Equal
            && self.sequence_num == other.sequence_num
    }
}

impl<T> Eq for ScheduledContinuation<T> {}

impl<T> PartialOrd for ScheduledContinuation<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledContinuation<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .resume_at
            .total_cmp(&self.resume_at)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Timed delays as (resume-time, continuation) entries.
///
/// The owner advances the local clock every tick and drains whatever has
/// come due. Entries scheduled for the same instant resume in the order
/// they were scheduled.
#[derive(Debug)]
pub struct DelayScheduler<T> {
    queue: BinaryHeap<ScheduledContinuation<T>>,
    sequence_counter: u64,
    now: f64,
}

impl<T> DelayScheduler<T> {
    /// Create a new DelayScheduler with its clock at zero
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            sequence_counter: 0,
            now: 0.0,
        }
    }

    /// Schedule a continuation to resume after `delay_secs`
    pub fn schedule(&mut self, continuation: T, delay_secs: f32) {
        let scheduled = ScheduledContinuation {
            resume_at: self.now + f64::from(delay_secs.max(0.0)),
            sequence_num: self.sequence_counter,
            continuation,
        };

        self.queue.push(scheduled);
        self.sequence_counter += 1;
    }

    /// Advance the local clock
    pub fn advance(&mut self, dt: f32) {
        self.now += f64::from(dt.max(0.0));
    }

    /// Remove and return every continuation whose resume time has passed
    pub fn drain_due(&mut self) -> Vec<T> {
        let mut due = Vec::new();

        while let Some(scheduled) = self.queue.peek() {
            if scheduled.resume_at <= self.now {
                if let Some(scheduled) = self.queue.pop() {
                    due.push(scheduled.continuation);
                }
            } else {
                break;
            }
        }

        due
    }

    /// Seconds until the next continuation resumes
    pub fn peek_next_delay(&self) -> Option<f64> {
        self.queue
            .peek()
            .map(|scheduled| (scheduled.resume_at - self.now).max(0.0))
    }

    /// Drop every pending continuation
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn now(&self) -> f64 {
        self.now
    }
}

impl<T> Default for DelayScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_due_before_delay() {
        let mut scheduler = DelayScheduler::new();
        scheduler.schedule("leave", 2.0);
        scheduler.advance(1.5);
        assert!(scheduler.drain_due().is_empty());
        assert!(scheduler.has_pending());
        assert!((scheduler.peek_next_delay().unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_due_in_resume_order() {
        let mut scheduler = DelayScheduler::new();
        scheduler.schedule("late", 3.0);
        scheduler.schedule("early", 1.0);
        scheduler.schedule("middle", 2.0);
        scheduler.advance(5.0);
        assert_eq!(scheduler.drain_due(), vec!["early", "middle", "late"]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_same_instant_keeps_schedule_order() {
        let mut scheduler = DelayScheduler::new();
        scheduler.schedule(1, 1.0);
        scheduler.schedule(2, 1.0);
        scheduler.schedule(3, 1.0);
        scheduler.advance(1.0);
        assert_eq!(scheduler.drain_due(), vec![1, 2, 3]);
    }

    #[test]
    fn test_delay_relative_to_current_clock() {
        let mut scheduler = DelayScheduler::new();
        scheduler.advance(10.0);
        scheduler.schedule('a', 1.0);
        scheduler.advance(0.5);
        assert!(scheduler.drain_due().is_empty());
        scheduler.advance(0.5);
        assert_eq!(scheduler.drain_due(), vec!['a']);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut scheduler = DelayScheduler::new();
        scheduler.schedule((), 0.0);
        scheduler.clear();
        assert_eq!(scheduler.len(), 0);
        assert!(scheduler.drain_due().is_empty());
    }
}
