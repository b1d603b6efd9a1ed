//! Shared frame clock for counter runs.
//!
//! One scheduler multiplexes any number of counters. A ticket names a counter
//! and the run generation it was scheduled for; the counter drops frames whose
//! generation is stale. Tickets scheduled during frame N first fire on frame
//! N + 1, so a run never receives two frames synchronously.

use serde::{Deserialize, Serialize};

use crate::ids::CounterId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTicket {
    pub counter: CounterId,
    pub generation: u64,
    ready_at: u64,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    frame: u64,
    tickets: Vec<FrameTicket>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the current frame (0 before the first one).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Subscribe `counter` at `generation`, replacing any earlier ticket for it.
    pub fn schedule(&mut self, counter: CounterId, generation: u64) {
        self.cancel(counter);
        self.tickets.push(FrameTicket {
            counter,
            generation,
            ready_at: self.frame + 1,
        });
    }

    pub fn cancel(&mut self, counter: CounterId) {
        self.tickets.retain(|t| t.counter != counter);
    }

    /// Tickets due in the current frame, in scheduling order.
    pub fn due(&self) -> Vec<FrameTicket> {
        self.tickets
            .iter()
            .filter(|t| t.ready_at <= self.frame)
            .copied()
            .collect()
    }

    pub fn is_scheduled(&self, counter: CounterId) -> bool {
        self.tickets.iter().any(|t| t.counter == counter)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_fire_from_the_next_frame() {
        let mut s = FrameScheduler::new();
        s.schedule(CounterId(0), 1);
        assert!(s.due().is_empty());
        s.begin_frame();
        assert_eq!(s.due().len(), 1);

        // Scheduled mid-frame: waits for the next one.
        s.schedule(CounterId(1), 1);
        assert_eq!(s.due().len(), 1);
        s.begin_frame();
        assert_eq!(s.due().len(), 2);
    }

    #[test]
    fn reschedule_replaces_and_cancel_removes() {
        let mut s = FrameScheduler::new();
        s.schedule(CounterId(3), 1);
        s.schedule(CounterId(3), 2);
        assert_eq!(s.len(), 1);
        s.begin_frame();
        assert_eq!(s.due()[0].generation, 2);
        s.cancel(CounterId(3));
        assert!(s.is_empty());
        assert!(!s.is_scheduled(CounterId(3)));
    }
}
