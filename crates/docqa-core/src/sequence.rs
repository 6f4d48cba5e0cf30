//! Latest-request-wins bookkeeping
//!
//! Requests cannot be cancelled once sent, so every request is tagged with a
//! ticket and a response is applied only if its ticket is still the newest
//! one for that slot.

/// One logical stream of requests whose responses replace each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    List,
    Upload,
    History,
    Query,
    Preview,
}

const SLOT_COUNT: usize = 5;

impl Slot {
    fn index(self) -> usize {
        match self {
            Slot::List => 0,
            Slot::Upload => 1,
            Slot::History => 2,
            Slot::Query => 3,
            Slot::Preview => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct Sequencer {
    counters: [u64; SLOT_COUNT],
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, slot: Slot) -> Ticket {
        let counter = &mut self.counters[slot.index()];
        *counter += 1;
        Ticket { slot, seq: *counter }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.counters[ticket.slot.index()] == ticket.seq
    }

    /// Make every outstanding ticket for `slot` stale
    pub fn invalidate(&mut self, slot: Slot) {
        self.counters[slot.index()] += 1;
    }
}
