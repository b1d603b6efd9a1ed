//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CounterId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObservationId(pub u32);

/// Monotonic allocator for ElementId, CounterId, and ObservationId.
/// Ids are never reused, so a detached id can't alias a newer entity.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_element: u32,
    next_counter: u32,
    next_observation: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_element(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element = self.next_element.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_counter(&mut self) -> CounterId {
        let id = CounterId(self.next_counter);
        self.next_counter = self.next_counter.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_observation(&mut self) -> ObservationId {
        let id = ObservationId(self.next_observation);
        self.next_observation = self.next_observation.wrapping_add(1);
        id
    }
}
