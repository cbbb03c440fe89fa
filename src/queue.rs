//! The event queue: a binary min-heap of site and circle events keyed by
//! `(y, x)`.
//!
//! Events are shared between the queue and up to three beach-line arcs, so
//! they live in a slab and everyone holds [`EventIdx`] handles. Each event
//! tracks its own heap position, which makes removal by handle O(log n);
//! a position of `None` marks an event that has left the queue (popped or
//! cancelled). Slab entries are never reused during a sweep.

use crate::beach::NodeIdx;
use crate::geom::SiteIdx;

/// What an [`Event`] does when it reaches the front of the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum EventKind {
    /// A new site reaches the sweep line and splits the arc above it.
    Site(SiteIdx),
    /// Three arcs converge: the middle one vanishes into a vertex.
    Circle {
        /// The beach-line leaf of the middle arc.
        node: NodeIdx,
        /// Radius of the converging circle; the event's `y` is the
        /// circle's bottom tangent, so the center sits at `y - radius`.
        radius: i32,
    },
}

/// A handle to an event in its queue's slab.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Serialize)]
pub struct EventIdx(usize);

/// A scheduled site or circle event.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Event {
    /// Horizontal position, the tie-breaker within a sweep row.
    pub x: i32,
    /// The sweep position the event fires at.
    pub y: i32,
    /// Site or circle payload.
    pub kind: EventKind,
    heap_slot: Option<usize>,
}

impl Event {
    /// The heap ordering key.
    fn key(&self) -> (i32, i32) {
        (self.y, self.x)
    }

    /// Whether the event is still waiting in the queue.
    pub fn is_queued(&self) -> bool {
        self.heap_slot.is_some()
    }

    /// The event's current position in the heap, if queued.
    pub fn heap_slot(&self) -> Option<usize> {
        self.heap_slot
    }
}

/// The priority queue driving the sweep.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
    heap: Vec<EventIdx>,
}

impl std::ops::Index<EventIdx> for EventQueue {
    type Output = Event;

    fn index(&self, index: EventIdx) -> &Event {
        &self.events[index.0]
    }
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> EventQueue {
        EventQueue::default()
    }

    /// Number of events waiting in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedules an event and returns its handle.
    pub(crate) fn push(&mut self, x: i32, y: i32, kind: EventKind) -> EventIdx {
        let idx = EventIdx(self.events.len());
        self.events.push(Event {
            x,
            y,
            kind,
            heap_slot: Some(self.heap.len()),
        });
        self.heap.push(idx);
        self.sift_up(self.heap.len() - 1);
        idx
    }

    /// Detaches and returns the event with the smallest `(y, x)`.
    pub(crate) fn pop_min(&mut self) -> Option<EventIdx> {
        let min = *self.heap.first()?;
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        self.events[self.heap[0].0].heap_slot = Some(0);
        self.heap.pop();
        self.events[min.0].heap_slot = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(min)
    }

    /// Detaches an event wherever it sits in the heap. A no-op for events
    /// that are already detached.
    pub(crate) fn remove(&mut self, event: EventIdx) {
        let Some(slot) = self.events[event.0].heap_slot else {
            return;
        };
        self.events[event.0].heap_slot = None;
        let last = self.heap.len() - 1;
        if slot == last {
            self.heap.pop();
            return;
        }
        self.heap.swap(slot, last);
        self.events[self.heap[slot].0].heap_slot = Some(slot);
        self.heap.pop();
        // The filler can be out of order in either direction.
        self.sift_up(slot);
        self.sift_down(slot);
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.events[self.heap[a].0].key() < self.events[self.heap[b].0].key()
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.events[self.heap[a].0].heap_slot = Some(a);
        self.events[self.heap[b].0].heap_slot = Some(b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.less(slot, parent) {
                break;
            }
            self.swap_slots(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let mut smallest = slot;
            for child in [2 * slot + 1, 2 * slot + 2] {
                if child < self.heap.len() && self.less(child, smallest) {
                    smallest = child;
                }
            }
            if smallest == slot {
                break;
            }
            self.swap_slots(slot, smallest);
            slot = smallest;
        }
    }

    #[cfg(test)]
    fn check_heap(&self) {
        for (slot, &idx) in self.heap.iter().enumerate() {
            assert_eq!(self.events[idx.0].heap_slot, Some(slot));
            if slot > 0 {
                assert!(!self.less(slot, (slot - 1) / 2));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(i: usize) -> EventKind {
        EventKind::Site(SiteIdx(i))
    }

    #[test]
    fn pops_in_y_then_x_order() {
        let mut queue = EventQueue::new();
        queue.push(5, 40, site(0));
        queue.push(9, 10, site(1));
        queue.push(1, 10, site(2));
        queue.push(0, 25, site(3));
        queue.check_heap();

        let mut popped = Vec::new();
        while let Some(idx) = queue.pop_min() {
            queue.check_heap();
            let ev = &queue[idx];
            assert!(!ev.is_queued());
            popped.push((ev.y, ev.x));
        }
        assert_eq!(popped, vec![(10, 1), (10, 9), (25, 0), (40, 5)]);
    }

    #[test]
    fn remove_detaches_an_arbitrary_event() {
        let mut queue = EventQueue::new();
        queue.push(0, 10, site(0));
        let middle = queue.push(0, 20, site(1));
        queue.push(0, 30, site(2));
        queue.push(0, 40, site(3));
        queue.check_heap();

        queue.remove(middle);
        queue.check_heap();
        assert_eq!(queue.len(), 3);
        assert!(!queue[middle].is_queued());

        // Removing again is a no-op.
        queue.remove(middle);
        assert_eq!(queue.len(), 3);

        let mut ys = Vec::new();
        while let Some(idx) = queue.pop_min() {
            ys.push(queue[idx].y);
        }
        assert_eq!(ys, vec![10, 30, 40]);
    }

    #[test]
    fn heap_slots_track_positions_through_churn() {
        let mut queue = EventQueue::new();
        let mut handles = Vec::new();
        for i in 0..20 {
            // A shuffled-ish insertion order.
            let y = (i * 7) % 20;
            handles.push(queue.push(i as i32, y as i32, site(i)));
            queue.check_heap();
        }
        for handle in handles.iter().step_by(3) {
            queue.remove(*handle);
            queue.check_heap();
        }
        let mut last = i32::MIN;
        while let Some(idx) = queue.pop_min() {
            queue.check_heap();
            assert!(queue[idx].y >= last);
            last = queue[idx].y;
        }
        assert!(queue.is_empty());
    }
}
