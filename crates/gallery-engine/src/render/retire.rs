use std::collections::VecDeque;

/// Holds replaced GPU resources until the frames that may still use them are done.
///
/// A resource retired during frame `n` is released once frame
/// `n + frames_in_flight` begins. Frames are submitted on a single queue, so by
/// then every command buffer referencing it has been submitted ahead of the
/// work that replaced it.
#[derive(Debug)]
pub struct RetireQueue<T> {
    frames_in_flight: u64,
    pending: VecDeque<(u64, T)>,
}

impl<T> RetireQueue<T> {
    pub fn new(frames_in_flight: u32) -> Self {
        Self {
            frames_in_flight: u64::from(frames_in_flight.max(1)),
            pending: VecDeque::new(),
        }
    }

    /// Parks `item`, replaced during `frame`.
    pub fn retire(&mut self, frame: u64, item: T) {
        self.pending.push_back((frame, item));
    }

    /// Releases everything whose in-flight window has passed at `frame`.
    ///
    /// Returns the number of released items.
    pub fn collect(&mut self, frame: u64) -> usize {
        let mut released = 0;
        while let Some((retired_at, _)) = self.pending.front() {
            if frame < retired_at.saturating_add(self.frames_in_flight) {
                break;
            }
            self.pending.pop_front();
            released += 1;
        }
        released
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn released_after_in_flight_window() {
        let mut q = RetireQueue::new(2);
        q.retire(10, "old");

        assert_eq!(q.collect(10), 0);
        assert_eq!(q.collect(11), 0);
        assert_eq!(q.collect(12), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn release_is_in_order() {
        let mut q = RetireQueue::new(1);
        q.retire(1, 'a');
        q.retire(3, 'b');

        assert_eq!(q.collect(2), 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.collect(4), 1);
    }

    #[test]
    fn items_are_dropped_on_release() {
        let item = Rc::new(());
        let mut q = RetireQueue::new(1);
        q.retire(0, Rc::clone(&item));
        assert_eq!(Rc::strong_count(&item), 2);

        q.collect(1);
        assert_eq!(Rc::strong_count(&item), 1);
    }
}
