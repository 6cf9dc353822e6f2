//! Two-slot ring buffer for read/write state.
//!
//! One slot is current (read this frame), the other is next (written this
//! frame). [`PingPong::swap`] toggles a single index; all access goes
//! through that index.

/// Double buffer with an explicit current index.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
    swaps: u64,
}

impl<T> PingPong<T> {
    /// Slot 0 starts as current.
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            current: 0,
            swaps: 0,
        }
    }

    /// Index of the slot read this frame.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Index of the slot written this frame.
    #[inline]
    pub fn next_index(&self) -> usize {
        self.current ^ 1
    }

    /// Number of swaps so far.
    #[inline]
    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// Slot read this frame.
    #[inline]
    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    /// Mutable access to the current slot, for seeding before the first frame.
    #[inline]
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.current]
    }

    /// Slot written this frame.
    #[inline]
    pub fn next(&self) -> &T {
        &self.slots[self.next_index()]
    }

    /// Read the current slot while writing the next one.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        if self.current == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }

    /// Swap roles: the slot just written becomes current.
    #[inline]
    pub fn swap(&mut self) {
        self.current ^= 1;
        self.swaps += 1;
    }

    /// Slot by absolute index (0 or 1).
    pub fn slot(&self, index: usize) -> &T {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_alternates() {
        let mut buf = PingPong::new("a", "b");
        assert_eq!((*buf.current(), *buf.next()), ("a", "b"));
        buf.swap();
        assert_eq!((*buf.current(), *buf.next()), ("b", "a"));
        buf.swap();
        assert_eq!((*buf.current(), *buf.next()), ("a", "b"));
        assert_eq!(buf.swaps(), 2);
    }

    #[test]
    fn test_split_matches_indices() {
        let mut buf = PingPong::new(0, 1);
        buf.swap();
        let (read, write) = buf.split();
        assert_eq!(*read, 1);
        *write = 10;
        assert_eq!(*buf.slot(0), 10);
        assert_eq!(buf.next_index(), 0);
    }

    #[test]
    fn test_written_slot_is_read_next() {
        let mut buf = PingPong::new(0u32, 0u32);
        for frame in 1..=5 {
            let written = buf.next_index();
            *buf.split().1 = frame;
            buf.swap();
            assert_eq!(buf.current_index(), written);
            assert_eq!(*buf.current(), frame);
        }
    }
}
