//! Lock-free SPSC byte ring
//!
//! Cursors run over `0..2N` so a full ring and an empty ring are told
//! apart without giving up a slot. Only the producer stores `tail`; only
//! the consumer stores `head`. Each cursor is a single atomic word, so a
//! push that lands while the consumer is mid-peek can only make more bytes
//! visible, never move the ones it is looking at.

use portable_atomic::{AtomicU8, AtomicUsize, Ordering};
use spilink_protocol::ByteQueue;

/// Push rejected because the ring is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelFull;

/// Fixed-capacity byte ring shared between the receive interrupt and the
/// main loop
///
/// `push` must only be called from the producer context and `pop`/`peek`/
/// `clear` only from the consumer context. `len` and `free` are safe from
/// either side and may be stale by the time they return.
pub struct ByteChannel<const N: usize> {
    slots: [AtomicU8; N],
    /// Next slot to read, in `0..2N`
    head: AtomicUsize,
    /// Next slot to write, in `0..2N`
    tail: AtomicUsize,
}

impl<const N: usize> Default for ByteChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteChannel<N> {
    /// Create an empty channel
    pub const fn new() -> Self {
        assert!(N > 0, "channel capacity must be non-zero");
        Self {
            slots: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    const fn advance(cursor: usize) -> usize {
        if cursor + 1 == 2 * N {
            0
        } else {
            cursor + 1
        }
    }

    const fn distance(head: usize, tail: usize) -> usize {
        if tail >= head {
            tail - head
        } else {
            tail + 2 * N - head
        }
    }

    /// Number of bytes buffered
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::distance(head, tail)
    }

    /// Check if the channel is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the channel is full
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Number of free slots
    pub fn free(&self) -> usize {
        N - self.len()
    }

    /// Append a byte (producer side)
    pub fn push(&self, byte: u8) -> Result<(), ChannelFull> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if Self::distance(head, tail) == N {
            return Err(ChannelFull);
        }

        self.slots[tail % N].store(byte, Ordering::Relaxed);
        self.tail.store(Self::advance(tail), Ordering::Release);
        Ok(())
    }

    /// Byte at `offset` from the front (consumer side)
    pub fn peek(&self, offset: usize) -> Option<u8> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if offset >= Self::distance(head, tail) {
            return None;
        }
        Some(self.slots[(head + offset) % N].load(Ordering::Relaxed))
    }

    /// Remove the front byte (consumer side)
    pub fn pop(&self) -> Option<u8> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let byte = self.slots[head % N].load(Ordering::Relaxed);
        self.head.store(Self::advance(head), Ordering::Release);
        Some(byte)
    }

    /// Drop everything currently buffered (consumer side)
    pub fn clear(&self) {
        let tail = self.tail.load(Ordering::Acquire);
        self.head.store(tail, Ordering::Release);
    }

    /// Consumer view implementing [`ByteQueue`]
    pub fn reader(&self) -> ChannelReader<'_, N> {
        ChannelReader { channel: self }
    }
}

/// Main-loop view of a [`ByteChannel`]
///
/// Exposes only the consumer operations.
pub struct ChannelReader<'a, const N: usize> {
    channel: &'a ByteChannel<N>,
}

impl<const N: usize> ChannelReader<'_, N> {
    /// Number of free slots
    pub fn free(&self) -> usize {
        self.channel.free()
    }

    /// Capacity in bytes
    pub fn capacity(&self) -> usize {
        N
    }

    /// Drop everything currently buffered
    pub fn clear(&mut self) {
        self.channel.clear();
    }
}

impl<const N: usize> ByteQueue for ChannelReader<'_, N> {
    fn len(&self) -> usize {
        self.channel.len()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.channel.peek(offset)
    }

    fn pop(&mut self) -> Option<u8> {
        self.channel.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_pop_fifo() {
        let channel = ByteChannel::<4>::new();
        assert!(channel.is_empty());
        channel.push(1).unwrap();
        channel.push(2).unwrap();
        channel.push(3).unwrap();
        assert_eq!(channel.len(), 3);
        assert_eq!(channel.pop(), Some(1));
        assert_eq!(channel.pop(), Some(2));
        assert_eq!(channel.pop(), Some(3));
        assert_eq!(channel.pop(), None);
    }

    #[test]
    fn test_full_uses_every_slot() {
        let channel = ByteChannel::<3>::new();
        for b in 0..3 {
            channel.push(b).unwrap();
        }
        assert!(channel.is_full());
        assert_eq!(channel.free(), 0);
        assert_eq!(channel.push(9), Err(ChannelFull));
        // rejected byte did not clobber anything
        assert_eq!(channel.pop(), Some(0));
        channel.push(9).unwrap();
        assert_eq!(channel.peek(2), Some(9));
    }

    #[test]
    fn test_peek_offsets_across_wrap() {
        let channel = ByteChannel::<4>::new();
        // walk the cursors around the ring a few times
        for round in 0..10u8 {
            channel.push(round).unwrap();
            channel.push(round.wrapping_add(100)).unwrap();
            assert_eq!(channel.peek(0), Some(round));
            assert_eq!(channel.peek(1), Some(round.wrapping_add(100)));
            assert_eq!(channel.peek(2), None);
            channel.pop();
            channel.pop();
        }
        assert!(channel.is_empty());
    }

    #[test]
    fn test_clear() {
        let channel = ByteChannel::<8>::new();
        channel.push(1).unwrap();
        channel.push(2).unwrap();
        channel.reader().clear();
        assert!(channel.is_empty());
        assert_eq!(channel.free(), 8);
    }

    #[test]
    fn test_reader_is_byte_queue() {
        let channel = ByteChannel::<8>::new();
        channel.push(5).unwrap();
        let mut reader = channel.reader();
        assert_eq!(ByteQueue::len(&reader), 1);
        assert_eq!(ByteQueue::peek(&reader, 0), Some(5));
        assert_eq!(ByteQueue::pop(&mut reader), Some(5));
        assert!(ByteQueue::is_empty(&reader));
    }

    #[test]
    fn test_threaded_spsc_preserves_order() {
        const COUNT: usize = 20_000;
        let channel = ByteChannel::<16>::new();

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut sent = 0;
                while sent < COUNT {
                    if channel.push(sent as u8).is_ok() {
                        sent += 1;
                    } else {
                        std::thread::yield_now();
                    }
                }
            });

            let mut expected = 0;
            while expected < COUNT {
                match channel.pop() {
                    Some(byte) => {
                        assert_eq!(byte, expected as u8);
                        expected += 1;
                    }
                    None => std::thread::yield_now(),
                }
            }
        });

        assert!(channel.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(u8),
        Pop,
        Peek(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Push),
            Just(Op::Pop),
            (0usize..8).prop_map(Op::Peek),
        ]
    }

    proptest! {
        #[test]
        fn prop_interleaving_never_loses_or_duplicates(ops in proptest::collection::vec(op(), 0..200)) {
            let channel = ByteChannel::<5>::new();
            let mut model = std::collections::VecDeque::new();

            for op in ops {
                match op {
                    Op::Push(b) => {
                        let accepted = channel.push(b).is_ok();
                        prop_assert_eq!(accepted, model.len() < 5);
                        if accepted {
                            model.push_back(b);
                        }
                    }
                    Op::Pop => prop_assert_eq!(channel.pop(), model.pop_front()),
                    Op::Peek(offset) => prop_assert_eq!(channel.peek(offset), model.get(offset).copied()),
                }
                prop_assert_eq!(channel.len(), model.len());
                prop_assert!(channel.len() <= channel.capacity());
            }
        }
    }
}
