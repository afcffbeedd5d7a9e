//! Peek-based message detection over a buffered byte queue
//!
//! These functions look only at what is currently buffered and carry no
//! state of their own. They work on any [`ByteQueue`], including one that
//! was filled with unfiltered bytes.

use heapless::{Deque, Vec};

use crate::frame::{normalize_size_byte, FrameError, Message, SENTINEL};

/// Minimum number of buffered bytes before a check is attempted
/// (SENTINEL, SIZE and METHOD)
const HEADER_LEN: usize = 3;

/// Consumer side of a FIFO byte container
pub trait ByteQueue {
    /// Number of bytes buffered
    fn len(&self) -> usize;

    /// Check if nothing is buffered
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte at `offset` from the front, without removing it
    fn peek(&self, offset: usize) -> Option<u8>;

    /// Remove and return the front byte
    fn pop(&mut self) -> Option<u8>;
}

impl<const N: usize> ByteQueue for Deque<u8, N> {
    fn len(&self) -> usize {
        Deque::len(self)
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.iter().nth(offset).copied()
    }

    fn pop(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

/// Check whether a whole message sits at the front of `queue`.
///
/// Leading bytes that are not a sentinel are popped and dropped. Nothing
/// else is consumed.
///
/// A SIZE of 2 or less is treated as complete as soon as the three header
/// bytes are present; [`read_message`] then rejects it.
pub fn has_complete_message<Q: ByteQueue + ?Sized>(queue: &mut Q) -> bool {
    if queue.len() < HEADER_LEN {
        return false;
    }

    // eat the garbage in front of the sentinel
    while let Some(byte) = queue.peek(0) {
        if byte == SENTINEL {
            break;
        }
        queue.pop();
    }

    if queue.len() < HEADER_LEN {
        return false;
    }

    let size = match queue.peek(1) {
        Some(byte) => normalize_size_byte(byte),
        None => return false,
    };

    // SIZE excludes the sentinel
    size <= 2 || queue.len() >= 1 + size as usize
}

/// Pop the next complete message off the front of `queue`.
///
/// Returns `Ok(None)` when no complete message is buffered. A message whose
/// SIZE cannot cover its method byte is dropped (sentinel and SIZE only)
/// and reported as [`FrameError::InvalidSize`].
pub fn read_message<Q: ByteQueue + ?Sized>(queue: &mut Q) -> Result<Option<Message>, FrameError> {
    if !has_complete_message(queue) {
        return Ok(None);
    }

    let size = queue
        .peek(1)
        .map(normalize_size_byte)
        .ok_or(FrameError::InvalidSize)?;

    // sentinel and SIZE
    queue.pop();
    queue.pop();

    if size < 2 {
        return Err(FrameError::InvalidSize);
    }

    let method = queue.pop().ok_or(FrameError::InvalidSize)?;
    let mut payload = Vec::new();
    for _ in 0..size - 2 {
        let byte = queue.pop().ok_or(FrameError::InvalidSize)?;
        payload.push(byte).map_err(|_| FrameError::PayloadTooLarge)?;
    }

    Ok(Some(Message { method, payload }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framer::Framer;
    use proptest::prelude::*;

    const METH: u8 = 0x10;

    type Queue = Deque<u8, 512>;

    fn queue_of(bytes: &[u8]) -> Queue {
        let mut queue = Queue::new();
        for &b in bytes {
            queue.push_back(b).unwrap();
        }
        queue
    }

    #[test]
    fn test_needs_three_bytes() {
        let mut queue = queue_of(&[SENTINEL, 2]);
        assert!(!has_complete_message(&mut queue));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_short_garbage_is_left_alone() {
        let mut queue = queue_of(&[1, 2]);
        assert!(!has_complete_message(&mut queue));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_garbage_is_popped() {
        let mut queue = queue_of(&[0xFF, 0x00, b'x', SENTINEL, 2, METH]);
        assert!(has_complete_message(&mut queue));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek(0), Some(SENTINEL));
    }

    #[test]
    fn test_full_message_needed() {
        let msg = [SENTINEL, 5, METH, 1, 2, 3];
        for n in 0..msg.len() {
            let mut queue = queue_of(&msg[..n]);
            assert!(!has_complete_message(&mut queue), "prefix of {} bytes", n);
        }
        let mut queue = queue_of(&msg);
        assert!(has_complete_message(&mut queue));
        assert_eq!(queue.len(), msg.len(), "check must not consume");
    }

    #[test]
    fn test_ascii_size_in_queue() {
        let mut queue = queue_of(&[SENTINEL, b'5', METH, 1, 2]);
        assert!(!has_complete_message(&mut queue));
        queue.push_back(3).unwrap();
        assert!(has_complete_message(&mut queue));
    }

    #[test]
    fn test_read_message_pops_exactly_one() {
        let mut queue = queue_of(&[SENTINEL, 4, METH, 7, 8, SENTINEL, 2, 0x22]);
        let msg = read_message(&mut queue).unwrap().unwrap();
        assert_eq!(msg.method, METH);
        assert_eq!(msg.payload.as_slice(), &[7, 8]);
        assert_eq!(queue.len(), 3);

        let msg = read_message(&mut queue).unwrap().unwrap();
        assert_eq!(msg.method, 0x22);
        assert!(msg.payload.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_read_message_incomplete() {
        let mut queue = queue_of(&[SENTINEL, 4, METH]);
        assert_eq!(read_message(&mut queue), Ok(None));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_read_message_rejects_undersized() {
        let mut queue = queue_of(&[SENTINEL, 1, SENTINEL, 2, METH]);
        assert_eq!(read_message(&mut queue), Err(FrameError::InvalidSize));
        // only the bad header was dropped
        assert_eq!(queue.len(), 3);
        assert_eq!(read_message(&mut queue).unwrap().unwrap().method, METH);
    }

    fn non_sentinel() -> impl Strategy<Value = u8> {
        any::<u8>().prop_filter("sentinel", |b| *b != SENTINEL)
    }

    fn message() -> impl Strategy<Value = Message> {
        (any::<u8>(), proptest::collection::vec(any::<u8>(), 0..40))
            .prop_map(|(method, payload)| Message::new(method, &payload).unwrap())
    }

    proptest! {
        #[test]
        fn prop_garbage_never_completes(garbage in proptest::collection::vec(non_sentinel(), 0..64)) {
            let mut queue = queue_of(&garbage);
            prop_assert!(!has_complete_message(&mut queue));
            if garbage.len() >= HEADER_LEN {
                prop_assert!(queue.is_empty());
            } else {
                prop_assert_eq!(queue.len(), garbage.len());
            }
        }

        #[test]
        fn prop_digit_size_equivalent(digit in 2u8..=9, method in any::<u8>(), fill in any::<u8>()) {
            let body: std::vec::Vec<u8> = std::iter::repeat(fill).take(digit as usize - 2).collect();

            let mut raw = std::vec![SENTINEL, digit, method];
            raw.extend_from_slice(&body);
            let mut ascii = raw.clone();
            ascii[1] = b'0' + digit;

            for n in 0..=raw.len() {
                let mut a = queue_of(&raw[..n]);
                let mut b = queue_of(&ascii[..n]);
                prop_assert_eq!(has_complete_message(&mut a), has_complete_message(&mut b));
            }

            let mut fa = Framer::new();
            let mut fb = Framer::new();
            for (x, y) in raw.iter().zip(ascii.iter()) {
                prop_assert_eq!(fa.feed(*x), fb.feed(*y));
            }
        }

        #[test]
        fn prop_framer_and_scanner_agree(
            garbage in proptest::collection::vec(non_sentinel(), 0..16),
            messages in proptest::collection::vec(message(), 1..4),
        ) {
            let mut stream = garbage.clone();
            for msg in &messages {
                stream.extend_from_slice(&msg.encode_to_vec().unwrap());
            }

            // framer keeps only framed bytes, like the receive interrupt does
            let mut framer = Framer::new();
            let mut kept = Queue::new();
            let mut completed = 0;
            for &b in &stream {
                let feed = framer.feed(b);
                if let Some(byte) = feed.byte {
                    kept.push_back(byte).unwrap();
                }
                if feed.complete {
                    completed += 1;
                }
            }
            prop_assert_eq!(completed, messages.len());

            // scanning the raw stream finds the same messages
            let mut raw = queue_of(&stream);
            for msg in &messages {
                let from_kept = read_message(&mut kept).unwrap();
                let from_raw = read_message(&mut raw).unwrap();
                prop_assert_eq!(from_kept.as_ref(), Some(msg));
                prop_assert_eq!(from_raw.as_ref(), Some(msg));
            }
            prop_assert!(kept.is_empty());
            prop_assert!(raw.is_empty());
        }
    }
}
