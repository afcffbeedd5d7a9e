//! Message encoding for the spilink wire format.
//!
//! Frame format:
//! - SENTINEL (1 byte): `'m'`
//! - SIZE (1 byte): SIZE + METHOD + PAYLOAD length, sentinel excluded
//! - METHOD (1 byte): method identifier
//! - PAYLOAD (SIZE - 2 bytes): opaque to the transport

use heapless::Vec;

/// Start-of-message marker
pub const SENTINEL: u8 = b'm';

/// First method id reserved for transport-internal messages
pub const METHOD_INTERNAL_BASE: u8 = 240;

/// Liveness / backpressure probe
///
/// On receipt the device latches a reply byte saying whether the receive
/// channel still has room, which the host reads on the following transfer.
pub const METHOD_INTERNAL_PING: u8 = METHOD_INTERNAL_BASE + 1;

/// Default headroom for the ping reply: a ping reports "healthy" when at
/// least `capacity - PING_BYTES_TO_HAVE_FREE` slots are free
pub const PING_BYTES_TO_HAVE_FREE: usize = 80;

/// Largest SIZE byte value
pub const MAX_SIZE: u8 = u8::MAX;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = MAX_SIZE as usize - 2;

/// Maximum complete frame size (SENTINEL + SIZE)
pub const MAX_FRAME_SIZE: usize = 1 + MAX_SIZE as usize;

/// Errors that can occur during frame decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// SIZE byte too small to cover the method byte
    InvalidSize,
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// SIZE would land on an ASCII digit and be misread after normalization
    AmbiguousSize,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Read an ASCII digit in the SIZE position as its numeric value.
///
/// Only the SIZE byte is normalized. Sizes 48..=57 are therefore not
/// representable on the wire.
pub const fn normalize_size_byte(byte: u8) -> u8 {
    if byte.is_ascii_digit() {
        byte - b'0'
    } else {
        byte
    }
}

/// A framed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Method identifier
    pub method: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Message {
    /// Create a message with the given method and payload
    pub fn new(method: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            method,
            payload: payload_vec,
        })
    }

    /// Create a message with no payload
    pub fn empty(method: u8) -> Self {
        Self {
            method,
            payload: Vec::new(),
        }
    }

    /// The transport's liveness probe
    pub fn ping() -> Self {
        Self::empty(METHOD_INTERNAL_PING)
    }

    /// Check whether this is a transport-internal method
    pub fn is_internal(&self) -> bool {
        self.method >= METHOD_INTERNAL_BASE
    }

    /// Value of the SIZE byte for this message
    pub fn size_byte(&self) -> u8 {
        (self.payload.len() + 2) as u8
    }

    /// Number of bytes on the wire, sentinel included
    pub fn frame_len(&self) -> usize {
        1 + self.size_byte() as usize
    }

    /// Encode this message into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let size = self.size_byte();
        if normalize_size_byte(size) != size {
            return Err(FrameError::AmbiguousSize);
        }

        let frame_len = self.frame_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = SENTINEL;
        buffer[1] = size;
        buffer[2] = self.method;
        buffer[3..frame_len].copy_from_slice(&self.payload);

        Ok(frame_len)
    }

    /// Encode this message into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}
