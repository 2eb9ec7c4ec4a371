use thiserror::Error;

/// Number of bytes in a frame header: flags (1) + length (4) + request id (4)
/// + request type (2).
pub const HEADER_LEN: usize = 11;

const FLAG_RESPONSE_EXPECTED: u8 = 1 << 0;
const FLAG_IS_RESPONSE: u8 = 1 << 1;
const FLAG_KNOWN_MASK: u8 = FLAG_RESPONSE_EXPECTED | FLAG_IS_RESPONSE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("undefined flag bits set: {0:#04x}")]
    UndefinedFlags(u8),
}

/// One length-delimited protocol message unit.
///
/// The length field is derived from the payload on encode, so the two can
/// never disagree on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub response_expected: bool,
    pub is_response: bool,
    pub request_id: u32,
    pub request_type: u16,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn request(request_id: u32, request_type: u16, response_expected: bool, payload: Vec<u8>) -> Self {
        Self {
            response_expected,
            is_response: false,
            request_id,
            request_type,
            payload,
        }
    }

    pub fn response(request_id: u32, request_type: u16, payload: Vec<u8>) -> Self {
        Self {
            response_expected: false,
            is_response: true,
            request_id,
            request_type,
            payload,
        }
    }

    /// Encode this frame as header + payload. Always succeeds.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());

        let mut flags = 0u8;
        if self.response_expected {
            flags |= FLAG_RESPONSE_EXPECTED;
        }
        if self.is_response {
            flags |= FLAG_IS_RESPONSE;
        }

        out.push(flags);
        out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.request_id.to_be_bytes());
        out.extend_from_slice(&self.request_type.to_be_bytes());
        out.extend_from_slice(&self.payload);

        out
    }

    /// Try to decode one frame from the start of `buffer`.
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a complete frame;
    /// the caller keeps buffering and retries on the next receive. An `Err`
    /// means the stream is corrupted and the connection must be closed — there
    /// is no resynchronization.
    pub fn decode(buffer: &[u8]) -> Result<Option<(Frame, usize)>, FrameError> {
        if buffer.len() < HEADER_LEN {
            return Ok(None);
        }

        let flags = buffer[0];
        if flags & !FLAG_KNOWN_MASK != 0 {
            return Err(FrameError::UndefinedFlags(flags));
        }

        let length = u32::from_be_bytes([buffer[1], buffer[2], buffer[3], buffer[4]]) as usize;
        if buffer.len() - HEADER_LEN < length {
            return Ok(None);
        }

        let request_id = u32::from_be_bytes([buffer[5], buffer[6], buffer[7], buffer[8]]);
        let request_type = u16::from_be_bytes([buffer[9], buffer[10]]);
        let payload = buffer[HEADER_LEN..HEADER_LEN + length].to_vec();

        let frame = Frame {
            response_expected: flags & FLAG_RESPONSE_EXPECTED != 0,
            is_response: flags & FLAG_IS_RESPONSE != 0,
            request_id,
            request_type,
            payload,
        };

        Ok(Some((frame, HEADER_LEN + length)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let frame = Frame {
            response_expected: true,
            is_response: false,
            request_id: 42,
            request_type: 100,
            payload: b"hello".to_vec(),
        };

        let bytes = frame.encode();
        let (decoded, consumed) = Frame::decode(&bytes).unwrap().unwrap();

        assert_eq!(decoded, frame);
        assert_eq!(consumed, HEADER_LEN + 5);
    }

    #[test]
    fn roundtrip_empty_payload() {
        let frame = Frame::response(7, 200, Vec::new());
        let bytes = frame.encode();
        let (decoded, consumed) = Frame::decode(&bytes).unwrap().unwrap();

        assert_eq!(decoded, frame);
        assert_eq!(consumed, HEADER_LEN);
    }

    #[test]
    fn incomplete_header_needs_more_data() {
        let frame = Frame::request(1, 10, false, b"payload".to_vec());
        let bytes = frame.encode();

        for cut in 0..HEADER_LEN {
            assert_eq!(Frame::decode(&bytes[..cut]).unwrap(), None);
        }
    }

    #[test]
    fn incomplete_payload_needs_more_data() {
        let frame = Frame::request(1, 10, false, b"payload".to_vec());
        let bytes = frame.encode();

        assert_eq!(Frame::decode(&bytes[..bytes.len() - 1]).unwrap(), None);
    }

    #[test]
    fn trailing_bytes_are_left_in_the_buffer() {
        let frame = Frame::request(3, 20, true, b"abc".to_vec());
        let mut bytes = frame.encode();
        bytes.extend_from_slice(b"extra");

        let (decoded, consumed) = Frame::decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(&bytes[consumed..], b"extra");
    }

    #[test]
    fn undefined_flag_bits_are_fatal() {
        let mut bytes = Frame::request(1, 10, false, Vec::new()).encode();
        bytes[0] |= 0x80;

        assert_eq!(Frame::decode(&bytes), Err(FrameError::UndefinedFlags(0x80)));
    }
}
