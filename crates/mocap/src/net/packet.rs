use byteorder::{BigEndian, ByteOrder};

pub const PACKET_HEAD: u16 = 0x2B3C;
pub const PACKET_TAIL: u16 = 0x4D5F;

/// Head, code, payload length and tail: everything in a frame except the payload.
pub const FRAME_OVERHEAD: usize = 8;
pub const PAYLOAD_OFFSET: usize = 6;
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Message kind carried in bytes 2..4 of every frame.
///
/// Equality and hashing go by the wire value, so `Unknown(3)` is the same
/// code as `FaceData`. Decoding always yields the named variant.
#[derive(Debug, Clone, Copy)]
pub enum PacketCode {
    None,
    HeartBeatReq,
    HeartBeatRsp,
    FaceData,
    PoseData,
    QuitNotify,
    Disconnect,
    Unknown(u16),
}

impl From<u16> for PacketCode {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::None,
            1 => Self::HeartBeatReq,
            2 => Self::HeartBeatRsp,
            3 => Self::FaceData,
            4 => Self::PoseData,
            5 => Self::QuitNotify,
            6 => Self::Disconnect,
            other => Self::Unknown(other),
        }
    }
}

impl From<PacketCode> for u16 {
    fn from(code: PacketCode) -> Self {
        match code {
            PacketCode::None => 0,
            PacketCode::HeartBeatReq => 1,
            PacketCode::HeartBeatRsp => 2,
            PacketCode::FaceData => 3,
            PacketCode::PoseData => 4,
            PacketCode::QuitNotify => 5,
            PacketCode::Disconnect => 6,
            PacketCode::Unknown(raw) => raw,
        }
    }
}

impl PacketCode {
    pub fn raw(self) -> u16 {
        u16::from(self)
    }

    /// The named variant for this wire value, if there is one.
    pub fn normalized(self) -> Self {
        Self::from(self.raw())
    }
}

impl PartialEq for PacketCode {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl Eq for PacketCode {}

impl std::hash::Hash for PacketCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw().hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub code: PacketCode,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("frame of {0} bytes is shorter than the 8 byte minimum")]
    TooShort(usize),
    #[error("bad head constant {0:#06x}")]
    BadHead(u16),
    #[error("declared payload of {declared} bytes does not match a {actual} byte frame")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("bad tail constant {0:#06x}")]
    BadTail(u16),
    #[error("buffer of {capacity} bytes cannot hold a {required} byte frame")]
    BufferTooSmall { required: usize, capacity: usize },
    #[error("payload of {0} bytes does not fit the 16-bit length field")]
    PayloadTooLarge(usize),
}

/// Decodes exactly one frame. The datagram boundary is the frame boundary,
/// so any trailing or missing byte is a length mismatch.
pub fn decode(bytes: &[u8]) -> Result<Frame<'_>, PacketError> {
    if bytes.len() < FRAME_OVERHEAD {
        return Err(PacketError::TooShort(bytes.len()));
    }

    let head = BigEndian::read_u16(&bytes[0..2]);
    if head != PACKET_HEAD {
        return Err(PacketError::BadHead(head));
    }

    let payload_len = BigEndian::read_u16(&bytes[4..6]) as usize;
    if bytes.len() != FRAME_OVERHEAD + payload_len {
        return Err(PacketError::LengthMismatch {
            declared: payload_len,
            actual: bytes.len(),
        });
    }

    let tail = BigEndian::read_u16(&bytes[bytes.len() - 2..]);
    if tail != PACKET_TAIL {
        return Err(PacketError::BadTail(tail));
    }

    Ok(Frame {
        code: PacketCode::from(BigEndian::read_u16(&bytes[2..4])),
        payload: &bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload_len],
    })
}

#[inline]
pub fn try_read(bytes: &[u8]) -> Option<Frame<'_>> {
    decode(bytes).ok()
}

/// Writes a frame whose payload is produced in place by `write_payload`.
///
/// The callback receives the payload region of `buffer` (capped at the
/// 16-bit length limit) and returns how many bytes it wrote there.
pub fn write_with<F>(buffer: &mut [u8], code: PacketCode, write_payload: F) -> Result<usize, PacketError>
where
    F: FnOnce(&mut [u8]) -> usize,
{
    if buffer.len() < FRAME_OVERHEAD {
        return Err(PacketError::BufferTooSmall {
            required: FRAME_OVERHEAD,
            capacity: buffer.len(),
        });
    }

    let capacity = (buffer.len() - FRAME_OVERHEAD).min(MAX_PAYLOAD_SIZE);
    let payload_len = write_payload(&mut buffer[PAYLOAD_OFFSET..PAYLOAD_OFFSET + capacity]);
    if payload_len > capacity {
        return Err(PacketError::BufferTooSmall {
            required: FRAME_OVERHEAD + payload_len,
            capacity: buffer.len(),
        });
    }

    BigEndian::write_u16(&mut buffer[0..2], PACKET_HEAD);
    BigEndian::write_u16(&mut buffer[2..4], code.into());
    BigEndian::write_u16(&mut buffer[4..6], payload_len as u16);
    let tail = PAYLOAD_OFFSET + payload_len;
    BigEndian::write_u16(&mut buffer[tail..tail + 2], PACKET_TAIL);

    Ok(FRAME_OVERHEAD + payload_len)
}

pub fn write(buffer: &mut [u8], code: PacketCode, payload: &[u8]) -> Result<usize, PacketError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(PacketError::PayloadTooLarge(payload.len()));
    }

    let required = FRAME_OVERHEAD + payload.len();
    if buffer.len() < required {
        return Err(PacketError::BufferTooSmall {
            required,
            capacity: buffer.len(),
        });
    }

    write_with(buffer, code, |dst| {
        dst[..payload.len()].copy_from_slice(payload);
        payload.len()
    })
}

#[inline]
pub fn write_empty(buffer: &mut [u8], code: PacketCode) -> Result<usize, PacketError> {
    write_with(buffer, code, |_| 0)
}

pub fn encode(code: PacketCode, payload: &[u8]) -> Result<Vec<u8>, PacketError> {
    let mut buffer = vec![0u8; FRAME_OVERHEAD + payload.len()];
    let len = write(&mut buffer, code, payload)?;
    buffer.truncate(len);
    Ok(buffer)
}
