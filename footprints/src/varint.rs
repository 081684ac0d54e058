//! Cursor over packed varints, the encoding of feature geometry command streams.
//! <https://protobuf.dev/programming-guides/encoding/#varints>

/// Buffer ended (or a 64-bit value overflowed) before the terminating byte of a varint.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("malformed varint at byte {position}")]
pub struct MalformedVarint {
    pub position: usize,
}

/// Longest varint encoding of a 64-bit integer.
const MAX_VARINT_LEN: usize = 10;

/// Reads until the end of the given slice and never past it.
#[derive(Debug, Clone)]
pub struct VarintReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> VarintReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Base-128, little-endian unsigned integer.
    pub fn read_varint(&mut self) -> Result<u64, MalformedVarint> {
        let start = self.pos;
        let mut value = 0u64;

        for i in 0..MAX_VARINT_LEN {
            if self.pos >= self.buf.len() {
                break;
            }

            let byte = self.buf[self.pos];
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << (7 * i);

            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(MalformedVarint { position: start })
    }

    /// Zig-zag encoded signed integer.
    pub fn read_svarint(&mut self) -> Result<i64, MalformedVarint> {
        let u = self.read_varint()?;
        Ok(((u >> 1) as i64) ^ -((u & 1) as i64))
    }
}
