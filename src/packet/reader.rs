use super::{PacketError, HEADER_LEN};

/// Cursor over a received byte slice. Every read is bounds-checked and
/// fails with `Truncated` instead of panicking, so a short or hostile
/// payload can never take the session down.
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PacketError> {
        if self.remaining() < n {
            return Err(PacketError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PacketError> {
        self.take(n)
    }

    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, PacketError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, PacketError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, PacketError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, PacketError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, PacketError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, PacketError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_i64(&mut self) -> Result<i64, PacketError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, PacketError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_uleb128(&mut self) -> Result<u64, PacketError> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(PacketError::Truncated);
            }
        }
    }

    /// Bancho string: 0x00 for empty, else 0x0b + ULEB128 length + UTF-8.
    pub fn read_string(&mut self) -> Result<String, PacketError> {
        match self.read_u8()? {
            0x00 => Ok(String::new()),
            0x0b => {
                let len = self.read_uleb128()? as usize;
                let bytes = self.take(len)?;
                String::from_utf8(bytes.to_vec()).map_err(|_| PacketError::InvalidUtf8)
            }
            tag => Err(PacketError::BadStringTag(tag)),
        }
    }
}

/// Pull one framed packet off the cursor: id, compression flag, length,
/// payload. The flag is read and discarded; no client we speak to
/// compresses.
pub fn read_frame(reader: &mut PacketReader<'_>) -> Result<(u16, Vec<u8>), PacketError> {
    let id = reader.read_u16()?;
    let _compressed = reader.read_u8()?;
    let len = reader.read_u32()? as usize;
    let payload = reader.read_bytes(len)?.to_vec();
    Ok((id, payload))
}

/// True when at least one more frame header could follow.
pub fn has_frame(reader: &PacketReader<'_>) -> bool {
    reader.remaining() >= HEADER_LEN
}
