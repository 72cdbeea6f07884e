//! Save-state cursor
//!
//! Sequential little-endian encoding of primitives and sample arrays, grouped
//! into named, versioned sections.
//!
//! ```text
//! section := name_len: u8, name: [u8; name_len], version: u8, payload...
//! samples := len: u32, [i16; len]
//! marker  := name_len: u8, name: [u8; name_len]
//! ```

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::StateError;

/// Writer half of the save-state cursor
pub struct StateWriter<W: Write> {
    writer: W,
}

impl<W: Write> StateWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Open a section; everything written until the next section belongs to it
    pub fn section(&mut self, name: &str, version: u8) -> Result<(), StateError> {
        self.write_name(name)?;
        self.writer.write_u8(version)?;
        Ok(())
    }

    /// Write a fixed tag that the reader verifies
    pub fn marker(&mut self, name: &str) -> Result<(), StateError> {
        self.write_name(name)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), StateError> {
        self.writer.write_u8(u8::from(value))?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), StateError> {
        self.writer.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), StateError> {
        self.writer.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Write a length-prefixed sample array
    pub fn write_samples<I>(&mut self, samples: I) -> Result<(), StateError>
    where
        I: ExactSizeIterator<Item = i16>,
    {
        self.write_len(samples.len())?;
        for sample in samples {
            self.writer.write_i16::<LittleEndian>(sample)?;
        }
        Ok(())
    }

    /// Write a collection length (u32)
    pub fn write_len(&mut self, len: usize) -> Result<(), StateError> {
        let len = u32::try_from(len).map_err(|_| StateError::Incompatible {
            what: "array length",
            saved: len,
            expected: u32::MAX as usize,
        })?;
        self.write_u32(len)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_name(&mut self, name: &str) -> Result<(), StateError> {
        let len = u8::try_from(name.len()).map_err(|_| StateError::Incompatible {
            what: "section name length",
            saved: name.len(),
            expected: u8::MAX as usize,
        })?;
        self.writer.write_u8(len)?;
        self.writer.write_all(name.as_bytes())?;
        Ok(())
    }
}

/// Reader half of the save-state cursor
pub struct StateReader<R: Read> {
    reader: R,
}

impl<R: Read> StateReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Enter a section, checking its name. Returns the recorded version.
    pub fn section(&mut self, name: &'static str, max_version: u8) -> Result<u8, StateError> {
        let found = self.read_name()?;
        if found != name {
            return Err(StateError::SectionMismatch {
                expected: name,
                found,
            });
        }
        let version = self.reader.read_u8()?;
        if version == 0 || version > max_version {
            return Err(StateError::UnsupportedVersion {
                name,
                version,
                max: max_version,
            });
        }
        Ok(version)
    }

    pub fn marker(&mut self, name: &'static str) -> Result<(), StateError> {
        if self.read_name()? != name {
            return Err(StateError::MarkerMismatch(name));
        }
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool, StateError> {
        Ok(self.reader.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32, StateError> {
        Ok(self.reader.read_u32::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32, StateError> {
        Ok(self.reader.read_i32::<LittleEndian>()?)
    }

    pub fn read_len(&mut self) -> Result<usize, StateError> {
        Ok(self.read_u32()? as usize)
    }

    /// Read a length-prefixed sample array holding at most `max_len` samples
    pub fn read_samples(
        &mut self,
        what: &'static str,
        max_len: usize,
    ) -> Result<Vec<i16>, StateError> {
        let len = self.read_len()?;
        if len > max_len {
            return Err(StateError::Incompatible {
                what,
                saved: len,
                expected: max_len,
            });
        }
        let mut samples = vec![0i16; len];
        self.reader.read_i16_into::<LittleEndian>(&mut samples)?;
        Ok(samples)
    }

    fn read_name(&mut self) -> Result<String, StateError> {
        let len = self.reader.read_u8()? as usize;
        let mut bytes = vec![0u8; len];
        self.reader.read_exact(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut StateWriter<&mut Vec<u8>>)) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut writer = StateWriter::new(&mut buffer);
        f(&mut writer);
        buffer
    }

    #[test]
    fn test_section_header_layout() {
        let buffer = written(|w| w.section("abc", 2).unwrap());
        assert_eq!(buffer, vec![3, b'a', b'b', b'c', 2]);
    }

    #[test]
    fn test_primitives_read_back() {
        let buffer = written(|w| {
            w.section("test", 1).unwrap();
            w.write_bool(true).unwrap();
            w.write_u32(0xDEAD_BEEF).unwrap();
            w.write_i32(-5).unwrap();
            w.write_samples([1i16, -2, 3].into_iter()).unwrap();
            w.marker("end").unwrap();
        });

        let mut reader = StateReader::new(buffer.as_slice());
        assert_eq!(reader.section("test", 1).unwrap(), 1);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_i32().unwrap(), -5);
        assert_eq!(reader.read_samples("samples", 16).unwrap(), vec![1, -2, 3]);
        reader.marker("end").unwrap();
    }

    #[test]
    fn test_wrong_section_name() {
        let buffer = written(|w| w.section("other", 1).unwrap());
        let mut reader = StateReader::new(buffer.as_slice());
        assert!(matches!(
            reader.section("sceAudio", 1),
            Err(StateError::SectionMismatch { .. })
        ));
    }

    #[test]
    fn test_newer_version_rejected() {
        let buffer = written(|w| w.section("sceAudio", 3).unwrap());
        let mut reader = StateReader::new(buffer.as_slice());
        assert!(matches!(
            reader.section("sceAudio", 1),
            Err(StateError::UnsupportedVersion { version: 3, .. })
        ));
    }

    #[test]
    fn test_oversized_sample_array_rejected() {
        let buffer = written(|w| w.write_samples([0i16; 10].into_iter()).unwrap());
        let mut reader = StateReader::new(buffer.as_slice());
        assert!(matches!(
            reader.read_samples("queue", 4),
            Err(StateError::Incompatible { saved: 10, expected: 4, .. })
        ));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let buffer = written(|w| w.write_u32(7).unwrap());
        let mut reader = StateReader::new(&buffer[..2]);
        assert!(matches!(reader.read_u32(), Err(StateError::Io(_))));
    }
}
