//! Little-endian read/write helpers shared by the record parsers

use std::io::{Read, Result, Write};

use glam::Vec3;

/// Extension trait for reading little-endian values from a reader
pub trait ReadExt: Read {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_i16_le(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    fn read_i32_le(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_f32_le(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn read_vec3(&mut self) -> Result<Vec3> {
        let x = self.read_f32_le()?;
        let y = self.read_f32_le()?;
        let z = self.read_f32_le()?;
        Ok(Vec3::new(x, y, z))
    }

    /// Read a NUL-padded string stored in a fixed `N`-byte field
    fn read_fixed_string<const N: usize>(&mut self) -> Result<String> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        let end = memchr::memchr(0, &buf).unwrap_or(N);
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }
}

/// Extension trait for writing little-endian values to a writer
pub trait WriteExt: Write {
    fn write_u8(&mut self, n: u8) -> Result<()> {
        self.write_all(&[n])
    }

    fn write_u16_le(&mut self, n: u16) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    fn write_i16_le(&mut self, n: i16) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    fn write_i32_le(&mut self, n: i32) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    fn write_f32_le(&mut self, n: f32) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32_le(v.x)?;
        self.write_f32_le(v.y)?;
        self.write_f32_le(v.z)
    }

    /// Write `s` into a fixed `N`-byte field, truncating and NUL-padding
    fn write_fixed_string<const N: usize>(&mut self, s: &str) -> Result<()> {
        let mut buf = [0u8; N];
        let bytes = s.as_bytes();
        // keep a terminating NUL
        let len = bytes.len().min(N.saturating_sub(1));
        buf[..len].copy_from_slice(&bytes[..len]);
        self.write_all(&buf)
    }
}

impl<R: Read + ?Sized> ReadExt for R {}
impl<W: Write + ?Sized> WriteExt for W {}
