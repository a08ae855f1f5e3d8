//! Fixed-width little-endian field codec
//!
//! Every snapshot starts with a 4-byte magic and a u16 version, then fields
//! written one by one. No struct is ever dumped as raw memory.

use chrono::{Datelike, NaiveDate};
use glam::Vec2;

use crate::error::{PersistError, PersistResult};

pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new(magic: [u8; 4], version: u16) -> Self {
        let mut enc = Self { buf: Vec::with_capacity(256) };
        enc.buf.extend_from_slice(&magic);
        enc.u16(version);
        enc
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn bool(&mut self, v: bool) {
        self.u8(v as u8);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn vec2(&mut self, v: Vec2) {
        self.f32(v.x);
        self.f32(v.y);
    }

    pub fn opt_i64(&mut self, v: Option<i64>) {
        self.bool(v.is_some());
        self.i64(v.unwrap_or(0));
    }

    /// Dates are stored as days from the common era
    pub fn opt_date(&mut self, v: Option<NaiveDate>) {
        self.bool(v.is_some());
        self.i32(v.map(|d| d.num_days_from_ce()).unwrap_or(0));
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub struct Decoder<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    /// Check the header and position after it
    pub fn new(data: &'a [u8], magic: [u8; 4], version: u16) -> PersistResult<Self> {
        let mut dec = Self { data, offset: 0 };
        let found = dec.array::<4>()?;
        if found != magic {
            return Err(PersistError::BadMagic { expected: magic, found });
        }
        let found_version = dec.u16()?;
        if found_version != version {
            return Err(PersistError::UnsupportedVersion {
                found: found_version,
                current: version,
            });
        }
        Ok(dec)
    }

    fn array<const N: usize>(&mut self) -> PersistResult<[u8; N]> {
        let end = self.offset + N;
        let Some(slice) = self.data.get(self.offset..end) else {
            return Err(PersistError::Truncated {
                offset: self.offset,
                needed: end - self.data.len(),
            });
        };
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.offset = end;
        Ok(out)
    }

    pub fn u8(&mut self) -> PersistResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn bool(&mut self) -> PersistResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(PersistError::Inconsistent(format!(
                "flag byte {other} at offset {}",
                self.offset - 1
            ))),
        }
    }

    pub fn u16(&mut self) -> PersistResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> PersistResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> PersistResult<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn i64(&mut self) -> PersistResult<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> PersistResult<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub fn vec2(&mut self) -> PersistResult<Vec2> {
        Ok(Vec2::new(self.f32()?, self.f32()?))
    }

    pub fn opt_i64(&mut self) -> PersistResult<Option<i64>> {
        let present = self.bool()?;
        let v = self.i64()?;
        Ok(present.then_some(v))
    }

    pub fn opt_date(&mut self) -> PersistResult<Option<NaiveDate>> {
        let present = self.bool()?;
        let days = self.i32()?;
        if !present {
            return Ok(None);
        }
        NaiveDate::from_num_days_from_ce_opt(days)
            .map(Some)
            .ok_or_else(|| PersistError::Inconsistent(format!("day number {days} out of range")))
    }

    /// Fail if anything is left over
    pub fn finish(self) -> PersistResult<()> {
        if self.offset != self.data.len() {
            return Err(PersistError::Inconsistent(format!(
                "{} trailing bytes",
                self.data.len() - self.offset
            )));
        }
        Ok(())
    }
}
