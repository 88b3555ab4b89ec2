//! Paletted, bit-packed storage for per-cell values.
//!
//! A [`PalettedGrid`] stores a fixed number of cells. Distinct values live
//! in a palette and each cell stores a palette index packed into `u64`
//! words. A grid holding a single value uses zero bits per cell and no
//! words at all. Entries never span word boundaries, so each word holds
//! `64 / bits` entries.
//!
//! # Wire format
//!
//! All integers are little-endian:
//!
//! ```text
//! [len: u32] [palette_len: u16] [palette: u32 x palette_len]
//! [bits: u8] [word_count: u32] [words: u64 x word_count]
//! ```
//!
//! [`PalettedGrid::serialized_size`] reports the exact payload length so
//! callers can allocate a buffer of precisely that size.

use chunkforge_types::{BiomeId, BlockId, CellContent, MarkerId};

use crate::error::WorldError;

/// Smallest non-zero entry width. Small palettes share one width so that
/// growing from two to sixteen values never repacks.
const MIN_BITS: u32 = 4;

/// Largest palette a grid can hold.
pub const MAX_PALETTE: usize = 65_535;

/// Tag bit distinguishing markers from blocks in the raw content encoding.
const MARKER_TAG: u32 = 0x8000_0000;

/// A value that can be stored in a [`PalettedGrid`].
pub trait PaletteValue: Copy + Eq {
    /// Encode the value as a raw `u32`.
    fn to_raw(self) -> u32;

    /// Decode a raw `u32`. Returns `None` for values this type cannot hold.
    fn from_raw(raw: u32) -> Option<Self>;
}

impl PaletteValue for BiomeId {
    fn to_raw(self) -> u32 {
        u32::from(self.0)
    }

    fn from_raw(raw: u32) -> Option<Self> {
        u16::try_from(raw).ok().map(Self)
    }
}

impl PaletteValue for BlockId {
    fn to_raw(self) -> u32 {
        u32::from(self.0)
    }

    fn from_raw(raw: u32) -> Option<Self> {
        u16::try_from(raw).ok().map(Self)
    }
}

impl PaletteValue for CellContent {
    fn to_raw(self) -> u32 {
        match self {
            Self::Block(block) => u32::from(block.0),
            Self::Marker(marker) => MARKER_TAG | u32::from(marker.0),
        }
    }

    fn from_raw(raw: u32) -> Option<Self> {
        let id = u16::try_from(raw & !MARKER_TAG).ok()?;
        if raw & MARKER_TAG == 0 {
            Some(Self::Block(BlockId(id)))
        } else {
            Some(Self::Marker(MarkerId(id)))
        }
    }
}

/// Fixed-length grid of values stored through a palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedGrid<T> {
    /// Number of cells.
    len: usize,
    /// Distinct values, in first-seen order.
    palette: Vec<T>,
    /// Bits per packed entry. Zero when the palette has a single value.
    bits: u32,
    /// Packed palette indices.
    words: Vec<u64>,
}

impl<T: PaletteValue> PalettedGrid<T> {
    /// Create a grid of `len` cells all holding `value`.
    pub fn filled(len: usize, value: T) -> Self {
        Self {
            len,
            palette: vec![value],
            bits: 0,
            words: Vec::new(),
        }
    }

    /// Number of cells in the grid.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the grid has zero cells.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct values currently in the palette.
    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Read the value at `index`. Returns `None` past the end.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        if self.bits == 0 {
            return self.palette.first().copied();
        }
        let (word, shift) = self.slot(index)?;
        let packed = self.words.get(word)?;
        let palette_index = usize::try_from((packed >> shift) & self.mask()).ok()?;
        self.palette.get(palette_index).copied()
    }

    /// Write `value` at `index`, growing the palette if needed.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), WorldError> {
        if index >= self.len {
            return Err(WorldError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let palette_index = self.palette_index_for(value)?;
        if self.bits == 0 {
            // Still a single value and it matches.
            return Ok(());
        }
        self.write_index(index, palette_index)
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: T) {
        self.palette.clear();
        self.palette.push(value);
        self.bits = 0;
        self.words.clear();
    }

    /// Iterate over all cell values in index order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).filter_map(|index| self.get(index))
    }

    /// Exact length in bytes of the serialized grid.
    pub fn serialized_size(&self) -> usize {
        // len + palette_len + palette + bits + word_count + words
        4_usize
            .saturating_add(2)
            .saturating_add(self.palette.len().saturating_mul(4))
            .saturating_add(1)
            .saturating_add(4)
            .saturating_add(self.words.len().saturating_mul(8))
    }

    /// Serialize into `buf`, which must be at least
    /// [`serialized_size`](Self::serialized_size) bytes long. Returns the
    /// number of bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, WorldError> {
        let mut writer = ByteWriter::new(buf);
        writer.put(&u32::try_from(self.len).map_err(|_err| overflow())?.to_le_bytes())?;
        let palette_len = u16::try_from(self.palette.len()).map_err(|_err| {
            WorldError::PaletteOverflow { max: MAX_PALETTE }
        })?;
        writer.put(&palette_len.to_le_bytes())?;
        for value in &self.palette {
            writer.put(&value.to_raw().to_le_bytes())?;
        }
        writer.put(&[u8::try_from(self.bits).map_err(|_err| overflow())?])?;
        let word_count = u32::try_from(self.words.len()).map_err(|_err| overflow())?;
        writer.put(&word_count.to_le_bytes())?;
        for word in &self.words {
            writer.put(&word.to_le_bytes())?;
        }
        Ok(writer.position())
    }

    /// Deserialize a grid previously written by
    /// [`write_to`](Self::write_to).
    pub fn read_from(bytes: &[u8]) -> Result<Self, WorldError> {
        let mut reader = ByteReader::new(bytes);
        let len = usize::try_from(u32::from_le_bytes(reader.take()?)).map_err(|_err| overflow())?;
        let palette_len = usize::from(u16::from_le_bytes(reader.take()?));
        if palette_len == 0 {
            return Err(malformed("empty palette"));
        }
        let mut palette = Vec::with_capacity(palette_len);
        for _ in 0..palette_len {
            let raw = u32::from_le_bytes(reader.take()?);
            let value = T::from_raw(raw)
                .ok_or_else(|| malformed(format!("unrepresentable palette value {raw:#x}")))?;
            palette.push(value);
        }
        let [bits] = reader.take::<1>()?;
        let bits = u32::from(bits);
        let expected_bits = bits_for(palette_len);
        if bits != expected_bits {
            return Err(malformed(format!(
                "palette of {palette_len} values stored with {bits} bits (expected {expected_bits})"
            )));
        }
        let word_count = usize::try_from(u32::from_le_bytes(reader.take()?)).map_err(|_err| overflow())?;
        if word_count != words_needed(len, bits) {
            return Err(malformed(format!(
                "{word_count} words cannot hold {len} entries of {bits} bits"
            )));
        }
        let mut words = Vec::with_capacity(word_count);
        for _ in 0..word_count {
            words.push(u64::from_le_bytes(reader.take()?));
        }
        if !reader.is_exhausted() {
            return Err(malformed("trailing bytes after grid payload"));
        }
        let grid = Self {
            len,
            palette,
            bits,
            words,
        };
        // Every packed index must point into the palette.
        if grid.iter().count() != len {
            return Err(malformed("packed index outside palette"));
        }
        Ok(grid)
    }

    /// Replace this grid's contents with a decoded payload of the same
    /// length.
    pub fn read_into(&mut self, bytes: &[u8]) -> Result<(), WorldError> {
        let decoded = Self::read_from(bytes)?;
        if decoded.len != self.len {
            return Err(malformed(format!(
                "payload holds {} cells, grid holds {}",
                decoded.len, self.len
            )));
        }
        *self = decoded;
        Ok(())
    }

    fn palette_index_for(&mut self, value: T) -> Result<usize, WorldError> {
        if let Some(found) = self.palette.iter().position(|v| *v == value) {
            return Ok(found);
        }
        if self.palette.len() >= MAX_PALETTE {
            return Err(WorldError::PaletteOverflow { max: MAX_PALETTE });
        }
        self.palette.push(value);
        let needed = bits_for(self.palette.len());
        if needed != self.bits {
            self.repack(needed)?;
        }
        Ok(self.palette.len().saturating_sub(1))
    }

    fn repack(&mut self, bits: u32) -> Result<(), WorldError> {
        let indices: Vec<u64> = if self.bits == 0 {
            vec![0; self.len]
        } else {
            (0..self.len)
                .map(|index| {
                    let (word, shift) = self.slot(index).ok_or_else(overflow)?;
                    let packed = self.words.get(word).ok_or_else(overflow)?;
                    Ok((packed >> shift) & self.mask())
                })
                .collect::<Result<_, WorldError>>()?
        };
        self.bits = bits;
        self.words = vec![0; words_needed(self.len, bits)];
        for (index, palette_index) in indices.into_iter().enumerate() {
            let palette_index = usize::try_from(palette_index).map_err(|_err| overflow())?;
            self.write_index(index, palette_index)?;
        }
        Ok(())
    }

    fn write_index(&mut self, index: usize, palette_index: usize) -> Result<(), WorldError> {
        let (word, shift) = self.slot(index).ok_or_else(overflow)?;
        let mask = self.mask();
        let value = u64::try_from(palette_index).map_err(|_err| overflow())? & mask;
        let packed = self.words.get_mut(word).ok_or_else(overflow)?;
        *packed = (*packed & !(mask << shift)) | (value << shift);
        Ok(())
    }

    /// Word index and bit shift of `index`.
    fn slot(&self, index: usize) -> Option<(usize, u32)> {
        let per_word = usize::try_from(64_u32.checked_div(self.bits)?).ok()?;
        let word = index.checked_div(per_word)?;
        let within = u32::try_from(index.checked_rem(per_word)?).ok()?;
        Some((word, within.checked_mul(self.bits)?))
    }

    const fn mask(&self) -> u64 {
        if self.bits == 0 {
            0
        } else {
            u64::MAX >> (64_u32.saturating_sub(self.bits))
        }
    }
}

/// Bits per entry for a palette of `palette_len` values.
fn bits_for(palette_len: usize) -> u32 {
    if palette_len <= 1 {
        return 0;
    }
    let highest_index = palette_len.saturating_sub(1);
    let needed = usize::BITS.saturating_sub(highest_index.leading_zeros());
    needed.max(MIN_BITS)
}

/// Number of `u64` words holding `len` entries of `bits` bits.
fn words_needed(len: usize, bits: u32) -> usize {
    let Some(per_word) = 64_u32.checked_div(bits).and_then(|p| usize::try_from(p).ok()) else {
        return 0;
    };
    len.div_ceil(per_word)
}

fn malformed(detail: impl Into<String>) -> WorldError {
    WorldError::MalformedPayload {
        detail: detail.into(),
    }
}

const fn overflow() -> WorldError {
    WorldError::ArithmeticOverflow
}

/// Cursor writing into a fixed-size byte slice.
struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    const fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), WorldError> {
        let end = self.pos.checked_add(bytes.len()).ok_or_else(overflow)?;
        let available = self.buf.len();
        let dest = self
            .buf
            .get_mut(self.pos..end)
            .ok_or_else(|| malformed(format!("buffer of {available} bytes too small")))?;
        dest.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    const fn position(&self) -> usize {
        self.pos
    }
}

/// Cursor reading fixed-width fields from a byte slice.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], WorldError> {
        let end = self.pos.checked_add(N).ok_or_else(overflow)?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| malformed(format!("truncated payload at byte {}", self.pos)))?;
        let mut out = [0_u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    const fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
