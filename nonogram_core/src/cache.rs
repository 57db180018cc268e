//! The compact cache encoding for puzzles and cell grids.
//!
//! Everything is written in a 64-character alphabet (`0-9`, `a-z`, `A-Z`,
//! `.`, `_`). Unsigned integers are self-delimiting, one to four characters
//! wide: the first character's top bits state the width and carry the
//! high-order value bits, and every following character is marked `10xxxx`
//! with four value bits. Cell grids pack six cells per character, one bit
//! each, most significant first.

use thiserror::Error;

use crate::cell::{Cell, Grid};
use crate::puzzle::Puzzle;
use crate::rule::Rule;

const ALPHABET: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ._";

/// The largest encodable integer: the 4-character form carries one bit in
/// its first character and four in each of the other three.
pub const MAX_VALUE: u32 = (1 << 13) - 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("character at offset {at} is not in the cache alphabet")]
    BadCharacter { at: usize },
    #[error("input ended inside an encoded value")]
    Truncated,
    #[error("continuation character at offset {at} has a bad marker")]
    BadContinuation { at: usize },
    #[error("value {0} does not fit the encoding")]
    ValueTooLarge(u32),
    #[error("cell at ({x}, {y}) is not determined and cannot be encoded")]
    Unencodable { x: usize, y: usize },
}

fn index_of(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'z' => Some(byte - b'a' + 10),
        b'A'..=b'Z' => Some(byte - b'A' + 36),
        b'.' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

/// Appends cache-encoded values to a string.
#[derive(Debug, Default)]
pub struct Encoder {
    out: String,
}

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Encoder::default()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.out
    }

    /// Writes one self-delimited unsigned integer.
    ///
    /// # Errors
    ///
    /// [`CodecError::ValueTooLarge`] above [`MAX_VALUE`].
    pub fn put_int(&mut self, v: u32) -> Result<(), CodecError> {
        if v > MAX_VALUE {
            return Err(CodecError::ValueTooLarge(v));
        }
        let (chars, mask, mark) = if v > 1023 {
            (4, 0x1, 0x3c)
        } else if v > 127 {
            (3, 0x3, 0x38)
        } else if v > 31 {
            (2, 0x7, 0x30)
        } else {
            (1, 0x1f, 0x00)
        };

        let mut mask: u32 = mask;
        let mut mark: u32 = mark;
        for place in (0..chars).rev() {
            let index = ((v >> (4 * place)) & mask) | mark;
            self.out.push(char::from(ALPHABET[index as usize]));
            mask = 0xf;
            mark = 0x20;
        }
        Ok(())
    }

    /// Writes a puzzle: column rules then row rules, each rule's blocks in
    /// order followed by a zero sentinel.
    ///
    /// # Errors
    ///
    /// [`CodecError::ValueTooLarge`] if any block exceeds [`MAX_VALUE`].
    pub fn put_puzzle(&mut self, puzzle: &Puzzle) -> Result<(), CodecError> {
        for rule in puzzle.cols().iter().chain(puzzle.rows()) {
            for &block in rule.blocks() {
                self.put_int(block as u32)?;
            }
            self.put_int(0)?;
        }
        Ok(())
    }

    /// Writes a grid row-major, six cells per character, one bit per cell
    /// (1 = solid, 0 = dot); the final character is padded with zero bits.
    ///
    /// # Errors
    ///
    /// [`CodecError::Unencodable`] on the first `Blank`/`Both` cell.
    pub fn put_cells(&mut self, grid: &Grid) -> Result<(), CodecError> {
        let mut bits = 0u8;
        let mut got = 0u8;
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                bits <<= 1;
                match grid.get(x, y) {
                    Cell::Solid => bits |= 1,
                    Cell::Dot => {}
                    Cell::Blank | Cell::Both => {
                        return Err(CodecError::Unencodable { x, y });
                    }
                }
                got += 1;
                if got == 6 {
                    self.out.push(char::from(ALPHABET[bits as usize]));
                    bits = 0;
                    got = 0;
                }
            }
        }
        if got > 0 {
            bits <<= 6 - got;
            self.out.push(char::from(ALPHABET[bits as usize]));
        }
        Ok(())
    }
}

/// Reads cache-encoded values from a string, keeping a cursor so that a
/// puzzle and its grid can be decoded back to back.
#[derive(Debug)]
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Decoder {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn next_index(&mut self) -> Result<u8, CodecError> {
        let at = self.pos;
        let byte = *self.input.get(at).ok_or(CodecError::Truncated)?;
        let index = index_of(byte).ok_or(CodecError::BadCharacter { at })?;
        self.pos += 1;
        Ok(index)
    }

    /// Reads one self-delimited unsigned integer.
    ///
    /// # Errors
    ///
    /// [`CodecError`] on truncation or a malformed character.
    pub fn take_int(&mut self) -> Result<u32, CodecError> {
        let key = self.next_index()?;
        let (extra, mut value) = match key {
            0x3e.. => return Err(CodecError::BadCharacter { at: self.pos - 1 }),
            0x3c..=0x3d => (3, u32::from(key & 0x1)),
            0x38..=0x3b => (2, u32::from(key & 0x3)),
            0x30..=0x37 => (1, u32::from(key & 0x7)),
            _ => (0, u32::from(key & 0x1f)),
        };
        for _ in 0..extra {
            let at = self.pos;
            let key = self.next_index()?;
            if key & 0x30 != 0x20 {
                return Err(CodecError::BadContinuation { at });
            }
            value = (value << 4) | u32::from(key & 0xf);
        }
        Ok(value)
    }

    /// Reads a puzzle of the given dimensions: column rules then row rules,
    /// each terminated by a zero sentinel.
    ///
    /// # Errors
    ///
    /// Any [`CodecError`] from the underlying integers.
    pub fn take_puzzle(&mut self, width: usize, height: usize) -> Result<Puzzle, CodecError> {
        let mut cols = Vec::with_capacity(width);
        for _ in 0..width {
            cols.push(self.take_rule()?);
        }
        let mut rows = Vec::with_capacity(height);
        for _ in 0..height {
            rows.push(self.take_rule()?);
        }
        Ok(Puzzle::new(rows, cols))
    }

    fn take_rule(&mut self) -> Result<Rule, CodecError> {
        let mut blocks = Vec::new();
        loop {
            let value = self.take_int()?;
            if value == 0 {
                return Ok(Rule::new(blocks));
            }
            blocks.push(value as usize);
        }
    }

    /// Reads a `width * height` grid of determined cells.
    ///
    /// # Errors
    ///
    /// [`CodecError::Truncated`] if fewer than `ceil(w*h/6)` characters
    /// remain, or [`CodecError::BadCharacter`] on one outside the alphabet.
    pub fn take_cells(&mut self, width: usize, height: usize) -> Result<Grid, CodecError> {
        let chars = (width * height).div_ceil(6);
        if self.remaining() < chars {
            return Err(CodecError::Truncated);
        }
        let mut cells = Vec::with_capacity(width * height);
        'chars: for _ in 0..chars {
            let bits = self.next_index()?;
            for b in (0..6).rev() {
                cells.push(if bits & (1 << b) == 0 {
                    Cell::Dot
                } else {
                    Cell::Solid
                });
                if cells.len() == width * height {
                    break 'chars;
                }
            }
        }
        Ok(Grid::from_cells(width, height, cells))
    }
}

/// One-shot puzzle encoding.
///
/// # Errors
///
/// See [`Encoder::put_puzzle`].
pub fn encode_puzzle(puzzle: &Puzzle) -> Result<String, CodecError> {
    let mut enc = Encoder::new();
    enc.put_puzzle(puzzle)?;
    Ok(enc.into_string())
}

/// One-shot puzzle decoding.
///
/// # Errors
///
/// See [`Decoder::take_puzzle`].
pub fn decode_puzzle(input: &str, width: usize, height: usize) -> Result<Puzzle, CodecError> {
    Decoder::new(input).take_puzzle(width, height)
}

/// One-shot grid encoding.
///
/// # Errors
///
/// See [`Encoder::put_cells`].
pub fn encode_cells(grid: &Grid) -> Result<String, CodecError> {
    let mut enc = Encoder::new();
    enc.put_cells(grid)?;
    Ok(enc.into_string())
}

/// One-shot grid decoding.
///
/// # Errors
///
/// See [`Decoder::take_cells`].
pub fn decode_cells(input: &str, width: usize, height: usize) -> Result<Grid, CodecError> {
    Decoder::new(input).take_cells(width, height)
}
