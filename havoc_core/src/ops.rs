//! Primitive operators. Each one rewrites a single scalar of the buffer in
//! place and never changes its length. An operator whose minimum length is not
//! met returns before drawing anything from the generator.

use crate::interesting::{ARITH_MAX, INTERESTING_8, INTERESTING_16, INTERESTING_32};
use crate::rng::ChainRng;

/// Width of a multi-byte window rewritten by the word/dword operators.
///
/// Windows are read and written little-endian at any offset. The "swapped"
/// variants interpret the same bytes big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Word,
    Dword,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::Word => 2,
            Width::Dword => 4,
        }
    }

    fn load(self, buf: &[u8], at: usize) -> u32 {
        match self {
            Width::Word => u16::from_le_bytes([buf[at], buf[at + 1]]) as u32,
            Width::Dword => {
                u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
            }
        }
    }

    fn store(self, buf: &mut [u8], at: usize, value: u32) {
        match self {
            Width::Word => buf[at..at + 2].copy_from_slice(&(value as u16).to_le_bytes()),
            Width::Dword => buf[at..at + 4].copy_from_slice(&value.to_le_bytes()),
        }
    }

    fn swap(self, value: u32) -> u32 {
        match self {
            Width::Word => (value as u16).swap_bytes() as u32,
            Width::Dword => value.swap_bytes(),
        }
    }

    /// Adds or subtracts `delta`, wrapping at this width.
    fn wrapping_step(self, value: u32, delta: u32, subtract: bool) -> u32 {
        match self {
            Width::Word => {
                let (v, d) = (value as u16, delta as u16);
                let out = if subtract {
                    v.wrapping_sub(d)
                } else {
                    v.wrapping_add(d)
                };
                out as u32
            }
            Width::Dword => {
                if subtract {
                    value.wrapping_sub(delta)
                } else {
                    value.wrapping_add(delta)
                }
            }
        }
    }

    fn interesting(self, rng: &mut ChainRng) -> u32 {
        match self {
            Width::Word => INTERESTING_16[rng.below(INTERESTING_16.len())] as u16 as u32,
            Width::Dword => INTERESTING_32[rng.below(INTERESTING_32.len())] as u32,
        }
    }
}

/// Flips one bit, indexed MSB-first within its byte.
pub fn bit_flip(buf: &mut [u8], rng: &mut ChainRng) {
    if buf.is_empty() {
        return;
    }
    let bit = rng.below(buf.len().saturating_mul(8));
    buf[bit >> 3] ^= 0x80 >> (bit & 7);
}

/// Overwrites one byte with an entry of [`INTERESTING_8`].
pub fn byte_interesting(buf: &mut [u8], rng: &mut ChainRng) {
    if buf.is_empty() {
        return;
    }
    let pos = rng.below(buf.len());
    buf[pos] = INTERESTING_8[rng.below(INTERESTING_8.len())] as u8;
}

/// Overwrites an unaligned window with an interesting value of the same width,
/// byte-swapped half of the time.
///
/// Draw order: table entry, swap coin, offset.
pub fn width_interesting(buf: &mut [u8], rng: &mut ChainRng, width: Width) {
    let w = width.bytes();
    if buf.len() < w {
        return;
    }
    let value = width.interesting(rng);
    let value = if rng.coin() { value } else { width.swap(value) };
    let pos = rng.below(buf.len() - w + 1);
    width.store(buf, pos, value);
}

pub fn word_interesting(buf: &mut [u8], rng: &mut ChainRng) {
    width_interesting(buf, rng, Width::Word)
}

pub fn dword_interesting(buf: &mut [u8], rng: &mut ChainRng) {
    width_interesting(buf, rng, Width::Dword)
}

/// Draws a delta in `[1, ARITH_MAX]`.
#[inline]
fn arith_delta(rng: &mut ChainRng) -> u32 {
    1 + rng.rand_range(ARITH_MAX)
}

/// Adds or subtracts a small delta to one byte, wrapping.
///
/// Draw order: offset, delta, subtract coin.
pub fn byte_arith(buf: &mut [u8], rng: &mut ChainRng) {
    if buf.is_empty() {
        return;
    }
    let pos = rng.below(buf.len());
    let delta = arith_delta(rng) as u8;
    buf[pos] = if rng.coin() {
        buf[pos].wrapping_sub(delta)
    } else {
        buf[pos].wrapping_add(delta)
    };
}

/// Adds or subtracts a small delta to an unaligned window.
///
/// Half of the time the arithmetic happens on the byte-swapped value, which is
/// then swapped back, so carries propagate in the opposite direction.
///
/// Draw order: offset, delta, subtract coin, swap coin.
pub fn width_arith(buf: &mut [u8], rng: &mut ChainRng, width: Width) {
    let w = width.bytes();
    if buf.len() < w {
        return;
    }
    let pos = rng.below(buf.len() - w + 1);
    let delta = arith_delta(rng);
    let subtract = rng.coin();
    let swapped = rng.coin();

    let value = width.load(buf, pos);
    let mutated = if swapped {
        width.swap(width.wrapping_step(width.swap(value), delta, subtract))
    } else {
        width.wrapping_step(value, delta, subtract)
    };
    width.store(buf, pos, mutated);
}

pub fn word_arith(buf: &mut [u8], rng: &mut ChainRng) {
    width_arith(buf, rng, Width::Word)
}

pub fn dword_arith(buf: &mut [u8], rng: &mut ChainRng) {
    width_arith(buf, rng, Width::Dword)
}

/// XORs one byte with a value in `[1, 255]`, so the byte always changes.
pub fn byte_random(buf: &mut [u8], rng: &mut ChainRng) {
    if buf.is_empty() {
        return;
    }
    let pos = rng.below(buf.len());
    buf[pos] ^= (1 + rng.rand_range(255)) as u8;
}
