//! Instruction word packing.
//!
//! Every instruction occupies one [`Word`] laid out as:
//!
//! ```text
//! | unused (31..12) | opcode (11..8) | arg1 (7..4) | arg2 (3..0) |
//! ```
//!
//! Packing masks each field to [`FIELD_BITS`] bits, so out-of-range inputs
//! truncate instead of failing. Decoding is total: any bit pattern yields some
//! field values, and whether the opcode is defined is decided by the
//! [`isa`](super::isa) table, not here.

use std::fmt;

/// A code memory slot: either an instruction or a raw wide immediate.
pub type Word = u32;

/// Width in bits of each packed field.
pub const FIELD_BITS: u32 = 4;

/// Mask selecting one field after shifting.
pub const FIELD_MASK: Word = (1 << FIELD_BITS) - 1;

/// Bit offset of the opcode field.
pub const OPCODE_SHIFT: u32 = 2 * FIELD_BITS;

/// Bit offset of the first argument field.
pub const ARG1_SHIFT: u32 = FIELD_BITS;

/// Bit offset of the second argument field.
pub const ARG2_SHIFT: u32 = 0;

/// Number of distinct values a field can hold.
pub const FIELD_VALUES: usize = 1 << FIELD_BITS;

/// Packs an instruction word. Each field is masked to [`FIELD_BITS`] bits.
pub const fn encode(opcode: u8, arg1: u8, arg2: u8) -> Word {
    ((opcode as Word & FIELD_MASK) << OPCODE_SHIFT)
        | ((arg1 as Word & FIELD_MASK) << ARG1_SHIFT)
        | ((arg2 as Word & FIELD_MASK) << ARG2_SHIFT)
}

/// Extracts the opcode field.
pub const fn decode_opcode(word: Word) -> u8 {
    ((word >> OPCODE_SHIFT) & FIELD_MASK) as u8
}

/// Extracts the first argument field.
pub const fn decode_arg1(word: Word) -> u8 {
    ((word >> ARG1_SHIFT) & FIELD_MASK) as u8
}

/// Extracts the second argument field.
pub const fn decode_arg2(word: Word) -> u8 {
    ((word >> ARG2_SHIFT) & FIELD_MASK) as u8
}

/// All three fields of an instruction word, decoded at once.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecodedWord {
    /// The raw word the fields were taken from.
    pub word: Word,
    pub opcode: u8,
    pub arg1: u8,
    pub arg2: u8,
}

impl DecodedWord {
    pub const fn new(word: Word) -> Self {
        Self {
            word,
            opcode: decode_opcode(word),
            arg1: decode_arg1(word),
            arg2: decode_arg2(word),
        }
    }
}

impl From<Word> for DecodedWord {
    fn from(word: Word) -> Self {
        Self::new(word)
    }
}

impl fmt::Display for DecodedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INS={:#x}, OP={:#x}, ARG1={:#x}, ARG2={:#x}",
            self.word, self.opcode, self.arg1, self.arg2
        )
    }
}
