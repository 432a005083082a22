//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and invokes a callback macro for code
//! generation, so the opcode enum, the ISA hash check and any future tables
//! are generated from one list.
//!
//! This module generates:
//! - The [`Opcode`] enum with its stable numeric values
//! - `TryFrom<u8>` for decoding opcode fields
//! - Mnemonics, word widths and operand kinds per opcode
//!
//! # Operand kinds
//!
//! - `Reg`: a register index carried in a 4-bit field
//! - `Imm`: a 4-bit unsigned immediate carried in a field
//! - `Addr`: a 4-bit absolute code address carried in a field
//! - `Wide`: a full word stored in the code slot after the instruction
//!
//! Inline operands fill `arg1` then `arg2` in declaration order. Opcodes with a
//! `Wide` operand occupy two code slots; there is no operand-kind selector bit,
//! each narrow opcode has a separate `W` twin instead.

use crate::virtual_machine::errors::VMError;

/// Invokes a callback macro with the complete instruction definition list.
///
/// Each entry reads `Name = opcode, "MNEMONIC" => [operands], width_in_words`.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// HALT ; stop execution
            Halt = 0, "HALT" => [], 1,
            /// ADD reg, imm4 ; reg += imm4
            Add = 1, "ADD" => [reg: Reg, imm: Imm], 1,
            /// LOAD reg, imm4 ; reg = imm4
            Load = 2, "LOAD" => [reg: Reg, imm: Imm], 1,
            /// LOADW reg, word ; reg = word from the next code slot
            LoadW = 3, "LOADW" => [reg: Reg, imm: Wide], 2,
            /// COPY dst, src ; dst = src
            Copy = 4, "COPY" => [dst: Reg, src: Reg], 1,
            /// CNDPC target ; condpc = target
            CndPc = 5, "CNDPC" => [target: Addr], 1,
            /// JMP target ; pc = target
            Jmp = 6, "JMP" => [target: Addr], 1,
            /// JMPEQ reg, imm4 ; if reg == imm4 then pc = condpc
            JmpEq = 7, "JMPEQ" => [reg: Reg, imm: Imm], 1,
            /// JMPEQW reg, word ; if reg == word from the next code slot then pc = condpc
            JmpEqW = 8, "JMPEQW" => [reg: Reg, imm: Wide], 2,
            /// PRINT reg ; write reg as a decimal line
            Print = 9, "PRINT" => [reg: Reg], 1,
        }
    };
}

/// Kind of a single instruction operand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperandKind {
    /// Register index in a 4-bit field.
    Reg,
    /// Unsigned immediate in a 4-bit field.
    Imm,
    /// Absolute code address in a 4-bit field.
    Addr,
    /// Full word in the following code slot.
    Wide,
}

impl OperandKind {
    /// Returns `true` if the operand lives in the word after the instruction.
    pub const fn is_wide(&self) -> bool {
        matches!(self, OperandKind::Wide)
    }
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $width:expr
        ),* $(,)?
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = VMError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Opcode::$name), )*
                    _ => Err(VMError::InvalidOpcode {
                        opcode: value,
                        pc: 0,
                    }),
                }
            }
        }

        impl Opcode {
            /// Every defined opcode in numeric order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the number of code slots this instruction occupies.
            pub const fn width(&self) -> usize {
                match self {
                    $( Opcode::$name => $width, )*
                }
            }

            /// Returns the operand kinds in encoding order.
            pub const fn operands(&self) -> &'static [OperandKind] {
                match self {
                    $( Opcode::$name => &[ $( OperandKind::$kind, )* ], )*
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl Opcode {
    /// Returns `true` for the opcodes that read a full-word immediate.
    pub fn is_wide(&self) -> bool {
        self.operands().iter().any(OperandKind::is_wide)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_numeric_values_are_stable() {
        assert_eq!(Opcode::Halt as u8, 0);
        assert_eq!(Opcode::Add as u8, 1);
        assert_eq!(Opcode::Load as u8, 2);
        assert_eq!(Opcode::LoadW as u8, 3);
        assert_eq!(Opcode::Copy as u8, 4);
        assert_eq!(Opcode::CndPc as u8, 5);
        assert_eq!(Opcode::Jmp as u8, 6);
        assert_eq!(Opcode::JmpEq as u8, 7);
        assert_eq!(Opcode::JmpEqW as u8, 8);
        assert_eq!(Opcode::Print as u8, 9);
    }

    #[test]
    fn try_from_round_trips_defined_opcodes() {
        for &op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op as u8), Ok(op));
        }
    }

    #[test]
    fn try_from_rejects_undefined_opcodes() {
        for value in 10..=15u8 {
            assert!(matches!(
                Opcode::try_from(value),
                Err(VMError::InvalidOpcode { opcode, .. }) if opcode == value
            ));
        }
    }

    #[test]
    fn only_w_forms_are_wide() {
        for &op in Opcode::ALL {
            let wide = matches!(op, Opcode::LoadW | Opcode::JmpEqW);
            assert_eq!(op.is_wide(), wide, "{op}");
            assert_eq!(op.width(), if wide { 2 } else { 1 }, "{op}");
        }
    }

    #[test]
    fn inline_operands_fit_in_two_fields() {
        for &op in Opcode::ALL {
            let inline = op.operands().iter().filter(|k| !k.is_wide()).count();
            assert!(inline <= 2, "{op} has {inline} inline operands");
        }
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::JmpEqW.mnemonic(), "JMPEQW");
        assert_eq!(Opcode::CndPc.to_string(), "CNDPC");
    }
}
