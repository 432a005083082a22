//! Program representation.
//!
//! A [`Program`] is the word sequence loaded into code memory before a run:
//! instruction words interleaved with the raw immediates of wide opcodes.
//! [`ProgramBuilder`] emits one method per opcode and takes care of the extra
//! slot wide opcodes need.

use crate::virtual_machine::encoding::{DecodedWord, Word, encode};
use crate::virtual_machine::isa::{Opcode, OperandKind};

/// An ordered sequence of code words.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
    words: Vec<Word>,
}

impl Program {
    /// Wraps already encoded words.
    pub fn from_words(words: Vec<Word>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Renders one line per instruction, skipping over wide immediates.
    ///
    /// Words whose opcode field is undefined are listed as `.word` and the
    /// listing continues with the next slot.
    pub fn disassemble(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut pc = 0;
        while pc < self.words.len() {
            let decoded = DecodedWord::new(self.words[pc]);
            let Ok(opcode) = Opcode::try_from(decoded.opcode) else {
                lines.push(format!("{pc:04}: .word {:#x}", decoded.word));
                pc += 1;
                continue;
            };

            let mut inline = [decoded.arg1, decoded.arg2].into_iter();
            let operands: Vec<String> = opcode
                .operands()
                .iter()
                .map(|kind| match kind {
                    OperandKind::Reg => format!("r{}", inline.next().unwrap_or_default()),
                    OperandKind::Imm => format!("{}", inline.next().unwrap_or_default()),
                    OperandKind::Addr => format!("@{}", inline.next().unwrap_or_default()),
                    OperandKind::Wide => match self.words.get(pc + 1) {
                        Some(&word) => format!("{}", word as i32),
                        None => "<missing>".to_string(),
                    },
                })
                .collect();

            if operands.is_empty() {
                lines.push(format!("{pc:04}: {opcode}"));
            } else {
                lines.push(format!("{pc:04}: {opcode} {}", operands.join(", ")));
            }
            pc += opcode.width();
        }
        lines
    }
}

impl From<Vec<Word>> for Program {
    fn from(words: Vec<Word>) -> Self {
        Self::from_words(words)
    }
}

/// Incremental program construction.
///
/// Field arguments are packed with [`encode`], so values above 15 truncate
/// exactly as they would in a hand-encoded word.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    words: Vec<Word>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code address the next emitted word will occupy.
    pub fn position(&self) -> usize {
        self.words.len()
    }

    fn emit(&mut self, opcode: Opcode, arg1: u8, arg2: u8) -> &mut Self {
        self.words.push(encode(opcode as u8, arg1, arg2));
        self
    }

    fn emit_wide(&mut self, opcode: Opcode, arg1: u8, imm: i32) -> &mut Self {
        self.emit(opcode, arg1, 0);
        self.words.push(imm as Word);
        self
    }

    /// Appends a raw word, e.g. an undefined opcode for fault testing.
    pub fn word(&mut self, word: Word) -> &mut Self {
        self.words.push(word);
        self
    }

    pub fn halt(&mut self) -> &mut Self {
        self.emit(Opcode::Halt, 0, 0)
    }

    pub fn add(&mut self, reg: u8, imm: u8) -> &mut Self {
        self.emit(Opcode::Add, reg, imm)
    }

    pub fn load(&mut self, reg: u8, imm: u8) -> &mut Self {
        self.emit(Opcode::Load, reg, imm)
    }

    pub fn load_w(&mut self, reg: u8, imm: i32) -> &mut Self {
        self.emit_wide(Opcode::LoadW, reg, imm)
    }

    pub fn copy(&mut self, dst: u8, src: u8) -> &mut Self {
        self.emit(Opcode::Copy, dst, src)
    }

    pub fn cnd_pc(&mut self, target: u8) -> &mut Self {
        self.emit(Opcode::CndPc, target, 0)
    }

    pub fn jmp(&mut self, target: u8) -> &mut Self {
        self.emit(Opcode::Jmp, target, 0)
    }

    pub fn jmp_eq(&mut self, reg: u8, imm: u8) -> &mut Self {
        self.emit(Opcode::JmpEq, reg, imm)
    }

    pub fn jmp_eq_w(&mut self, reg: u8, imm: i32) -> &mut Self {
        self.emit_wide(Opcode::JmpEqW, reg, imm)
    }

    pub fn print(&mut self, reg: u8) -> &mut Self {
        self.emit(Opcode::Print, reg, 0)
    }

    pub fn build(&mut self) -> Program {
        Program::from_words(std::mem::take(&mut self.words))
    }
}

/// The reference program: counts `r0` from zero up to `target`, then prints it.
///
/// ```text
/// 0000: CNDPC @7
/// 0001: LOADW r0, 0
/// 0003: ADD r0, 1
/// 0004: JMPEQW r0, target
/// 0006: JMP @3
/// 0007: PRINT r0
/// 0008: HALT
/// ```
pub fn counting_loop(target: i32) -> Program {
    ProgramBuilder::new()
        .cnd_pc(7)
        .load_w(0, 0)
        .add(0, 1)
        .jmp_eq_w(0, target)
        .jmp(3)
        .print(0)
        .halt()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_encodes_narrow_instructions() {
        let program = ProgramBuilder::new().load(1, 5).print(1).halt().build();
        assert_eq!(
            program.words(),
            &[encode(2, 1, 5), encode(9, 1, 0), encode(0, 0, 0)]
        );
    }

    #[test]
    fn builder_appends_wide_immediates() {
        let program = ProgramBuilder::new().load_w(2, -7).build();
        assert_eq!(program.len(), 2);
        assert_eq!(program.words()[0], encode(3, 2, 0));
        assert_eq!(program.words()[1] as i32, -7);
    }

    #[test]
    fn builder_position_tracks_wide_slots() {
        let mut builder = ProgramBuilder::new();
        builder.cnd_pc(0).load_w(0, 0);
        assert_eq!(builder.position(), 3);
        builder.add(0, 1);
        assert_eq!(builder.position(), 4);
    }

    #[test]
    fn builder_truncates_oversized_fields() {
        let program = ProgramBuilder::new().load(17, 20).build();
        assert_eq!(program.words(), &[encode(2, 1, 4)]);
    }

    #[test]
    fn build_resets_builder() {
        let mut builder = ProgramBuilder::new();
        builder.halt();
        assert_eq!(builder.build().len(), 1);
        assert!(builder.build().is_empty());
    }

    #[test]
    fn counting_loop_layout() {
        let program = counting_loop(1_000_000);
        assert_eq!(program.len(), 9);
        assert_eq!(program.words()[0], encode(5, 7, 0));
        assert_eq!(program.words()[5], 1_000_000);
        assert_eq!(program.words()[7], encode(9, 0, 0));
    }

    #[test]
    fn disassemble_counting_loop() {
        assert_eq!(
            counting_loop(1_000_000).disassemble(),
            vec![
                "0000: CNDPC @7",
                "0001: LOADW r0, 0",
                "0003: ADD r0, 1",
                "0004: JMPEQW r0, 1000000",
                "0006: JMP @3",
                "0007: PRINT r0",
                "0008: HALT",
            ]
        );
    }

    #[test]
    fn disassemble_undefined_and_truncated() {
        let program = ProgramBuilder::new()
            .word(encode(10, 0, 0))
            .copy(1, 0)
            .word(encode(3, 0, 0))
            .build();
        assert_eq!(
            program.disassemble(),
            vec!["0000: .word 0xa00", "0001: COPY r1, r0", "0002: LOADW r0, <missing>"]
        );
    }
}
