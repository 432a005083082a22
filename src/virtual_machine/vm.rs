//! Core virtual machine implementation.
//!
//! The VM owns a register file, a fixed-size code memory, the program counter
//! and the `condpc` branch target. [`VM::run`] drives the fetch-decode-execute
//! loop until `HALT` or a fault. Every fault is terminal: the VM records it and
//! returns it again from any later call.

mod registers;

use crate::debug;
use crate::virtual_machine::config::VmConfig;
use crate::virtual_machine::encoding::{DecodedWord, Word};
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::output::Output;
use crate::virtual_machine::program::Program;
use registers::Registers;

/// Externally visible execution state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// More instructions can be executed.
    Running,
    /// `HALT` was executed.
    Halted,
    /// A fault stopped execution; see [`VM::fault`].
    Faulted,
}

#[derive(Clone, Debug)]
enum State {
    Running,
    Halted,
    Faulted(VMError),
}

/// What the program counter does after an instruction.
enum Flow {
    /// Move past the instruction and any wide operand.
    Next,
    /// Continue at an absolute code address.
    Jump(usize),
    Halt,
}

/// Dispatches a decoded opcode to its `op_*` handler.
///
/// Operands are read by kind before the handler runs: `Arg1`/`Arg2` take the
/// inline fields, `Wide` reads the following code slot. Handlers listed with
/// `out;` also receive the output sink.
macro_rules! exec_vm {
    (
        vm = $vm:ident,
        out = $out:ident,
        word = $word:ident,
        opcode = $opcode:ident,
        { $( $variant:ident => $handler:ident $args:tt ),* $(,)? }
    ) => {{
        match $opcode {
            $(
                Opcode::$variant => exec_vm!(@call $vm, $out, $word, $handler, $args),
            )*
        }
    }};

    // Handler with the output sink (semicolon separator)
    (@call $vm:ident, $out:ident, $word:ident, $handler:ident,
        (out; $( $field:ident : $kind:ident ),* $(,)? )
    ) => {{
        $( let $field = exec_vm!(@read $vm, $word, $kind)?; )*
        $vm.$handler($out, $( $field ),*)
    }};

    // Handler without the output sink
    (@call $vm:ident, $out:ident, $word:ident, $handler:ident,
        ( $( $field:ident : $kind:ident ),* $(,)? )
    ) => {{
        $( let $field = exec_vm!(@read $vm, $word, $kind)?; )*
        $vm.$handler($( $field ),*)
    }};

    (@read $vm:ident, $word:ident, Arg1) => {
        Ok::<u8, VMError>($word.arg1)
    };

    (@read $vm:ident, $word:ident, Arg2) => {
        Ok::<u8, VMError>($word.arg2)
    };

    (@read $vm:ident, $word:ident, Wide) => {
        $vm.read_wide()
    };
}

/// Bytecode virtual machine.
pub struct VM {
    /// Code memory, immutable once constructed.
    code: Vec<Word>,
    registers: Registers,
    /// Program counter.
    pc: usize,
    /// Branch target for `JMPEQ`/`JMPEQW`.
    condpc: usize,
    state: State,
    /// Instructions executed so far.
    steps: u64,
    config: VmConfig,
}

impl VM {
    /// Loads `program` into a new VM.
    ///
    /// With a fixed code capacity the program is copied into zero-filled code
    /// memory (zero decodes as `HALT`); a program longer than the capacity is
    /// rejected.
    pub fn new(program: Program, config: VmConfig) -> Result<Self, VMError> {
        config.validate()?;

        let mut code = program.into_words();
        if let Some(capacity) = config.code_capacity {
            if code.len() > capacity {
                return Err(VMError::ProgramTooLarge {
                    len: code.len(),
                    capacity,
                });
            }
            code.resize(capacity, 0);
        }

        Ok(Self {
            code,
            registers: Registers::new(config.register_count),
            pc: 0,
            condpc: 0,
            state: State::Running,
            steps: 0,
            config,
        })
    }

    /// Loads `program` with the reference configuration.
    pub fn with_program(program: Program) -> Result<Self, VMError> {
        Self::new(program, VmConfig::default())
    }

    /// Executes until `HALT` or a fault.
    ///
    /// Honours [`VmConfig::max_steps`]: when the limit is reached before the
    /// program halts the run faults with [`VMError::StepLimitExceeded`].
    pub fn run<O: Output>(&mut self, out: &mut O) -> Result<(), VMError> {
        loop {
            if let Some(limit) = self.config.max_steps
                && self.status() == Status::Running
                && self.steps >= limit
            {
                return Err(self.fail(VMError::StepLimitExceeded {
                    limit,
                    pc: self.pc,
                }));
            }
            if self.step(out)? != Status::Running {
                return Ok(());
            }
        }
    }

    /// Executes at most `budget` instructions and reports where execution stands.
    ///
    /// Running out of budget is not a fault: the VM stays [`Status::Running`]
    /// and can be resumed.
    pub fn run_steps<O: Output>(&mut self, out: &mut O, budget: u64) -> Result<Status, VMError> {
        if let State::Faulted(err) = &self.state {
            return Err(err.clone());
        }
        for _ in 0..budget {
            if self.step(out)? != Status::Running {
                break;
            }
        }
        Ok(self.status())
    }

    /// Executes exactly one instruction.
    ///
    /// A halted VM stays halted; a faulted VM returns its fault again.
    pub fn step<O: Output>(&mut self, out: &mut O) -> Result<Status, VMError> {
        match &self.state {
            State::Halted => return Ok(Status::Halted),
            State::Faulted(err) => return Err(err.clone()),
            State::Running => {}
        }

        match self.execute(out) {
            Ok(next) => {
                self.steps += 1;
                match next {
                    Some(pc) => self.pc = pc,
                    None => self.state = State::Halted,
                }
                Ok(self.status())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Decodes the code slot at `address` without executing it.
    pub fn fetch(&self, address: usize) -> Result<DecodedWord, VMError> {
        self.code
            .get(address)
            .map(|&word| DecodedWord::new(word))
            .ok_or(VMError::AddressOutOfRange {
                address,
                pc: self.pc,
                len: self.code.len(),
            })
    }

    pub fn status(&self) -> Status {
        match self.state {
            State::Running => Status::Running,
            State::Halted => Status::Halted,
            State::Faulted(_) => Status::Faulted,
        }
    }

    /// Returns the fault that stopped execution, if any.
    pub fn fault(&self) -> Option<&VMError> {
        match &self.state {
            State::Faulted(err) => Some(err),
            _ => None,
        }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn condpc(&self) -> usize {
        self.condpc
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn registers(&self) -> &[i32] {
        self.registers.as_slice()
    }

    pub fn register(&self, idx: u8) -> Option<i32> {
        self.registers.as_slice().get(idx as usize).copied()
    }

    pub fn code(&self) -> &[Word] {
        &self.code
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Records `err` as the terminal fault and hands it back.
    fn fail(&mut self, err: VMError) -> VMError {
        self.state = State::Faulted(err.clone());
        err
    }

    /// Fetches, decodes and executes the instruction at `pc`.
    ///
    /// Returns the next program counter, or `None` once the program halts.
    fn execute<O: Output>(&mut self, out: &mut O) -> Result<Option<usize>, VMError> {
        let word = self.fetch(self.pc)?;
        if self.config.trace {
            debug!("PC={:#x}, {}", self.pc, word);
        }

        let opcode = Opcode::try_from(word.opcode).map_err(|_| VMError::InvalidOpcode {
            opcode: word.opcode,
            pc: self.pc,
        })?;

        let flow = exec_vm! {
            vm = self,
            out = out,
            word = word,
            opcode = opcode,
            {
                Halt => op_halt(),
                Add => op_add(reg: Arg1, imm: Arg2),
                Load => op_load(reg: Arg1, imm: Arg2),
                LoadW => op_load_w(reg: Arg1, imm: Wide),
                Copy => op_copy(dst: Arg1, src: Arg2),
                CndPc => op_cnd_pc(target: Arg1),
                Jmp => op_jmp(target: Arg1),
                JmpEq => op_jmp_eq(reg: Arg1, imm: Arg2),
                JmpEqW => op_jmp_eq_w(reg: Arg1, imm: Wide),
                Print => op_print(out; reg: Arg1),
            }
        }?;

        Ok(match flow {
            Flow::Next => Some(self.pc + opcode.width()),
            Flow::Jump(target) => Some(target),
            Flow::Halt => None,
        })
    }

    /// Reads the wide immediate stored right after the current instruction.
    fn read_wide(&self) -> Result<i32, VMError> {
        let address = self.pc + 1;
        self.code
            .get(address)
            .map(|&word| word as i32)
            .ok_or(VMError::AddressOutOfRange {
                address,
                pc: self.pc,
                len: self.code.len(),
            })
    }

    fn op_halt(&mut self) -> Result<Flow, VMError> {
        Ok(Flow::Halt)
    }

    fn op_add(&mut self, reg: u8, imm: u8) -> Result<Flow, VMError> {
        let value = self.registers.get(reg, self.pc)?;
        self.registers
            .set(reg, value.wrapping_add(imm as i32), self.pc)?;
        Ok(Flow::Next)
    }

    fn op_load(&mut self, reg: u8, imm: u8) -> Result<Flow, VMError> {
        self.registers.set(reg, imm as i32, self.pc)?;
        Ok(Flow::Next)
    }

    fn op_load_w(&mut self, reg: u8, imm: i32) -> Result<Flow, VMError> {
        self.registers.set(reg, imm, self.pc)?;
        Ok(Flow::Next)
    }

    fn op_copy(&mut self, dst: u8, src: u8) -> Result<Flow, VMError> {
        let value = self.registers.get(src, self.pc)?;
        self.registers.set(dst, value, self.pc)?;
        Ok(Flow::Next)
    }

    fn op_cnd_pc(&mut self, target: u8) -> Result<Flow, VMError> {
        self.condpc = target as usize;
        Ok(Flow::Next)
    }

    fn op_jmp(&mut self, target: u8) -> Result<Flow, VMError> {
        Ok(Flow::Jump(target as usize))
    }

    fn op_jmp_eq(&mut self, reg: u8, imm: u8) -> Result<Flow, VMError> {
        if self.registers.get(reg, self.pc)? == imm as i32 {
            return Ok(Flow::Jump(self.condpc));
        }
        Ok(Flow::Next)
    }

    fn op_jmp_eq_w(&mut self, reg: u8, imm: i32) -> Result<Flow, VMError> {
        if self.registers.get(reg, self.pc)? == imm {
            return Ok(Flow::Jump(self.condpc));
        }
        Ok(Flow::Next)
    }

    fn op_print<O: Output>(&mut self, out: &mut O, reg: u8) -> Result<Flow, VMError> {
        let value = self.registers.get(reg, self.pc)?;
        out.print(value).map_err(|message| VMError::Output {
            pc: self.pc,
            message,
        })?;
        Ok(Flow::Next)
    }
}
