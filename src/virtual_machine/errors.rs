use picovm_derive::Error;

/// Errors raised while configuring or executing the VM.
///
/// Runtime faults carry the program counter of the instruction that faulted.
/// Every runtime fault is terminal for the run that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VMError {
    /// The opcode field does not name a defined instruction.
    #[error("unrecognized opcode {opcode} at pc {pc:#x}")]
    InvalidOpcode { opcode: u8, pc: usize },
    /// A fetch (the instruction itself or its wide operand) fell outside code memory.
    #[error("address {address:#x} out of range (pc {pc:#x}, code length {len})")]
    AddressOutOfRange {
        address: usize,
        pc: usize,
        len: usize,
    },
    /// A register field names a register beyond the configured register file.
    #[error("register r{index} out of range ({available} registers, pc {pc:#x})")]
    RegisterOutOfRange {
        index: u8,
        available: usize,
        pc: usize,
    },
    /// The configured step limit ran out before the program halted.
    #[error("step limit of {limit} exhausted at pc {pc:#x}")]
    StepLimitExceeded { limit: u64, pc: usize },
    /// The output sink rejected a PRINT.
    #[error("output failed at pc {pc:#x}: {message}")]
    Output { pc: usize, message: String },
    /// The program does not fit in the configured code memory.
    #[error("program of {len} words exceeds code capacity of {capacity}")]
    ProgramTooLarge { len: usize, capacity: usize },
    /// The register file size is zero or larger than a register field can address.
    #[error("invalid register count {count} (must be between 1 and {max})")]
    InvalidRegisterCount { count: usize, max: usize },
}

impl VMError {
    /// Returns the program counter of the faulting instruction, if this is a runtime fault.
    pub fn pc(&self) -> Option<usize> {
        match self {
            VMError::InvalidOpcode { pc, .. }
            | VMError::AddressOutOfRange { pc, .. }
            | VMError::RegisterOutOfRange { pc, .. }
            | VMError::StepLimitExceeded { pc, .. }
            | VMError::Output { pc, .. } => Some(*pc),
            VMError::ProgramTooLarge { .. } | VMError::InvalidRegisterCount { .. } => None,
        }
    }
}
