use crate::virtual_machine::errors::VMError;

/// Register file of signed 32-bit registers, zero-initialised.
///
/// The size is fixed at construction. Accesses outside it return
/// [`VMError::RegisterOutOfRange`] tagged with the faulting program counter.
#[derive(Clone, Debug)]
pub(super) struct Registers {
    regs: Vec<i32>,
}

impl Registers {
    /// Creates a register file with `count` registers.
    pub(super) fn new(count: usize) -> Self {
        Self {
            regs: vec![0; count],
        }
    }

    fn out_of_range(&self, idx: u8, pc: usize) -> VMError {
        VMError::RegisterOutOfRange {
            index: idx,
            available: self.regs.len(),
            pc,
        }
    }

    /// Returns the value in register `idx`.
    pub(super) fn get(&self, idx: u8, pc: usize) -> Result<i32, VMError> {
        self.regs
            .get(idx as usize)
            .copied()
            .ok_or_else(|| self.out_of_range(idx, pc))
    }

    /// Stores `v` into register `idx`.
    pub(super) fn set(&mut self, idx: u8, v: i32, pc: usize) -> Result<(), VMError> {
        let err = self.out_of_range(idx, pc);
        let slot = self.regs.get_mut(idx as usize).ok_or(err)?;
        *slot = v;
        Ok(())
    }

    pub(super) fn as_slice(&self) -> &[i32] {
        &self.regs
    }
}
