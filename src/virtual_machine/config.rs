//! Construction parameters for a [`VM`](super::vm::VM).

use crate::virtual_machine::encoding::FIELD_VALUES;
use crate::virtual_machine::errors::VMError;

/// Register file size of the reference machine (`r0..r3`).
pub const DEFAULT_REGISTER_COUNT: usize = 4;

/// Code memory size of the reference machine, in words.
pub const DEFAULT_CODE_CAPACITY: usize = 1024;

/// Largest register file a 4-bit register field can address.
pub const MAX_REGISTER_COUNT: usize = FIELD_VALUES;

/// VM construction parameters.
///
/// The defaults reproduce the reference machine: four registers, 1024 words
/// of zero-filled code memory, no step limit and no tracing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VmConfig {
    /// Number of registers, between 1 and [`MAX_REGISTER_COUNT`].
    pub register_count: usize,
    /// Code memory size in words. `None` sizes code memory to the program.
    pub code_capacity: Option<usize>,
    /// Maximum instructions executed by [`VM::run`](super::vm::VM::run) before faulting.
    pub max_steps: Option<u64>,
    /// Log every executed instruction at debug level.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            register_count: DEFAULT_REGISTER_COUNT,
            code_capacity: Some(DEFAULT_CODE_CAPACITY),
            max_steps: None,
            trace: false,
        }
    }
}

impl VmConfig {
    pub fn with_register_count(mut self, count: usize) -> Self {
        self.register_count = count;
        self
    }

    pub fn with_code_capacity(mut self, capacity: Option<usize>) -> Self {
        self.code_capacity = capacity;
        self
    }

    pub fn with_max_steps(mut self, limit: Option<u64>) -> Self {
        self.max_steps = limit;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Checks the register count. Code capacity is checked against the program in `VM::new`.
    pub fn validate(&self) -> Result<(), VMError> {
        if self.register_count == 0 || self.register_count > MAX_REGISTER_COUNT {
            return Err(VMError::InvalidRegisterCount {
                count: self.register_count,
                max: MAX_REGISTER_COUNT,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_reference_machine() {
        let config = VmConfig::default();
        assert_eq!(config.register_count, 4);
        assert_eq!(config.code_capacity, Some(1024));
        assert_eq!(config.max_steps, None);
        assert!(!config.trace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn register_count_bounds() {
        assert!(VmConfig::default().with_register_count(1).validate().is_ok());
        assert!(VmConfig::default().with_register_count(16).validate().is_ok());
        assert_eq!(
            VmConfig::default().with_register_count(0).validate(),
            Err(VMError::InvalidRegisterCount { count: 0, max: 16 })
        );
        assert_eq!(
            VmConfig::default().with_register_count(17).validate(),
            Err(VMError::InvalidRegisterCount { count: 17, max: 16 })
        );
    }

    #[test]
    fn setters_chain() {
        let config = VmConfig::default()
            .with_code_capacity(None)
            .with_max_steps(Some(10))
            .with_trace(true);
        assert_eq!(config.code_capacity, None);
        assert_eq!(config.max_steps, Some(10));
        assert!(config.trace);
    }
}
