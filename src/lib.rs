//! picovm library.
//!
//! A small register-based virtual machine with packed 32-bit instruction words,
//! plus the logging utilities its command-line tool uses.

pub mod utils;
pub mod virtual_machine;
