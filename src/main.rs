//! Runs the built-in counting program on the picovm virtual machine.
//!
//! The program counts `r0` from zero up to `TARGET` and prints the result.
//!
//! # Usage
//! ```text
//! picovm [TARGET] [OPTIONS]
//! ```
//!
//! # Arguments
//! - `TARGET`: Value to count to (defaults to 1000000)
//!
//! # Options
//! - `--trace`: Log every executed instruction
//! - `--max-steps <n>`: Fault once `n` instructions have run
//! - `--registers <n>`: Register file size (1 to 16, defaults to 4)
//! - `--capacity <n|exact>`: Code memory size in words (defaults to 1024)
//! - `--disasm`: Print the program listing instead of running it
//! - `--quiet`: Only log warnings and errors
//!
//! # Examples
//! ```text
//! picovm
//! picovm 42 --trace
//! picovm --capacity exact --disasm
//! ```

use picovm::utils::log::{Level, set_min_level};
use picovm::virtual_machine::config::VmConfig;
use picovm::virtual_machine::output::StdoutOutput;
use picovm::virtual_machine::program::counting_loop;
use picovm::virtual_machine::vm::VM;
use picovm::{error, info};
use std::env;
use std::process;
use std::str::FromStr;

const DEFAULT_TARGET: i32 = 1_000_000;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        print_usage(&args[0]);
        process::exit(0);
    }

    let mut target = DEFAULT_TARGET;
    let mut config = VmConfig::default();
    let mut disasm = false;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--trace" => {
                config = config.with_trace(true);
                i += 1;
            }
            "--disasm" => {
                disasm = true;
                i += 1;
            }
            "--quiet" | "-q" => {
                quiet = true;
                i += 1;
            }
            k @ "--max-steps" => {
                i += 1;
                config = config.with_max_steps(Some(parse_value(k, args.get(i))));
                i += 1;
            }
            k @ "--registers" => {
                i += 1;
                config = config.with_register_count(parse_value(k, args.get(i)));
                i += 1;
            }
            k @ "--capacity" => {
                i += 1;
                let capacity = match args.get(i) {
                    Some(value) if value == "exact" => None,
                    value => Some(parse_value(k, value)),
                };
                config = config.with_code_capacity(capacity);
                i += 1;
            }
            other if !other.starts_with("--") => {
                target = parse_value("TARGET", Some(&args[i]));
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    if config.trace {
        set_min_level(Level::Debug);
    } else if quiet {
        set_min_level(Level::Warn);
    }

    let program = counting_loop(target);

    if disasm {
        for line in program.disassemble() {
            println!("{line}");
        }
        return;
    }

    let mut vm = VM::new(program, config).unwrap_or_else(|e| {
        error!("{e}");
        process::exit(1)
    });

    if let Err(e) = vm.run(&mut StdoutOutput::new()) {
        error!("Execution faulted after {} steps: {}", vm.steps(), e);
        process::exit(1);
    }

    info!("Halted at pc {:#x} after {} steps", vm.pc(), vm.steps());
}

/// Parses the value following `flag`, exiting with an error if it is missing or malformed.
fn parse_value<T: FromStr>(flag: &str, value: Option<&String>) -> T {
    let Some(value) = value else {
        error!("{flag} requires an argument");
        process::exit(1);
    };
    value.parse::<T>().unwrap_or_else(|_| {
        error!("Invalid value for {flag}: '{value}' is not a valid number");
        process::exit(1)
    })
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [TARGET] [OPTIONS]", program);
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  TARGET                  Value to count to (default {DEFAULT_TARGET})");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --trace                 Log every executed instruction");
    eprintln!("  --max-steps <n>         Fault once n instructions have run");
    eprintln!("  --registers <n>         Register file size, 1 to 16 (default 4)");
    eprintln!("  --capacity <n|exact>    Code memory size in words (default 1024)");
    eprintln!("  --disasm                Print the program listing and exit");
    eprintln!("  -q, --quiet             Only log warnings and errors");
    eprintln!("  -h, --help              Show this help");
}
