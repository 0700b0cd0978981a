//! Zinc compiler CLI.
//!
//! `zincc program.zn` compiles to persisted bytecode (`program.znc`);
//! `--run` executes in the VM, `--emit-c` produces C source instead, and
//! `--disassemble` prints the bytecode listing. A `.znc` argument runs
//! directly.

use clap::Parser as ClapParser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use zinc_core::Program;
use zinc_vm::Vm;

#[derive(ClapParser)]
#[command(name = "zincc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Zinc compiler - natural English programs on a bytecode VM", long_about = None)]
struct Cli {
    /// Zinc source file (.zn) or compiled bytecode (.znc)
    source: PathBuf,

    /// Output path for the bytecode or C source
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit C source instead of bytecode
    #[arg(long)]
    emit_c: bool,

    /// Print the bytecode disassembly and exit
    #[arg(short = 'd', long)]
    disassemble: bool,

    /// Execute the program after compiling
    #[arg(long)]
    run: bool,

    /// Trace each instruction during execution (implies --run)
    #[arg(long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();
    process::exit(run_cli(&cli));
}

fn run_cli(cli: &Cli) -> i32 {
    if cli.source.extension().is_some_and(|e| e == "znc") {
        if cli.emit_c || cli.disassemble {
            eprintln!("Error: cannot transpile or disassemble an already-compiled file");
            return 1;
        }
        return run_bytecode_file(&cli.source, cli.debug);
    }

    if cli.source.extension().map_or(true, |e| e != "zn") {
        eprintln!("Warning: source file does not have .zn extension");
    }

    let source = match fs::read_to_string(&cli.source) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.source.display(), e);
            return 1;
        }
    };

    if cli.emit_c {
        let c_code = match zinc_compiler::transpile_source(&source) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}", e);
                return 1;
            }
        };
        match &cli.output {
            Some(path) => {
                if let Err(e) = fs::write(path, c_code) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    return 1;
                }
                println!("C source written to {}", path.display());
            }
            None => println!("{}", c_code),
        }
        return 0;
    }

    let program = match zinc_compiler::compile_source(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    if cli.disassemble {
        println!("{}", program.disassemble());
        return 0;
    }

    if cli.run || cli.debug {
        return run_program(&program, cli.debug);
    }

    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.source.with_extension("znc"));
    let bytes = match program.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = fs::write(&out_path, bytes) {
        eprintln!("Error writing {}: {}", out_path.display(), e);
        return 1;
    }
    println!("Bytecode saved to: {}", out_path.display());
    0
}

fn run_bytecode_file(path: &Path, debug: bool) -> i32 {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            return 1;
        }
    };
    let program = match Program::from_bytes(&bytes) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    run_program(&program, debug)
}

fn run_program(program: &Program, debug: bool) -> i32 {
    let mut vm = Vm::new(program);
    vm.set_debug(debug);
    vm.run()
}
