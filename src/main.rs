use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ron::ser::{to_string_pretty, PrettyConfig};
use classfile_disassembler::DisassemblerFlags;
use simple_logger::SimpleLogger;

/// Prints a bytecode listing of a compiled class file.
#[derive(Parser)]
#[clap(name = "classdis", version)]
struct Args {
    /// Path to the `.class` file
    class_file: PathBuf,
    #[clap(short = 'l', long, help = "print line number tables")]
    line_numbers: bool,
    #[clap(long, help = "print local variable tables")]
    locals: bool,
    #[clap(short = 'v', long, help = "print the header, constant pool and member flags")]
    verbose: bool,
    #[clap(long, help = "omit method bodies")]
    no_code: bool,
    #[clap(long, help = "print the resolved class tree as RON instead of a listing")]
    ast: bool,
    #[clap(long, default_value = "warn")]
    log_level: log::LevelFilter,
}

impl Args {
    fn flags(&self) -> DisassemblerFlags {
        let mut flags = DisassemblerFlags::empty();
        flags.set(DisassemblerFlags::LINE_NUMBERS, self.line_numbers);
        flags.set(DisassemblerFlags::LOCAL_VARIABLES, self.locals);
        flags.set(DisassemblerFlags::VERBOSE, self.verbose);
        flags.set(DisassemblerFlags::SKIP_CODE, self.no_code);
        flags
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    SimpleLogger::new().with_level(args.log_level).init()?;

    let path = &args.class_file;
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let report = if args.ast {
        let tree = classfile_disassembler::parse_tree(&bytes)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        to_string_pretty(&tree, PrettyConfig::default())?
    } else {
        classfile_disassembler::disassemble_with_flags(&bytes, args.flags())
            .with_context(|| format!("failed to disassemble {}", path.display()))?
    };
    // the whole report is built before anything reaches stdout
    println!("{}", report);
    Ok(())
}
