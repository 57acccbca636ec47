// Standard Imports
use clap::Parser;
use std::path::PathBuf;

use cminus_compiler::{
    AstParser,
    BackEndGenerator,
    CMinusSemanticAnalyser,
    PestCMinusParser,
    SemanticAnalyser,
    TmCodeGenerator,
};

/// Command Line interface struct
/// Describes possible arguments using the clap library
#[derive(Parser)]
struct CompilerCLIOptions {
    /// Path of file to compile. C-Minus source files end in .cm
    #[clap(parse(from_os_str))]
    path: PathBuf,

    /// Path to output file, default is <path_filename>.tm
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    // Flags

    /// Write compilation result to stdout instead of output
    #[clap(long, action)]
    stdout: bool,

    /// Generates code with debug decorations
    #[clap(long, action)]
    debug: bool,

    /// Write the parsed syntax tree to stdout
    #[clap(long, action)]
    ast: bool,

    /// Write the symbol table listing to stdout
    #[clap(long, action)]
    symbols: bool,
}

impl CompilerCLIOptions {
    /// Derives default values for empty arguments that cannot be set to constants.
    /// For instance output is derived from the input file path.
    /// @return: Returns CompilerCLIOptions with modified empty arguments
    fn derive_defaults(mut self) -> Self {
        // Derive output file path from input file path if not set
        if self.output.is_none() {
            self.output = Some(self.path.with_extension("tm"))
        }

        return self;
    }
}

fn main() {
    // Parse Command line arguments
    let cli_args = CompilerCLIOptions::parse().derive_defaults();

    let source = match std::fs::read_to_string(cli_args.path.as_path()) {
        Ok(source) => source,
        Err(why) => {
            println!("Couldn't read {}: {}", cli_args.path.display(), why);
            std::process::exit(exitcode::IOERR);
        }
    };

    // The phases run one at a time so the intermediate listings can be
    // written out between them when requested.
    let tree = match PestCMinusParser::default().parse(source.as_str()) {
        Ok(tree) => tree,
        Err(why) => {
            println!("{}", why);
            std::process::exit(exitcode::DATAERR);
        }
    };
    if cli_args.ast {
        println!("{}", tree);
    }

    let annotated = match CMinusSemanticAnalyser::default().analyse(tree) {
        Ok(annotated) => annotated,
        Err(diagnostics) => {
            for diagnostic in &diagnostics {
                println!("{}", diagnostic);
            }
            std::process::exit(exitcode::DATAERR);
        }
    };
    if cli_args.symbols {
        println!("{}", annotated.symbol_table());
    }

    let mut program_code = TmCodeGenerator::default().generate(annotated);
    if cli_args.debug {
        program_code = program_code.decorated();
    }

    // Check if output should be to stdout
    if cli_args.stdout {
        print!("{}", program_code);
        std::process::exit(exitcode::OK);
    }

    let dest_path = cli_args.output.unwrap(); // Can unwrap as output will always be derived
    match std::fs::write(dest_path.as_path(), format!("{}", program_code)) {
        Ok(_) => {
            println!("Compile success!");
            std::process::exit(exitcode::OK);
        }
        Err(why) => {
            println!("Couldn't write to {}: {}", dest_path.display(), why);
            std::process::exit(exitcode::IOERR);
        }
    }
}
