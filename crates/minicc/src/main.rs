use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use minic_compiler::{generate, Parser as McParser};

#[derive(Parser, Debug)]
#[command(name = "minicc")]
#[command(about = "MiniC compiler (front half: source to linear IR)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a source file and print the AST
    Parse { file: PathBuf },
    /// Parse a source file and print its linear IR
    Ir { file: PathBuf },
}

fn read_source(file: &PathBuf) -> String {
    match fs::read_to_string(file) {
        Ok(src) => src,
        Err(e) => {
            eprintln!("failed to read {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse { file } => {
            let src = read_source(&file);
            match McParser::from_source(&src).and_then(|mut p| p.parse_compile_unit()) {
                Ok(unit) => {
                    println!("Parsed OK: {} top-level items", unit.items.len());
                    println!("{:#?}", unit);
                }
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Ir { file } => {
            let src = read_source(&file);
            let unit = match McParser::from_source(&src).and_then(|mut p| p.parse_compile_unit()) {
                Ok(unit) => unit,
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    std::process::exit(1);
                }
            };
            match generate(&unit) {
                Ok(module) => print!("{}", module),
                Err(e) => {
                    eprintln!("Semantic error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
