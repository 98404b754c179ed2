//! Command-line driver
//!
//! Usage: `minic <file.c> [--ast]`
//!
//! Exit codes: 0 on success (the result of `main` is printed), 1 for
//! lexical/syntax errors, 2 for semantic errors (all are listed), 3 for
//! runtime errors.

use minic::interpreter::Interpreter;
use minic::parser::Parser;
use minic::semantics::SemanticAnalyzer;
use std::env;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let mut path = None;
    let mut show_ast = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--ast" => show_ast = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                return ExitCode::SUCCESS;
            }
            other if path.is_none() => path = Some(other.to_string()),
            other => {
                eprintln!("Unexpected argument: {}", other);
                print_usage(&args[0]);
                return ExitCode::FAILURE;
            }
        }
    }

    let path = match path {
        Some(path) => path,
        None => {
            print_usage(&args[0]);
            return ExitCode::FAILURE;
        }
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let program = {
        let mut parser = match Parser::new(&source) {
            Ok(parser) => parser,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::from(1);
            }
        };
        match parser.parse_program() {
            Ok(program) => program,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::from(1);
            }
        }
    };

    if show_ast {
        println!("{:#?}", program);
    }

    if let Err(errors) = SemanticAnalyzer::new().analyze(&program) {
        for error in &errors {
            eprintln!("{}", error);
        }
        eprintln!("{} semantic error(s) found; not executed", errors.len());
        return ExitCode::from(2);
    }

    match Interpreter::new(&program).run() {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(3)
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <file.c> [--ast]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --ast    Print the parsed syntax tree before running");
    eprintln!("  --help   Show this message");
}
