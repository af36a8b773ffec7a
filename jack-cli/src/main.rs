//! Entrypoint for CLI
use std::{env, path::PathBuf};

use jack::{driver, prelude::*, IMPL_VERSION};
use log::{error, info};

static USAGE: &str = r#"
usage: jackc [CMD] PATH

commands:
    compile     Compile the target .jack file, or every .jack file in
                the target directory, into .vm files (default)
    tokens      Write the token listing of each .jack file into an
                XML file, Main.jack -> MainT.xml

examples:
    jackc Main.jack
    jackc compile projects/Square
    jackc tokens projects/Square
"#;

fn run_compiler(path: PathBuf) -> JackResult<()> {
    info!("compiling {}", path.display());

    let outputs = driver::compile_path(&path, &DriverConf::default())?;
    for output in &outputs {
        println!("{}", output.display());
    }

    Ok(())
}

fn run_tokenizer(path: PathBuf) -> JackResult<()> {
    info!("tokenizing {}", path.display());

    let outputs = driver::tokenize_path(&path, &DriverConf::default())?;
    for output in &outputs {
        println!("{}", output.display());
    }

    Ok(())
}

fn main() {
    if let Err(err) = simple_logger::SimpleLogger::new().env().init() {
        eprintln!("failed to initialise logger: {err}");
    }

    let result = match parse_args() {
        Some(Cmd::Compile { path }) => run_compiler(path),
        Some(Cmd::Tokens { path }) => run_tokenizer(path),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    match result {
        Ok(()) => {}
        Err(err @ JackError::Usage(_)) => {
            error!("{err}");
            print_usage();
            std::process::exit(64)
        }
        Err(err) => {
            error!("{err}");
            std::process::exit(1)
        }
    }
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    let cmd = match args.next()?.as_str() {
        "compile" => Cmd::Compile {
            path: consume_arg(&mut args)?,
        },
        "tokens" => Cmd::Tokens {
            path: consume_arg(&mut args)?,
        },
        "-h" | "--help" => return None,
        // A lone path is compiled.
        path => Cmd::Compile {
            path: PathBuf::from(path),
        },
    };

    // Trailing arguments are a mistake.
    match args.next() {
        Some(_) => None,
        None => Some(cmd),
    }
}

/// Consumes the next argument as a path.
fn consume_arg(args: &mut impl Iterator<Item = String>) -> Option<PathBuf> {
    args.next().map(PathBuf::from)
}

fn print_usage() {
    println!("jackc v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Compile to VM code
    Compile { path: PathBuf },
    /// Write token listings
    Tokens { path: PathBuf },
}
