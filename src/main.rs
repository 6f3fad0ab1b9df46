use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use minipy::error::Raised;
use minipy::interpreter::Interpreter;
use minipy::object::Object;
use minipy::parser::Parser;
use minipy::scanner::Scanner;
use minipy::stmt::Stmt;
use minipy::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "MiniPy language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses input from a file and prints its AST as JSON
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a MiniPy program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive read-eval-print loop
    Repl,
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with statement number and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'minipy::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("minipy::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Renders an uncaught exception to stderr, innermost frame last.
fn print_traceback(raised: &Raised) {
    eprintln!("Traceback (most recent call last):");

    for frame in &raised.traceback {
        eprintln!("  line {}", frame.line);

        let text = frame.text.trim();
        if !text.is_empty() {
            eprintln!("    {}", text);
        }
    }

    eprintln!("{}", raised);
}

/// Scans the whole buffer, reporting every lexical error before giving up.
fn tokenize(buf: &[u8]) -> std::result::Result<Vec<Token>, ()> {
    let scanner = Scanner::new(buf);
    let mut tokens = Vec::new();
    let mut clean = true;

    for token in scanner {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                tokens.push(token);
            }

            Err(e) => {
                clean = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if clean {
        Ok(tokens)
    } else {
        Err(())
    }
}

fn parse_program(buf: &[u8]) -> std::result::Result<Vec<Stmt>, ()> {
    let Ok(tokens) = tokenize(buf) else {
        return Err(());
    };

    let source = String::from_utf8_lossy(buf).into_owned();
    let mut parser = Parser::new(tokens, &source);

    match parser.parse() {
        Ok(statements) => {
            info!("Parsed {} statements", statements.len());
            Ok(statements)
        }

        Err(e) => {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
            Err(())
        }
    }
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { ">>> " } else { "... " };
        print!("{}", prompt);
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            println!();
            return Ok(());
        }

        let trimmed = line.trim_end();

        // A line ending in ':' opens a block; keep reading until the user
        // enters a blank line.
        if buffer.is_empty() {
            if trimmed.is_empty() {
                continue;
            }

            buffer.push_str(trimmed);
            buffer.push('\n');

            if trimmed.ends_with(':') {
                continue;
            }
        } else if trimmed.is_empty() {
            // blank line terminates the pending block
        } else {
            buffer.push_str(trimmed);
            buffer.push('\n');
            continue;
        }

        let input = std::mem::take(&mut buffer);

        let Ok(statements) = parse_program(input.as_bytes()) else {
            continue;
        };

        for stmt in &statements {
            match interpreter.interpret_one(stmt) {
                Ok(Some(value)) => {
                    if !matches!(value, Object::None) {
                        println!("{}", value.repr());
                    }
                }

                Ok(None) => {}

                Err(raised) => {
                    print_traceback(&raised);
                    break;
                }
            }
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger before parsing CLI args
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");
                let buf = read_file(filename)?;
                let scanner = Scanner::new(&buf);
                let mut clean = true;

                for token in scanner {
                    match token {
                        Ok(token) => {
                            debug!("Scanned token: {}", token);

                            println!("{}", token);
                        }

                        Err(e) => {
                            clean = false;

                            debug!("Tokenization debug: {}", e);

                            eprintln!("{}", e);
                        }
                    }
                }

                if !clean {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }
            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");
                let buf = read_file(filename)?;

                let Ok(statements) = parse_program(&buf) else {
                    std::process::exit(65);
                };

                let json = serde_json::to_string_pretty(&statements)
                    .context("Failed to serialize AST")?;
                println!("{}", json);

                info!("Parse subcommand completed");
            }
            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");
                let buf = read_file(filename)?;

                let Ok(statements) = parse_program(&buf) else {
                    std::process::exit(65);
                };

                let mut interpreter = Interpreter::new();

                match interpreter.interpret(&statements) {
                    Ok(()) => {
                        info!("Program executed successfully");
                    }

                    Err(raised) => {
                        debug!("Runtime debug: {}", raised);
                        print_traceback(&raised);
                        std::process::exit(70);
                    }
                }
            }

            None => {
                info!("No filepath provided for Run");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Repl => repl()?,
    }

    Ok(())
}
