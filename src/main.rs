use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use calculator::{Environment, Lexer};
use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::WrapErr;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate lines from a file, or from stdin when no file is given
    Run { filename: Option<PathBuf> },
    /// Print the tokens of one line
    Tokenize { line: String },
    /// Print the parsed tree of one line
    Parse { line: String },
}

fn main() -> miette::Result<()> {
    calculator::init_tracing();
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Run { filename: None }) {
        Commands::Run { filename: Some(filename) } => {
            let file = File::open(&filename)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading `{}` failed", filename.display()))?;
            run(BufReader::new(file))?;
        }
        Commands::Run { filename: None } => run(io::stdin().lock())?,
        Commands::Tokenize { line } => {
            for token in Lexer::new(&line) {
                let token = match token {
                    Ok(token) => token,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return Err(e.into());
                    }
                };
                println!("{token}");
            }
            println!("EOF  null");
        }
        Commands::Parse { line } => {
            let expression = calculator::Parser::new(&line).parse()?;
            println!("{expression}");
        }
    }
    Ok(())
}

/// One session: every line shares the same variables, and a failing line
/// does not end it.
fn run(input: impl BufRead) -> miette::Result<()> {
    let mut environment = Environment::new();

    for line in input.lines() {
        let line = line.into_diagnostic().wrap_err("reading input failed")?;
        if line.trim().is_empty() {
            continue;
        }

        let expression = match calculator::parse(&line) {
            Ok(expression) => expression,
            Err(e) => {
                println!("Error: {}", e.reason);
                eprintln!("{:?}", miette::Report::new(e));
                continue;
            }
        };

        match calculator::evaluate(&expression, &mut environment) {
            Ok(value) => println!("Result: {value}"),
            Err(failure) => println!("Error: {}", failure.reason),
        }
    }
    Ok(())
}
