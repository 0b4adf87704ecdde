use clap::{Parser as ClapParser, Subcommand};
use classad_lang::cli::{self, CheckOptions, CheckResult, EvalOptions};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "classad")]
#[command(about = "ClassAd expression language - evaluate matchmaking expressions against attribute records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against MY and TARGET records
    Eval {
        /// The expression to evaluate
        expr: String,

        /// MY record file of `Name = expr` lines (reads from stdin if
        /// not provided and stdin is piped)
        #[arg(short, long)]
        my: Option<String>,

        /// TARGET record file
        #[arg(short, long)]
        target: Option<String>,

        /// Print the result as JSON
        #[arg(short, long)]
        json: bool,

        /// Trace every evaluation step
        #[arg(short, long)]
        debug: bool,
    },

    /// Validate an expression and print its canonical form
    Check {
        /// The expression to validate
        expr: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expr,
            my,
            target,
            json,
            debug,
        } => run_eval(expr, my, target, json, debug),
        Commands::Check { expr } => run_check(expr),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(
    expr: String,
    my: Option<String>,
    target: Option<String>,
    json: bool,
    debug: bool,
) -> Result<(), cli::CliError> {
    let my_text = match &my {
        Some(_) => None,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = EvalOptions {
        expr,
        my,
        my_text,
        target,
        debug,
    };

    let value = cli::execute_eval(&options)?;
    if json {
        println!("{}", classad_lang::to_json(&value));
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn run_check(expr: String) -> Result<(), cli::CliError> {
    match cli::execute_check(&CheckOptions { expr })? {
        CheckResult::Valid { canonical, .. } => {
            println!("{}", canonical);
        }
    }
    Ok(())
}
