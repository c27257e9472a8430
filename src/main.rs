use std::io::{self, Read};

use clap::{Parser as ClapParser, Subcommand};
use objpath::{
    IndexPolicy,
    cli::{self, CheckOptions, CheckResult, CliError, GetOptions, PatchOptions},
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "objpath")]
#[command(about = "objpath - Resolve and patch values in object graphs with path expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a path expression and print its normalized form
    Check {
        /// The path expression, e.g. `Images[ImgIDList[2]].Content`
        path: String,
    },

    /// Resolve a path against a JSON document
    Get {
        /// The path expression
        path: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// How indices past the end of an array are handled
        #[arg(long, value_enum, default_value_t = IndexPolicy::Strict)]
        index_policy: IndexPolicy,
    },

    /// Apply PATH=VALUE assignments to a JSON document
    Patch {
        /// Assignment, may be repeated; VALUE is JSON or a plain string
        #[arg(short, long = "set", value_name = "PATH=VALUE", required = true)]
        set: Vec<String>,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// How indices past the end of an array are handled
        #[arg(long, value_enum, default_value_t = IndexPolicy::Strict)]
        index_policy: IndexPolicy,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { path } => run_check(path),
        Commands::Get {
            path,
            input,
            pretty,
            index_policy,
        } => read_input(input).and_then(|input| {
            let options = GetOptions {
                path,
                input,
                index_policy,
            };
            print_json(&cli::execute_get(&options)?, pretty)
        }),
        Commands::Patch {
            set,
            input,
            pretty,
            index_policy,
        } => read_input(input).and_then(|input| {
            let options = PatchOptions {
                input,
                assignments: set,
                index_policy,
            };
            print_json(&cli::execute_patch(&options)?, pretty)
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(path: String) -> Result<(), CliError> {
    match cli::execute_check(&CheckOptions { path })? {
        CheckResult::Valid {
            normalized,
            first_part,
        } => {
            println!("{}", normalized);
            if !first_part.is_empty() {
                println!("first part: {}", first_part);
            }
        }
    }
    Ok(())
}

fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn print_json(output: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    println!("{}", json);
    Ok(())
}
