//! CLI for sluice-rs: handler scaffolding.

use std::path::Path;

use clap::{Parser, Subcommand};
use sluice_rs::HandlerTemplate;

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Sluice Rust CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a command or query handler to a module (generates <module>/<request>.rs).
    AddHandler {
        /// Module directory (e.g. users)
        module: String,
        /// Request type in PascalCase (e.g. DeleteUser)
        request: String,
        /// Generate a query returning this type instead of a command
        #[arg(long, value_name = "RESULT")]
        query: Option<String>,
        /// Generate an async handler
        #[arg(long = "async")]
        asynchronous: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::AddHandler {
            module,
            request,
            query,
            asynchronous,
        } => {
            let template = HandlerTemplate {
                module,
                request,
                result: query,
                asynchronous,
            };
            let path = template.write(Path::new("."))?;
            println!("Generated {}", path.display());
            println!(
                "Add to your module wiring: mod {}; let module = {}::register(module);",
                template.file_name().trim_end_matches(".rs"),
                template.file_name().trim_end_matches(".rs")
            );
            Ok(())
        }
    }
}
