//! appdex - desktop application manager and creator.
//!
//! Thin CLI over the registry engine in `appdex-registry`. Every command
//! maps a core failure to a printed diagnostic plus exit code 1.

mod output;
mod webapp;

use std::process::{self, Command};

use appdex_registry::{ListFilter, Registry, RegistryError};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "appdex",
    version,
    about = "Manage desktop launcher entries: list, inspect, launch, create, remove"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List applications
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Search in names and descriptions
        #[arg(short, long)]
        search: Option<String>,
        /// Show only web applications
        #[arg(short, long)]
        webapps: bool,
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },
    /// Display application information
    Info {
        /// Application name
        name: String,
    },
    /// Run an application
    Run {
        /// Application name
        name: String,
    },
    /// Search applications
    Search {
        /// Search query
        query: String,
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },
    /// Create a web application from a URL
    CreateWebapp {
        /// Website URL
        url: String,
        /// Application name (defaults to the page title)
        #[arg(short, long)]
        name: Option<String>,
        /// Application categories (default: Network;WebBrowser;)
        #[arg(short, long)]
        categories: Option<String>,
        /// Custom icon URL (defaults to the page favicon)
        #[arg(short, long)]
        icon: Option<String>,
    },
    /// Create a native application entry
    CreateNative {
        /// Application name
        name: String,
        /// Execution command
        exec: String,
        /// Application categories (default: Utility;)
        #[arg(short, long)]
        categories: Option<String>,
        /// Icon path or name
        #[arg(short, long)]
        icon: Option<String>,
        /// Application description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Remove an application entry
    Remove {
        /// Application name
        name: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(message) = run(cli) {
        eprintln!("{message}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut registry = Registry::new().map_err(|e| e.to_string())?;

    match cli.command {
        Commands::List {
            category,
            search,
            webapps,
            json,
        } => {
            let filter = ListFilter {
                category,
                search,
                webapp: webapps.then_some(true),
            };
            let entries = registry.list(&filter);
            if json {
                output::print_json(&entries)?;
            } else if entries.is_empty() {
                println!("No matching applications found.");
            } else {
                output::print_table(&entries);
            }
        }

        Commands::Info { name } => {
            let entry = registry
                .find_by_name(&name)
                .ok_or_else(|| format!("Application '{name}' not found."))?;
            output::print_info(entry);
        }

        Commands::Run { name } => {
            let arguments = registry
                .launch_arguments(&name)
                .map_err(|e| describe_run_failure(&name, &e))?;
            // Detached: no wait, no output capture.
            Command::new(&arguments[0])
                .args(&arguments[1..])
                .spawn()
                .map_err(|e| format!("Failed to run application '{name}': {e}"))?;
        }

        Commands::Search { query, json } => {
            let entries = registry.search(&query);
            if json {
                output::print_json(&entries)?;
            } else if entries.is_empty() {
                println!("No matching applications found for '{query}'.");
            } else {
                output::print_table(&entries);
            }
        }

        Commands::CreateWebapp {
            url,
            name,
            categories,
            icon,
        } => {
            let scratch = registry.scratch_dir();
            let meta = webapp::resolve_metadata(&url, name, icon, &scratch)
                .map_err(|e| format!("Failed to create web application: {e}"))?;
            let path = registry
                .create_webapp(
                    &url,
                    &meta.name,
                    &meta.comment,
                    categories.as_deref(),
                    &meta.icon,
                )
                .map_err(|e| format!("Failed to create web application: {e}"))?;
            println!("Web application created successfully: {}", path.display());
        }

        Commands::CreateNative {
            name,
            exec,
            categories,
            icon,
            description,
        } => {
            let path = registry
                .create_native(
                    &name,
                    &exec,
                    categories.as_deref(),
                    icon.as_deref(),
                    description.as_deref().unwrap_or(""),
                )
                .map_err(|e| format!("Failed to create native application: {e}"))?;
            println!(
                "Native application created successfully: {}",
                path.display()
            );
        }

        Commands::Remove { name } => {
            match registry.remove(&name) {
                Ok(_) => println!("Application '{name}' removed successfully"),
                Err(RegistryError::NotFound(_)) => {
                    return Err(format!("Application '{name}' not found"));
                }
                Err(e) => return Err(format!("Failed to remove application: {e}")),
            }
        }
    }

    Ok(())
}

fn describe_run_failure(name: &str, error: &RegistryError) -> String {
    match error {
        RegistryError::NotFound(_) => format!("Application '{name}' not found."),
        other => format!("Failed to run application '{name}': {other}"),
    }
}
