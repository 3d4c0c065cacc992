//! CLI module for graphmart.
//!
//! Subcommands:
//! - `init`: Ensure the graph schema, optionally seeding the bundled catalog
//! - `serve`: Run the HTTP storefront API

mod init;
mod serve;

use clap::{Parser, Subcommand};

/// Graph-backed storefront API
#[derive(Parser)]
#[command(name = "graphmart")]
#[command(about = "Graph-backed e-commerce storefront API")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the graph, labels and indexes
    Init {
        /// Replace the catalog with the bundled sample products
        #[arg(long)]
        seed: bool,
    },

    /// Run the HTTP server
    Serve {
        /// Host address to bind to (defaults to `server.host`)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to `server.port`)
        #[arg(long)]
        port: Option<u16>,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init { seed } => self.run_init(seed).await,
            Command::Serve { ref host, port } => self.run_serve(host.clone(), port).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let app = App::try_parse_from(["graphmart", "serve", "--port", "8080", "-v"]).unwrap();
        assert!(app.verbose);
        match app.command {
            Command::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(8080));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_init_seed() {
        let app = App::try_parse_from(["graphmart", "init", "--seed"]).unwrap();
        assert!(matches!(app.command, Command::Init { seed: true }));
    }
}
