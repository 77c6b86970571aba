//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Motorbike rental backend
#[derive(Parser, Debug)]
#[command(name = "motorbike-rental")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Delete expired tokens, sessions and blacklist entries
    Cleanup,

    /// Create an administrator account
    CreateAdmin(CreateAdminArgs),
}

/// Arguments for the serve command. Unset values come from the config.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

#[derive(Parser, Debug)]
pub struct CreateAdminArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, default_value = "Admin")]
    pub first_name: String,

    #[arg(long, default_value = "User")]
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["motorbike-rental", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.host, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_migrate_actions() {
        let cli = Cli::try_parse_from(["motorbike-rental", "-v", "migrate", "fresh"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Migrate(args) => assert_eq!(args.action, MigrateAction::Fresh),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_create_admin_requires_email() {
        assert!(Cli::try_parse_from(["motorbike-rental", "create-admin", "--password", "x"]).is_err());

        let cli = Cli::try_parse_from([
            "motorbike-rental",
            "create-admin",
            "--email",
            "root@example.com",
            "--password",
            "secret123",
        ])
        .unwrap();
        match cli.command {
            Commands::CreateAdmin(args) => {
                assert_eq!(args.email, "root@example.com");
                assert_eq!(args.first_name, "Admin");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
