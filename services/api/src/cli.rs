use crate::server;
use clap::{Args, Parser, Subcommand};
use zuhaush::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "zuhaush",
    about = "Run the Zuhaush real-estate marketplace API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Seed a super admin, then start the HTTP service
    CreateAdmin(CreateAdminArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

/// The store lives in process memory, so the admin is created by the serving process.
#[derive(Args, Debug)]
pub(crate) struct CreateAdminArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: String,
    #[arg(long, default_value = "Super Admin")]
    pub(crate) name: String,
    #[command(flatten)]
    pub(crate) serve: ServeArgs,
}

/// Super admin seeded before the listener opens.
#[derive(Debug, Clone)]
pub(crate) struct AdminSeed {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) name: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, None).await,
        Command::CreateAdmin(args) => {
            let seed = AdminSeed {
                email: args.email,
                password: args.password,
                name: args.name,
            };
            server::run(args.serve, Some(seed)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["zuhaush"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_admin_accepts_serve_overrides() {
        let cli = Cli::try_parse_from([
            "zuhaush",
            "create-admin",
            "--email",
            "root@zuhaush.com",
            "--password",
            "s3cret-pass",
            "--port",
            "8080",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::CreateAdmin(args)) => {
                assert_eq!(args.email, "root@zuhaush.com");
                assert_eq!(args.name, "Super Admin");
                assert_eq!(args.serve.port, Some(8080));
                assert!(args.serve.host.is_none());
            }
            other => panic!("expected create-admin, got {other:?}"),
        }
    }

    #[test]
    fn create_admin_requires_credentials() {
        assert!(Cli::try_parse_from(["zuhaush", "create-admin", "--email", "a@b.co"]).is_err());
    }
}
