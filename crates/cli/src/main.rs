use anyhow::Context;
use clap::{Parser, Subcommand};
use libris::{
    app,
    modules::users::{models::CreateUser, service::create_user},
    AppState,
};
use libris_kernel::Settings;

#[derive(Debug, Parser)]
#[command(name = "libris-cli", version, about = "Operate a libris deployment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations and serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Create an account directly in the store, e.g. the first librarian
    AddUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "LIBRARIAN")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry);
    settings.validate()?;

    match cli.command {
        Command::Serve => app::serve(settings).await,
        Command::Migrate => {
            let state = AppState::from_settings(&settings)?;
            let registry = app::build_registry(&state)?;
            app::migrate(&state.store, &registry)?;
            Ok(())
        }
        Command::AddUser {
            username,
            password,
            role,
        } => {
            let state = AppState::from_settings(&settings)?;
            let registry = app::build_registry(&state)?;
            app::migrate(&state.store, &registry)?;

            let input = CreateUser {
                username: Some(username),
                password: Some(password),
                role: Some(role),
            };
            let user = state
                .run(move |s| create_user(&s.store, &s.hasher, input))
                .await
                .context("failed to create user")?;
            tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "user added");
            println!("{}", user.id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_user_defaults_to_librarian() {
        let cli = Cli::try_parse_from([
            "libris-cli",
            "add-user",
            "--username",
            "root",
            "--password",
            "changeme",
        ])
        .unwrap();
        match cli.command {
            Command::AddUser { username, role, .. } => {
                assert_eq!(username, "root");
                assert_eq!(role, "LIBRARIAN");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn add_user_requires_credentials() {
        assert!(Cli::try_parse_from(["libris-cli", "add-user", "--username", "root"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["libris-cli"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["libris-cli", "migrate"]).unwrap().command,
            Command::Migrate
        ));
    }
}
