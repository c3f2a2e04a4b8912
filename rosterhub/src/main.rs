//! rosterhub CLI - operator entry point for the file-backed store.
//!
//! Route handlers embed [`rosterhub_store::Storage`] directly; this binary is
//! for the people running them:
//!
//! 1. **`init`**: create the data directory.
//! 2. **`summary`**: list every collection file with its record count and
//!    whether the last read/write succeeded.
//! 3. **`add-user`** / **`add-team`**: seed records without going through the
//!    web layer (handy for a first admin account).
//!
//! The data directory comes from `--data-dir`, then `ROSTERHUB_DATA_DIR`, then
//! `~/.config/rosterhub/data`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rosterhub_store::persistence::{NewTeam, NewUser};
use rosterhub_store::{EntityId, EntityKind, Storage, StorageConfig};

mod report;

/// Top-level CLI arguments for rosterhub.
#[derive(Parser)]
#[command(name = "rosterhub", about = "Manage the rosterhub data directory")]
struct Cli {
    /// Data directory to use instead of the configured default.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory if it does not exist.
    Init,
    /// Show record counts and file health for every collection.
    Summary,
    /// Create a user account. Plaintext passwords are hashed before storage.
    AddUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Create a team owned by an existing user.
    AddTeam {
        #[arg(long)]
        name: String,
        /// Id of the owning user.
        #[arg(long)]
        owner: EntityId,
        /// Join code to use instead of a generated one.
        #[arg(long)]
        join_code: Option<String>,
    },
}

/// Error type for CLI operations.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("username {0:?} is already taken")]
    UsernameTaken(String),

    #[error("no user with id {0}")]
    UnknownOwner(EntityId),

    #[error("join code {0:?} is already in use")]
    JoinCodeTaken(String),

    #[error("{0} could not be written; see the log for details")]
    WriteFailed(&'static str),
}

#[tokio::main]
async fn main() -> ExitCode {
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = StorageConfig::resolve(cli.data_dir);
    let storage = Storage::open(config).await;

    match cli.command {
        Commands::Init => {
            println!("Data directory ready at {}", storage.data_dir().display());
        }
        Commands::Summary => {
            let summary = storage.collection_summary().await;
            print!("{}", report::render_summary(storage.data_dir(), &summary));
        }
        Commands::AddUser {
            username,
            password,
            full_name,
            email,
        } => {
            if storage.get_user_by_username(&username).await.is_some() {
                return Err(CliError::UsernameTaken(username).into());
            }
            let user = storage
                .create_user(NewUser {
                    username,
                    password,
                    full_name,
                    email,
                    ..Default::default()
                })
                .await;
            ensure_written(&storage, EntityKind::Users).await?;
            tracing::info!(id = user.id, username = %user.username, "Created user");
            println!("Created user {} ({})", user.id, user.username);
        }
        Commands::AddTeam {
            name,
            owner,
            join_code,
        } => {
            if storage.get_user(owner).await.is_none() {
                return Err(CliError::UnknownOwner(owner).into());
            }
            if let Some(code) = &join_code {
                if storage.get_team_by_join_code(code).await.is_some() {
                    return Err(CliError::JoinCodeTaken(code.clone()).into());
                }
            }
            let team = storage
                .create_team(NewTeam {
                    name,
                    owner_id: owner,
                    join_code,
                    ..Default::default()
                })
                .await;
            ensure_written(&storage, EntityKind::Teams).await?;
            tracing::info!(id = team.id, owner = team.owner_id, "Created team");
            println!(
                "Created team {} ({}), join code {}",
                team.id, team.name, team.join_code
            );
        }
    }

    Ok(())
}

/// Turn a swallowed write failure into a non-zero exit for the operator.
async fn ensure_written(storage: &Storage, kind: EntityKind) -> Result<(), CliError> {
    let healthy = storage
        .storage_health()
        .await
        .into_iter()
        .find(|(k, _)| *k == kind)
        .map_or(true, |(_, status)| status.save_error.is_none());
    if healthy {
        Ok(())
    } else {
        tracing::error!(entity = %kind, "Collection was not written");
        Err(CliError::WriteFailed(kind.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_team() {
        let cli = Cli::try_parse_from([
            "rosterhub",
            "--data-dir",
            "/tmp/rh",
            "add-team",
            "--name",
            "Harbor FC",
            "--owner",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/rh")));
        match cli.command {
            Commands::AddTeam {
                name,
                owner,
                join_code,
            } => {
                assert_eq!(name, "Harbor FC");
                assert_eq!(owner, 3);
                assert_eq!(join_code, None);
            }
            _ => panic!("expected add-team"),
        }
    }

    #[tokio::test]
    async fn test_add_user_rejects_duplicate_username() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_path_buf();
        let add = |username: &str| Cli {
            data_dir: Some(data_dir.clone()),
            command: Commands::AddUser {
                username: username.to_string(),
                password: "secret123".to_string(),
                full_name: "Alex Morgan".to_string(),
                email: None,
            },
        };

        run(add("alex")).await.unwrap();
        let err = run(add("alex")).await.unwrap_err();
        assert!(err.to_string().contains("already taken"));
    }

    #[tokio::test]
    async fn test_add_team_requires_existing_owner() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            data_dir: Some(dir.path().to_path_buf()),
            command: Commands::AddTeam {
                name: "Harbor FC".to_string(),
                owner: 42,
                join_code: None,
            },
        };
        let err = run(cli).await.unwrap_err();
        assert!(err.to_string().contains("no user with id 42"));
    }

    #[tokio::test]
    async fn test_add_user_fails_when_users_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.json"), "not json").unwrap();
        let cli = Cli {
            data_dir: Some(dir.path().to_path_buf()),
            command: Commands::AddUser {
                username: "alex".to_string(),
                password: "secret123".to_string(),
                full_name: "Alex Morgan".to_string(),
                email: None,
            },
        };

        let err = run(cli).await.unwrap_err();
        assert!(err.to_string().contains("users could not be written"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("users.json")).unwrap(),
            "not json"
        );
    }
}
