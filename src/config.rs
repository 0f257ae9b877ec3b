use crate::catalog::CatalogIdentity;
use crate::storage::{DurabilityMode, FileStoreOptions};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "dataset-catalog")]
#[command(about = "Governed dataset catalog over an indexed entity store")]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub identity: IdentityConfig,

    #[command(flatten)]
    pub serve: ServeConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// `serve` when no subcommand was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve,
    /// Compare every entity index with the stored records.
    CheckIndex {
        /// Add unindexed records and drop phantom ids.
        #[arg(long)]
        repair: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Directory for the write-ahead log and snapshot. In-memory store when unset.
    #[arg(long, env = "CATALOG_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, env = "CATALOG_DURABILITY", default_value_t = DurabilityMode::Sync, global = true)]
    pub durability: DurabilityMode,

    /// Log entries accumulated before a snapshot is written.
    #[arg(long, env = "CATALOG_CHECKPOINT_EVERY", default_value_t = 1000, global = true)]
    pub checkpoint_every: usize,
}

impl StoreConfig {
    pub fn file_options(&self) -> FileStoreOptions {
        FileStoreOptions {
            durability: self.durability,
            checkpoint_every: self.checkpoint_every,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct IdentityConfig {
    /// Acting requester for access requests and downloads.
    #[arg(long, env = "CATALOG_CURRENT_USER", default_value = "user-4", global = true)]
    pub current_user: String,

    /// Author of administrative audit entries.
    #[arg(long, env = "CATALOG_ADMIN_USER", default_value = "user-1", global = true)]
    pub admin_user: String,

    /// Owner assigned to new datasets.
    #[arg(long, env = "CATALOG_OWNER_USER", default_value = "user-2", global = true)]
    pub owner_user: String,
}

impl From<IdentityConfig> for CatalogIdentity {
    fn from(config: IdentityConfig) -> Self {
        Self {
            current_user_id: config.current_user,
            admin_user_id: config.admin_user,
            owner_user_id: config.owner_user,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    #[arg(long, env = "CATALOG_HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    #[arg(long, env = "CATALOG_PORT", default_value_t = 8080, global = true)]
    pub port: u16,
}

impl ServeConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_seeded_identities() {
        let cli = Cli::try_parse_from(["dataset-catalog"]).unwrap();
        assert!(cli.store.data_dir.is_none());
        assert_eq!(cli.store.durability, DurabilityMode::Sync);
        assert_eq!(cli.store.checkpoint_every, 1000);

        let identity = CatalogIdentity::from(cli.identity.clone());
        assert_eq!(identity, CatalogIdentity::default());
    }

    #[test]
    fn check_index_accepts_store_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "dataset-catalog",
            "check-index",
            "--repair",
            "--data-dir",
            "/var/lib/catalog",
            "--durability",
            "async",
        ])
        .unwrap();

        assert!(matches!(cli.command(), Command::CheckIndex { repair: true }));
        assert_eq!(cli.store.data_dir, Some(PathBuf::from("/var/lib/catalog")));
        assert_eq!(cli.store.durability, DurabilityMode::Async);
    }

    #[test]
    fn serve_reads_host_and_port() {
        let cli =
            Cli::try_parse_from(["dataset-catalog", "serve", "--host", "127.0.0.1", "--port", "9000"])
                .unwrap();
        assert!(matches!(cli.command(), Command::Serve));
        assert_eq!(cli.serve.address(), "127.0.0.1:9000");
    }

    #[test]
    fn bare_invocation_serves_on_the_declared_defaults() {
        let cli = Cli::try_parse_from(["dataset-catalog", "--port", "9100"]).unwrap();
        assert!(matches!(cli.command(), Command::Serve));
        assert_eq!(cli.serve.port, 9100);

        let cli = Cli::try_parse_from(["dataset-catalog"]).unwrap();
        assert!(matches!(cli.command(), Command::Serve));
        if std::env::var_os("CATALOG_HOST").is_none() && std::env::var_os("CATALOG_PORT").is_none() {
            assert_eq!(cli.serve.address(), "0.0.0.0:8080");
        }
    }
}
