use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dataset_catalog::catalog::{AccessRequest, AuditLog, CatalogService, Dataset, User};
use dataset_catalog::config::{Cli, Command, ServeConfig, StoreConfig};
use dataset_catalog::entity::{IndexReport, IndexedEntity, IndexedRecord};
use dataset_catalog::storage::{FileRecordStore, MemoryRecordStore, SharedStore};
use dataset_catalog::web::{AppState, build_router};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let (store, durable) = open_store(&cli.store)?;

    match cli.command() {
        Command::Serve => {
            let catalog = CatalogService::new(store, cli.identity.clone().into());
            run_server(catalog, &cli.serve).await?;
        }
        Command::CheckIndex { repair } => {
            check_indexes(&store, repair).await?;
        }
    }

    if let Some(durable) = durable {
        durable
            .checkpoint()
            .await
            .context("failed to checkpoint record store")?;
        info!(data_dir = %durable.data_dir().display(), "record store checkpointed");
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dataset_catalog=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_store(config: &StoreConfig) -> Result<(SharedStore, Option<Arc<FileRecordStore>>)> {
    match &config.data_dir {
        Some(dir) => {
            let durable = Arc::new(
                FileRecordStore::open(dir, config.file_options())
                    .with_context(|| format!("failed to open record store in {}", dir.display()))?,
            );
            info!(
                data_dir = %dir.display(),
                durability = %config.durability,
                "using durable record store"
            );
            let store: SharedStore = durable.clone();
            Ok((store, Some(durable)))
        }
        None => {
            warn!("no data directory configured, records live in memory only");
            Ok((Arc::new(MemoryRecordStore::new()), None))
        }
    }
}

async fn run_server(catalog: CatalogService, config: &ServeConfig) -> Result<()> {
    let app = build_router(AppState::new(catalog));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "dataset catalog started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("dataset catalog stopped");
    Ok(())
}

async fn check_indexes(store: &SharedStore, repair: bool) -> Result<()> {
    let reports = [
        check_index::<User>(store, repair).await?,
        check_index::<Dataset>(store, repair).await?,
        check_index::<AccessRequest>(store, repair).await?,
        check_index::<AuditLog>(store, repair).await?,
    ];

    let drifted = reports.iter().filter(|report| !report.is_consistent()).count();
    if drifted > 0 && !repair {
        bail!("{drifted} index(es) out of sync with stored records; rerun with --repair");
    }
    Ok(())
}

async fn check_index<T: IndexedRecord>(store: &SharedStore, repair: bool) -> Result<IndexReport> {
    let checked = if repair {
        IndexedEntity::<T>::repair_index(store).await
    } else {
        IndexedEntity::<T>::inspect_index(store).await
    };
    let report =
        checked.with_context(|| format!("failed to check index '{}'", T::INDEX_NAME))?;

    if report.is_consistent() {
        info!(index = T::INDEX_NAME, "index consistent");
    } else {
        warn!(
            index = T::INDEX_NAME,
            unindexed = ?report.unindexed,
            phantom = ?report.phantom,
            repaired = repair,
            "index drift found"
        );
    }
    Ok(report)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
