//! Command execution.

use serde_json::{json, Value};
use tracing::info;

use tappal_access::{Tappal, TappalStatus};
use tappal_routing::{
    Fixture, FixtureError, FixtureStores, OfficerDirectory, RoutingConfig, RoutingError,
    RoutingService, Session, TappalStore,
};

use crate::args::{Args, Command};

/// Credential presented by CLI sessions.
const CLI_TOKEN: &str = "tappal-cli";

/// Error types for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Unknown officer: {0}")]
    UnknownOfficer(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run one command against the fixture named in `args`.
///
/// Returns the JSON document to print. With `--save`, mutating commands
/// write the resulting state back to the fixture.
pub async fn run(args: &Args, config: RoutingConfig) -> Result<Value, CliError> {
    let stores = Fixture::load(&args.fixtures)?.into_stores()?;
    let service = RoutingService::new(
        stores.store.clone(),
        stores.directory.clone(),
        stores.comments.clone(),
    )
    .with_config(config);

    let output = execute(&service, &stores, &args.command).await?;

    if args.save && args.command.mutates() {
        Fixture::capture(&stores).await?.save(&args.fixtures)?;
        info!(path = %args.fixtures.display(), "Saved fixture");
    }

    Ok(output)
}

async fn execute(
    service: &RoutingService,
    stores: &FixtureStores,
    command: &Command,
) -> Result<Value, CliError> {
    match command {
        Command::Access { officer, tappal } => {
            let session = sign_in(stores, officer).await?;
            Ok(serde_json::to_value(service.open(&session, tappal).await?)?)
        }

        Command::History { tappal } => {
            let history = stores
                .store
                .history(tappal)
                .await
                .map_err(RoutingError::from)?;
            let chain = match stores.store.verify_history(tappal).await {
                Ok(()) => json!({ "intact": true }),
                Err(e) => json!({ "intact": false, "error": e.to_string() }),
            };
            Ok(json!({ "tappal_id": tappal, "chain": chain, "movements": history }))
        }

        Command::Targets { officer, tappal } => {
            let session = sign_in(stores, officer).await?;
            let tappal = load(stores, tappal).await?;
            let targets = service.forward_targets(&session, &tappal).await?;
            Ok(serde_json::to_value(targets)?)
        }

        Command::Forward {
            officer,
            tappal,
            to,
            reason,
        } => {
            let session = sign_in(stores, officer).await?;
            let tappal = load(stores, tappal).await?;
            let outcome = service.forward(&session, &tappal, to, reason).await?;
            Ok(serde_json::to_value(outcome)?)
        }

        Command::Transition {
            officer,
            tappal,
            status,
            reason,
        } => {
            let target =
                TappalStatus::parse(status).ok_or_else(|| CliError::UnknownStatus(status.clone()))?;
            let session = sign_in(stores, officer).await?;
            let tappal = load(stores, tappal).await?;
            let outcome = service.transition(&session, &tappal, target, reason).await?;
            Ok(serde_json::to_value(outcome)?)
        }

        Command::Comment {
            officer,
            tappal,
            body,
        } => {
            let session = sign_in(stores, officer).await?;
            let tappal = load(stores, tappal).await?;
            let comment = service.add_comment(&session, &tappal, body).await?;
            Ok(serde_json::to_value(comment)?)
        }
    }
}

async fn sign_in(stores: &FixtureStores, officer_id: &str) -> Result<Session, CliError> {
    let officer = stores
        .directory
        .lookup(officer_id)
        .await
        .map_err(RoutingError::from)?
        .ok_or_else(|| CliError::UnknownOfficer(officer_id.to_string()))?;
    Ok(Session::new(officer, CLI_TOKEN))
}

async fn load(stores: &FixtureStores, tappal_id: &str) -> Result<Tappal, CliError> {
    stores
        .store
        .load(tappal_id)
        .await
        .map_err(RoutingError::from)?
        .ok_or_else(|| RoutingError::NotFound(tappal_id.to_string()).into())
}
