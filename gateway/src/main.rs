//! Gateway entry-point: checks the configured session and reports what the
//! account holds upstream.

use std::env;

use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use recipe_gateway::GatewaySettings;
use recipe_gateway::bootstrap::{build_gateway, build_transport};
use recipe_gateway::domain::ListQuery;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GatewaySettings::load_from_iter(env::args_os())
        .map_err(|error| eyre!("failed to load configuration: {error}"))?;
    let transport = build_transport(&settings).wrap_err("failed to build transport")?;
    let gateway = build_gateway(&settings, transport).wrap_err("failed to build gateway")?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    if !gateway.validate_session(&cancel).await? {
        return Err(eyre!("upstream rejected the configured account"));
    }

    let user = gateway.fetch_user(&cancel).await?;
    let recipes = gateway.list_recipes(ListQuery::all(), &cancel).await?;
    let collections = gateway.list_collections(ListQuery::all(), &cancel).await?;
    info!(
        username = %user.username,
        recipes = recipes.total,
        collections = collections.total,
        "upstream session is usable"
    );
    Ok(())
}
