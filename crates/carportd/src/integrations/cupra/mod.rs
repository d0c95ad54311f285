mod button;
mod capability;
mod config;
#[allow(clippy::module_inception)]
mod cupra;
mod status;
mod switch;

use std::sync::Arc;

use anyhow::Context;
use carportd_connect::SimulatedGateway;
use carportd_connect::demo_fleet;
pub use config::Config as CupraConfig;
pub use cupra::CupraIntegration;
use linkme::distributed_slice;
use tracing::info;

use crate::engine;

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_cupra(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    let cupra_config = if let Some(c) = &ctx.config.integrations.cupra {
        c
    } else {
        return Ok(None);
    };

    if !cupra_config.enabled {
        return Ok(None);
    }

    info!("Initializing CUPRA integration");
    let gateway = match &cupra_config.fleet_file {
        Some(path) => SimulatedGateway::from_fleet_file(path)
            .with_context(|| format!("Failed to load fleet file {}", path.display()))?,
        None => SimulatedGateway::new(demo_fleet()),
    };

    Ok(Some(Box::new(CupraIntegration::new(
        Arc::new(gateway),
        cupra_config,
    ))))
}
