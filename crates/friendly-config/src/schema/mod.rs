//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod agent;
mod gateway;
mod logging;
mod web;

pub use agent::*;
pub use gateway::*;
pub use logging::*;
pub use web::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    pub gateway: GatewayConfig,
    pub agent: PersonaConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}
