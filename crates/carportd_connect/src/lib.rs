//! Vendor-neutral seam between carportd and a connected-car account.
//!
//! The daemon talks to the account exclusively through [`VehicleGateway`];
//! the crate ships the data model, the trait, and [`SimulatedGateway`], an
//! in-memory implementation used for development and tests. Clients for the
//! real vendor API implement the same trait and plug in unchanged.

mod gateway;
mod model;
mod simulated;

pub use gateway::ChargeSpeed;
pub use gateway::ControlOperation;
pub use gateway::GatewayError;
pub use gateway::VehicleGateway;
pub use model::Vehicle;
pub use model::scalar_str;
pub use model::unwrap_value;
pub use simulated::FleetFileError;
pub use simulated::IssuedCommand;
pub use simulated::SimulatedGateway;
pub use simulated::demo_fleet;
