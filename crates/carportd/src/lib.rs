pub mod api;
pub mod config;
mod engine;
pub mod integrations;

pub use config::Config;
pub use config::LogLevel;
pub use engine::Device;
pub use engine::Engine;
pub use engine::EntityDescriptor;
pub use engine::Integration;
pub use engine::Platform;
pub use engine::State;
pub use engine::SwitchState;
