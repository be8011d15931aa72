mod types;

pub use types::{GatewayConfig, ProbeConfig};
