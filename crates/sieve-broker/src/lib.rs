pub mod broker;
pub mod config;
pub mod controller;

pub use broker::{BrokerEndpoint, BrokerError, BrokerUnderTest, ReadySignal};
pub use config::BrokerConfig;
pub use controller::{BrokerController, ControllerError};
