mod account_gateway;
mod monitor;

pub use account_gateway::HttpAccountGateway;
pub use monitor::ConnectivityMonitor;
