pub mod dashboard;
pub mod entitlement;
pub mod health;
pub mod learn;

pub use dashboard::dashboard_config;
pub use entitlement::entitlement_config;
pub use health::health_config;
pub use learn::learn_config;
