pub mod access_service;
pub mod dashboard_service;
pub mod quota_service;

pub use access_service::*;
pub use dashboard_service::*;
pub use quota_service::*;
