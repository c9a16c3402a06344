//! Access/entitlement resolution.
//!
//! - `types`: 输入记录与对外的 `AccessSummary`
//! - `resolver`: 权益 + 支付 + 额度 -> 摘要
//! - `dashboard`: 把摘要并入 dashboard 响应，失败时降级为 `EMPTY_ACCESS`
//! - `badge`: 摘要 -> UI 徽章与提示

pub mod badge;
pub mod dashboard;
pub mod resolver;
pub mod types;

pub use badge::*;
pub use dashboard::*;
pub use resolver::*;
pub use types::*;
