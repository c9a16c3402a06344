pub mod concepts;
pub mod entitlements;
pub mod payments;
pub mod policy_level_up;
pub mod session_bundles;
pub mod sessions;
pub mod user_concept_status;
pub mod user_level_history;
pub mod users;

pub use concepts as concept_entity;
pub use entitlements as entitlement_entity;
pub use payments as payment_entity;
pub use policy_level_up as policy_level_up_entity;
pub use session_bundles as session_bundle_entity;
pub use sessions as session_entity;
pub use user_concept_status as user_concept_status_entity;
pub use user_level_history as user_level_history_entity;
pub use users as user_entity;
pub use users::UserRole;
