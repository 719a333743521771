pub mod attribution;
pub mod session;
pub mod spend;

pub use attribution::{AttributionResult, Touch};
pub use session::Session;
pub use spend::{CampaignSpend, CpaRow};
