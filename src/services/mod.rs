pub mod accounts;
pub mod admin_log;
pub mod bootstrap;
pub mod campaigns;
pub mod credits;
pub mod gateway;
pub mod progress;
pub mod security;

pub use campaigns::CampaignService;
pub use gateway::{BroadcastGateway, HttpGateway, SharedGateway};
pub use progress::ProgressUpdater;
pub use security::*;
