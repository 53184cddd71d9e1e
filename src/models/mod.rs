pub mod admin_log;
pub mod campaign;
pub mod campaign_recipient;
pub mod credit_transaction;
pub mod user;

pub mod prelude {
    pub use super::admin_log::{self, Entity as AdminLog};
    pub use super::campaign::{self, Entity as Campaign};
    pub use super::campaign_recipient::{self, Entity as CampaignRecipient};
    pub use super::credit_transaction::{self, Entity as CreditTransaction};
    pub use super::user::{self, Entity as User};
}
