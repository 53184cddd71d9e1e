use crate::config::campaigns::CampaignsConfig;
use crate::config::Config;
use crate::db::DbConn;
use crate::middleware::RateLimiter;
use crate::services::campaigns::CampaignService;
use crate::services::gateway::SharedGateway;
use crate::services::progress::ProgressUpdater;
use crate::services::security::TokenService;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub tokens: TokenService,
    pub campaigns: CampaignService,
    pub progress: ProgressUpdater,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        db: DbConn,
        tokens: TokenService,
        gateway: SharedGateway,
        campaigns_config: CampaignsConfig,
        rate_limiter: RateLimiter,
    ) -> Self {
        let progress = ProgressUpdater::new(db.clone(), campaigns_config);
        let campaigns = CampaignService::new(db.clone(), gateway, progress.clone());

        Self {
            db,
            tokens,
            campaigns,
            progress,
            rate_limiter,
        }
    }

    /// Wire everything from the loaded configuration
    pub fn from_config(db: DbConn, config: &Config, gateway: SharedGateway) -> Self {
        Self::new(
            db,
            TokenService::from_config(&config.auth),
            gateway,
            config.campaigns.clone(),
            RateLimiter::new(config.rate_limit.clone(), config.server.trust_proxy),
        )
    }
}
