use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::Authenticated;
use crate::schemas::{CampaignResponse, CreateCampaignRequest, CreateCampaignResponse, PageQuery};
use crate::state::AppState;

/// Campaign routes for the calling user
pub fn campaign_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_campaigns).post(create_campaign))
        .route("/{campaign_id}", get(get_campaign))
        .with_state(state)
}

/// Submit a campaign: reserve credits, send to the gateway, settle
async fn create_campaign(
    State(state): State<AppState>,
    caller: Authenticated,
    payload: std::result::Result<Json<CreateCampaignRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateCampaignResponse>)> {
    let Json(request) = payload?;

    let receipt = state.campaigns.submit(caller.user_id(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateCampaignResponse {
            message: format!(
                "Campaign submitted to {} recipient{}",
                receipt.recipients,
                if receipt.recipients == 1 { "" } else { "s" }
            ),
            campaign_id: receipt.campaign_id,
            status: "success",
        }),
    ))
}

async fn list_campaigns(
    State(state): State<AppState>,
    caller: Authenticated,
    page: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<CampaignResponse>>> {
    let Query(page) = page?;
    let (skip, limit) = page.bounds();
    let campaigns = state
        .campaigns
        .list_for_user(caller.user_id(), skip, limit)
        .await?;

    Ok(Json(campaigns.into_iter().map(CampaignResponse::from).collect()))
}

async fn get_campaign(
    State(state): State<AppState>,
    caller: Authenticated,
    campaign_id: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<CampaignResponse>> {
    let Path(campaign_id) = campaign_id?;
    let (campaign, recipients) = state
        .campaigns
        .find_for_user(caller.user_id(), &campaign_id)
        .await?;

    Ok(Json(CampaignResponse::from(campaign).with_recipients(recipients)))
}
