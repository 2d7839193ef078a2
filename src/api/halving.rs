use actix_web::{HttpResponse, Responder, get, web};
use chrono::Utc;

use super::models::{AppState, HalvingResponse};
use crate::halving::{Countdown, HalvingEstimate};

/// Current halving estimate, computed the same way as the presence text.
#[get("/halving/")]
pub async fn get_halving(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now();
    let records = state.store.load();
    let Some(est) = HalvingEstimate::observed(&records, now, &state.params) else {
        return HttpResponse::ServiceUnavailable().body("no block data available");
    };

    HttpResponse::Ok().json(HalvingResponse {
        height: est.height,
        blocks_remaining: est.blocks_remaining,
        average_block_time_secs: est.average_block_time.num_seconds(),
        halving_date: est.eta,
        remaining_secs: est.remaining_seconds(),
        countdown: Countdown::between(now, est.eta).to_string(),
    })
}
