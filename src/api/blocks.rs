use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BlocksResponse};

/// Records currently held by the block store, oldest first.
#[get("/blocks/")]
pub async fn get_blocks(state: web::Data<AppState>) -> impl Responder {
    let blocks = state.store.load();
    HttpResponse::Ok().json(BlocksResponse {
        length: blocks.len(),
        blocks,
    })
}
