mod blocks;
mod halving;
mod health;
pub mod models;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(halving::get_halving)
            .service(blocks::get_blocks),
    );
}
