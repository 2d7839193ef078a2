use actix_web::{App, HttpServer, web};
use log::info;
use serenity::all::{Client, GatewayIntents};
use std::sync::Arc;

use halving_bot::api::{self, AppState};
use halving_bot::blockchain::{BlockCypherClient, BlockStore};
use halving_bot::bot::{Handler, HttpAssets};
use halving_bot::config::BotConfig;
use halving_bot::scheduler::Scheduler;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = Arc::new(BotConfig::from_env()?);

    println!("₿ Starting halving bot (store: {})", config.data_file.display());

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let store = Arc::new(BlockStore::new(config.data_file.clone()));
    let source = Arc::new(BlockCypherClient::with_client(
        http.clone(),
        config.explorer_url.clone(),
        config.explorer_token.clone(),
    ));
    let scheduler = Scheduler::new(
        config.clone(),
        store.clone(),
        source,
        Arc::new(HttpAssets::new(http)),
    );

    let mut client = Client::builder(&config.discord_token, GatewayIntents::GUILDS)
        .event_handler(Handler::new(scheduler))
        .await?;

    if !config.status_api_enabled {
        client.start().await?;
        return Ok(());
    }

    info!("API - status endpoint at http://{}:{}", config.host, config.port);
    let state = web::Data::new(AppState {
        store,
        params: config.halving_params(),
    });
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    tokio::select! {
        r = client.start() => r?,
        r = server => r?,
    }
    Ok(())
}
