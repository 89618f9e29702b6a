#![allow(dead_code)]

use std::sync::Arc;

use game_persistence::MemoryRoomStore;
use game_server::config::{Config, StoreBackend};
use game_server::create_routes;
use game_server::room_hub::RoomHub;
use game_types::{RoomDocument, StartingPhase, StartingPlayer};
use serde::Serialize;
use warp::Filter;
use warp::http::Response;
use warp::hyper::body::Bytes;

pub fn test_config() -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        list_timeout_seconds: 1,
        max_body_bytes: 16 * 1024,
        ..Config::default()
    }
}

/// A hub on a fresh in-memory store plus the full route tree in front of it.
pub fn create_test_app() -> (
    Arc<RoomHub>,
    impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone + Send + Sync + 'static,
) {
    let hub = Arc::new(RoomHub::new(Arc::new(MemoryRoomStore::new())));
    let routes = create_routes(hub.clone(), test_config());
    (hub, routes)
}

pub async fn post_json<F, B>(routes: &F, path: &str, body: &B) -> Response<Bytes>
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
    B: Serialize,
{
    warp::test::request().method("POST").path(path).json(body).reply(routes).await
}

pub fn lobby(names: &[&str]) -> RoomDocument {
    RoomDocument::Start(StartingPhase {
        word_length: 5,
        players: names
            .iter()
            .map(|name| StartingPlayer {
                name: name.to_string(),
                word: None,
            })
            .collect(),
    })
}
