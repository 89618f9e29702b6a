use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use crate::config::Config;
use crate::room_hub::RoomHub;
use game_types::{CommitReply, CommitRequest, ListReply, ListRequest, MakeRoomReply, MakeRoomRequest};

pub mod client;
pub mod config;
pub mod room_hub;

fn json_body<T: DeserializeOwned + Send>(limit: u64) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(limit).and(warp::body::json())
}

fn with_hub(hub: Arc<RoomHub>) -> impl Filter<Extract = (Arc<RoomHub>,), Error = Infallible> + Clone {
    warp::any().map(move || hub.clone())
}

fn error_reply(message: &str, status: StatusCode) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(&serde_json::json!({ "error": message })), status).into_response()
}

pub fn create_routes(
    hub: Arc<RoomHub>,
    config: Config,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let limit = config.max_body_bytes;
    let list_timeout = config.list_timeout();

    // Long-poll read of a room
    let list = warp::path!("list")
        .and(warp::post())
        .and(json_body::<ListRequest>(limit))
        .and(with_hub(hub.clone()))
        .and(warp::any().map(move || list_timeout))
        .and_then(handle_list);

    // Compare-and-swap write
    let commit = warp::path!("commit")
        .and(warp::post())
        .and(json_body::<CommitRequest>(limit))
        .and(with_hub(hub.clone()))
        .and_then(handle_commit);

    let make_room = warp::path!("make_room")
        .and(warp::post())
        .and(json_body::<MakeRoomRequest>(limit))
        .and(with_hub(hub))
        .and_then(handle_make_room);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let static_files = match config.static_dir {
        Some(dir) => warp::get().and(warp::fs::dir(dir)).boxed(),
        None => warp::any()
            .and_then(|| async { Err::<warp::fs::File, warp::Rejection>(warp::reject::not_found()) })
            .boxed(),
    };

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    list.or(commit)
        .or(make_room)
        .or(health)
        .or(static_files)
        .with(cors)
        .with(warp::log("strawberry"))
}

async fn handle_list(
    request: ListRequest,
    hub: Arc<RoomHub>,
    list_timeout: Duration,
) -> Result<warp::reply::Response, warp::Rejection> {
    let waited = tokio::time::timeout(list_timeout, hub.wait_for_change(&request.room, request.version)).await;
    Ok(match waited {
        Ok(Ok(Some(latest))) => warp::reply::json(&ListReply {
            version: latest.version,
            data: latest.document,
        })
        .into_response(),
        Ok(Ok(None)) => error_reply("Room not found", StatusCode::NOT_FOUND),
        Ok(Err(err)) => {
            tracing::error!(room = %request.room, %err, "list failed");
            error_reply("Failed to read room", StatusCode::INTERNAL_SERVER_ERROR)
        }
        // nothing changed before the timeout
        Err(_) => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn handle_commit(request: CommitRequest, hub: Arc<RoomHub>) -> Result<warp::reply::Response, warp::Rejection> {
    Ok(match hub.commit(&request.room, request.version, &request.data).await {
        Ok(success) => warp::reply::json(&CommitReply { success }).into_response(),
        Err(err) => {
            tracing::error!(room = %request.room, %err, "commit failed");
            error_reply("Failed to commit room", StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
}

async fn handle_make_room(
    request: MakeRoomRequest,
    hub: Arc<RoomHub>,
) -> Result<warp::reply::Response, warp::Rejection> {
    Ok(match hub.make_room(&request.data).await {
        Ok(room) => warp::reply::json(&MakeRoomReply { room }).into_response(),
        Err(err) => {
            tracing::error!(%err, "make_room failed");
            error_reply("Failed to create room", StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
}
