//! routes/rooms.rs: room CRUD
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::{error::AppResult, state::Rooms};

#[derive(Serialize)]
struct RoomJson {
    name: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list))
        .route("/:name", post(create).get(show).delete(remove))
}

async fn list(Extension(rooms): Extension<Rooms>) -> Json<Vec<String>> {
    Json(rooms.names().await)
}

async fn create(
    Extension(rooms): Extension<Rooms>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let room = rooms.create(&name).await?;
    Ok((StatusCode::CREATED, Json(RoomJson { name: room.name().to_owned() })))
}

async fn show(
    Extension(rooms): Extension<Rooms>,
    Path(name): Path<String>,
) -> AppResult<Json<RoomJson>> {
    let room = rooms.get(&name).await?;
    Ok(Json(RoomJson { name: room.name().to_owned() }))
}

async fn remove(
    Extension(rooms): Extension<Rooms>,
    Path(name): Path<String>,
) -> AppResult<Json<RoomJson>> {
    let room = rooms.delete(&name).await?;
    Ok(Json(RoomJson { name: room.name().to_owned() }))
}
