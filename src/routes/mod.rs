use axum::Router;

pub mod rooms;
pub mod theater;
pub mod ws;

#[cfg(test)]
mod loopback;

pub fn router() -> Router {
    Router::new()
        .nest("/rooms", rooms::router().merge(ws::router()))
        .merge(theater::router())
}
