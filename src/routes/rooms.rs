//! Room search and catalog handlers

use axum::{
    extract::{Query, State},
    Json,
};

use crate::admin::rooms::{self, RoomView};
use crate::availability::{self, RoomAvailability, SearchQuery};
use crate::error::Result;
use crate::AppState;

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<RoomAvailability>>> {
    let (filters, stay) = query.into_parts()?;
    let results = availability::search(
        state.store.as_ref(),
        &state.cache,
        &filters,
        stay.as_ref(),
        None,
    )
    .await?;
    Ok(Json(results))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<RoomView>>> {
    let all = rooms::list_rooms(state.store.as_ref(), &state.cache).await?;
    Ok(Json(all))
}
