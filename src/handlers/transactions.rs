//! Transaction log handlers

use axum::{extract::State, Json};

use crate::{AppState, AppResult};
use crate::models::Transaction;

/// List every stored transaction in insertion order
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Transaction>>> {
    let transactions = state.store.list().await?;
    Ok(Json(transactions))
}
