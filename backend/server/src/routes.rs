use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{self, Path, Query},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use proximity::{SearchRequest, SearchResult};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    auth::{CurrentUser, hash_password, verify_password},
    database::{LocationId, SavedLocation},
    error::AppError,
    state::State,
    utils::{check_credentials, clean_description, to_point},
};

#[derive(Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub struct AroundParams {
    latitude: f64,
    longitude: f64,
    radius: Option<i64>,
}

#[derive(Deserialize)]
pub struct SaveLocationForm {
    latitude: f64,
    longitude: f64,
    description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDescriptionForm {
    new_description: String,
}

pub async fn register_handler(
    extract::State(state): extract::State<Arc<State>>,
    Form(form): Form<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    check_credentials(&form.username, &form.password)?;

    let password_hash = hash_password(&form.password)?;
    let user = state
        .store
        .create_user(&form.username, &password_hash)
        .await?
        .ok_or(AppError::UsernameTaken)?;

    info!("Registered user {}", user.id);

    Ok(Redirect::to("/login"))
}

pub async fn login_handler(
    extract::State(state): extract::State<Arc<State>>,
    jar: CookieJar,
    Form(form): Form<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user(&form.username)
        .await?
        .filter(|user| verify_password(&form.password, &user.password_hash))
        .ok_or(AppError::InvalidCredentials)?;

    debug!("User {} logged in", user.id);

    Ok((
        jar.add(state.sessions.cookie(user.id)),
        Redirect::to(&state.config.redirect_url),
    ))
}

pub async fn around_handler(
    extract::State(state): extract::State<Arc<State>>,
    Query(params): Query<AroundParams>,
) -> Result<Json<SearchResult>, AppError> {
    let request = SearchRequest::new(params.latitude, params.longitude, params.radius)?;

    let result = state.shelters.search(request).await?;

    debug!(
        "{} shelters within {}m of ({}, {})",
        result.shelters.len(),
        result.center.radius,
        result.center.lat,
        result.center.lon
    );

    Ok(Json(result))
}

pub async fn save_location_handler(
    extract::State(state): extract::State<Arc<State>>,
    CurrentUser(user_id): CurrentUser,
    Form(form): Form<SaveLocationForm>,
) -> Result<Json<Value>, AppError> {
    let point = to_point(form.latitude, form.longitude)?;
    let description = clean_description(form.description)?;

    let location = state
        .store
        .save_location(user_id, point, description)
        .await?;

    Ok(Json(json!({
        "message": "Location saved",
        "location_id": location.id,
        "user_id": user_id,
        "latitude": location.lat,
        "longitude": location.lon,
        "description": location.description,
    })))
}

pub async fn get_locations_handler(
    extract::State(state): extract::State<Arc<State>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<SavedLocation>>, AppError> {
    Ok(Json(state.store.list_locations(user_id).await?))
}

pub async fn delete_location_handler(
    extract::State(state): extract::State<Arc<State>>,
    CurrentUser(user_id): CurrentUser,
    Path(location_id): Path<LocationId>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_location(user_id, location_id).await? {
        return Err(AppError::LocationNotFound);
    }

    Ok(Json(json!({
        "message": "Location deleted",
        "location_id": location_id,
    })))
}

pub async fn update_description_handler(
    extract::State(state): extract::State<Arc<State>>,
    CurrentUser(user_id): CurrentUser,
    Path(location_id): Path<LocationId>,
    Form(form): Form<UpdateDescriptionForm>,
) -> Result<impl IntoResponse, AppError> {
    let description = clean_description(Some(form.new_description))?;

    state
        .store
        .update_description(user_id, location_id, description)
        .await?
        .ok_or(AppError::LocationNotFound)?;

    Ok(Redirect::to(&state.config.redirect_url))
}
