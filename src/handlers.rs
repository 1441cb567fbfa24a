use crate::{
    auth::Claims,
    error::{ApiError, ErrorBody},
    extract::{DrinkId, JsonBody},
    models::{
        CreateDrinkRequest, DeleteResponse, Drink, DrinkLong, DrinkShort, DrinksResponse, Recipe,
        UpdateDrinkRequest,
    },
    repository::RepositoryState,
};
use axum::{Json, extract::State};
use serde_json::Value;

/// Renders every drink with `view`. A row whose stored recipe no longer decodes fails the
/// whole listing.
fn render_all<T>(
    drinks: &[Drink],
    view: fn(&Drink) -> Result<T, serde_json::Error>,
) -> Result<Vec<T>, ApiError> {
    drinks
        .iter()
        .map(|drink| {
            view(drink).map_err(|e| {
                tracing::error!(drink_id = drink.id, "stored recipe is not decodable: {}", e);
                ApiError::Unprocessable
            })
        })
        .collect()
}

/// Python-style truthiness of a JSON value: `null`, `false`, `0`, `""`, `[]`, `{}` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// --- Handlers ---

/// get_drinks
///
/// [Public Route] Lists every drink in the short view (ingredient names withheld).
#[utoipa::path(
    get,
    path = "/drinks",
    responses(
        (status = 200, description = "`{success, drinks}` with short views", body = [DrinkShort]),
        (status = 422, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn get_drinks(
    State(repo): State<RepositoryState>,
) -> Result<Json<DrinksResponse<DrinkShort>>, ApiError> {
    let drinks = repo.list().await?;
    Ok(Json(DrinksResponse::new(render_all(&drinks, Drink::short)?)))
}

/// get_drinks_detail
///
/// [Permission `get:drinks-detail`] Lists every drink in the long view.
#[utoipa::path(
    get,
    path = "/drinks-detail",
    responses(
        (status = 200, description = "`{success, drinks}` with long views", body = [DrinkLong]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Permission not granted", body = ErrorBody),
        (status = 422, description = "Store failure", body = ErrorBody)
    ),
    security(("bearer" = ["get:drinks-detail"]))
)]
pub async fn get_drinks_detail(
    claims: Claims,
    State(repo): State<RepositoryState>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError> {
    tracing::debug!(sub = ?claims.sub, "listing drink details");
    let drinks = repo.list().await?;
    Ok(Json(DrinksResponse::new(render_all(&drinks, Drink::long)?)))
}

/// create_drink
///
/// [Permission `post:drinks`] Creates a drink. `title` and `recipe` are both required; the
/// recipe is normalized to its canonical list form and stored as JSON text.
#[utoipa::path(
    post,
    path = "/drinks",
    request_body = CreateDrinkRequest,
    responses(
        (status = 200, description = "`{success, drinks: [created]}`", body = [DrinkLong]),
        (status = 400, description = "Missing or malformed field", body = ErrorBody),
        (status = 422, description = "Duplicate title or store failure", body = ErrorBody)
    ),
    security(("bearer" = ["post:drinks"]))
)]
pub async fn create_drink(
    claims: Claims,
    State(repo): State<RepositoryState>,
    JsonBody(payload): JsonBody<CreateDrinkRequest>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError> {
    let title = payload.title.ok_or(ApiError::BadRequest)?;
    let recipe = payload
        .recipe
        .as_ref()
        .ok_or(ApiError::BadRequest)
        .and_then(|value| Recipe::from_request(value).ok_or(ApiError::BadRequest))?;

    let drink = repo.create(title, recipe.to_stored()).await?;
    tracing::info!(drink_id = drink.id, sub = ?claims.sub, "drink created");

    let long = drink.long().map_err(|_| ApiError::Unprocessable)?;
    Ok(Json(DrinksResponse::new(vec![long])))
}

/// patch_drink
///
/// [Permission `patch:drinks`] Partial update. A non-empty `title` replaces the title; a
/// non-empty `recipe` replaces the recipe. Every failure after the lookup is a 400.
#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    params(("id" = i32, Path, description = "Drink ID")),
    request_body = UpdateDrinkRequest,
    responses(
        (status = 200, description = "`{success, drinks: [updated]}`", body = [DrinkLong]),
        (status = 400, description = "Invalid field or store failure", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    ),
    security(("bearer" = ["patch:drinks"]))
)]
pub async fn patch_drink(
    claims: Claims,
    State(repo): State<RepositoryState>,
    DrinkId(id): DrinkId,
    JsonBody(payload): JsonBody<UpdateDrinkRequest>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError> {
    let mut drink = repo
        .find_by_id(id)
        .await
        .map_err(|_| ApiError::BadRequest)?
        .ok_or(ApiError::NotFound)?;

    if let Some(title) = payload.title.filter(|t| !t.is_empty()) {
        drink.title = title;
    }
    if let Some(value) = payload.recipe.as_ref().filter(|v| is_truthy(v)) {
        let recipe = Recipe::from_request(value).ok_or(ApiError::BadRequest)?;
        if !recipe.is_empty() {
            drink.recipe = recipe.to_stored();
        }
    }

    let updated = repo.update(&drink).await.map_err(|e| {
        tracing::error!(drink_id = id, "update failed: {}", e);
        ApiError::BadRequest
    })?;
    tracing::info!(drink_id = id, sub = ?claims.sub, "drink updated");

    let long = updated.long().map_err(|_| ApiError::BadRequest)?;
    Ok(Json(DrinksResponse::new(vec![long])))
}

/// delete_drink
///
/// [Permission `delete:drinks`] Hard delete. The store rolls back its transaction before a
/// failure reaches this handler.
#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    params(("id" = i32, Path, description = "Drink ID")),
    responses(
        (status = 200, description = "Deleted", body = DeleteResponse),
        (status = 400, description = "Store failure", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    ),
    security(("bearer" = ["delete:drinks"]))
)]
pub async fn delete_drink(
    claims: Claims,
    State(repo): State<RepositoryState>,
    DrinkId(id): DrinkId,
) -> Result<Json<DeleteResponse>, ApiError> {
    let drink = repo
        .find_by_id(id)
        .await
        .map_err(|_| ApiError::BadRequest)?
        .ok_or(ApiError::NotFound)?;

    repo.delete(&drink).await.map_err(|e| {
        tracing::error!(drink_id = id, "delete failed: {}", e);
        ApiError::BadRequest
    })?;
    tracing::info!(drink_id = id, sub = ?claims.sub, "drink deleted");

    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
