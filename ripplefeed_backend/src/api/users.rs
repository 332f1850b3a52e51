use super::{ApiError, ApiResult, AppState};
use crate::users::{CreateUserInput, UserService, UserView};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub(crate) async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let service = UserService::new(state.database.clone());
    let view = service.create_user(payload)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserView> {
    let service = UserService::new(state.database.clone());
    let view = service.get_user(&id)?;
    Ok(Json(view))
}
