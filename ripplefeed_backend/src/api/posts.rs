use super::{ApiError, ApiResult, AppState, AuthedUser, MaybeUser};
use crate::engagement::{EngagementService, SubjectPath};
use crate::posts::{CreatePostInput, PostService, UpdatePostInput};
use crate::views::{LikeView, PostView};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct CommentBody {
    content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyBody {
    content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LikesResponse {
    likes: Vec<LikeView>,
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Json(payload): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let service = PostService::new(state.database.clone());
    let view = service.create_post(&identity, payload)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
) -> ApiResult<Vec<PostView>> {
    let service = PostService::new(state.database.clone());
    let views = service.list_posts(identity.as_ref())?;
    Ok(Json(views))
}

pub(crate) async fn get_post(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    let service = PostService::new(state.database.clone());
    let view = service.get_post(&id, identity.as_ref())?;
    Ok(Json(view))
}

pub(crate) async fn update_post(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePostInput>,
) -> ApiResult<PostView> {
    let service = PostService::new(state.database.clone());
    let view = service.update_post(&id, &identity, payload)?;
    Ok(Json(view))
}

pub(crate) async fn delete_post(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = PostService::new(state.database.clone());
    service.delete_post(&id, &identity)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn toggle_post_like(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<String>,
) -> ApiResult<LikesResponse> {
    let service = EngagementService::new(state.database.clone());
    let likes = service.toggle_like(&SubjectPath::post(id), &identity)?;
    Ok(Json(LikesResponse { likes }))
}

pub(crate) async fn get_post_likes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<LikesResponse> {
    let service = EngagementService::new(state.database.clone());
    let likes = service.likes(&SubjectPath::post(id))?;
    Ok(Json(LikesResponse { likes }))
}

pub(crate) async fn add_comment(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<String>,
    Json(payload): Json<CommentBody>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let service = EngagementService::new(state.database.clone());
    let view = service.add_comment(&id, &identity, &payload.content)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn toggle_comment_like(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<LikesResponse> {
    let service = EngagementService::new(state.database.clone());
    let likes = service.toggle_like(&SubjectPath::comment(id, comment_id), &identity)?;
    Ok(Json(LikesResponse { likes }))
}

pub(crate) async fn get_comment_likes(
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<LikesResponse> {
    let service = EngagementService::new(state.database.clone());
    let likes = service.likes(&SubjectPath::comment(id, comment_id))?;
    Ok(Json(LikesResponse { likes }))
}

pub(crate) async fn add_reply(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path((id, comment_id)): Path<(String, String)>,
    Json(payload): Json<ReplyBody>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let service = EngagementService::new(state.database.clone());
    let view = service.add_reply(&id, &comment_id, &identity, &payload.content)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn toggle_reply_like(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path((id, comment_id, reply_id)): Path<(String, String, String)>,
) -> ApiResult<LikesResponse> {
    let service = EngagementService::new(state.database.clone());
    let likes = service.toggle_like(&SubjectPath::reply(id, comment_id, reply_id), &identity)?;
    Ok(Json(LikesResponse { likes }))
}

pub(crate) async fn get_reply_likes(
    State(state): State<AppState>,
    Path((id, comment_id, reply_id)): Path<(String, String, String)>,
) -> ApiResult<LikesResponse> {
    let service = EngagementService::new(state.database.clone());
    let likes = service.likes(&SubjectPath::reply(id, comment_id, reply_id))?;
    Ok(Json(LikesResponse { likes }))
}
