use super::{ApiResponse, AppState, WebResult};
use crate::catalog::{
    AccessRequestPayload, AccessRequestWithDataset, AccessRequestWithRequestor, AuditLogWithUser,
    Dataset, DatasetUpdate, DownloadLink, Message, NewDataset, NewUser, User, UserPatch,
};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

type JsonBody<T> = Result<Json<T>, JsonRejection>;

pub async fn healthcheck() -> Json<ApiResponse<Message>> {
    Json(ApiResponse::ok(Message::new("ok")))
}

// ----------------------------------------------------------------------
// Datasets
// ----------------------------------------------------------------------

pub async fn list_datasets(State(state): State<AppState>) -> WebResult<Vec<Dataset>> {
    let datasets = state.catalog.list_datasets().await?;
    Ok(Json(ApiResponse::ok(datasets)))
}

pub async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Dataset> {
    let dataset = state.catalog.get_dataset(&id).await?;
    Ok(Json(ApiResponse::ok(dataset)))
}

pub async fn create_dataset(
    State(state): State<AppState>,
    payload: JsonBody<NewDataset>,
) -> WebResult<Dataset> {
    let Json(payload) = payload?;
    let created = state.catalog.create_dataset(payload).await?;
    Ok(Json(ApiResponse::ok(created)))
}

pub async fn update_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: JsonBody<DatasetUpdate>,
) -> WebResult<Dataset> {
    let Json(update) = payload?;
    let updated = state.catalog.update_dataset(&id, update).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

pub async fn download_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<DownloadLink> {
    let link = state.catalog.download_dataset(&id).await?;
    Ok(Json(ApiResponse::ok(link)))
}

// ----------------------------------------------------------------------
// Access requests
// ----------------------------------------------------------------------

pub async fn request_access(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
    payload: JsonBody<AccessRequestPayload>,
) -> WebResult<Message> {
    let Json(payload) = payload?;
    let message = state.catalog.request_access(&dataset_id, payload).await?;
    Ok(Json(ApiResponse::ok(message)))
}

pub async fn pending_access_requests(
    State(state): State<AppState>,
) -> WebResult<Vec<AccessRequestWithRequestor>> {
    let requests = state.catalog.pending_access_requests().await?;
    Ok(Json(ApiResponse::ok(requests)))
}

pub async fn my_requests(
    State(state): State<AppState>,
) -> WebResult<Vec<AccessRequestWithDataset>> {
    let requests = state.catalog.my_requests().await?;
    Ok(Json(ApiResponse::ok(requests)))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Message> {
    let message = state.catalog.approve_request(&id).await?;
    Ok(Json(ApiResponse::ok(message)))
}

pub async fn deny_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Message> {
    let message = state.catalog.deny_request(&id).await?;
    Ok(Json(ApiResponse::ok(message)))
}

// ----------------------------------------------------------------------
// Users
// ----------------------------------------------------------------------

pub async fn list_users(State(state): State<AppState>) -> WebResult<Vec<User>> {
    let users = state.catalog.list_users().await?;
    Ok(Json(ApiResponse::ok(users)))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: JsonBody<NewUser>,
) -> WebResult<User> {
    let Json(payload) = payload?;
    let created = state.catalog.create_user(payload).await?;
    Ok(Json(ApiResponse::ok(created)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: JsonBody<UserPatch>,
) -> WebResult<User> {
    let Json(patch) = payload?;
    let updated = state.catalog.update_user(&id, patch).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Message> {
    let message = state.catalog.delete_user(&id).await?;
    Ok(Json(ApiResponse::ok(message)))
}

// ----------------------------------------------------------------------
// Audit trail
// ----------------------------------------------------------------------

pub async fn audit_logs(State(state): State<AppState>) -> WebResult<Vec<AuditLogWithUser>> {
    let logs = state.catalog.audit_logs().await?;
    Ok(Json(ApiResponse::ok(logs)))
}
