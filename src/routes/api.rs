use crate::{
    data::{
        parse_id,
        student::{Student, StudentDraft, StudentPatch},
    },
    error::{MalformedBodySnafu, RosterResult},
    state::RosterState,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;
use snafu::ResultExt;
use std::borrow::Cow;

/// Envelope shared by every JSON response, errors included.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: Cow<'static, str>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(message: &'static str, data: T) -> Json<Self> {
        Json(Self {
            message: Cow::Borrowed(message),
            data,
        })
    }
}

type ApiResult<T> = RosterResult<Json<ApiResponse<T>>>;

pub async fn get_users(State(state): State<RosterState>) -> ApiResult<Vec<Student>> {
    let students = state.roster().list().await?;

    let message = if students.is_empty() {
        "No users found"
    } else {
        "Users fetched successfully"
    };
    Ok(ApiResponse::ok(message, students))
}

pub async fn post_users(
    State(state): State<RosterState>,
    body: Result<Json<StudentDraft>, JsonRejection>,
) -> ApiResult<Student> {
    let Json(draft) = body.context(MalformedBodySnafu)?;

    let student = state.roster().create(draft).await?;
    Ok(ApiResponse::ok("User Created Successfully", student))
}

pub async fn put_user(
    State(state): State<RosterState>,
    Path(id): Path<String>,
    body: Result<Json<StudentPatch>, JsonRejection>,
) -> ApiResult<Student> {
    let id = parse_id(&id)?;
    let Json(patch) = body.context(MalformedBodySnafu)?;

    let student = state.roster().update(id, patch).await?;
    Ok(ApiResponse::ok("User Updated Successfully", student))
}

pub async fn delete_user(
    State(state): State<RosterState>,
    Path(id): Path<String>,
) -> ApiResult<Student> {
    let id = parse_id(&id)?;

    let student = state.roster().delete(id).await?;
    Ok(ApiResponse::ok("User Deleted Successfully", student))
}
