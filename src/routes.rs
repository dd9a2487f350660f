use crate::{
    routes::{
        api::{delete_user, get_users, post_users, put_user},
        roster::{
            get_roster_page, internal_close_form, internal_delete_student,
            internal_get_roster, internal_get_student_form, internal_post_edit_student,
            internal_put_new_student,
        },
        sse::sse_feed,
    },
    state::RosterState,
};
use axum::{
    Router,
    routing::{get, post, put},
};

pub mod api;
pub mod roster;
pub mod sse;

pub fn router(state: RosterState) -> Router {
    Router::new()
        .route("/", get(get_roster_page))
        .route("/api/users", get(get_users).post(post_users))
        .route("/api/user/{id}", put(put_user).delete(delete_user))
        .route("/internal/roster", get(internal_get_roster))
        .route("/internal/student_form", get(internal_get_student_form))
        .route("/internal/close_form", get(internal_close_form))
        .route("/internal/students", put(internal_put_new_student))
        .route(
            "/internal/students/{id}",
            post(internal_post_edit_student).delete(internal_delete_student),
        )
        .route("/sse_feed", get(sse_feed))
        .with_state(state)
}
