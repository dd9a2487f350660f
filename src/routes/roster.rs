use crate::{
    config::images::ImageConfig,
    data::{
        parse_id,
        student::{FieldErrors, ProfilePicture, Student, StudentDraft, StudentPatch},
    },
    error::{RosterError, RosterResult},
    maud_conveniences::{field_error, form_submit_button, simple_form_element, title},
    ring::{Category, RingChart},
    routes::sse::SseEvent,
    state::RosterState,
};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, Render, html};
use serde::Deserialize;

/// Client-side event that makes the roster fragment reload itself.
const ROSTER_CHANGED: &str = "roster-changed";

pub async fn get_roster_page(State(state): State<RosterState>) -> Markup {
    let roster_triggers = format!(
        "load, sse:{}, {ROSTER_CHANGED} from:body",
        SseEvent::CrudStudent.name()
    );

    state.render(html! {
        div sse-connect="/sse_feed" class="container mx-auto px-4 py-8" {
            div class="flex items-center justify-between mb-8" {
                h1 class="text-3xl font-bold text-gray-900" {"Students"}
                button hx-get="/internal/student_form" hx-target="#in_focus" class="border border-gray-300 bg-white hover:bg-gray-100 font-semibold py-2 px-4 rounded" {
                    "Create"
                }
            }
            div id="in_focus" {}
            div id="roster" hx-get="/internal/roster" hx-trigger=(roster_triggers) {}
        }
    })
}

struct StudentCard<'a> {
    student: &'a Student,
    images: &'a ImageConfig,
}

impl Render for StudentCard<'_> {
    fn render(&self) -> Markup {
        let Self { student, images } = self;
        let counts = student.counts();
        let name = student.full_name();

        html! {
            div class="bg-white shadow-sm rounded-lg p-6" {
                div class="flex items-start space-x-4" {
                    img src=(images.src_for(&student.profile_picture)) alt=(name) width="80" height="80" class="rounded-full object-cover";
                    div class="flex-1" {
                        div class="flex justify-between mb-2" {
                            div {
                                h3 class="text-lg font-semibold" {(name)}
                                p class="text-sm text-gray-500" {"Exercises Tracked"}
                            }
                            div class="flex space-x-2" {
                                button hx-get={"/internal/student_form?id=" (student.id)} hx-target="#in_focus" class="text-sm text-blue-600 hover:underline" {"Edit"}
                                button hx-delete={"/internal/students/" (student.id)} hx-target="#in_focus" hx-confirm="Are you sure you want to delete this student?" class="text-sm text-red-600 hover:underline" {"Delete"}
                            }
                        }
                        div class="space-y-2 mb-4" {
                            @for category in Category::ORDER {
                                div class="flex items-center space-x-2" {
                                    div class={"w-3 h-3 rounded-full " (category.dot_class())} {}
                                    span class="text-sm" {(category.label()) ": " (counts.get(category))}
                                }
                            }
                        }
                    }
                    div class="flex-shrink-0" {
                        (RingChart::new(counts))
                    }
                }
            }
        }
    }
}

pub async fn internal_get_roster(State(state): State<RosterState>) -> RosterResult<Markup> {
    let students = state.roster().list().await?;
    let images = state.config().images();

    Ok(html! {
        @if students.is_empty() {
            p class="text-center text-gray-500" {"No students yet."}
        } @else {
            div class="grid grid-cols-1 md:grid-cols-2 gap-6" {
                @for student in &students {
                    (StudentCard { student, images: &images })
                }
            }
        }
    })
}

/// Raw form fields, kept as typed so they can be shown again on error.
#[derive(Debug, Default, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    profile_picture: String,
    #[serde(default)]
    passed: String,
    #[serde(default)]
    redo: String,
    #[serde(default)]
    pending: String,
}

impl StudentForm {
    fn blank() -> Self {
        Self {
            passed: "0".into(),
            redo: "0".into(),
            pending: "0".into(),
            ..Self::default()
        }
    }

    /// Unparseable counters are reported and replaced with zero.
    fn to_draft(&self) -> (StudentDraft, FieldErrors) {
        let mut problems = FieldErrors::default();
        let mut count = |field: &'static str, label: &str, raw: &str| {
            raw.trim().parse::<i64>().unwrap_or_else(|_| {
                problems.insert(field, format!("{label} count must be a whole number"));
                0
            })
        };

        let draft = StudentDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: ProfilePicture::from_input(&self.profile_picture),
            passed: count("passed", "Passed", &self.passed),
            redo: count("redo", "Redo", &self.redo),
            pending: count("pending", "Pending", &self.pending),
        };

        (draft, problems)
    }
}

impl From<&Student> for StudentForm {
    fn from(student: &Student) -> Self {
        Self {
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            profile_picture: student.profile_picture.as_url().unwrap_or_default().to_string(),
            passed: student.passed.to_string(),
            redo: student.redo.to_string(),
            pending: student.pending.to_string(),
        }
    }
}

fn render_student_form(id: Option<i32>, values: &StudentForm, problems: &FieldErrors) -> Markup {
    let number = Some("number");
    let create_url = id.is_none().then_some("/internal/students");
    let edit_url = id.map(|id| format!("/internal/students/{id}"));

    html! {
        div class="bg-white shadow-md rounded-lg p-6 mb-8 max-w-md mx-auto" {
            @if id.is_some() {
                (title("Edit Student"))
                p class="text-sm text-gray-500 mb-4" {"Update the student's information and progress."}
            } @else {
                (title("Create New Student"))
                p class="text-sm text-gray-500 mb-4" {"Add a new student with their progress info."}
            }

            form hx-target="#in_focus"
                hx-put=[create_url]
                hx-post=[edit_url] {
                (simple_form_element("first_name", "First Name", true, None, Some(values.first_name.as_str()), None))
                (field_error(problems.get("firstName")))
                (simple_form_element("last_name", "Last Name", true, None, Some(values.last_name.as_str()), None))
                (field_error(problems.get("lastName")))
                (simple_form_element("profile_picture", "Profile Picture URL (optional)", false, Some("url"), Some(values.profile_picture.as_str()), None))
                (simple_form_element("passed", "Passed", true, number, Some(values.passed.as_str()), Some(0)))
                (field_error(problems.get("passed")))
                (simple_form_element("redo", "Redo", true, number, Some(values.redo.as_str()), Some(0)))
                (field_error(problems.get("redo")))
                (simple_form_element("pending", "Pending", true, number, Some(values.pending.as_str()), Some(0)))
                (field_error(problems.get("pending")))

                div class="flex space-x-2" {
                    (form_submit_button(Some("Save")))
                    button type="button" hx-get="/internal/close_form" hx-target="#in_focus" class="py-2 px-4 rounded border border-gray-300" {"Cancel"}
                }
            }
        }
    }
}

#[derive(Deserialize)]
pub struct FormQuery {
    id: Option<String>,
}

pub async fn internal_get_student_form(
    State(state): State<RosterState>,
    Query(FormQuery { id }): Query<FormQuery>,
) -> RosterResult<Markup> {
    let Some(id) = id.as_deref().filter(|id| !id.is_empty()) else {
        return Ok(render_student_form(None, &StudentForm::blank(), &FieldErrors::default()));
    };

    let student = state.roster().get(parse_id(id)?).await?;
    Ok(render_student_form(
        Some(student.id),
        &StudentForm::from(&student),
        &FieldErrors::default(),
    ))
}

pub async fn internal_close_form() -> Markup {
    html! {}
}

/// Empties the form slot and tells the page to reload the roster. Only sent
/// once the store has accepted the change.
fn roster_changed() -> Response {
    ([("HX-Trigger", ROSTER_CHANGED)], html! {}).into_response()
}

/// Shows the form again when the service rejects the input, otherwise passes
/// the error through untouched.
fn form_or_error(
    id: Option<i32>,
    form: &StudentForm,
    result: RosterResult<Student>,
) -> RosterResult<Response> {
    match result {
        Ok(_) => Ok(roster_changed()),
        Err(RosterError::InvalidStudent { problems }) => {
            Ok(render_student_form(id, form, &problems).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn internal_put_new_student(
    State(state): State<RosterState>,
    Form(form): Form<StudentForm>,
) -> RosterResult<Response> {
    let (draft, mut problems) = form.to_draft();
    if !problems.is_empty() {
        if let Err(more) = draft.validate() {
            problems.extend(more);
        }
        return Ok(render_student_form(None, &form, &problems).into_response());
    }

    let result = state.roster().create(draft).await;
    form_or_error(None, &form, result)
}

pub async fn internal_post_edit_student(
    State(state): State<RosterState>,
    Path(id): Path<String>,
    Form(form): Form<StudentForm>,
) -> RosterResult<Response> {
    let id = parse_id(&id)?;

    let (draft, mut problems) = form.to_draft();
    if !problems.is_empty() {
        if let Err(more) = draft.validate() {
            problems.extend(more);
        }
        return Ok(render_student_form(Some(id), &form, &problems).into_response());
    }

    let result = state.roster().update(id, StudentPatch::from(draft)).await;
    form_or_error(Some(id), &form, result)
}

pub async fn internal_delete_student(
    State(state): State<RosterState>,
    Path(id): Path<String>,
) -> RosterResult<Response> {
    let id = parse_id(&id)?;

    state.roster().delete(id).await?;
    Ok(roster_changed())
}
