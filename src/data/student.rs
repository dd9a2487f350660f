use crate::ring::ExerciseCounts;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Wire value meaning "no custom picture, use the placeholder".
pub const NO_IMAGE: &str = "no_image";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfilePicture {
    #[default]
    Placeholder,
    Url(String),
}

impl ProfilePicture {
    /// Blank input and the wire sentinel both mean the placeholder.
    pub fn from_input(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || trimmed == NO_IMAGE {
            Self::Placeholder
        } else {
            Self::Url(trimmed.to_string())
        }
    }

    pub fn from_column(column: Option<String>) -> Self {
        column.map_or(Self::Placeholder, Self::from_input)
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Placeholder => None,
            Self::Url(url) => Some(url),
        }
    }

    pub fn as_wire(&self) -> &str {
        self.as_url().unwrap_or(NO_IMAGE)
    }
}

impl Serialize for ProfilePicture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for ProfilePicture {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map_or(Self::Placeholder, Self::from_input))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: ProfilePicture,
    pub passed: u32,
    pub redo: u32,
    pub pending: u32,
}

impl Student {
    pub fn counts(&self) -> ExerciseCounts {
        ExerciseCounts {
            passed: self.passed,
            redo: self.redo,
            pending: self.pending,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A validated student that has not been given an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: ProfilePicture,
    pub passed: u32,
    pub redo: u32,
    pub pending: u32,
}

impl NewStudent {
    pub fn with_id(self, id: i32) -> Student {
        let Self {
            first_name,
            last_name,
            profile_picture,
            passed,
            redo,
            pending,
        } = self;

        Student {
            id,
            first_name,
            last_name,
            profile_picture,
            passed,
            redo,
            pending,
        }
    }
}

/// Validated partial update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<ProfilePicture>,
    pub passed: Option<u32>,
    pub redo: Option<u32>,
    pub pending: Option<u32>,
}

impl StudentChanges {
    pub fn apply_to(self, student: &mut Student) {
        if let Some(first_name) = self.first_name {
            student.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            student.last_name = last_name;
        }
        if let Some(profile_picture) = self.profile_picture {
            student.profile_picture = profile_picture;
        }
        if let Some(passed) = self.passed {
            student.passed = passed;
        }
        if let Some(redo) = self.redo {
            student.redo = redo;
        }
        if let Some(pending) = self.pending {
            student.pending = pending;
        }
    }
}

/// Body of a create request, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile_picture: ProfilePicture,
    #[serde(default)]
    pub passed: i64,
    #[serde(default)]
    pub redo: i64,
    #[serde(default)]
    pub pending: i64,
}

impl StudentDraft {
    pub fn validate(self) -> Result<NewStudent, FieldErrors> {
        let mut errors = FieldErrors::default();

        let first_name = errors.name("firstName", "First name", &self.first_name);
        let last_name = errors.name("lastName", "Last name", &self.last_name);
        let passed = errors.count("passed", "Passed", self.passed);
        let redo = errors.count("redo", "Redo", self.redo);
        let pending = errors.count("pending", "Pending", self.pending);

        match (first_name, last_name, passed, redo, pending) {
            (Some(first_name), Some(last_name), Some(passed), Some(redo), Some(pending)) => {
                Ok(NewStudent {
                    first_name,
                    last_name,
                    profile_picture: self.profile_picture,
                    passed,
                    redo,
                    pending,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Body of an update request. Only these fields can ever be written; anything
/// else in the body, `id` included, is dropped during deserialisation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<ProfilePicture>,
    pub passed: Option<i64>,
    pub redo: Option<i64>,
    pub pending: Option<i64>,
}

impl StudentPatch {
    pub fn validate(self) -> Result<StudentChanges, FieldErrors> {
        let mut errors = FieldErrors::default();

        let changes = StudentChanges {
            first_name: self
                .first_name
                .and_then(|v| errors.name("firstName", "First name", &v)),
            last_name: self
                .last_name
                .and_then(|v| errors.name("lastName", "Last name", &v)),
            profile_picture: self.profile_picture,
            passed: self.passed.and_then(|v| errors.count("passed", "Passed", v)),
            redo: self.redo.and_then(|v| errors.count("redo", "Redo", v)),
            pending: self
                .pending
                .and_then(|v| errors.count("pending", "Pending", v)),
        };

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }
}

/// A full overwrite, as sent by the edit form.
impl From<StudentDraft> for StudentPatch {
    fn from(draft: StudentDraft) -> Self {
        Self {
            first_name: Some(draft.first_name),
            last_name: Some(draft.last_name),
            profile_picture: Some(draft.profile_picture),
            passed: Some(draft.passed),
            redo: Some(draft.redo),
            pending: Some(draft.pending),
        }
    }
}

/// Field name (as it appears on the wire) to a human readable problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Keeps any message already recorded for a field.
    pub fn extend(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn name(&mut self, field: &'static str, label: &str, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.insert(field, format!("{label} is required"));
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    //counters live in an INTEGER column
    fn count(&mut self, field: &'static str, label: &str, raw: i64) -> Option<u32> {
        if raw < 0 {
            self.insert(field, format!("{label} count cannot be negative"));
            None
        } else if raw > i64::from(i32::MAX) {
            self.insert(field, format!("{label} count is too large"));
            None
        } else {
            u32::try_from(raw).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> StudentDraft {
        StudentDraft {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            profile_picture: ProfilePicture::from_input(""),
            passed: 3,
            redo: 1,
            pending: 2,
        }
    }

    #[test]
    fn blank_and_sentinel_pictures_are_placeholders() {
        assert_eq!(ProfilePicture::from_input(""), ProfilePicture::Placeholder);
        assert_eq!(ProfilePicture::from_input("   "), ProfilePicture::Placeholder);
        assert_eq!(ProfilePicture::from_input(NO_IMAGE), ProfilePicture::Placeholder);
        assert_eq!(ProfilePicture::from_column(None), ProfilePicture::Placeholder);
        assert_eq!(
            ProfilePicture::from_input(" https://i.pravatar.cc/150 "),
            ProfilePicture::Url("https://i.pravatar.cc/150".into())
        );
    }

    #[test]
    fn placeholder_serialises_as_sentinel() {
        let student = ada().validate().unwrap().with_id(7);
        let json = serde_json::to_value(&student).unwrap();

        assert_eq!(json["profilePicture"], "no_image");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn null_or_missing_picture_deserialises_to_placeholder() {
        let draft: StudentDraft =
            serde_json::from_str(r#"{"firstName":"a","lastName":"b","profilePicture":null}"#)
                .unwrap();
        assert_eq!(draft.profile_picture, ProfilePicture::Placeholder);

        let draft: StudentDraft = serde_json::from_str(r#"{"firstName":"a"}"#).unwrap();
        assert_eq!(draft.profile_picture, ProfilePicture::Placeholder);
        assert_eq!(draft.passed, 0);
    }

    #[test]
    fn valid_draft_is_trimmed() {
        let draft = StudentDraft {
            first_name: "  Ada ".into(),
            ..ada()
        };
        let new = draft.validate().unwrap();

        assert_eq!(new.first_name, "Ada");
        assert_eq!((new.passed, new.redo, new.pending), (3, 1, 2));
    }

    #[test]
    fn draft_reports_every_problem() {
        let draft = StudentDraft {
            first_name: " ".into(),
            last_name: String::new(),
            passed: -1,
            redo: i64::from(i32::MAX) + 1,
            ..ada()
        };
        let errors = draft.validate().unwrap_err();

        assert_eq!(errors.get("firstName"), Some("First name is required"));
        assert_eq!(errors.get("lastName"), Some("Last name is required"));
        assert_eq!(errors.get("passed"), Some("Passed count cannot be negative"));
        assert_eq!(errors.get("redo"), Some("Redo count is too large"));
        assert_eq!(errors.get("pending"), None);
    }

    #[test]
    fn patch_ignores_id_and_unknown_fields() {
        let patch: StudentPatch =
            serde_json::from_str(r#"{"id": 42, "passed": 9, "favouriteColour": "blue"}"#).unwrap();
        let changes = patch.validate().unwrap();

        assert_eq!(
            changes,
            StudentChanges {
                passed: Some(9),
                ..StudentChanges::default()
            }
        );
    }

    #[test]
    fn patch_only_checks_present_fields() {
        let patch = StudentPatch {
            last_name: Some("   ".into()),
            pending: Some(-4),
            ..StudentPatch::default()
        };
        let errors = patch.validate().unwrap_err();

        assert_eq!(errors.get("lastName"), Some("Last name is required"));
        assert_eq!(errors.get("pending"), Some("Pending count cannot be negative"));
        assert_eq!(errors.get("firstName"), None);
    }

    #[test]
    fn changes_overwrite_only_given_fields() {
        let mut student = ada().validate().unwrap().with_id(1);
        StudentChanges {
            redo: Some(0),
            profile_picture: Some(ProfilePicture::Url("https://randomuser.me/a.jpg".into())),
            ..StudentChanges::default()
        }
        .apply_to(&mut student);

        assert_eq!(student.redo, 0);
        assert_eq!(student.passed, 3);
        assert_eq!(student.first_name, "Ada");
        assert_eq!(student.profile_picture.as_wire(), "https://randomuser.me/a.jpg");
    }
}
