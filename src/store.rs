use crate::{
    data::student::{NewStudent, ProfilePicture, Student, StudentChanges},
    error::{CorruptCounterSnafu, MakeQuerySnafu, RosterResult},
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::{FromRow, Pool, Postgres};
use std::{collections::BTreeMap, fmt::Debug};
use tokio::sync::Mutex;

/// Primary-key access to the student table. Every call is a single round trip;
/// `Ok(None)` means no row has that id.
#[async_trait]
pub trait StudentStore: Debug + Send + Sync {
    async fn list(&self) -> RosterResult<Vec<Student>>;
    async fn get(&self, id: i32) -> RosterResult<Option<Student>>;
    async fn insert(&self, student: NewStudent) -> RosterResult<Student>;
    async fn update(&self, id: i32, changes: StudentChanges) -> RosterResult<Option<Student>>;
    async fn remove(&self, id: i32) -> RosterResult<Option<Student>>;

    async fn close(&self) {}
}

#[derive(Debug, FromRow)]
struct StudentRow {
    id: i32,
    first_name: String,
    last_name: String,
    profile_picture: Option<String>,
    passed: i32,
    redo: i32,
    pending: i32,
}

impl TryFrom<StudentRow> for Student {
    type Error = crate::error::RosterError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let counter = |value: i32| u32::try_from(value).context(CorruptCounterSnafu { id });

        Ok(Self {
            id,
            passed: counter(row.passed)?,
            redo: counter(row.redo)?,
            pending: counter(row.pending)?,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_picture: ProfilePicture::from_column(row.profile_picture),
        })
    }
}

//counters are validated to fit in an INTEGER before they get here
#[allow(clippy::cast_possible_wrap)]
const fn column(count: u32) -> i32 {
    count as i32
}

const COLUMNS: &str = "id, first_name, last_name, profile_picture, passed, redo, pending";

#[derive(Clone, Debug)]
pub struct PgStudentStore {
    pool: Pool<Postgres>,
}

impl PgStudentStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn list(&self) -> RosterResult<Vec<Student>> {
        sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {COLUMNS} FROM public.students ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .into_iter()
        .map(Student::try_from)
        .collect()
    }

    async fn get(&self, id: i32) -> RosterResult<Option<Student>> {
        sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {COLUMNS} FROM public.students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .map(Student::try_from)
        .transpose()
    }

    async fn insert(&self, student: NewStudent) -> RosterResult<Student> {
        let NewStudent {
            first_name,
            last_name,
            profile_picture,
            passed,
            redo,
            pending,
        } = student;

        sqlx::query_as::<_, StudentRow>(&format!(
            "INSERT INTO public.students (first_name, last_name, profile_picture, passed, redo, pending) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(profile_picture.as_url())
        .bind(column(passed))
        .bind(column(redo))
        .bind(column(pending))
        .fetch_one(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .try_into()
    }

    async fn update(&self, id: i32, changes: StudentChanges) -> RosterResult<Option<Student>> {
        let StudentChanges {
            first_name,
            last_name,
            profile_picture,
            passed,
            redo,
            pending,
        } = changes;

        //the picture can be cleared, so NULL alone can't mean "leave it"
        let set_picture = profile_picture.is_some();
        let picture = profile_picture.as_ref().and_then(ProfilePicture::as_url);

        sqlx::query_as::<_, StudentRow>(&format!(
            "UPDATE public.students SET \
             first_name = COALESCE($2, first_name), \
             last_name = COALESCE($3, last_name), \
             profile_picture = CASE WHEN $4::BOOLEAN THEN $5::TEXT ELSE profile_picture END, \
             passed = COALESCE($6, passed), \
             redo = COALESCE($7, redo), \
             pending = COALESCE($8, pending) \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(set_picture)
        .bind(picture)
        .bind(passed.map(column))
        .bind(redo.map(column))
        .bind(pending.map(column))
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .map(Student::try_from)
        .transpose()
    }

    async fn remove(&self, id: i32) -> RosterResult<Option<Student>> {
        sqlx::query_as::<_, StudentRow>(&format!(
            "DELETE FROM public.students WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .map(Student::try_from)
        .transpose()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, Default)]
struct MemoryTable {
    last_id: i32,
    rows: BTreeMap<i32, Student>,
}

/// Keeps the table in process, in primary-key order. Ids are never reused.
#[derive(Debug, Default)]
pub struct MemoryStudentStore {
    table: Mutex<MemoryTable>,
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn list(&self) -> RosterResult<Vec<Student>> {
        Ok(self.table.lock().await.rows.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> RosterResult<Option<Student>> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn insert(&self, student: NewStudent) -> RosterResult<Student> {
        let mut table = self.table.lock().await;
        table.last_id += 1;

        let student = student.with_id(table.last_id);
        table.rows.insert(student.id, student.clone());
        Ok(student)
    }

    async fn update(&self, id: i32, changes: StudentChanges) -> RosterResult<Option<Student>> {
        let mut table = self.table.lock().await;
        let Some(student) = table.rows.get_mut(&id) else {
            return Ok(None);
        };

        changes.apply_to(student);
        Ok(Some(student.clone()))
    }

    async fn remove(&self, id: i32) -> RosterResult<Option<Student>> {
        Ok(self.table.lock().await.rows.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grace() -> NewStudent {
        NewStudent {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            profile_picture: ProfilePicture::Placeholder,
            passed: 1,
            redo: 2,
            pending: 3,
        }
    }

    #[test]
    fn negative_row_counter_is_rejected() {
        let row = StudentRow {
            id: 4,
            first_name: "a".into(),
            last_name: "b".into(),
            profile_picture: None,
            passed: 0,
            redo: -1,
            pending: 0,
        };

        assert!(matches!(
            Student::try_from(row),
            Err(crate::error::RosterError::CorruptCounter { id: 4, .. })
        ));
    }

    #[test]
    fn null_column_is_placeholder() {
        let row = StudentRow {
            id: 1,
            first_name: "a".into(),
            last_name: "b".into(),
            profile_picture: None,
            passed: 0,
            redo: 0,
            pending: 0,
        };

        let student = Student::try_from(row).unwrap();
        assert_eq!(student.profile_picture, ProfilePicture::Placeholder);
    }

    #[tokio::test]
    async fn memory_ids_are_monotonic_and_not_reused() {
        let store = MemoryStudentStore::default();

        let first = store.insert(grace()).await.unwrap();
        let second = store.insert(grace()).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        store.remove(second.id).await.unwrap();
        let third = store.insert(grace()).await.unwrap();
        assert_eq!(third.id, 3);

        let ids: Vec<_> = store.list().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[tokio::test]
    async fn memory_update_of_missing_row_creates_nothing() {
        let store = MemoryStudentStore::default();

        let updated = store
            .update(
                999_999,
                StudentChanges {
                    passed: Some(1),
                    ..StudentChanges::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.is_none());
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get(999_999).await.unwrap().is_none());
    }

    /// Runs against a scratch database: `DATABASE_URL=... cargo test -- --ignored`.
    mod postgres {
        use super::*;
        use crate::error::{ErrorKind, RosterError};
        use sqlx::PgPool;

        fn pictured() -> NewStudent {
            NewStudent {
                profile_picture: ProfilePicture::Url("https://i.pravatar.cc/150".into()),
                ..grace()
            }
        }

        #[sqlx::test]
        #[ignore = "needs DATABASE_URL"]
        async fn partial_update_keeps_other_columns(pool: PgPool) {
            let store = PgStudentStore::new(pool);
            let inserted = store.insert(pictured()).await.unwrap();

            let updated = store
                .update(
                    inserted.id,
                    StudentChanges {
                        passed: Some(9),
                        last_name: Some("Murray".into()),
                        ..StudentChanges::default()
                    },
                )
                .await
                .unwrap()
                .unwrap();

            assert_eq!(updated.id, inserted.id);
            assert_eq!(updated.passed, 9);
            assert_eq!(updated.last_name, "Murray");
            assert_eq!(updated.first_name, "Grace");
            assert_eq!((updated.redo, updated.pending), (2, 3));
            assert_eq!(updated.profile_picture, inserted.profile_picture);
        }

        #[sqlx::test]
        #[ignore = "needs DATABASE_URL"]
        async fn picture_reset_stores_null(pool: PgPool) {
            let store = PgStudentStore::new(pool.clone());
            let inserted = store.insert(pictured()).await.unwrap();

            let updated = store
                .update(
                    inserted.id,
                    StudentChanges {
                        profile_picture: Some(ProfilePicture::Placeholder),
                        ..StudentChanges::default()
                    },
                )
                .await
                .unwrap()
                .unwrap();
            assert_eq!(updated.profile_picture, ProfilePicture::Placeholder);

            let column: Option<String> =
                sqlx::query_scalar("SELECT profile_picture FROM public.students WHERE id = $1")
                    .bind(inserted.id)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert_eq!(column, None);
        }

        #[sqlx::test]
        #[ignore = "needs DATABASE_URL"]
        async fn missing_rows_are_none(pool: PgPool) {
            let store = PgStudentStore::new(pool);

            let updated = store
                .update(
                    999_999,
                    StudentChanges {
                        passed: Some(1),
                        ..StudentChanges::default()
                    },
                )
                .await
                .unwrap();
            assert!(updated.is_none());
            assert!(store.remove(999_999).await.unwrap().is_none());
            assert!(store.list().await.unwrap().is_empty());
        }

        #[sqlx::test]
        #[ignore = "needs DATABASE_URL"]
        async fn negative_counter_violates_constraint(pool: PgPool) {
            let error = sqlx::query(
                "INSERT INTO public.students (first_name, last_name, passed) VALUES ('a', 'b', -1)",
            )
            .execute(&pool)
            .await
            .context(MakeQuerySnafu)
            .unwrap_err();

            assert!(matches!(error, RosterError::MakeQuery { .. }));
            assert!(matches!(error.kind(), ErrorKind::Invalid));
        }
    }
}
