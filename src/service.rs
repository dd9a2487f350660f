use crate::{
    data::student::{Student, StudentDraft, StudentPatch},
    error::{InvalidStudentSnafu, MissingStudentSnafu, RosterResult},
    routes::sse::SseEvent,
    store::StudentStore,
};
use snafu::OptionExt;
use std::sync::Arc;
use tokio::sync::broadcast::{Receiver, Sender, channel};

const CHANGE_FEED_CAPACITY: usize = 16;

/// List/create/update/delete over the roster. Input is validated here as well
/// as in the form, and listeners on the change feed only hear about a
/// mutation once the store has confirmed it.
#[derive(Clone, Debug)]
pub struct RosterService {
    store: Arc<dyn StudentStore>,
    changes: Sender<SseEvent>,
}

impl RosterService {
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        let (changes, _rx) = channel(CHANGE_FEED_CAPACITY);
        Self { store, changes }
    }

    pub fn subscribe(&self) -> Receiver<SseEvent> {
        self.changes.subscribe()
    }

    fn announce(&self, event: SseEvent) {
        //no subscribers is fine
        let _ = self.changes.send(event);
    }

    pub async fn list(&self) -> RosterResult<Vec<Student>> {
        self.store.list().await
    }

    pub async fn get(&self, id: i32) -> RosterResult<Student> {
        self.store.get(id).await?.context(MissingStudentSnafu { id })
    }

    pub async fn create(&self, draft: StudentDraft) -> RosterResult<Student> {
        let new = draft
            .validate()
            .map_err(|problems| InvalidStudentSnafu { problems }.build())?;

        let student = self.store.insert(new).await?;
        info!(id = student.id, "Created student");
        self.announce(SseEvent::CrudStudent);
        Ok(student)
    }

    pub async fn update(&self, id: i32, patch: StudentPatch) -> RosterResult<Student> {
        let changes = patch
            .validate()
            .map_err(|problems| InvalidStudentSnafu { problems }.build())?;

        let student = self
            .store
            .update(id, changes)
            .await?
            .context(MissingStudentSnafu { id })?;
        info!(id, "Updated student");
        self.announce(SseEvent::CrudStudent);
        Ok(student)
    }

    pub async fn delete(&self, id: i32) -> RosterResult<Student> {
        let student = self
            .store
            .remove(id)
            .await?
            .context(MissingStudentSnafu { id })?;
        info!(id, "Deleted student");
        self.announce(SseEvent::CrudStudent);
        Ok(student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::student::{NO_IMAGE, ProfilePicture},
        error::ErrorKind,
        store::MemoryStudentStore,
    };
    use tokio::sync::broadcast::error::TryRecvError;

    fn service() -> RosterService {
        RosterService::new(Arc::new(MemoryStudentStore::default()))
    }

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

    #[tokio::test]
    async fn create_assigns_id_and_normalises_picture() {
        let service = service();
        let student = service.create(ada()).await.unwrap();

        assert_eq!(student.id, 1);
        assert_eq!(student.profile_picture.as_wire(), NO_IMAGE);
        assert_eq!((student.passed, student.redo, student.pending), (3, 1, 2));
        assert_eq!(service.list().await.unwrap(), vec![student]);
    }

    #[tokio::test]
    async fn list_of_empty_roster_is_empty() {
        assert!(service().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_student_is_not_found() {
        let service = service();
        let err = service
            .update(
                999_999,
                StudentPatch {
                    passed: Some(1),
                    ..StudentPatch::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_given_fields_only() {
        let service = service();
        let created = service.create(ada()).await.unwrap();

        let updated = service
            .update(
                created.id,
                StudentPatch {
                    last_name: Some(" Byron ".into()),
                    pending: Some(0),
                    ..StudentPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.last_name, "Byron");
        assert_eq!(updated.pending, 0);
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.passed, 3);
        assert_eq!(service.get(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn delete_twice() {
        let service = service();
        let created = service.create(ada()).await.unwrap();

        let deleted = service.delete(created.id).await.unwrap();
        assert_eq!(deleted, created);

        let err = service.delete(created.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let service = service();
        let err = service
            .create(StudentDraft {
                pending: -1,
                ..ada()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let created = service.create(ada()).await.unwrap();
        let err = service
            .update(
                created.id,
                StudentPatch {
                    first_name: Some(String::new()),
                    ..StudentPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert_eq!(service.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn only_confirmed_mutations_are_announced() {
        let service = service();
        let mut feed = service.subscribe();

        let _ = service.delete(1).await;
        let _ = service
            .create(StudentDraft {
                first_name: String::new(),
                ..ada()
            })
            .await;
        assert!(matches!(feed.try_recv(), Err(TryRecvError::Empty)));

        let created = service.create(ada()).await.unwrap();
        assert!(matches!(feed.try_recv(), Ok(SseEvent::CrudStudent)));

        service.delete(created.id).await.unwrap();
        assert!(matches!(feed.try_recv(), Ok(SseEvent::CrudStudent)));
    }
}
