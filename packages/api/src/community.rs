//! Events and meeting minutes.
//!
//! Admins author events and meetings; any active member may read them and add
//! notes to a meeting's thread.

use chrono::{NaiveDate, Utc};
use serde_json::json;
use store::{DocumentStore, Fields, Repository, Stored};

use crate::error::{Error, Result};
use crate::models::{Event, Meeting, Note, MINUTES};
use crate::validation::{require, validate_time};
use crate::visibility::Viewer;

#[derive(Debug, Clone)]
pub struct EventForm {
    pub title: String,
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
    pub location: String,
    pub description: String,
}

impl EventForm {
    fn into_event(self) -> Result<Event> {
        require(&self.title, "Title")?;
        validate_time(&self.time)?;
        Ok(Event {
            title: self.title.trim().to_string(),
            date: self.date,
            time: self.time.trim().to_string(),
            location: self.location.trim().to_string(),
            description: self.description,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MeetingForm {
    pub title: String,
    pub date: NaiveDate,
    pub content: String,
}

#[derive(Clone, Debug)]
pub struct Community<S> {
    repo: Repository<S>,
}

impl<S: DocumentStore> Community<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Events in date order.
    pub async fn events(&self, viewer: &Viewer) -> Result<Vec<Stored<Event>>> {
        viewer.require_active()?;
        let mut events = self.repo.list::<Event>().await?;
        events.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        Ok(events)
    }

    pub async fn create_event(&self, viewer: &Viewer, form: EventForm) -> Result<Stored<Event>> {
        viewer.require_admin("create events")?;
        let event = form.into_event()?;
        let id = self
            .repo
            .add(&event)
            .await
            .map_err(Error::failed("save event"))?;
        tracing::info!(%id, title = %event.title, "event created");
        Ok(Stored { id, data: event })
    }

    pub async fn update_event(&self, viewer: &Viewer, id: &str, form: EventForm) -> Result<()> {
        viewer.require_admin("edit events")?;
        let event = form.into_event()?;
        if self.repo.get::<Event>(id).await?.is_none() {
            return Err(Error::not_found("Event", id));
        }
        self.repo
            .set(id, &event)
            .await
            .map_err(Error::failed("save event"))?;
        tracing::info!(%id, "event updated");
        Ok(())
    }

    pub async fn delete_event(&self, viewer: &Viewer, id: &str) -> Result<()> {
        viewer.require_admin("delete events")?;
        self.repo
            .delete::<Event>(id)
            .await
            .map_err(Error::failed("delete event"))?;
        tracing::info!(%id, "event deleted");
        Ok(())
    }

    /// Meetings, most recent first.
    pub async fn meetings(&self, viewer: &Viewer) -> Result<Vec<Stored<Meeting>>> {
        viewer.require_active()?;
        let mut meetings = self.repo.list::<Meeting>().await?;
        meetings.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(meetings)
    }

    pub async fn create_meeting(
        &self,
        viewer: &Viewer,
        form: MeetingForm,
    ) -> Result<Stored<Meeting>> {
        viewer.require_admin("record meetings")?;
        require(&form.title, "Title")?;
        let meeting = Meeting {
            title: form.title.trim().to_string(),
            date: form.date,
            content: form.content,
            kind: MINUTES.to_string(),
            notes: Vec::new(),
        };
        let id = self
            .repo
            .add(&meeting)
            .await
            .map_err(Error::failed("save meeting"))?;
        tracing::info!(%id, title = %meeting.title, "meeting recorded");
        Ok(Stored { id, data: meeting })
    }

    /// Change title, date and summary. The note thread is left untouched.
    pub async fn update_meeting(&self, viewer: &Viewer, id: &str, form: MeetingForm) -> Result<()> {
        viewer.require_admin("edit meetings")?;
        require(&form.title, "Title")?;

        let mut patch = Fields::new();
        patch.insert("title".into(), json!(form.title.trim()));
        patch.insert("date".into(), json!(form.date));
        patch.insert("content".into(), json!(form.content));
        self.repo
            .update::<Meeting>(id, patch)
            .await
            .map_err(|e| match e {
                store::StoreError::NotFound { .. } => Error::not_found("Meeting", id),
                other => Error::failed("save meeting")(other),
            })?;
        tracing::info!(%id, "meeting updated");
        Ok(())
    }

    pub async fn delete_meeting(&self, viewer: &Viewer, id: &str) -> Result<()> {
        viewer.require_admin("delete meetings")?;
        self.repo
            .delete::<Meeting>(id)
            .await
            .map_err(Error::failed("delete meeting"))?;
        tracing::info!(%id, "meeting deleted");
        Ok(())
    }

    /// Append a note signed with the caller's display name. Blank text is
    /// ignored and yields `None`.
    ///
    /// The thread is read, extended and written back whole; two members adding a
    /// note at the same instant can lose one of them.
    pub async fn add_note(
        &self,
        viewer: &Viewer,
        meeting_id: &str,
        text: &str,
    ) -> Result<Option<Note>> {
        viewer.require_active()?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let meeting = self
            .repo
            .get::<Meeting>(meeting_id)
            .await?
            .ok_or_else(|| Error::not_found("Meeting", meeting_id))?;
        let note = Note {
            author: viewer.name.clone(),
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        let mut notes = meeting.data.notes;
        notes.push(note.clone());

        let mut patch = Fields::new();
        patch.insert("notes".into(), json!(notes));
        self.repo
            .update::<Meeting>(meeting_id, patch)
            .await
            .map_err(Error::failed("add note"))?;
        tracing::debug!(%meeting_id, author = %note.author, "note added");
        Ok(Some(note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::{Role, UserStatus};
    use store::MemoryStore;

    fn viewer(uid: &str, role: Role) -> Viewer {
        Viewer {
            uid: uid.into(),
            name: format!("{} name", uid),
            role,
            status: UserStatus::Active,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn event(title: &str, day: u32, time: &str) -> EventForm {
        EventForm {
            title: title.into(),
            date: date(day),
            time: time.into(),
            location: "Park".into(),
            description: "Bring water".into(),
        }
    }

    fn community() -> Community<MemoryStore> {
        Community::new(Repository::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_events_crud_and_order() {
        let community = community();
        let admin = viewer("root", Role::Admin);
        let resident = viewer("asha", Role::Resident);

        community.create_event(&admin, event("Cleanup", 9, "07:30")).await.unwrap();
        let early = community.create_event(&admin, event("Yoga", 2, "06:00")).await.unwrap();

        let titles: Vec<_> = community
            .events(&resident)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.data.title)
            .collect();
        assert_eq!(titles, ["Yoga", "Cleanup"]);

        community
            .update_event(&admin, &early.id, event("Morning Yoga", 2, "06:15"))
            .await
            .unwrap();
        community.delete_event(&admin, &early.id).await.unwrap();
        assert_eq!(community.events(&resident).await.unwrap().len(), 1);

        assert!(matches!(
            community.create_event(&resident, event("Party", 1, "20:00")).await,
            Err(Error::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_event_time_is_validated() {
        let community = community();
        let admin = viewer("root", Role::Admin);
        assert!(matches!(
            community.create_event(&admin, event("Cleanup", 9, "7.30am")).await,
            Err(Error::Validation(ValidationError::Time))
        ));
        assert!(matches!(
            community.update_event(&admin, "missing", event("Cleanup", 9, "07:30")).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_new_meeting_is_minutes_without_notes() {
        let community = community();
        let admin = viewer("root", Role::Admin);
        let meeting = community
            .create_meeting(
                &admin,
                MeetingForm {
                    title: "AGM".into(),
                    date: date(1),
                    content: "Budget approved".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(meeting.kind, MINUTES);
        assert!(meeting.notes.is_empty());
    }

    #[tokio::test]
    async fn test_notes_thread() {
        let community = community();
        let admin = viewer("root", Role::Admin);
        let resident = viewer("asha", Role::Resident);
        let meeting = community
            .create_meeting(
                &admin,
                MeetingForm {
                    title: "AGM".into(),
                    date: date(1),
                    content: String::new(),
                },
            )
            .await
            .unwrap();

        assert!(community.add_note(&resident, &meeting.id, "   ").await.unwrap().is_none());
        let note = community
            .add_note(&resident, &meeting.id, " Thanks for the update ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note.author, "asha name");
        assert_eq!(note.text, "Thanks for the update");
        community.add_note(&admin, &meeting.id, "Noted").await.unwrap();

        // Editing the summary keeps the thread
        community
            .update_meeting(
                &admin,
                &meeting.id,
                MeetingForm {
                    title: "AGM 2026".into(),
                    date: date(2),
                    content: "Revised".into(),
                },
            )
            .await
            .unwrap();

        let meetings = community.meetings(&resident).await.unwrap();
        assert_eq!(meetings[0].title, "AGM 2026");
        let authors: Vec<_> = meetings[0].notes.iter().map(|n| n.author.as_str()).collect();
        assert_eq!(authors, ["asha name", "root name"]);
    }

    #[tokio::test]
    async fn test_pending_members_see_nothing() {
        let community = community();
        let mut pending = viewer("new", Role::Resident);
        pending.status = UserStatus::Pending;
        assert!(matches!(
            community.events(&pending).await,
            Err(Error::AccountPending)
        ));
        assert!(matches!(
            community.add_note(&pending, "m", "hi").await,
            Err(Error::AccountPending)
        ));
    }
}
