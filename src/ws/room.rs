use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use crate::models::{ConnectionId, Participant, RoomResponse, SendMessage};

/// Document every new room starts with.
pub const DEFAULT_CONTENT: &str = "// Welcome to the collaborative editor!\n// Start typing to collaborate in real-time\n\nfunction hello() {\n  console.log(\"Hello, world!\");\n}\n\nhello();";

#[derive(Debug)]
struct Member {
    participant: Participant,
    outbox: UnboundedSender<SendMessage>,
}

/// One editing session: who is in it and the latest full document.
///
/// Each member carries its connection's outbound queue, so fan-out only touches this room.
#[derive(Debug)]
pub struct Room {
    id: String,
    members: HashMap<ConnectionId, Member>,
    content: String,
    created_at: DateTime<Utc>,
    /// Set once the room has been unlinked from the registry. A closed room is never mutated again.
    pub(crate) closed: bool,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            members: HashMap::new(),
            content: DEFAULT_CONTENT.to_string(),
            created_at: Utc::now(),
            closed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Inserts or overwrites the participant keyed by its connection id.
    /// Returns the previous record when the connection was already present.
    pub fn upsert_participant(
        &mut self,
        participant: Participant,
        outbox: UnboundedSender<SendMessage>,
    ) -> Option<Participant> {
        self.members
            .insert(participant.id.clone(), Member { participant, outbox })
            .map(|member| member.participant)
    }

    pub fn remove_participant(&mut self, id: &ConnectionId) -> Option<Participant> {
        self.members.remove(id).map(|member| member.participant)
    }

    /// Participants ordered by join time.
    pub fn participants(&self) -> Vec<Participant> {
        let mut users: Vec<Participant> = self
            .members
            .values()
            .map(|member| member.participant.clone())
            .collect();
        users.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        users
    }

    pub fn participant_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Queues `message` for every member except `exclude`. Returns how many accepted it.
    pub fn broadcast(&self, message: &SendMessage, exclude: Option<&ConnectionId>) -> usize {
        self.members
            .iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .filter(|(_, member)| member.outbox.send(message.clone()).is_ok())
            .count()
    }

    /// Replaces the whole document. There is no merge: the latest call wins.
    pub fn replace_content(&mut self, content: String) {
        self.content = content;
    }

    pub fn snapshot(&self) -> RoomResponse {
        RoomResponse {
            id: self.id.clone(),
            users: self.participants(),
            content: self.content.clone(),
            created_at: self.created_at,
        }
    }
}
