use std::sync::Arc;
use crate::models::{ConnectionId, ContentChangeMessage, JoinRoomMessage, ReceivedMessage};
use crate::ws::{ConnectionHub, RoomRegistry};
use super::msg_content_handler::handle_content_change_message;
use super::msg_join_handler::handle_join_message;
use super::msg_leave_handler::handle_disconnect;

/// Everything a connection can ask of the room manager.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    Join(JoinRoomMessage),
    ContentChange(ContentChangeMessage),
    Disconnect,
}

impl From<ReceivedMessage> for RoomEvent {
    fn from(msg: ReceivedMessage) -> Self {
        match msg {
            ReceivedMessage::JoinRoom(join_msg) => RoomEvent::Join(join_msg),
            ReceivedMessage::ContentChange(change_msg) => RoomEvent::ContentChange(change_msg),
        }
    }
}

/// Applies inbound events to the registry and fans the results out through the hub.
#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: Arc<RoomRegistry>,
    hub: Arc<ConnectionHub>,
}

impl EventRouter {
    pub fn new(registry: Arc<RoomRegistry>, hub: Arc<ConnectionHub>) -> Self {
        Self { registry, hub }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn dispatch(&self, connection_id: &ConnectionId, event: RoomEvent) {
        match event {
            RoomEvent::Join(join_msg) => {
                handle_join_message(join_msg, connection_id, &self.registry, &self.hub);
            }
            RoomEvent::ContentChange(change_msg) => {
                handle_content_change_message(change_msg, connection_id, &self.registry);
            }
            RoomEvent::Disconnect => {
                handle_disconnect(connection_id, &self.registry, &self.hub);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomJoinedMessage, SendMessage};
    use crate::ws::{RegistryStats, DEFAULT_CONTENT};
    use std::thread;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn router() -> EventRouter {
        EventRouter::new(Arc::new(RoomRegistry::new()), Arc::new(ConnectionHub::new()))
    }

    fn join(room_id: &str, name: &str) -> RoomEvent {
        RoomEvent::Join(JoinRoomMessage {
            room_id: room_id.to_string(),
            user_name: name.to_string(),
            color: "#ff8800".to_string(),
        })
    }

    fn change(room_id: &str, content: &str) -> RoomEvent {
        RoomEvent::ContentChange(ContentChangeMessage {
            room_id: room_id.to_string(),
            content: content.to_string(),
        })
    }

    fn drain(rx: &mut UnboundedReceiver<SendMessage>) -> Vec<SendMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn expect_room_joined(rx: &mut UnboundedReceiver<SendMessage>) -> RoomJoinedMessage {
        match drain(rx).as_slice() {
            [SendMessage::RoomJoined(joined)] => joined.clone(),
            other => panic!("expected a single room-joined, got {other:?}"),
        }
    }

    #[test]
    fn two_user_session_walkthrough() {
        let router = router();
        let (a, mut rx_a) = router.hub().register();
        let (b, mut rx_b) = router.hub().register();

        router.dispatch(&a, join("ABC123", "Alice"));
        let joined = expect_room_joined(&mut rx_a);
        assert_eq!(joined.content, DEFAULT_CONTENT);
        assert!(joined.users.iter().all(|u| u.id == a));

        router.dispatch(&b, join("ABC123", "Bob"));
        let joined = expect_room_joined(&mut rx_b);
        assert_eq!(joined.content, DEFAULT_CONTENT);
        let peers: Vec<_> = joined
            .users
            .iter()
            .filter(|u| u.id != b)
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(peers, vec!["Alice"]);
        match drain(&mut rx_a).as_slice() {
            [SendMessage::UserJoined(p)] => {
                assert_eq!(p.id, b);
                assert_eq!(p.name, "Bob");
            }
            other => panic!("expected user-joined, got {other:?}"),
        }

        router.dispatch(&a, change("ABC123", "hello"));
        assert_eq!(drain(&mut rx_b), vec![SendMessage::ContentChanged("hello".into())]);
        assert!(drain(&mut rx_a).is_empty());

        router.dispatch(&b, RoomEvent::Disconnect);
        assert_eq!(drain(&mut rx_a), vec![SendMessage::UserLeft(b.clone())]);
        let stats = router.registry().stats();
        assert_eq!((stats.rooms, stats.participants), (1, 1));

        router.dispatch(&a, RoomEvent::Disconnect);
        assert!(!router.registry().contains("ABC123"));
        assert_eq!(router.hub().connection_count(), 0);
    }

    #[test]
    fn content_change_for_unknown_room_is_dropped() {
        let router = router();
        let (a, mut rx_a) = router.hub().register();
        let (b, mut rx_b) = router.hub().register();
        router.dispatch(&a, join("real", "Alice"));
        drain(&mut rx_a);

        router.dispatch(&b, change("missing", "text"));
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_b).is_empty());
        assert!(!router.registry().contains("missing"));
    }

    #[test]
    fn content_change_reaches_each_other_member_once() {
        let router = router();
        let mut members = Vec::new();
        for name in ["a", "b", "c", "d"] {
            let (id, rx) = router.hub().register();
            router.dispatch(&id, join("room", name));
            members.push((id, rx));
        }
        for (_, rx) in members.iter_mut() {
            drain(rx);
        }

        let sender = members[0].0.clone();
        router.dispatch(&sender, change("room", "v2"));

        let (_, rx) = &mut members[0];
        assert!(drain(rx).is_empty());
        for (_, rx) in members.iter_mut().skip(1) {
            assert_eq!(drain(rx), vec![SendMessage::ContentChanged("v2".into())]);
        }
    }

    #[test]
    fn later_join_sees_last_committed_content() {
        let router = router();
        let (a, _rx_a) = router.hub().register();
        let (b, mut rx_b) = router.hub().register();
        router.dispatch(&a, join("r", "Alice"));
        router.dispatch(&a, change("r", "first"));
        router.dispatch(&a, change("r", "second"));

        router.dispatch(&b, join("r", "Bob"));
        assert_eq!(expect_room_joined(&mut rx_b).content, "second");
    }

    #[test]
    fn repeated_disconnect_is_idempotent() {
        let router = router();
        let (a, mut rx_a) = router.hub().register();
        let (b, _rx_b) = router.hub().register();
        let (c, _rx_c) = router.hub().register();
        router.dispatch(&a, join("r", "Alice"));
        router.dispatch(&b, join("r", "Bob"));
        router.dispatch(&c, join("r", "Carol"));
        drain(&mut rx_a);

        router.dispatch(&b, RoomEvent::Disconnect);
        router.dispatch(&b, RoomEvent::Disconnect);
        assert_eq!(drain(&mut rx_a), vec![SendMessage::UserLeft(b.clone())]);
        assert_eq!(router.registry().stats().participants, 2);
    }

    #[test]
    fn disconnect_without_room_is_noop() {
        let router = router();
        let (a, _rx) = router.hub().register();
        router.dispatch(&a, RoomEvent::Disconnect);
        assert_eq!(router.registry().stats().rooms, 0);
    }

    #[test]
    fn repeat_join_overwrites_own_record() {
        let router = router();
        let (a, mut rx_a) = router.hub().register();
        router.dispatch(&a, join("r", "Alice"));
        router.dispatch(&a, join("r", "Alicia"));

        let replies = drain(&mut rx_a);
        let Some(SendMessage::RoomJoined(last)) = replies.last() else {
            panic!("expected room-joined, got {replies:?}");
        };
        assert_eq!(last.users.len(), 1);
        assert_eq!(last.users[0].name, "Alicia");
        assert_eq!(router.registry().stats().participants, 1);
    }

    #[test]
    fn joining_another_room_leaves_the_first() {
        let router = router();
        let (a, _rx_a) = router.hub().register();
        let (b, mut rx_b) = router.hub().register();
        router.dispatch(&a, join("one", "Alice"));
        router.dispatch(&b, join("one", "Bob"));
        drain(&mut rx_b);

        router.dispatch(&a, join("two", "Alice"));
        assert_eq!(drain(&mut rx_b), vec![SendMessage::UserLeft(a.clone())]);
        assert_eq!(router.hub().room_of(&a).as_deref(), Some("two"));

        router.dispatch(&b, RoomEvent::Disconnect);
        assert!(!router.registry().contains("one"));
        assert!(router.registry().contains("two"));
    }

    #[test]
    fn last_leave_then_rejoin_starts_fresh() {
        let router = router();
        let (a, _rx_a) = router.hub().register();
        router.dispatch(&a, join("r", "Alice"));
        router.dispatch(&a, change("r", "scratch"));
        router.dispatch(&a, RoomEvent::Disconnect);
        assert!(!router.registry().contains("r"));

        let (b, mut rx_b) = router.hub().register();
        router.dispatch(&b, join("r", "Bob"));
        let joined = expect_room_joined(&mut rx_b);
        assert_eq!(joined.content, DEFAULT_CONTENT);
        assert_eq!(joined.users.len(), 1);
        assert_eq!(joined.users[0].id, b);
    }

    #[test]
    fn join_arriving_after_disconnect_leaves_no_record() {
        let router = router();
        let (a, mut rx_a) = router.hub().register();

        router.dispatch(&a, RoomEvent::Disconnect);
        router.dispatch(&a, join("r", "Alice"));
        assert!(drain(&mut rx_a).is_empty());
        assert!(!router.registry().contains("r"));
        assert_eq!(router.registry().stats(), RegistryStats::default());

        router.dispatch(&a, RoomEvent::Disconnect);
        assert!(!router.registry().contains("r"));
    }

    #[test]
    fn join_after_close_does_not_disturb_existing_members() {
        let router = router();
        let (a, mut rx_a) = router.hub().register();
        let (b, _rx_b) = router.hub().register();
        router.dispatch(&a, join("r", "Alice"));
        drain(&mut rx_a);

        router.dispatch(&b, RoomEvent::Disconnect);
        router.dispatch(&b, join("r", "Bob"));
        assert!(drain(&mut rx_a).is_empty());
        let snapshot = router.registry().snapshot("r").unwrap();
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.users[0].id, a);
    }

    fn version_of(content: &str) -> i64 {
        if content == DEFAULT_CONTENT {
            return -1;
        }
        content
            .strip_prefix('v')
            .and_then(|n| n.parse().ok())
            .unwrap_or_else(|| panic!("content {content:?} was never committed"))
    }

    #[test]
    fn concurrent_joins_only_observe_committed_content() {
        const VERSIONS: i64 = 200;
        let router = router();
        let (writer, _rx_writer) = router.hub().register();
        router.dispatch(&writer, join("shared", "Writer"));

        thread::scope(|s| {
            let router = &router;
            s.spawn(move || {
                for version in 0..VERSIONS {
                    router.dispatch(&writer, change("shared", &format!("v{version}")));
                }
            });

            for worker in 0..6 {
                s.spawn(move || {
                    let (id, mut rx) = router.hub().register();
                    router.dispatch(&id, join("shared", &format!("reader-{worker}")));

                    let mut seen = match rx.try_recv() {
                        Ok(SendMessage::RoomJoined(joined)) => version_of(&joined.content),
                        other => panic!("expected room-joined first, got {other:?}"),
                    };
                    // Everything relayed after the join must be newer than what the join saw.
                    thread::sleep(Duration::from_millis(5));
                    for msg in drain(&mut rx) {
                        if let SendMessage::ContentChanged(content) = msg {
                            let version = version_of(&content);
                            assert!(version > seen, "saw v{version} after v{seen}");
                            seen = version;
                        }
                    }
                });
            }
        });

        let content = router.registry().snapshot("shared").unwrap().content;
        assert_eq!(content, format!("v{}", VERSIONS - 1));
    }
}
