//! Ephemeral per-connection state: cursor and selection.
//!
//! Each connection owns exactly one [`Presence`] record and is the only
//! writer of it. Records are broadcast as JSON [`PresenceMessage`]s that a
//! transport carries between connections. Presence is never stored in the
//! shared document.

use crate::layer::LayerId;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of one live connection to a board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What a connection is pointing at and has selected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Presence {
    /// Cursor in canvas coordinates, `None` when off the canvas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Point>,
    #[serde(default)]
    pub selection: Vec<LayerId>,
}

/// Partial presence update. Fields left as `None` keep their value;
/// `cursor: Some(None)` clears the cursor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresenceUpdate {
    pub cursor: Option<Option<Point>>,
    pub selection: Option<Vec<LayerId>>,
}

impl PresenceUpdate {
    pub fn cursor(cursor: Option<Point>) -> Self {
        Self {
            cursor: Some(cursor),
            selection: None,
        }
    }

    pub fn selection(selection: Vec<LayerId>) -> Self {
        Self {
            cursor: None,
            selection: Some(selection),
        }
    }
}

/// How a presence write is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceOptions {
    /// Record a selection change as an undo step.
    pub add_to_history: bool,
}

impl PresenceOptions {
    pub const WITH_HISTORY: Self = Self {
        add_to_history: true,
    };
}

/// Presence wire messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceMessage {
    /// Full presence of a connection.
    Update {
        connection_id: ConnectionId,
        #[serde(flatten)]
        presence: Presence,
    },
    /// A connection went away.
    Leave { connection_id: ConnectionId },
}

/// What an incoming message changed.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    Updated(ConnectionId),
    Left(ConnectionId),
}

/// Holds the local presence and a read-only mirror of everyone else's.
pub struct PresenceBroadcaster {
    connection_id: ConnectionId,
    mine: Presence,
    others: HashMap<ConnectionId, Presence>,
    /// Pending outgoing messages (JSON strings).
    outgoing: Vec<String>,
    /// The last queued message is an update that has not been taken yet.
    update_pending: bool,
}

impl PresenceBroadcaster {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            mine: Presence::default(),
            others: HashMap::new(),
            outgoing: Vec::new(),
            update_pending: false,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn my_presence(&self) -> &Presence {
        &self.mine
    }

    /// Apply `update` to the local presence and queue a broadcast.
    ///
    /// Returns the previous selection if the selection changed.
    pub fn set_my_presence(&mut self, update: PresenceUpdate) -> Option<Vec<LayerId>> {
        let mut changed = false;

        if let Some(cursor) = update.cursor {
            changed |= self.mine.cursor != cursor;
            self.mine.cursor = cursor;
        }

        let mut previous = None;
        if let Some(selection) = update.selection {
            if selection != self.mine.selection {
                previous = Some(std::mem::replace(&mut self.mine.selection, selection));
                changed = true;
            }
        }

        if changed {
            self.queue_update();
        }
        previous
    }

    /// Presence of every other connection.
    pub fn others_presence(&self) -> &HashMap<ConnectionId, Presence> {
        &self.others
    }

    /// `(connection, selection)` for every other connection.
    pub fn others_selections(&self) -> impl Iterator<Item = (&ConnectionId, &[LayerId])> {
        self.others
            .iter()
            .map(|(id, presence)| (id, presence.selection.as_slice()))
    }

    /// Queue a leave message and clear the local cursor.
    pub fn leave(&mut self) {
        self.mine.cursor = None;
        self.queue(&PresenceMessage::Leave {
            connection_id: self.connection_id.clone(),
        });
        self.update_pending = false;
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        self.update_pending = false;
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Handle an incoming JSON message. Malformed input is ignored.
    pub fn handle_message(&mut self, json: &str) -> Option<PresenceEvent> {
        match serde_json::from_str::<PresenceMessage>(json) {
            Ok(message) => self.apply_remote(message),
            Err(err) => {
                log::warn!("ignoring malformed presence message: {err}");
                None
            }
        }
    }

    /// Apply a decoded message from another connection.
    ///
    /// Messages that claim the local connection id are dropped.
    pub fn apply_remote(&mut self, message: PresenceMessage) -> Option<PresenceEvent> {
        match message {
            PresenceMessage::Update {
                connection_id,
                presence,
            } => {
                if connection_id == self.connection_id {
                    log::debug!("dropping presence update for own connection {connection_id}");
                    return None;
                }
                self.others.insert(connection_id.clone(), presence);
                Some(PresenceEvent::Updated(connection_id))
            }
            PresenceMessage::Leave { connection_id } => {
                if connection_id == self.connection_id {
                    return None;
                }
                self.others.remove(&connection_id)?;
                Some(PresenceEvent::Left(connection_id))
            }
        }
    }

    /// Queue the current presence. An update still waiting in the queue
    /// is replaced, so only the latest state goes out.
    fn queue_update(&mut self) {
        let message = PresenceMessage::Update {
            connection_id: self.connection_id.clone(),
            presence: self.mine.clone(),
        };
        if self.update_pending {
            self.outgoing.pop();
        }
        self.update_pending = self.queue(&message);
    }

    fn queue(&mut self, message: &PresenceMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(json) => {
                self.outgoing.push(json);
                true
            }
            Err(err) => {
                log::warn!("failed to encode presence message: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<LayerId> {
        names.iter().map(|n| LayerId::from(*n)).collect()
    }

    #[test]
    fn test_set_presence_returns_previous_selection() {
        let mut presence = PresenceBroadcaster::new(ConnectionId::from("me"));
        assert_eq!(
            presence.set_my_presence(PresenceUpdate::selection(ids(&["a"]))),
            Some(vec![])
        );
        assert_eq!(
            presence.set_my_presence(PresenceUpdate::selection(ids(&["a"]))),
            None
        );
        assert_eq!(
            presence.set_my_presence(PresenceUpdate::selection(ids(&["b"]))),
            Some(ids(&["a"]))
        );
    }

    #[test]
    fn test_cursor_update_keeps_selection() {
        let mut presence = PresenceBroadcaster::new(ConnectionId::from("me"));
        presence.set_my_presence(PresenceUpdate::selection(ids(&["a"])));
        let previous = presence.set_my_presence(PresenceUpdate::cursor(Some(Point::new(1.0, 2.0))));

        assert_eq!(previous, None);
        assert_eq!(presence.my_presence().selection, ids(&["a"]));
        assert_eq!(presence.my_presence().cursor, Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_broadcast_roundtrip() {
        let mut alice = PresenceBroadcaster::new(ConnectionId::from("alice"));
        let mut bob = PresenceBroadcaster::new(ConnectionId::from("bob"));

        alice.set_my_presence(PresenceUpdate {
            cursor: Some(Some(Point::new(5.0, 6.0))),
            selection: Some(ids(&["x"])),
        });
        let messages = alice.take_outgoing();
        assert_eq!(messages.len(), 1);
        assert!(!alice.has_outgoing());

        let event = bob.handle_message(&messages[0]);
        assert_eq!(event, Some(PresenceEvent::Updated(ConnectionId::from("alice"))));
        let seen = &bob.others_presence()[&ConnectionId::from("alice")];
        assert_eq!(seen.cursor, Some(Point::new(5.0, 6.0)));
        assert_eq!(seen.selection, ids(&["x"]));
    }

    #[test]
    fn test_own_connection_messages_are_ignored() {
        let mut me = PresenceBroadcaster::new(ConnectionId::from("me"));
        let spoof = PresenceMessage::Update {
            connection_id: ConnectionId::from("me"),
            presence: Presence {
                cursor: None,
                selection: ids(&["evil"]),
            },
        };
        assert_eq!(me.apply_remote(spoof), None);
        assert!(me.others_presence().is_empty());
        assert!(me.my_presence().selection.is_empty());
    }

    #[test]
    fn test_leave_removes_record() {
        let mut alice = PresenceBroadcaster::new(ConnectionId::from("alice"));
        let mut bob = PresenceBroadcaster::new(ConnectionId::from("bob"));

        alice.set_my_presence(PresenceUpdate::cursor(Some(Point::ZERO)));
        alice.leave();
        assert_eq!(alice.my_presence().cursor, None);
        for message in alice.take_outgoing() {
            bob.handle_message(&message);
        }
        assert!(bob.others_presence().is_empty());
    }

    #[test]
    fn test_pending_update_is_replaced() {
        let mut alice = PresenceBroadcaster::new(ConnectionId::from("alice"));
        let mut bob = PresenceBroadcaster::new(ConnectionId::from("bob"));

        for x in 0..5 {
            alice.set_my_presence(PresenceUpdate::cursor(Some(Point::new(x as f64, 0.0))));
        }
        let messages = alice.take_outgoing();
        assert_eq!(messages.len(), 1);
        bob.handle_message(&messages[0]);
        assert_eq!(
            bob.others_presence()[&ConnectionId::from("alice")].cursor,
            Some(Point::new(4.0, 0.0))
        );

        alice.set_my_presence(PresenceUpdate::cursor(Some(Point::new(9.0, 9.0))));
        assert_eq!(alice.take_outgoing().len(), 1);
    }

    #[test]
    fn test_leave_is_not_replaced() {
        let mut alice = PresenceBroadcaster::new(ConnectionId::from("alice"));
        let mut bob = PresenceBroadcaster::new(ConnectionId::from("bob"));

        alice.set_my_presence(PresenceUpdate::cursor(Some(Point::ZERO)));
        alice.leave();
        alice.set_my_presence(PresenceUpdate::selection(ids(&["a"])));
        let messages = alice.take_outgoing();
        assert_eq!(messages.len(), 3);

        for message in &messages {
            bob.handle_message(message);
        }
        assert_eq!(bob.others_presence()[&ConnectionId::from("alice")].selection, ids(&["a"]));
    }

    #[test]
    fn test_wire_format() {
        let message = PresenceMessage::Update {
            connection_id: ConnectionId::from("c1"),
            presence: Presence {
                cursor: Some(Point::new(1.0, 2.0)),
                selection: ids(&["L1"]),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["connection_id"], "c1");
        assert_eq!(json["cursor"]["x"], 1.0);
        assert_eq!(json["selection"][0], "L1");

        let leave = serde_json::to_string(&PresenceMessage::Leave {
            connection_id: ConnectionId::from("c1"),
        })
        .unwrap();
        assert_eq!(leave, r#"{"type":"leave","connection_id":"c1"}"#);
    }

    #[test]
    fn test_malformed_message_is_ignored() {
        let mut me = PresenceBroadcaster::new(ConnectionId::from("me"));
        assert_eq!(me.handle_message("{\"type\":\"teleport\"}"), None);
        assert_eq!(me.handle_message("not json"), None);
    }
}
