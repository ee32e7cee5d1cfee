//! Per-connection scroll spy state.

use tracing::debug;
use uuid::Uuid;

use super::events::{ClientMessage, ServerMessage};
use crate::error::ScrollSpyError;
use crate::scroll_spy::{ScrollSpy, ScrollSpyOptions, fragment_for};

/// One WebSocket client's scroll spy. Each connection owns its own spy, so
/// clients never see each other's sections.
#[derive(Debug)]
pub struct ScrollSpySession {
    connection_id: Uuid,
    spy: ScrollSpy,
}

impl ScrollSpySession {
    pub fn new(connection_id: Uuid, options: ScrollSpyOptions) -> Result<Self, ScrollSpyError> {
        Ok(Self {
            connection_id,
            spy: ScrollSpy::new(options)?,
        })
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn spy(&self) -> &ScrollSpy {
        &self.spy
    }

    /// Apply one client message and produce the reply.
    pub fn handle(&mut self, msg: ClientMessage) -> ServerMessage {
        match msg {
            ClientMessage::Register { sections } => {
                let sections = self.spy.register(sections);
                ServerMessage::Registered {
                    sections,
                    generation: self.spy.generation(),
                }
            }
            ClientMessage::Configure { options } => match self.spy.configure(options) {
                Ok(()) => ServerMessage::Configured {
                    generation: self.spy.generation(),
                    threshold: self.spy.options().threshold,
                },
                Err(e) => ServerMessage::error("INVALID_OPTIONS", e.to_string()),
            },
            ClientMessage::Visibility { entries } => {
                if !self.spy.is_attached() {
                    return detached_error();
                }
                self.spy.on_visibility(&entries);
                self.active_section()
            }
            ClientMessage::Layout { snapshot } => {
                if !self.spy.is_attached() {
                    return detached_error();
                }
                self.spy.on_layout(&snapshot);
                self.active_section()
            }
            ClientMessage::Detach => {
                let was_attached = self.spy.detach();
                debug!(connection_id = %self.connection_id, was_attached, "Scroll spy detached");
                ServerMessage::Detached { was_attached }
            }
            ClientMessage::Ping { timestamp } => ServerMessage::Pong {
                timestamp: timestamp.unwrap_or_else(chrono::Utc::now),
            },
        }
    }

    fn active_section(&self) -> ServerMessage {
        let id = self.spy.active().map(String::from);
        let fragment = id.as_deref().map(fragment_for);
        ServerMessage::ActiveSection { id, fragment }
    }
}

fn detached_error() -> ServerMessage {
    ServerMessage::error(
        "DETACHED",
        "Scroll spy is detached; send Register to resume",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll_spy::{LayoutSnapshot, Rect, SectionRef, VisibilityEntry};
    use pretty_assertions::assert_eq;

    fn session() -> ScrollSpySession {
        ScrollSpySession::new(Uuid::new_v4(), ScrollSpyOptions::default()).unwrap()
    }

    fn register(session: &mut ScrollSpySession, ids: &[&str]) -> ServerMessage {
        session.handle(ClientMessage::Register {
            sections: ids.iter().map(|id| SectionRef::new(*id)).collect(),
        })
    }

    #[test]
    fn test_register_then_visibility() {
        let mut s = session();
        assert_eq!(
            register(&mut s, &["introduction", "architecture", "embeddings"]),
            ServerMessage::Registered {
                sections: 3,
                generation: 1
            }
        );
        let reply = s.handle(ClientMessage::Visibility {
            entries: vec![
                VisibilityEntry::new("embeddings", 0.9),
                VisibilityEntry::new("architecture", 0.3),
            ],
        });
        assert_eq!(
            reply,
            ServerMessage::ActiveSection {
                id: Some("architecture".into()),
                fragment: Some("#architecture".into()),
            }
        );
    }

    #[test]
    fn test_nothing_visible_before_any_selection() {
        let mut s = session();
        register(&mut s, &["a"]);
        let reply = s.handle(ClientMessage::Visibility { entries: vec![] });
        assert_eq!(
            reply,
            ServerMessage::ActiveSection {
                id: None,
                fragment: None
            }
        );
    }

    #[test]
    fn test_layout_message() {
        let mut s = session();
        register(&mut s, &["a", "b"]);
        let snapshot = LayoutSnapshot::new(Rect::new(0.0, 0.0, 800.0, 600.0))
            .with_region("a", Rect::new(0.0, -900.0, 800.0, 600.0))
            .with_region("b", Rect::new(0.0, 100.0, 800.0, 600.0));
        let reply = s.handle(ClientMessage::Layout { snapshot });
        assert_eq!(
            reply,
            ServerMessage::ActiveSection {
                id: Some("b".into()),
                fragment: Some("#b".into()),
            }
        );
    }

    #[test]
    fn test_detach_blocks_updates_until_register() {
        let mut s = session();
        register(&mut s, &["a", "b"]);
        s.handle(ClientMessage::Visibility {
            entries: vec![VisibilityEntry::new("b", 1.0)],
        });

        assert_eq!(
            s.handle(ClientMessage::Detach),
            ServerMessage::Detached { was_attached: true }
        );
        assert_eq!(
            s.handle(ClientMessage::Detach),
            ServerMessage::Detached {
                was_attached: false
            }
        );
        let reply = s.handle(ClientMessage::Visibility {
            entries: vec![VisibilityEntry::new("a", 1.0)],
        });
        assert!(matches!(reply, ServerMessage::Error { ref code, .. } if code == "DETACHED"));
        assert_eq!(s.spy().active(), Some("b"));

        register(&mut s, &["a", "b"]);
        let reply = s.handle(ClientMessage::Visibility {
            entries: vec![VisibilityEntry::new("a", 1.0)],
        });
        assert!(matches!(reply, ServerMessage::ActiveSection { id: Some(ref id), .. } if id == "a"));
    }

    #[test]
    fn test_configure_bumps_generation() {
        let mut s = session();
        let reply = s.handle(ClientMessage::Configure {
            options: ScrollSpyOptions::default().with_threshold(3.0),
        });
        assert_eq!(
            reply,
            ServerMessage::Configured {
                generation: 2,
                threshold: 1.0
            }
        );

        let reply = s.handle(ClientMessage::Configure {
            options: ScrollSpyOptions::default().with_threshold(f64::INFINITY),
        });
        assert!(matches!(reply, ServerMessage::Error { ref code, .. } if code == "INVALID_OPTIONS"));
        assert_eq!(s.spy().generation(), 2);
    }

    #[test]
    fn test_configure_does_not_reattach() {
        let mut s = session();
        register(&mut s, &["a"]);
        s.handle(ClientMessage::Detach);

        let reply = s.handle(ClientMessage::Configure {
            options: ScrollSpyOptions::default().with_threshold(0.5),
        });
        assert!(matches!(reply, ServerMessage::Configured { generation: 2, .. }));
        assert!(!s.spy().is_attached());

        let reply = s.handle(ClientMessage::Visibility {
            entries: vec![VisibilityEntry::new("a", 1.0)],
        });
        assert!(matches!(reply, ServerMessage::Error { ref code, .. } if code == "DETACHED"));
    }

    #[test]
    fn test_ping_echoes_timestamp() {
        let mut s = session();
        let now = chrono::Utc::now();
        assert_eq!(
            s.handle(ClientMessage::Ping {
                timestamp: Some(now)
            }),
            ServerMessage::Pong { timestamp: now }
        );
    }
}
