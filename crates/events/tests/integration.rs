//! Integration tests for events

#[cfg(test)]
mod tests {
    use wbx_events::*;
    use wbx_types::PhaseKind;

    /// Emitter that tags every event with a session id
    struct Session {
        id: String,
        sender: EventSender,
    }

    impl EventEmitter for Session {
        fn event_sender(&self) -> Option<&EventSender> {
            Some(&self.sender)
        }

        fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
            meta.session_id = Some(self.id.clone());
        }
    }

    #[tokio::test]
    async fn test_event_sender_ext() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(
            event1.event,
            AppEvent::General(GeneralEvent::Error { .. })
        ));
        assert_eq!(event1.meta.tracing_level(), tracing::Level::ERROR);

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2.event,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_emitter_enriches_metadata() {
        let (sender, mut rx) = channel();
        let session = Session {
            id: "session-1".into(),
            sender,
        };

        session.emit(AppEvent::Build(BuildEvent::PhaseSkipped {
            session_id: "session-1".into(),
            phase: PhaseKind::Compile,
            label: "compile App".into(),
            reason: "up to date".into(),
        }));

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.session_id.as_deref(), Some("session-1"));
        assert_eq!(message.meta.source.as_str(), "build");
    }

    #[test]
    fn test_emit_without_receiver_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit_warning("nobody is listening");
    }
}
