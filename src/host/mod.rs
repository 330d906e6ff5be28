//! Application host - lifecycle of the single embedded application
//!
//! Owns the only [`Session`] and is the only thing allowed to talk across the
//! isolation boundary. A new launch always tears the previous session down
//! first; the frame host does not reclaim memory promptly otherwise.
//!
//! Each session gets a generation number. Load notifications carry the
//! generation they belong to, so a late `loaded`/`failed` from a frame that
//! has already been torn down is ignored.

pub mod bridge;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::{BridgeError, FrameError};
use bridge::{InboundMessage, OutboundMessage};

/// The host's frame-sandboxing primitive
pub trait AppFrame {
    /// Start loading `url`; completion is reported back through the shell
    fn load(&mut self, url: &str) -> Result<(), FrameError>;

    fn post(&mut self, message: &OutboundMessage) -> Result<(), FrameError>;

    /// Best-effort wipe of the embedded document. Fails across origins.
    fn clear_document(&mut self) -> Result<(), FrameError>;

    /// Point the frame at a blank resource so its old document can be reclaimed
    fn navigate_blank(&mut self);

    fn is_alive(&self) -> bool;
}

/// Creates frames for new sessions
pub trait FrameFactory {
    fn create(&mut self, app_id: &str, generation: u64) -> Box<dyn AppFrame>;
}

/// One running application
pub struct Session {
    pub app_id: String,
    pub generation: u64,
    /// Application reported it is at its internal root
    pub at_root: bool,
    /// Loading indicator visible
    pub loading: bool,
    frame: Box<dyn AppFrame>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("app_id", &self.app_id)
            .field("generation", &self.generation)
            .field("at_root", &self.at_root)
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

pub struct AppHost {
    factory: Box<dyn FrameFactory>,
    session: Option<Session>,
    next_generation: u64,
    origin: String,
}

impl AppHost {
    pub fn new(factory: Box<dyn FrameFactory>, origin: String) -> Self {
        Self {
            factory,
            session: None,
            next_generation: 1,
            origin,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// A session exists and its frame is still alive
    pub fn is_running(&self) -> bool {
        self.session.as_ref().map(|s| s.frame.is_alive()).unwrap_or(false)
    }

    pub fn at_root(&self) -> bool {
        self.session.as_ref().map(|s| s.at_root).unwrap_or(false)
    }

    pub fn set_at_root(&mut self, at_root: bool) {
        if let Some(session) = self.session.as_mut() {
            session.at_root = at_root;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.session.as_ref().map(|s| s.loading).unwrap_or(false)
    }

    pub fn generation(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.generation)
    }

    /// Tear down any current session, then start `app_id` at `url`.
    /// Returns the new session's generation.
    pub fn launch(&mut self, app_id: &str, url: &str) -> Result<u64, FrameError> {
        self.teardown();

        let generation = self.next_generation;
        self.next_generation += 1;

        let mut frame = self.factory.create(app_id, generation);
        if let Err(e) = frame.load(url) {
            warn!(app_id, %e, "Application frame failed to start loading");
            frame.navigate_blank();
            return Err(e);
        }

        info!(app_id, generation, url, "Launched application");
        self.session = Some(Session {
            app_id: app_id.to_string(),
            generation,
            at_root: true,
            loading: true,
            frame,
        });
        Ok(generation)
    }

    /// Release the current session. No-op without one; returns whether a
    /// session was torn down.
    pub fn teardown(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };

        // Advisory: the frame host reclaims the document anyway once blank
        if let Err(e) = session.frame.clear_document() {
            debug!(app_id = %session.app_id, %e, "Could not clear document, releasing directly");
        }
        session.frame.navigate_blank();

        info!(app_id = %session.app_id, generation = session.generation, "Tore down application");
        true
    }

    /// Frame finished loading. Returns false for stale generations.
    pub fn frame_loaded(&mut self, generation: u64, theme: &BTreeMap<String, String>) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.generation == generation) else {
            debug!(generation, "Ignoring load notification for stale frame");
            return false;
        };
        session.loading = false;
        info!(app_id = %session.app_id, "Application loaded");

        self.post(&OutboundMessage::ThemeReady);
        self.post(&OutboundMessage::Theme { tokens: theme.clone() });
        true
    }

    /// Frame failed to load. Clears the loading indicator and returns true if
    /// the failure belongs to the current session.
    pub fn frame_failed(&mut self, generation: u64) -> bool {
        match self.session.as_mut() {
            Some(session) if session.generation == generation => {
                session.loading = false;
                warn!(app_id = %session.app_id, "Application failed to load");
                true
            }
            _ => {
                debug!(generation, "Ignoring failure notification for stale frame");
                false
            }
        }
    }

    /// Send a message to the running application. Failures are logged and
    /// reported as `false`, never raised.
    pub fn post(&mut self, message: &OutboundMessage) -> bool {
        let Some(session) = self.session.as_mut() else {
            debug!(?message, "No application to post to");
            return false;
        };
        if !session.frame.is_alive() {
            debug!(?message, "Application frame is gone, dropping message");
            return false;
        }
        match session.frame.post(message) {
            Ok(()) => true,
            Err(e) => {
                debug!(?message, %e, "Failed to post to application");
                false
            }
        }
    }

    /// Validate a message posted by the frame of session `generation`
    pub fn receive(
        &self,
        generation: u64,
        raw: &str,
        origin: &str,
    ) -> Result<InboundMessage, BridgeError> {
        let session = self.session.as_ref().ok_or(BridgeError::NoSession)?;
        if session.generation != generation {
            return Err(BridgeError::StaleSession {
                current: session.generation,
                got: generation,
            });
        }
        bridge::parse_inbound(raw, origin, &self.origin)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording frames for tests

    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    pub struct FrameLog {
        pub created: Vec<(String, u64)>,
        pub loaded_urls: Vec<String>,
        pub posted: Vec<(u64, OutboundMessage)>,
        pub cleared: Vec<u64>,
        pub blanked: Vec<u64>,
    }

    impl FrameLog {
        pub fn posted_to(&self, generation: u64) -> Vec<OutboundMessage> {
            self.posted
                .iter()
                .filter(|(g, _)| *g == generation)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    #[derive(Clone, Default)]
    pub struct RecordingFactory {
        pub log: Rc<RefCell<FrameLog>>,
        /// Frames created from now on refuse `clear_document`
        pub cross_origin: Rc<RefCell<bool>>,
        /// Frames created from now on fail `load`
        pub fail_load: Rc<RefCell<bool>>,
        pub alive: Rc<RefCell<bool>>,
    }

    impl RecordingFactory {
        pub fn new() -> Self {
            let factory = Self::default();
            *factory.alive.borrow_mut() = true;
            factory
        }
    }

    struct RecordingFrame {
        generation: u64,
        log: Rc<RefCell<FrameLog>>,
        cross_origin: bool,
        fail_load: bool,
        alive: Rc<RefCell<bool>>,
    }

    impl AppFrame for RecordingFrame {
        fn load(&mut self, url: &str) -> Result<(), FrameError> {
            if self.fail_load {
                return Err(FrameError::Gone);
            }
            self.log.borrow_mut().loaded_urls.push(url.to_string());
            Ok(())
        }

        fn post(&mut self, message: &OutboundMessage) -> Result<(), FrameError> {
            self.log.borrow_mut().posted.push((self.generation, message.clone()));
            Ok(())
        }

        fn clear_document(&mut self) -> Result<(), FrameError> {
            if self.cross_origin {
                return Err(FrameError::CrossOrigin);
            }
            self.log.borrow_mut().cleared.push(self.generation);
            Ok(())
        }

        fn navigate_blank(&mut self) {
            self.log.borrow_mut().blanked.push(self.generation);
        }

        fn is_alive(&self) -> bool {
            *self.alive.borrow()
        }
    }

    impl FrameFactory for RecordingFactory {
        fn create(&mut self, app_id: &str, generation: u64) -> Box<dyn AppFrame> {
            self.log.borrow_mut().created.push((app_id.to_string(), generation));
            Box::new(RecordingFrame {
                generation,
                log: self.log.clone(),
                cross_origin: *self.cross_origin.borrow(),
                fail_load: *self.fail_load.borrow(),
                alive: self.alive.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingFactory;
    use super::*;

    const ORIGIN: &str = "http://127.0.0.1:3000";

    fn host() -> (AppHost, RecordingFactory) {
        let factory = RecordingFactory::new();
        (AppHost::new(Box::new(factory.clone()), ORIGIN.into()), factory)
    }

    #[test]
    fn test_launch_tears_down_previous_first() {
        let (mut host, factory) = host();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            host.launch(id, &format!("{ORIGIN}/apps/{id}/")).unwrap();
            // teardowns == launches - 1
            assert_eq!(factory.log.borrow().blanked.len(), i);
        }
        let session = host.session().unwrap();
        assert_eq!(session.app_id, "c");
        assert!(session.at_root);
        assert!(session.loading);
        assert_eq!(factory.log.borrow().blanked, vec![1, 2]);
    }

    #[test]
    fn test_teardown_idempotent() {
        let (mut host, factory) = host();
        assert!(!host.teardown());
        host.launch("a", "url").unwrap();
        assert!(host.teardown());
        assert!(!host.teardown());
        assert_eq!(factory.log.borrow().blanked.len(), 1);
        assert!(!host.has_session());
    }

    #[test]
    fn test_cross_origin_teardown_still_releases() {
        let (mut host, factory) = host();
        *factory.cross_origin.borrow_mut() = true;
        host.launch("a", "url").unwrap();
        assert!(host.teardown());
        let log = factory.log.borrow();
        assert!(log.cleared.is_empty());
        assert_eq!(log.blanked, vec![1]);
    }

    #[test]
    fn test_stale_load_notifications_ignored() {
        let (mut host, factory) = host();
        let first = host.launch("a", "url").unwrap();
        let second = host.launch("b", "url").unwrap();
        assert!(!host.frame_loaded(first, &BTreeMap::new()));
        assert!(!host.frame_failed(first));
        assert!(host.is_loading());
        assert!(host.frame_loaded(second, &BTreeMap::new()));
        assert!(!host.is_loading());
        assert_eq!(
            factory.log.borrow().posted_to(second),
            vec![OutboundMessage::ThemeReady, OutboundMessage::Theme { tokens: BTreeMap::new() }]
        );
    }

    #[test]
    fn test_failed_load_start_leaves_no_session() {
        let (mut host, factory) = host();
        *factory.fail_load.borrow_mut() = true;
        assert!(host.launch("a", "url").is_err());
        assert!(!host.has_session());
        assert!(!host.is_loading());
    }

    #[test]
    fn test_receive_requires_session() {
        let (mut host, _factory) = host();
        assert!(matches!(
            host.receive(1, r#"{"kind":"AtTop"}"#, ORIGIN),
            Err(BridgeError::NoSession)
        ));
        let generation = host.launch("a", "url").unwrap();
        assert_eq!(
            host.receive(generation, r#"{"kind":"AtTop"}"#, ORIGIN).unwrap(),
            InboundMessage::AtTop
        );
    }

    #[test]
    fn test_receive_rejects_previous_session() {
        let (mut host, _factory) = host();
        let first = host.launch("a", "url").unwrap();
        let second = host.launch("b", "url").unwrap();
        assert!(matches!(
            host.receive(first, r#"{"kind":"NavState","atRoot":false}"#, ORIGIN),
            Err(BridgeError::StaleSession { current, got }) if current == second && got == first
        ));
    }

    #[test]
    fn test_dead_frame_is_not_running() {
        let (mut host, factory) = host();
        host.launch("a", "url").unwrap();
        assert!(host.is_running());
        *factory.alive.borrow_mut() = false;
        assert!(!host.is_running());
        assert!(host.has_session());
        assert!(!host.post(&OutboundMessage::Back));
    }
}
