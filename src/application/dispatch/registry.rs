//! Ordered handler registry.

use std::sync::Arc;

use crate::domain::foundation::HandlerId;
use crate::ports::Handler;

/// Handlers in registration order, plus the mandatory default.
///
/// Registration order is the tie-break for keyword and similarity routing.
/// The default handler is never part of the ordered list and therefore never
/// claims a turn by keyword or similarity.
#[derive(Clone)]
pub struct HandlerRegistry {
    default: Arc<dyn Handler>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new(default: Arc<dyn Handler>) -> Self {
        Self {
            default,
            handlers: Vec::new(),
        }
    }

    /// Adds a handler. A handler whose id is already registered replaces it
    /// in place.
    pub fn register(mut self, handler: Arc<dyn Handler>) -> Self {
        match self.handlers.iter().position(|h| h.id() == handler.id()) {
            Some(i) => self.handlers[i] = handler,
            None => self.handlers.push(handler),
        }
        self
    }

    pub fn default_handler(&self) -> &Arc<dyn Handler> {
        &self.default
    }

    /// Non-default handlers in registration order.
    pub fn ordered(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// Looks up any handler, including the default.
    pub fn get(&self, id: &HandlerId) -> Option<&Arc<dyn Handler>> {
        if self.default.id() == id {
            return Some(&self.default);
        }
        self.handlers.iter().find(|h| h.id() == id)
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.get(id).is_some()
    }

    /// Every id, registration order first and the default last.
    pub fn ids(&self) -> Vec<HandlerId> {
        self.handlers
            .iter()
            .map(|h| h.id().clone())
            .chain(std::iter::once(self.default.id().clone()))
            .collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::StubHandler;
    use super::*;

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new(Arc::new(StubHandler::new("default_chat")))
            .register(Arc::new(StubHandler::new("riskmanaging")))
            .register(Arc::new(StubHandler::new("quiz")))
    }

    #[test]
    fn ids_keep_registration_order_with_default_last() {
        let ids: Vec<String> = registry().ids().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["riskmanaging", "quiz", "default_chat"]);
    }

    #[test]
    fn get_finds_default_and_registered() {
        let r = registry();
        assert!(r.get(&HandlerId::new("default_chat")).is_some());
        assert!(r.get(&HandlerId::new("quiz")).is_some());
        assert!(r.get(&HandlerId::new("email")).is_none());
        assert_eq!(r.ordered().len(), 2);
    }

    #[test]
    fn re_registering_replaces_in_place() {
        let r = registry().register(Arc::new(StubHandler::new("riskmanaging").with_triggers(&["x"])));
        assert_eq!(r.ordered().len(), 2);
        assert_eq!(r.ordered()[0].profile().triggers, vec!["x".to_string()]);
    }
}
