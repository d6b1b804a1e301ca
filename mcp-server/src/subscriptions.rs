use std::collections::HashMap;
use std::collections::HashSet;

use mcp_types::RequestId;

/// The server-side subscription map from §3's data model:
/// `map<resourceURI, set<ID>>` of clients currently subscribed to updates for
/// a resource. Core defines only the shape; what "subscribed" means --
/// whether a `resources/subscribe` handler actually honors it, how updates
/// get pushed back out as `notifications/resources/updated` -- is left to
/// embedder-registered handlers (§9, Open Question).
///
/// The `ID` keying each subscriber is the request id of the `subscribe` call
/// that registered it, which is the only identifier the core data model
/// defines; this single-transport session has no separate notion of "client
/// identity" to key by instead (multi-peer routing is a non-goal).
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    subscribers: HashMap<String, HashSet<RequestId>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, uri: impl Into<String>, subscriber: RequestId) {
        self.subscribers.entry(uri.into()).or_default().insert(subscriber);
    }

    pub fn unsubscribe(&mut self, uri: &str, subscriber: &RequestId) {
        if let Some(subscribers) = self.subscribers.get_mut(uri) {
            subscribers.remove(subscriber);
            if subscribers.is_empty() {
                self.subscribers.remove(uri);
            }
        }
    }

    pub fn subscribers_for(&self, uri: &str) -> HashSet<RequestId> {
        self.subscribers.get(uri).cloned().unwrap_or_default()
    }

    pub fn is_subscribed(&self, uri: &str, subscriber: &RequestId) -> bool {
        self.subscribers
            .get(uri)
            .is_some_and(|subscribers| subscribers.contains(subscriber))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn subscribing_then_unsubscribing_clears_the_uri_entirely() {
        let mut table = SubscriptionTable::new();
        let id = RequestId::Integer(1);
        table.subscribe("file:///a", id.clone());
        assert!(table.is_subscribed("file:///a", &id));
        table.unsubscribe("file:///a", &id);
        assert!(!table.is_subscribed("file:///a", &id));
        assert_eq!(table.subscribers_for("file:///a"), HashSet::new());
    }

    #[test]
    fn multiple_subscribers_share_a_uri() {
        let mut table = SubscriptionTable::new();
        let a = RequestId::Integer(1);
        let b = RequestId::Integer(2);
        table.subscribe("file:///a", a.clone());
        table.subscribe("file:///a", b.clone());
        assert_eq!(table.subscribers_for("file:///a").len(), 2);
    }
}
