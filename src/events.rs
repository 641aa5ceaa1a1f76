use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registration key for subscribers: one entry per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Chat,
    SpectateJoin,
    SpectateLeave,
    SpectateSwitch,
    Login,
    Quit,
    WebRequest,
}

/// Closed set of things observers can watch. Payloads carry ids rather
/// than session handles so subscribers cannot hold sessions alive.
#[derive(Debug, Clone)]
pub enum EventKind {
    Chat {
        source_id: i32,
        destination: String,
        text: String,
    },
    SpectateJoin {
        viewer_id: i32,
        target_id: i32,
    },
    SpectateLeave {
        viewer_id: i32,
        target_id: i32,
    },
    SpectateSwitch {
        viewer_id: i32,
        from_id: i32,
        to_id: i32,
    },
    Login {
        user_id: i32,
    },
    Quit {
        user_id: i32,
    },
    WebRequest {
        path: String,
    },
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::Chat { .. } => EventType::Chat,
            EventKind::SpectateJoin { .. } => EventType::SpectateJoin,
            EventKind::SpectateLeave { .. } => EventType::SpectateLeave,
            EventKind::SpectateSwitch { .. } => EventType::SpectateSwitch,
            EventKind::Login { .. } => EventType::Login,
            EventKind::Quit { .. } => EventType::Quit,
            EventKind::WebRequest { .. } => EventType::WebRequest,
        }
    }
}

/// One dispatch's worth of state: the payload plus a single cancel flag.
/// Cancellation is advisory until the publisher reads it; every
/// subscriber still runs.
#[derive(Debug)]
pub struct Event {
    pub kind: EventKind,
    cancelled: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

type Callback = Box<dyn Fn(&mut Event) + Send + Sync>;

struct Subscriber {
    owner: String,
    callback: Callback,
}

/// Synchronous publish/subscribe. Subscribers run in registration order on
/// the publisher's execution context; a subscriber that never returns
/// stalls the calling request, so observers must stay quick.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventType, Vec<Arc<Subscriber>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under an owner tag. The tag is the unit of
    /// bulk removal when the owning collaborator goes away.
    pub fn subscribe<F>(&self, owner: &str, event_type: EventType, callback: F)
    where
        F: Fn(&mut Event) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap()
            .entry(event_type)
            .or_default()
            .push(Arc::new(Subscriber {
                owner: owner.to_string(),
                callback: Box::new(callback),
            }));
    }

    /// Drop every subscription held by `owner`, across all event types.
    pub fn unsubscribe(&self, owner: &str) {
        let mut subscribers = self.subscribers.write().unwrap();
        for list in subscribers.values_mut() {
            list.retain(|s| s.owner != owner);
        }
    }

    /// Invoke every subscriber for the event's kind, in order. The list is
    /// cloned out of the lock first so callbacks never run under it. The
    /// caller must check `event.is_cancelled()` before performing the
    /// guarded mutation.
    pub fn publish(&self, event: &mut Event) {
        let list: Vec<Arc<Subscriber>> = self
            .subscribers
            .read()
            .unwrap()
            .get(&event.kind.event_type())
            .cloned()
            .unwrap_or_default();
        for subscriber in list {
            (subscriber.callback)(event);
        }
    }
}
