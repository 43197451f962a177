//! Identity store: who is currently acting.
//!
//! The store holds at most one [`Subject`]. It is owned by the caller and
//! injected into every [`Gate`](crate::Gate) that reads it, so tests can build
//! isolated stores without shared process state.
//!
//! Nothing is persisted. Credentials are validated elsewhere; `login` trusts
//! the subject it is given.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::debug;
use warden_types::Subject;

/// Snapshot of the current identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Nobody is logged in.
    Anonymous,

    /// A subject is logged in.
    Authenticated(Arc<Subject>),
}

impl Identity {
    /// Returns the subject, or `None` when anonymous.
    pub fn subject(&self) -> Option<&Subject> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(subject) => Some(subject),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

/// Change notification delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// A subject logged in, replacing any previous one.
    LoggedIn(Arc<Subject>),

    /// The current subject logged out.
    LoggedOut,
}

/// Handle returned by [`IdentityStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&IdentityEvent) + Send + Sync>;

#[derive(Debug, Default)]
struct Snapshot {
    subject: Option<Arc<Subject>>,
    generation: u64,
}

/// Single source of truth for the acting subject.
///
/// Writers (`login`/`logout`) are serialized; readers always see a whole
/// subject, swapped in as one `Arc`.
///
/// Observers run synchronously on the writer's thread, after the new
/// snapshot is visible and before `login`/`logout` returns. They may read
/// the store but must not call `login` or `logout` on it.
#[derive(Default)]
pub struct IdentityStore {
    current: RwLock<Snapshot>,
    writer: Mutex<()>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
}

impl IdentityStore {
    /// Creates an empty (anonymous) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store ready to be shared between gates.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Makes `subject` the current subject, replacing any previous one.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_rbac::identity::{Identity, IdentityStore};
    /// use warden_types::Subject;
    ///
    /// let store = IdentityStore::new();
    /// store.login(Subject::new("TestUser", "editor"));
    ///
    /// let Identity::Authenticated(current) = store.current_subject() else {
    ///     panic!("expected a subject");
    /// };
    /// assert_eq!(current.username, "TestUser");
    /// ```
    pub fn login(&self, subject: Subject) {
        let _writer = lock(&self.writer);
        let subject = Arc::new(subject);

        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            current.subject = Some(Arc::clone(&subject));
            current.generation += 1;
        }

        debug!(
            username = %subject.username,
            role = %subject.role,
            "Subject logged in"
        );
        self.notify(&IdentityEvent::LoggedIn(subject));
    }

    /// Clears the current subject.
    ///
    /// Idempotent: logging out while anonymous does nothing and notifies
    /// nobody. Returns whether a subject was cleared.
    pub fn logout(&self) -> bool {
        let _writer = lock(&self.writer);

        let previous = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let previous = current.subject.take();
            if previous.is_some() {
                current.generation += 1;
            }
            previous
        };

        match previous {
            Some(subject) => {
                debug!(username = %subject.username, "Subject logged out");
                self.notify(&IdentityEvent::LoggedOut);
                true
            }
            None => false,
        }
    }

    /// Returns the current identity. Never fails.
    pub fn current_subject(&self) -> Identity {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        match &current.subject {
            Some(subject) => Identity::Authenticated(Arc::clone(subject)),
            None => Identity::Anonymous,
        }
    }

    /// Returns the change counter, bumped on every login and effective logout.
    pub fn generation(&self) -> u64 {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Registers an observer for identity changes.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&IdentityEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        lock(&self.observers).push((id, Arc::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = lock(&self.observers);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn notify(&self, event: &IdentityEvent) {
        // Observers are cloned out so they can subscribe or unsubscribe.
        let observers: Vec<Observer> = lock(&self.observers)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(event);
        }
    }
}

impl std::fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityStore")
            .field("current", &self.current_subject())
            .field("generation", &self.generation())
            .field("observers", &lock(&self.observers).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_anonymous() {
        let store = IdentityStore::new();
        assert_eq!(store.current_subject(), Identity::Anonymous);
        assert!(store.current_subject().subject().is_none());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_login_round_trip() {
        let store = IdentityStore::new();
        let subject = Subject::new("TestUser", "admin");

        store.login(subject.clone());

        let identity = store.current_subject();
        assert!(identity.is_authenticated());
        assert_eq!(identity.subject(), Some(&subject));
    }

    #[test]
    fn test_login_replaces_subject() {
        let store = IdentityStore::new();
        store.login(Subject::new("first", "viewer"));
        store.login(Subject::new("second", "editor"));

        assert_eq!(store.current_subject().subject().unwrap().username, "second");
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let store = IdentityStore::new();
        store.login(Subject::new("TestUser", "admin"));

        assert!(store.logout());
        let after_one = store.current_subject();
        let generation = store.generation();

        assert!(!store.logout());
        assert_eq!(store.current_subject(), after_one);
        assert_eq!(store.current_subject(), Identity::Anonymous);
        assert_eq!(store.generation(), generation);
    }

    #[test]
    fn test_logout_when_never_logged_in() {
        let store = IdentityStore::new();
        assert!(!store.logout());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_observers_notified_synchronously() {
        let store = Arc::new(IdentityStore::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let reader = Arc::clone(&store);
        let sink = Arc::clone(&seen);
        store.subscribe(move |event| {
            // The new snapshot is already visible to observers.
            let visible = reader.current_subject().is_authenticated();
            sink.lock().unwrap().push((event.clone(), visible));
        });

        store.login(Subject::new("TestUser", "editor"));
        assert_eq!(seen.lock().unwrap().len(), 1);

        store.logout();
        store.logout(); // no-op, no event

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[0], (IdentityEvent::LoggedIn(s), true) if s.username == "TestUser"));
        assert_eq!(seen[1], (IdentityEvent::LoggedOut, false));
    }

    #[test]
    fn test_unsubscribe() {
        let store = IdentityStore::new();
        let count = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&count);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.login(Subject::new("a", "viewer"));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.login(Subject::new("b", "viewer"));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_readers_see_whole_subjects() {
        let store = IdentityStore::shared();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..200 {
                    if i % 2 == 0 {
                        store.login(Subject::new("alice", "admin"));
                    } else {
                        store.login(Subject::new("bob", "viewer"));
                    }
                }
                store.logout();
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        if let Some(s) = store.current_subject().subject() {
                            let consistent = (s.username == "alice" && s.role.as_str() == "admin")
                                || (s.username == "bob" && s.role.as_str() == "viewer");
                            assert!(consistent, "torn subject: {s}");
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.current_subject(), Identity::Anonymous);
    }
}
