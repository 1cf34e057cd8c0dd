use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rocket::http::{Cookie, SameSite};
use rocket::request::{FromRequest, Outcome, Request};

use crate::navigation::NavigationState;

pub const SESSION_COOKIE: &str = "artcat_session";

/// Sessions untouched for this long are dropped by [`SessionStore::cleanup`].
pub const SESSION_IDLE: Duration = Duration::from_secs(60 * 60 * 24);

struct Entry {
    state: NavigationState,
    touched: Instant,
}

/// In-memory navigation state keyed by session id.
pub struct SessionStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, id: &str, state: NavigationState) {
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(
            id.to_string(),
            Entry {
                state,
                touched: Instant::now(),
            },
        );
    }

    /// Run `f` against the session's state and store the result, under one lock.
    pub fn update<T>(&self, id: &str, f: impl FnOnce(&mut NavigationState) -> T) -> T {
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = map.entry(id.to_string()).or_insert_with(|| Entry {
            state: NavigationState::new(),
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        f(&mut entry.state)
    }

    pub fn cleanup(&self, max_idle: Duration) {
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|_, entry| entry.touched.elapsed() < max_idle);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Session id request guard ──

/// The caller's session id, read from the private cookie or freshly issued.
pub struct SessionId(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionId {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cookies = request.cookies();
        if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
            let id = cookie.value().to_string();
            if !id.is_empty() {
                return Outcome::Success(SessionId(id));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let mut cookie = Cookie::new(SESSION_COOKIE, id.clone());
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookies.add_private(cookie);
        Outcome::Success(SessionId(id))
    }
}
