use std::collections::{HashMap, HashSet};
use std::future::{ready, Ready};
use std::sync::RwLock;

use actix_web::{dev, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::model::Article;

pub const SESSION_HEADER: &str = "X-Session-Id";

/// Everything one user context accumulates over its lifetime.
///
/// Nothing here survives a restart: the history table only ever grows
/// (dedup aside), the scrap table shrinks only on explicit deletion, and
/// the selection set mirrors the checkboxes of the client.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    pub history: Vec<Article>,
    pub scrap: Vec<Article>,
    pub selection: HashSet<String>,
    pub last_update: Option<DateTime<Utc>>,
}

/// All live sessions, keyed by id. Each session owns an isolated copy of
/// the monitoring state; nothing is shared across ids.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionState>>,
}

impl SessionRegistry {
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .write()
            .expect("session registry lock poisoned")
            .insert(id, SessionState::default());
        id
    }

    /// A point-in-time copy of the session state, if the session exists.
    pub fn snapshot(&self, id: &Uuid) -> Option<SessionState> {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .get(id)
            .cloned()
    }

    /// Run a mutation against the session state. The lock is only held for
    /// the duration of the closure; never call back into the registry or
    /// await from inside it.
    pub fn with_session<T>(&self, id: &Uuid, f: impl FnOnce(&mut SessionState) -> T) -> Option<T> {
        self.sessions
            .write()
            .expect("session registry lock poisoned")
            .get_mut(id)
            .map(f)
    }
}

/// # The session id of the calling client, from the `X-Session-Id` header
#[derive(Debug, Clone, Copy)]
pub struct SessionId(pub Uuid);

impl FromRequest for SessionId {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        ready(extract_session_id(req))
    }
}

fn extract_session_id(req: &HttpRequest) -> Result<SessionId, ApiError> {
    let raw = req
        .headers()
        .get(SESSION_HEADER)
        .ok_or_else(|| ApiError::InvalidSession(format!("missing {SESSION_HEADER} header")))?
        .to_str()
        .map_err(|_| ApiError::InvalidSession(format!("invalid {SESSION_HEADER} header value")))?;

    let id = Uuid::parse_str(raw)
        .map_err(|_| ApiError::InvalidSession(format!("{raw} is not a valid session id")))?;

    Ok(SessionId(id))
}
