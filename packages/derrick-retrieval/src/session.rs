//! Short-lived per-conversation memory.
//!
//! Sessions live in process memory only; a restart forgets everything. An
//! entry idle past the configured TTL is treated as not found on its next
//! access and removed. All map access goes through one async mutex, which
//! also serialises appends for a given session id.

use std::collections::HashMap;

use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use derrick_domain::{EntityMention, Intent, coref};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Turn {
	pub query: String,
	pub intent: Intent,
	pub entities: Vec<EntityMention>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Session {
	pub id: Uuid,
	pub turns: Vec<Turn>,
	pub created_at: OffsetDateTime,
	pub last_seen: OffsetDateTime,
}

pub struct SessionStore {
	ttl: Duration,
	max_turns: usize,
	sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionStore {
	pub fn new(cfg: &derrick_config::SessionConfig) -> Self {
		Self {
			ttl: Duration::seconds(cfg.ttl_seconds as i64),
			max_turns: cfg.max_turns as usize,
			sessions: Mutex::new(HashMap::new()),
		}
	}

	/// Rewrite pronouns and demonstratives in `query` against the session's
	/// turn history. Read-only: an expired or unknown session just passes the
	/// query through.
	pub async fn resolve_references(&self, id: Uuid, query: &str) -> String {
		let now = OffsetDateTime::now_utc();
		let mut sessions = self.sessions.lock().await;

		if self.expire_if_idle(&mut sessions, id, now) {
			return query.to_string();
		}

		let Some(session) = sessions.get(&id) else {
			return query.to_string();
		};
		let recent: Vec<EntityMention> = session
			.turns
			.iter()
			.rev()
			.flat_map(|turn| turn.entities.iter().cloned())
			.collect();

		coref::resolve_references(query, &recent)
	}

	/// Record a completed turn, creating the session on first use.
	pub async fn append(&self, id: Uuid, turn: Turn) -> usize {
		let now = OffsetDateTime::now_utc();
		let mut sessions = self.sessions.lock().await;

		self.expire_if_idle(&mut sessions, id, now);

		let session = sessions.entry(id).or_insert_with(|| Session {
			id,
			turns: Vec::new(),
			created_at: now,
			last_seen: now,
		});

		session.turns.push(turn);

		if session.turns.len() > self.max_turns {
			let excess = session.turns.len() - self.max_turns;
			session.turns.drain(..excess);
		}

		session.last_seen = now;

		session.turns.len()
	}

	pub async fn get(&self, id: Uuid) -> Option<Session> {
		let now = OffsetDateTime::now_utc();
		let mut sessions = self.sessions.lock().await;

		if self.expire_if_idle(&mut sessions, id, now) {
			return None;
		}

		sessions.get(&id).cloned()
	}

	/// Drop every session idle past the TTL. Returns how many were evicted.
	pub async fn sweep(&self) -> usize {
		let now = OffsetDateTime::now_utc();
		let mut sessions = self.sessions.lock().await;
		let before = sessions.len();

		sessions.retain(|_, session| now - session.last_seen <= self.ttl);

		before - sessions.len()
	}

	fn expire_if_idle(
		&self,
		sessions: &mut HashMap<Uuid, Session>,
		id: Uuid,
		now: OffsetDateTime,
	) -> bool {
		let expired = sessions
			.get(&id)
			.map(|session| now - session.last_seen > self.ttl)
			.unwrap_or(false);

		if expired {
			sessions.remove(&id);
		}

		expired
	}
}
