//! Shareable workspace links.
//!
//! A link looks like `/office?room=room-ab12cd#state=<encoded snapshot>`.
//! The query carries the room id; the fragment lets a fresh context
//! bootstrap from the sender's state.

use rand::Rng;
use std::fmt;
use tracing::warn;


/// Fragment prefix marking an embedded snapshot
pub const STATE_FRAGMENT_PREFIX: &str = "state=";

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ShareLink {
    path: String,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl ShareLink {
    /// Parse `path?query#fragment`. Unparseable query strings are dropped.
    pub fn parse(link: &str) -> Self {
        let (rest, fragment) = match link.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (link, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, query),
            None => (rest, ""),
        };

        let query = serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring malformed share link query");
            Vec::new()
        });

        let fragment = fragment.map(|f| match urlencoding::decode(f) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => f.to_string(),
        });

        Self {
            path: path.to_string(),
            query,
            fragment,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set a query parameter, replacing an existing one in place
    pub fn set_query_param(&mut self, name: &str, value: &str) {
        match self.query.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.query.push((name.to_string(), value.to_string())),
        }
    }

    /// Room id carried by the link, or a freshly generated one.
    ///
    /// Either way the id ends up in the link so re-sharing keeps the room.
    pub fn resolve_room_id(&mut self, param: &str) -> String {
        let room_id = self
            .query_param(param)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_room_id);

        if self.query_param(param) != Some(room_id.as_str()) {
            self.set_query_param(param, &room_id);
        }
        room_id
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Encoded snapshot embedded in the fragment, if any
    pub fn state_fragment(&self) -> Option<&str> {
        self.fragment
            .as_deref()
            .and_then(|f| f.strip_prefix(STATE_FRAGMENT_PREFIX))
            .filter(|state| !state.is_empty())
    }

    pub fn set_state_fragment(&mut self, encoded: &str) {
        self.fragment = Some(format!("{}{}", STATE_FRAGMENT_PREFIX, encoded));
    }

    pub fn clear_fragment(&mut self) {
        self.fragment = None;
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            // Serializing string pairs cannot fail
            let query = serde_urlencoded::to_string(&self.query).map_err(|_| fmt::Error)?;
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

/// Room id: `room-{6 chars}`
pub fn generate_room_id() -> String {
    format!("room-{}", random_base36(6))
}

/// Context id: `client-{8 chars}`
pub fn generate_context_id() -> String {
    format!("client-{}", random_base36(8))
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..36u8);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}
