// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration join record linking a user to an event.

use serde::{Deserialize, Serialize};

/// Registration stored in the `registrations` collection.
///
/// At most one exists per (user_id, event_id); the document id is derived
/// from the pair so the store itself rejects duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Document ID, see [`Registration::doc_id`]
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub registered_at: String,
}

impl Registration {
    pub fn new(user_id: &str, event_id: &str, registered_at: String) -> Self {
        Self {
            id: Self::doc_id(user_id, event_id),
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            registered_at,
        }
    }

    /// Document ID for a registration pair.
    pub fn doc_id(user_id: &str, event_id: &str) -> String {
        // '+' never survives encoding, so the separator is unambiguous and
        // '/' in an id can't escape the collection path.
        format!(
            "{}+{}",
            urlencoding::encode(user_id),
            urlencoding::encode(event_id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_is_unambiguous() {
        assert_ne!(
            Registration::doc_id("a_b", "c"),
            Registration::doc_id("a", "b_c")
        );
        assert!(!Registration::doc_id("a/b", "c").contains('/'));
    }
}
