//! Chat identifiers and send targets
//!
//! WhatsApp addresses every chat with a qualified identifier: a bare number
//! or group id followed by a server suffix. Outbound sends accept bare
//! numbers and qualify them here; inbound events are stripped back to the
//! bare id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix for individual (contact) chats
pub const INDIVIDUAL_SUFFIX: &str = "@c.us";

/// Suffix for group chats
pub const GROUP_SUFFIX: &str = "@g.us";

/// Suffix for broadcast lists and status updates
pub const BROADCAST_SUFFIX: &str = "@broadcast";

/// Suffix for linked-device identities
pub const LINKED_DEVICE_SUFFIX: &str = "@lid";

/// Multi-device individual suffix, treated like [`INDIVIDUAL_SUFFIX`]
pub const MULTI_DEVICE_SUFFIX: &str = "@s.whatsapp.net";

/// Every suffix removed by [`strip_suffixes`]
pub const KNOWN_SUFFIXES: [&str; 5] = [
    INDIVIDUAL_SUFFIX,
    GROUP_SUFFIX,
    BROADCAST_SUFFIX,
    LINKED_DEVICE_SUFFIX,
    MULTI_DEVICE_SUFFIX,
];

/// Destination of an outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    /// A contact addressed by phone number (country code, no `+`)
    Individual { raw_number: String },
    /// A group addressed by its id
    Group { group_id: String },
    /// An already-qualified chat id
    Raw { chat_id: String },
}

impl Target {
    /// Target a contact by phone number
    #[must_use]
    pub fn individual(raw_number: impl Into<String>) -> Self {
        Self::Individual {
            raw_number: raw_number.into(),
        }
    }

    /// Target a group by id
    #[must_use]
    pub fn group(group_id: impl Into<String>) -> Self {
        Self::Group {
            group_id: group_id.into(),
        }
    }

    /// Target a fully-qualified chat id
    #[must_use]
    pub fn raw(chat_id: impl Into<String>) -> Self {
        Self::Raw {
            chat_id: chat_id.into(),
        }
    }

    /// The identifier as supplied by the caller
    #[must_use]
    pub fn as_input(&self) -> &str {
        match self {
            Self::Individual { raw_number } => raw_number,
            Self::Group { group_id } => group_id,
            Self::Raw { chat_id } => chat_id,
        }
    }

    /// Resolve to the wire-level chat id
    ///
    /// Idempotent: an identifier that already carries an `@` qualifier is
    /// returned unchanged.
    #[must_use]
    pub fn chat_id(&self) -> String {
        match self {
            Self::Individual { raw_number } => qualify(raw_number, INDIVIDUAL_SUFFIX),
            Self::Group { group_id } => qualify(group_id, GROUP_SUFFIX),
            Self::Raw { chat_id } => chat_id.trim().to_string(),
        }
    }

    /// Whether this target addresses a group chat
    #[must_use]
    pub fn is_group(&self) -> bool {
        ChatKind::of(&self.chat_id(), false) == ChatKind::Group
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_input())
    }
}

/// Append `suffix` unless the identifier is already qualified
fn qualify(id: &str, suffix: &str) -> String {
    let id = id.trim();
    if id.contains('@') {
        id.to_string()
    } else {
        // Callers often paste numbers as "+91 98765-43210"
        let bare: String = id
            .chars()
            .filter(|c| {
                !matches!(*c, '+' | ' ' | '(' | ')') && (suffix == GROUP_SUFFIX || *c != '-')
            })
            .collect();
        format!("{bare}{suffix}")
    }
}

/// Strip every known qualifier suffix, leaving the bare number or id
///
/// Suffixes are removed repeatedly and in any order, so identifiers such as
/// `123@lid@c.us` reduce to `123`.
#[must_use]
pub fn strip_suffixes(id: &str) -> &str {
    let mut rest = id;
    loop {
        let before = rest.len();
        for suffix in KNOWN_SUFFIXES {
            if let Some(stripped) = rest.strip_suffix(suffix) {
                rest = stripped;
            }
        }
        if rest.len() == before {
            return rest;
        }
    }
}

/// Kind of chat an identifier belongs to
///
/// Exactly one kind applies to any identifier, which keeps the
/// `isGroup`/`isBroadcast`/`isPrivate` flags mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    /// Group chat (`@g.us`)
    Group,
    /// Broadcast list or status (`@broadcast`, or flagged by the platform)
    Broadcast,
    /// One-to-one chat
    Private,
}

impl ChatKind {
    /// Classify an identifier
    ///
    /// A group suffix wins over the broadcast flag.
    #[must_use]
    pub fn of(id: &str, broadcast_flag: bool) -> Self {
        if id.ends_with(GROUP_SUFFIX) {
            Self::Group
        } else if broadcast_flag || id.ends_with(BROADCAST_SUFFIX) {
            Self::Broadcast
        } else {
            Self::Private
        }
    }

    /// Lowercase name used in webhook payloads
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Broadcast => "broadcast",
            Self::Private => "private",
        }
    }
}
