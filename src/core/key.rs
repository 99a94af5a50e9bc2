//! Comparable identifiers for states and events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hashable identity shared by states and events.
///
/// Two keys are the same identity only when both the variant and the value
/// match, so `Key::from(1)` and `Key::from("1")` never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Label correlated against a state's outgoing exits.
///
/// Equality is the only thing the engine ever asks of an event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Key);

impl Event {
    /// Create an event from any key value.
    pub fn new(key: impl Into<Key>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &Key {
        &self.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Key> for Event {
    fn from(key: Key) -> Self {
        Self(key)
    }
}

impl From<&Event> for Event {
    fn from(event: &Event) -> Self {
        event.clone()
    }
}

macro_rules! impl_int_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::Int(i64::from(value))
                }
            }

            impl From<$ty> for Event {
                fn from(value: $ty) -> Self {
                    Event(Key::from(value))
                }
            }
        )*
    };
}

impl_int_key!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(value)
    }
}

impl From<&str> for Event {
    fn from(value: &str) -> Self {
        Event(Key::from(value))
    }
}

impl From<String> for Event {
    fn from(value: String) -> Self {
        Event(Key::from(value))
    }
}
