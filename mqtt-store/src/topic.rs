use std::fmt::{self, Write};
use std::{ops, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;
use crate::Result;

pub const SEPARATOR: char = '/';
pub const WILDCARD_ONE: &str = "+";
pub const WILDCARD_ALL: &str = "#";

/// One `/`-delimited segment of a key.
///
/// Parsing is total: any string is a valid level. `+` and `#` become wildcard levels, but the tree
/// treats them as ordinary edge labels on insertion; only the searches give them meaning.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Hash)]
pub enum Level {
    Normal(String),
    Blank,
    SingleWildcard, // Single level wildcard +
    MultiWildcard,  // Multi-level wildcard #
}

impl Level {
    #[inline]
    pub fn parse<T: AsRef<str>>(s: T) -> Level {
        match s.as_ref() {
            WILDCARD_ONE => Level::SingleWildcard,
            WILDCARD_ALL => Level::MultiWildcard,
            "" => Level::Blank,
            s => Level::Normal(String::from(s)),
        }
    }

    #[inline]
    pub fn value(&self) -> Option<&str> {
        match *self {
            Level::Normal(ref s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        matches!(*self, Level::Normal(_))
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        matches!(*self, Level::SingleWildcard | Level::MultiWildcard)
    }
}

impl FromStr for Level {
    type Err = StoreError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        Ok(Level::parse(s))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Level::Normal(ref s) => f.write_str(s.as_str()),
            Level::Blank => Ok(()),
            Level::SingleWildcard => f.write_str(WILDCARD_ONE),
            Level::MultiWildcard => f.write_str(WILDCARD_ALL),
        }
    }
}

/// Serialized as the segment text, so a level works as a map key in text formats.
impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Level::Normal(s) => serializer.serialize_str(s),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Level::parse)
    }
}

/// A key split into levels. An empty string has no levels at all.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Default, Serialize, Deserialize)]
pub struct Topic(Vec<Level>);

impl Topic {
    #[inline]
    pub fn parse<T: AsRef<str>>(s: T) -> Topic {
        let s = s.as_ref();
        if s.is_empty() {
            return Topic::default();
        }
        Topic(s.split(SEPARATOR).map(Level::parse).collect())
    }

    #[inline]
    pub fn levels(&self) -> &Vec<Level> {
        &self.0
    }

    #[inline]
    pub fn has_wildcards(&self) -> bool {
        self.0.iter().any(Level::is_wildcard)
    }

    /// `#` may only be the last level of a pattern.
    #[inline]
    pub fn is_filter_valid(&self) -> bool {
        !self
            .0
            .iter()
            .enumerate()
            .any(|(pos, level)| matches!(level, Level::MultiWildcard) && pos != self.0.len() - 1)
    }

    /// Segment strings, in order.
    #[inline]
    pub fn sections(&self) -> Vec<String> {
        self.0.iter().map(|l| l.to_string()).collect()
    }
}

/// Parses a pattern for [`crate::MqttStore::find_matching`].
pub fn parse_filter(pattern: &str) -> Result<Topic> {
    let topic = Topic::parse(pattern);
    if topic.is_filter_valid() {
        Ok(topic)
    } else {
        Err(StoreError::MalformedPattern(pattern.into()))
    }
}

/// Parses a concrete key for [`crate::MqttStore::find_patterns`]. The key must not contain a
/// wildcard character anywhere, not even inside a longer segment.
pub fn parse_name(key: &str) -> Result<Topic> {
    if key.contains(['+', '#']) {
        return Err(StoreError::InvalidKey(key.into()));
    }
    Ok(Topic::parse(key))
}

impl FromStr for Topic {
    type Err = StoreError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        Ok(Topic::parse(s))
    }
}

impl From<&[Level]> for Topic {
    fn from(s: &[Level]) -> Self {
        Topic(s.to_vec())
    }
}

impl From<Vec<Level>> for Topic {
    fn from(v: Vec<Level>) -> Self {
        Topic(v)
    }
}

impl From<Topic> for Vec<Level> {
    fn from(t: Topic) -> Self {
        t.0
    }
}

impl ops::Deref for Topic {
    type Target = Vec<Level>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for level in &self.0 {
            if first {
                first = false;
            } else {
                f.write_char(SEPARATOR)?;
            }

            level.fmt(f)?;
        }

        Ok(())
    }
}
