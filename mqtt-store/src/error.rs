#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// `#` used anywhere but as the last segment of a pattern
    #[error("malformed pattern, # wildcard can only be at the end of a pattern. In: {0}")]
    MalformedPattern(String),
    /// Wildcard character in a key that must be concrete
    #[error("invalid key, cannot use key with wildcards finding patterns: {0}")]
    InvalidKey(String),
    #[error("too many topic levels, {0}")]
    TooManyTopicLevels(String),
    #[error("the number of stored entries has reached the limit of {0}")]
    TooManyEntries(isize),
}
