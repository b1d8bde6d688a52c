// Relation tag parsing: prefix patterns, roles and shared identifiers

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// Role a relation value plays for a digital object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagRole {
    Full,
    Thumb,
    LinkTo,
}

impl TagRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagRole::Full => "full",
            TagRole::Thumb => "thumb",
            TagRole::LinkTo => "linkto",
        }
    }
}

impl fmt::Display for TagRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A configured prefix and the anchored pattern derived from it
#[derive(Debug, Clone)]
pub struct TagPattern {
    prefix: String,
    pattern: Regex,
}

impl TagPattern {
    /// The prefix is matched literally at the start of a value.
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("^{}", regex::escape(prefix)))?;
        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    /// Remainder of `value` after the prefix, if it matches
    pub fn strip<'v>(&self, value: &'v str) -> Option<&'v str> {
        self.pattern.find(value).map(|m| &value[m.end()..])
    }
}

impl PartialEq for TagPattern {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
    }
}

impl Serialize for TagPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.prefix)
    }
}

/// Relation prefixes for each role. Read-only while a request is processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagConfig {
    pub full: TagPattern,
    pub thumb: TagPattern,
    pub linkto: TagPattern,
}

impl TagConfig {
    pub fn new(full: &str, thumb: &str, linkto: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            full: TagPattern::new(full)?,
            thumb: TagPattern::new(thumb)?,
            linkto: TagPattern::new(linkto)?,
        })
    }

    pub fn pattern(&self, role: TagRole) -> &TagPattern {
        match role {
            TagRole::Full => &self.full,
            TagRole::Thumb => &self.thumb,
            TagRole::LinkTo => &self.linkto,
        }
    }
}

/// A relation value with its prefix and optional shared id stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRelation {
    pub role: TagRole,
    pub shared_id: Option<String>,
    pub payload: String,
}

/// Leading `[A-Za-z0-9]+:` token of `value`, without the colon.
///
/// Values starting with `http:` or `https:` never carry a token, so a bare
/// URI is not mistaken for an identifier.
pub fn parse_unique_id(value: &str) -> Option<&str> {
    let lowered = value.get(..6).unwrap_or(value).to_ascii_lowercase();
    if lowered.starts_with("http:") || lowered.starts_with("https:") {
        return None;
    }

    let token_len = value
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if token_len == 0 || value.as_bytes().get(token_len) != Some(&b':') {
        return None;
    }
    Some(&value[..token_len])
}

/// Role of `value`, checking full, thumb and linkto in that order.
/// `None` means the value is not a recognized relation tag.
pub fn classify(value: &str, config: &TagConfig) -> Option<TagRole> {
    [TagRole::Full, TagRole::Thumb, TagRole::LinkTo]
        .into_iter()
        .find(|role| config.pattern(*role).is_match(value))
}

/// Split the remainder after a prefix into shared id and payload
pub fn split_shared_id(rest: &str) -> (Option<String>, String) {
    match parse_unique_id(rest) {
        Some(id) => (Some(id.to_string()), rest[id.len() + 1..].to_string()),
        None => (None, rest.to_string()),
    }
}

/// Classify `value` and strip its prefix and shared id
pub fn parse_relation(value: &str, config: &TagConfig) -> Option<ParsedRelation> {
    let role = classify(value, config)?;
    let rest = config.pattern(role).strip(value)?;
    let (shared_id, payload) = split_shared_id(rest);
    Some(ParsedRelation {
        role,
        shared_id,
        payload,
    })
}

#[cfg(test)]
pub(crate) fn default_tags() -> TagConfig {
    TagConfig::new("full:", "thumb:", "linkto:").unwrap()
}
