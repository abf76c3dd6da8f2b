//! Placeholder grammar for manifest templates.
//!
//! A template is literal text with `#{name}` placeholders. Only a fixed set
//! of names is recognized; anything else is rejected when the template is
//! parsed, so expansion can never leave stray `#{...}` text behind.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const OPEN: &str = "#{";
const CLOSE: char = '}';

/// A recognized placeholder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `#{version}`: the version being installed.
    Version,
    /// `#{token}`: the package identifier.
    Token,
    /// `#{bundle_id}`: the application's reverse-domain bundle identifier.
    BundleId,
}

impl Placeholder {
    /// The name between the braces.
    pub fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Token => "token",
            Self::BundleId => "bundle_id",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "version" => Some(Self::Version),
            "token" => Some(Self::Token),
            "bundle_id" => Some(Self::BundleId),
            _ => None,
        }
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{{{}}}", self.name())
    }
}

/// Errors raised while parsing a template string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateSyntaxError {
    /// A `#{` with no closing brace.
    #[error("unterminated placeholder at byte {offset} in '{template}'")]
    Unterminated {
        /// The template being parsed.
        template: String,
        /// Byte offset of the opening `#{`.
        offset: usize,
    },

    /// `#{}` with nothing inside.
    #[error("empty placeholder at byte {offset} in '{template}'")]
    Empty {
        /// The template being parsed.
        template: String,
        /// Byte offset of the opening `#{`.
        offset: usize,
    },

    /// A name outside the recognized set.
    #[error("unknown placeholder '#{{{name}}}' in '{template}'")]
    Unknown {
        /// The template being parsed.
        template: String,
        /// The unrecognized name.
        name: String,
    },
}

/// A placeholder had no value during expansion.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no value bound for {0}")]
pub struct UnboundPlaceholder(pub Placeholder);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

/// Values available to a template expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bindings<'a> {
    /// Value for `#{version}`.
    pub version: Option<&'a str>,
    /// Value for `#{token}`.
    pub token: Option<&'a str>,
    /// Value for `#{bundle_id}`.
    pub bundle_id: Option<&'a str>,
}

impl<'a> Bindings<'a> {
    fn get(&self, placeholder: Placeholder) -> Option<&'a str> {
        match placeholder {
            Placeholder::Version => self.version,
            Placeholder::Token => self.token,
            Placeholder::BundleId => self.bundle_id,
        }
    }
}

impl Template {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateSyntaxError`] on an unterminated, empty or unknown
    /// placeholder.
    pub fn parse(source: &str) -> Result<Self, TemplateSyntaxError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut consumed = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let offset = consumed + start;
            let after = &rest[start + OPEN.len()..];
            let end = after.find(CLOSE).ok_or_else(|| TemplateSyntaxError::Unterminated {
                template: source.to_string(),
                offset,
            })?;
            let name = after[..end].trim();
            if name.is_empty() {
                return Err(TemplateSyntaxError::Empty {
                    template: source.to_string(),
                    offset,
                });
            }
            let slot = Placeholder::from_name(name).ok_or_else(|| TemplateSyntaxError::Unknown {
                template: source.to_string(),
                name: name.to_string(),
            })?;
            segments.push(Segment::Slot(slot));

            let advance = start + OPEN.len() + end + 1;
            consumed += advance;
            rest = &rest[advance..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Distinct placeholders in order of first appearance.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut seen = Vec::new();
        for seg in &self.segments {
            if let Segment::Slot(p) = seg {
                if !seen.contains(p) {
                    seen.push(*p);
                }
            }
        }
        seen
    }

    /// Returns `true` if `placeholder` occurs at least once.
    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot(p) if *p == placeholder))
    }

    /// Substitute every placeholder occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`UnboundPlaceholder`] for the first placeholder that has no
    /// value in `bindings`.
    pub fn expand(&self, bindings: &Bindings<'_>) -> Result<String, UnboundPlaceholder> {
        let mut out = String::with_capacity(self.source.len());
        for seg in &self.segments {
            match seg {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(p) => out.push_str(bindings.get(*p).ok_or(UnboundPlaceholder(*p))?),
            }
        }
        Ok(out)
    }
}

impl std::str::FromStr for Template {
    type Err = TemplateSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
