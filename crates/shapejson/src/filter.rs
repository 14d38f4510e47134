//! Serialization options: layout, member filters and name casing.
//!
//! Filters and casing apply to the members of described objects at every
//! depth. Dictionary keys are data, not member names, and pass through
//! untouched.
//!
//! # Examples
//!
//! ```
//! use shapejson::{NameCase, NameFilter, Options};
//!
//! let opts = Options::compact()
//!     .with_filter(NameFilter::only(["Id", "Name"]))
//!     .with_name_case(NameCase::Camel);
//! assert!(!opts.pretty);
//! assert_eq!(NameCase::Camel.apply("FirstName"), "firstName");
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::descriptor::PropertyDescriptor;

/// Knobs for one serialize or deserialize call.
///
/// Deserializable with every field optional, so an options file only needs
/// the settings it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Indented multi-line output instead of a single line.
    pub pretty: bool,
    /// Let non-public members take part in both directions.
    pub include_non_public: bool,
    pub filter: NameFilter,
    pub name_case: NameCase,
    /// Emit non-ASCII characters as `\uXXXX` escapes.
    pub escape_non_ascii: bool,
}

impl Options {
    /// Single-line output, no filters.
    pub fn compact() -> Self {
        Self::default()
    }

    /// Indented output, no filters.
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_name_case(mut self, name_case: NameCase) -> Self {
        self.name_case = name_case;
        self
    }

    pub fn include_non_public(mut self, include: bool) -> Self {
        self.include_non_public = include;
        self
    }

    pub fn escape_non_ascii(mut self, escape: bool) -> Self {
        self.escape_non_ascii = escape;
        self
    }

    /// Whether `member` is emitted under these options.
    pub fn admits(&self, member: &PropertyDescriptor) -> bool {
        !member.is_ignored()
            && (member.is_public() || self.include_non_public)
            && self.filter.admits(member)
    }
}

/// Member-name filter. Include and exclude lists are separate variants, so a
/// call can never carry both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "names")]
pub enum NameFilter {
    #[default]
    All,
    /// Emit only members named here.
    Only(Vec<String>),
    /// Emit every member except those named here.
    Excluding(Vec<String>),
}

impl NameFilter {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameFilter::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn excluding<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameFilter::Excluding(names.into_iter().map(Into::into).collect())
    }

    /// A name matches when it equals either the declared or the serialized
    /// name of the member.
    pub fn admits(&self, member: &PropertyDescriptor) -> bool {
        let listed = |names: &[String]| {
            names
                .iter()
                .any(|n| n == member.declared_name() || n == member.serialized_name())
        };
        match self {
            NameFilter::All => true,
            NameFilter::Only(names) => listed(names),
            NameFilter::Excluding(names) => !listed(names),
        }
    }
}

/// Casing convention for emitted member names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    #[default]
    AsDeclared,
    /// `firstName`
    Camel,
    /// `FirstName`
    Pascal,
    /// `first_name`
    Snake,
    /// `firstname`
    Lower,
}

impl NameCase {
    /// Render `name` under this convention.
    pub fn apply<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            NameCase::AsDeclared => Cow::Borrowed(name),
            NameCase::Camel => {
                let mut out = String::with_capacity(name.len());
                for (i, word) in split_words(name).into_iter().enumerate() {
                    if i == 0 {
                        out.extend(word.chars().flat_map(char::to_lowercase));
                    } else {
                        push_capitalized(word, &mut out);
                    }
                }
                Cow::Owned(out)
            }
            NameCase::Pascal => {
                let mut out = String::with_capacity(name.len());
                for word in split_words(name) {
                    push_capitalized(word, &mut out);
                }
                Cow::Owned(out)
            }
            NameCase::Snake => Cow::Owned(
                split_words(name)
                    .into_iter()
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
                    .join("_"),
            ),
            NameCase::Lower => Cow::Owned(
                split_words(name)
                    .into_iter()
                    .map(str::to_lowercase)
                    .collect(),
            ),
        }
    }
}

/// Case-insensitive name comparison used for member lookup.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

fn push_capitalized(word: &str, out: &mut String) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

/// Split an identifier into words at `_`, `-`, spaces, lower→upper
/// transitions, and the end of an acronym (`URLPath` → `URL`, `Path`).
fn split_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut start: Option<usize> = None;

    for (i, &(pos, ch)) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if let Some(s) = start.take() {
                words.push(&name[s..pos]);
            }
            continue;
        }
        let Some(s) = start else {
            start = Some(pos);
            continue;
        };
        let prev = chars[i - 1].1;
        let next = chars.get(i + 1).map(|&(_, c)| c);
        let boundary = ch.is_uppercase()
            && (prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next.is_some_and(char::is_lowercase)));
        if boundary {
            words.push(&name[s..pos]);
            start = Some(pos);
        }
    }
    if let Some(s) = start {
        words.push(&name[s..]);
    }
    words
}
