//! Parse events consumed by the Markdown transducer
//!
//! A document reaches the converter as a flat, ordered stream of
//! [`ParseEvent`]s. Tag names are lowercase; attribute values are already
//! entity-decoded by the tokenizer.

/// Attributes of a start or self-closing tag, in source order
///
/// Lookups are typed by intent: [`Attributes::required`] for attributes a tag
/// is expected to carry (absent reads as the empty string) and
/// [`Attributes::get_or`] for optional ones with a documented default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attribute by name
    ///
    /// When a hand-built attribute list repeats a name, the last value wins.
    /// Tokenized HTML never repeats one: the tokenizer keeps the first and drops
    /// later duplicates.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of an attribute the tag is expected to carry
    ///
    /// An absent attribute reads as `""` and is logged at trace level.
    pub fn required(&self, name: &str) -> &str {
        match self.get(name) {
            Some(value) => value,
            None => {
                tracing::trace!(attribute = name, "required attribute missing, using empty value");
                ""
            }
        }
    }

    /// Value of an optional attribute, or `default` when absent
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One tokenizer event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// `<name attr=...>`
    StartTag { name: String, attrs: Attributes },
    /// `</name>`
    EndTag { name: String },
    /// `<name attr=... />`
    SelfClosingTag { name: String, attrs: Attributes },
    /// Character data between tags
    Text(String),
}

impl ParseEvent {
    pub fn start(name: &str) -> Self {
        Self::start_with(name, std::iter::empty::<(&str, &str)>())
    }

    pub fn start_with<K, V>(name: &str, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ParseEvent::StartTag {
            name: name.to_ascii_lowercase(),
            attrs: attrs.into_iter().collect(),
        }
    }

    pub fn end(name: &str) -> Self {
        ParseEvent::EndTag {
            name: name.to_ascii_lowercase(),
        }
    }

    pub fn self_closing<K, V>(name: &str, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ParseEvent::SelfClosingTag {
            name: name.to_ascii_lowercase(),
            attrs: attrs.into_iter().collect(),
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        ParseEvent::Text(data.into())
    }

    /// Tag name, or `None` for text
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            ParseEvent::StartTag { name, .. }
            | ParseEvent::EndTag { name }
            | ParseEvent::SelfClosingTag { name, .. } => Some(name),
            ParseEvent::Text(_) => None,
        }
    }
}
