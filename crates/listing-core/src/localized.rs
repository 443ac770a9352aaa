use std::fmt;
use std::str::FromStr;

use listing_document::{DocumentError, WRAPPER_KEY};
use serde_json::{Map, Value, json};

use crate::error::RecordError;

/// Text attributes that carry one value per activated language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Localizable {
    Keywords,
    Description,
    SupportUrl,
    MarketingUrl,
    ReleaseNotes,
}

impl Localizable {
    pub const ALL: [Localizable; 5] = [
        Localizable::Keywords,
        Localizable::Description,
        Localizable::SupportUrl,
        Localizable::MarketingUrl,
        Localizable::ReleaseNotes,
    ];

    /// Key of this field inside a language entry.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Keywords => "keywords",
            Self::Description => "description",
            Self::SupportUrl => "supportURL",
            Self::MarketingUrl => "marketingURL",
            Self::ReleaseNotes => "releaseNotes",
        }
    }
}

impl fmt::Display for Localizable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Localizable {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|field| field.key().to_ascii_lowercase() == normalized)
            .ok_or_else(|| {
                RecordError::invalid_argument(
                    "localized field",
                    s,
                    "must be one of keywords, description, supportURL, marketingURL, releaseNotes",
                )
            })
    }
}

pub(crate) fn entry_language(entry: &Value) -> Option<&str> {
    entry.get("language").and_then(Value::as_str)
}

pub(crate) fn find_language<'a>(
    languages: &'a [Value],
    language: &str,
) -> Result<&'a Value, RecordError> {
    languages
        .iter()
        .find(|entry| entry_language(entry) == Some(language))
        .ok_or_else(|| RecordError::not_found("Language", language))
}

pub(crate) fn find_language_mut<'a>(
    languages: &'a mut [Value],
    language: &str,
) -> Result<&'a mut Value, RecordError> {
    languages
        .iter_mut()
        .find(|entry| entry_language(entry) == Some(language))
        .ok_or_else(|| RecordError::not_found("Language", language))
}

/// Read-only per-language view of one [`Localizable`] field.
#[derive(Debug, Clone, Copy)]
pub struct LocalizedField<'a> {
    field: Localizable,
    languages: &'a [Value],
}

impl<'a> LocalizedField<'a> {
    #[must_use]
    pub fn new(field: Localizable, languages: &'a [Value]) -> Self {
        Self { field, languages }
    }

    #[must_use]
    pub fn field(&self) -> Localizable {
        self.field
    }

    /// The value for `language`, or `None` when it has not been set.
    ///
    /// # Errors
    /// Returns `NotFound` when `language` is not activated, and
    /// `MalformedDocument` when the stored payload is not text.
    pub fn get(&self, language: &str) -> Result<Option<&'a str>, RecordError> {
        let entry = find_language(self.languages, language)?;
        self.read(language, entry)
    }

    /// `(language, value)` pairs in document order.
    ///
    /// # Errors
    /// Returns `MalformedDocument` when a stored payload is not text.
    pub fn entries(&self) -> Result<Vec<(&'a str, Option<&'a str>)>, RecordError> {
        self.languages
            .iter()
            .filter_map(|entry| entry_language(entry).map(|language| (language, entry)))
            .map(|(language, entry)| Ok((language, self.read(language, entry)?)))
            .collect()
    }

    fn read(&self, language: &str, entry: &'a Value) -> Result<Option<&'a str>, RecordError> {
        let payload = entry
            .get(self.field.key())
            .and_then(|wrapper| wrapper.get(WRAPPER_KEY));

        match payload {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.as_str())),
            Some(_) => Err(RecordError::MalformedDocument(DocumentError::invalid(
                format!("details.value[{language}].{}.value", self.field.key()),
                "string",
            ))),
        }
    }
}

/// Mutable per-language view of one [`Localizable`] field.
#[derive(Debug)]
pub struct LocalizedFieldMut<'a> {
    field: Localizable,
    languages: &'a mut [Value],
}

impl<'a> LocalizedFieldMut<'a> {
    #[must_use]
    pub fn new(field: Localizable, languages: &'a mut [Value]) -> Self {
        Self { field, languages }
    }

    #[must_use]
    pub fn view(&self) -> LocalizedField<'_> {
        LocalizedField::new(self.field, self.languages)
    }

    /// Write `value` for an already activated `language`, creating the
    /// field's wrapper if the entry does not have one yet.
    ///
    /// # Errors
    /// Returns `NotFound` when `language` is not activated.
    pub fn set(&mut self, language: &str, value: &str) -> Result<(), RecordError> {
        let key = self.field.key();
        let entry = find_language_mut(self.languages, language)?;
        let Value::Object(entry) = entry else {
            return Err(RecordError::MalformedDocument(DocumentError::invalid(
                format!("details.value[{language}]"),
                "map",
            )));
        };

        match entry.get_mut(key) {
            Some(Value::Object(wrapper)) => {
                wrapper.insert(WRAPPER_KEY.to_string(), json!(value));
            }
            _ => {
                let mut wrapper = Map::new();
                wrapper.insert(WRAPPER_KEY.to_string(), json!(value));
                entry.insert(key.to_string(), Value::Object(wrapper));
            }
        }

        log::debug!("Set {key} for {language}");
        Ok(())
    }
}
