use listing_document::DocumentError;
use serde_json::{Map, Value};

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// An icon slot (`largeAppIcon.value`, `watchAppIcon.value`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppImage {
    pub asset_token: Option<String>,
    pub original_file_name: Option<String>,
    pub url: Option<String>,
}

impl AppImage {
    /// Parse the payload of an icon wrapper; a null payload means no icon.
    ///
    /// # Errors
    /// Fails when the payload is neither null nor a map.
    pub fn parse(path: &str, payload: &Value) -> Result<Option<Self>, DocumentError> {
        match payload {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(Self {
                asset_token: text(map, "assetToken"),
                original_file_name: text(map, "originalFileName"),
                url: text(map, "url"),
            })),
            _ => Err(DocumentError::invalid(path, "icon map or null")),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.asset_token.is_none() && self.original_file_name.is_none() && self.url.is_none()
    }
}

/// Routing-coverage file attached to navigation apps (`transitAppFile.value`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitAppFile {
    pub asset_token: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub time_stamp: Option<i64>,
}

impl TransitAppFile {
    /// # Errors
    /// Fails when the payload is neither null nor a map.
    pub fn parse(path: &str, payload: &Value) -> Result<Option<Self>, DocumentError> {
        match payload {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(Self {
                asset_token: text(map, "assetToken"),
                name: text(map, "name"),
                url: text(map, "url"),
                time_stamp: map.get("timeStamp").and_then(Value::as_i64),
            })),
            _ => Err(DocumentError::invalid(path, "transit file map or null")),
        }
    }
}
