use serde_json::Value;

use crate::cursor::{Leaf, assign, lookup};
use crate::error::DocumentError;

/// Named scalar fields of a version document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AppType,
    CanBetaTest,
    CanPrepareForUpload,
    CanRejectVersion,
    CanSendVersionLive,
    Copyright,
    Languages,
    AppIconOriginalName,
    AppIconUrl,
    WatchAppIconOriginalName,
    WatchAppIconUrl,
    ReleaseOnApproval,
    Status,
    SupportsAppleWatch,
    VersionId,
    Version,
    BuildVersion,
    BuildTrainVersion,
    BuildUploadDate,
    ReviewFirstName,
    ReviewLastName,
    ReviewPhoneNumber,
    ReviewEmail,
    ReviewNotes,
    ReviewUserName,
    ReviewPassword,
}

/// Coercion applied to a raw leaf before it is handed out as a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// The leaf as stored; flags read JSON booleans.
    Raw,
    /// `true` iff the leaf is the string `"true"`.
    StringTrue,
    /// `true` iff the leaf exists and is not null.
    Presence,
}

impl Decoder {
    #[must_use]
    pub fn flag(self, leaf: Leaf<'_>) -> bool {
        match self {
            Self::Raw => leaf.value().and_then(Value::as_bool).unwrap_or(false),
            Self::StringTrue => leaf.as_str() == Some("true"),
            Self::Presence => leaf.is_present(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBinding {
    pub field: Field,
    pub path: &'static str,
    pub decoder: Decoder,
    pub create_missing: bool,
}

const fn bind(field: Field, path: &'static str) -> PathBinding {
    PathBinding {
        field,
        path,
        decoder: Decoder::Raw,
        create_missing: false,
    }
}

const fn bind_decoded(field: Field, path: &'static str, decoder: Decoder) -> PathBinding {
    PathBinding {
        field,
        path,
        decoder,
        create_missing: false,
    }
}

const fn bind_creating(field: Field, path: &'static str) -> PathBinding {
    PathBinding {
        field,
        path,
        decoder: Decoder::Raw,
        create_missing: true,
    }
}

/// Every binding, in [`Field`] declaration order.
pub const BINDINGS: &[PathBinding] = &[
    bind(Field::AppType, "appType"),
    bind(Field::CanBetaTest, "canBetaTest"),
    bind(Field::CanPrepareForUpload, "canPrepareForUpload"),
    bind(Field::CanRejectVersion, "canRejectVersion"),
    bind(Field::CanSendVersionLive, "canSendVersionLive"),
    bind(Field::Copyright, "copyright.value"),
    bind(Field::Languages, "details.value"),
    bind(Field::AppIconOriginalName, "largeAppIcon.value.originalFileName"),
    bind(Field::AppIconUrl, "largeAppIcon.value.url"),
    bind(
        Field::WatchAppIconOriginalName,
        "watchAppIcon.value.originalFileName",
    ),
    bind(Field::WatchAppIconUrl, "watchAppIcon.value.url"),
    bind_decoded(
        Field::ReleaseOnApproval,
        "releaseOnApproval.value",
        Decoder::StringTrue,
    ),
    bind(Field::Status, "status"),
    bind_decoded(
        Field::SupportsAppleWatch,
        "supportsAppleWatch",
        Decoder::Presence,
    ),
    bind(Field::VersionId, "versionId"),
    bind(Field::Version, "version.value"),
    bind_creating(Field::BuildVersion, "preReleaseBuildVersionString.value"),
    bind_creating(Field::BuildTrainVersion, "preReleaseBuildTrainVersionString"),
    bind_creating(Field::BuildUploadDate, "preReleaseBuildUploadDate"),
    bind(Field::ReviewFirstName, "appReviewInfo.firstName.value"),
    bind(Field::ReviewLastName, "appReviewInfo.lastName.value"),
    bind(Field::ReviewPhoneNumber, "appReviewInfo.phoneNumber.value"),
    bind(Field::ReviewEmail, "appReviewInfo.emailAddress.value"),
    bind(Field::ReviewNotes, "appReviewInfo.reviewNotes.value"),
    bind(Field::ReviewUserName, "appReviewInfo.userName.value"),
    bind(Field::ReviewPassword, "appReviewInfo.password.value"),
];

impl Field {
    #[must_use]
    pub fn binding(self) -> &'static PathBinding {
        &BINDINGS[self as usize]
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        self.binding().path
    }
}

impl PathBinding {
    #[must_use]
    pub fn get<'a>(&self, document: &'a Value) -> Leaf<'a> {
        lookup(document, self.path)
    }

    #[must_use]
    pub fn get_str<'a>(&self, document: &'a Value) -> Option<&'a str> {
        self.get(document).as_str()
    }

    /// Read the leaf through this binding's [`Decoder`].
    #[must_use]
    pub fn flag(&self, document: &Value) -> bool {
        self.decoder.flag(self.get(document))
    }

    /// # Errors
    /// Fails when an intermediate segment is missing and this binding may not
    /// create it, or when a segment is not a map.
    pub fn set(&self, document: &mut Value, value: Value) -> Result<(), DocumentError> {
        assign(document, self.path, value, self.create_missing)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn table_order_matches_field_discriminants() {
        for (index, binding) in BINDINGS.iter().enumerate() {
            assert_eq!(
                binding.field as usize, index,
                "binding for {:?} is out of order",
                binding.field
            );
        }
        assert_eq!(Field::ReviewPassword as usize + 1, BINDINGS.len());
    }

    #[test]
    fn paths_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for binding in BINDINGS {
            assert!(seen.insert(binding.path), "duplicate path {}", binding.path);
            assert!(
                binding.path.split('.').all(|segment| !segment.is_empty()),
                "empty segment in {}",
                binding.path
            );
        }
    }

    #[test]
    fn only_build_fields_create_intermediates() {
        let creating: Vec<Field> = BINDINGS
            .iter()
            .filter(|binding| binding.create_missing)
            .map(|binding| binding.field)
            .collect();

        assert_eq!(
            creating,
            vec![
                Field::BuildVersion,
                Field::BuildTrainVersion,
                Field::BuildUploadDate
            ]
        );
    }

    #[test]
    fn release_on_approval_reads_string_true_only() {
        let binding = Field::ReleaseOnApproval.binding();

        assert!(binding.flag(&json!({ "releaseOnApproval": { "value": "true" } })));
        assert!(!binding.flag(&json!({ "releaseOnApproval": { "value": "false" } })));
        assert!(!binding.flag(&json!({ "releaseOnApproval": { "value": true } })));
        assert!(!binding.flag(&json!({})));
    }

    #[test]
    fn supports_apple_watch_reads_presence() {
        let binding = Field::SupportsAppleWatch.binding();

        assert!(binding.flag(&json!({ "supportsAppleWatch": false })));
        assert!(binding.flag(&json!({ "supportsAppleWatch": {} })));
        assert!(!binding.flag(&json!({ "supportsAppleWatch": null })));
        assert!(!binding.flag(&json!({})));
    }

    #[test]
    fn raw_flags_read_json_booleans() {
        let binding = Field::CanBetaTest.binding();

        assert!(binding.flag(&json!({ "canBetaTest": true })));
        assert!(!binding.flag(&json!({ "canBetaTest": "true" })));
    }

    #[test]
    fn set_goes_through_binding_path() {
        let mut document = json!({ "copyright": { "value": "2025 Acme", "isEditable": true } });

        Field::Copyright
            .binding()
            .set(&mut document, json!("2026 Acme"))
            .expect("copyright wrapper exists");

        assert_eq!(Field::Copyright.binding().get_str(&document), Some("2026 Acme"));
        assert_eq!(document["copyright"]["isEditable"], json!(true));
    }

    #[test]
    fn set_review_field_without_review_info_fails() {
        let mut document = json!({});

        let error = Field::ReviewEmail
            .binding()
            .set(&mut document, json!("a@b.c"))
            .expect_err("appReviewInfo is absent");

        assert!(matches!(error, DocumentError::MissingSegment { ref segment, .. } if segment == "appReviewInfo"));
    }
}
