use std::fmt;
use std::path::Path;

use listing_document::{DocumentError, Field, Leaf, WRAPPER_KEY, cursor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::device::Device;
use crate::error::{RecordError, ServiceError};
use crate::images::{AppImage, TransitAppFile};
use crate::localized::{Localizable, LocalizedField, LocalizedFieldMut, entry_language};
use crate::media::{self, MediaCollection, Screenshot, Trailer};
use crate::rating::RatingDescriptorSet;
use crate::status::AppStatus;
use crate::traits::{AssetKind, AssetUploader, MediaUtility, UploadFile, VersionTransport};

/// Language whose entry is cloned for newly activated languages.
pub const TEMPLATE_LANGUAGE: &str = "en-US";

/// Preview frame timestamp used when the caller does not pick one.
pub const DEFAULT_PREVIEW_TIMESTAMP: &str = "05.00";

const TEXT_FIELDS: [Field; 9] = [
    Field::Copyright,
    Field::Version,
    Field::ReviewFirstName,
    Field::ReviewLastName,
    Field::ReviewPhoneNumber,
    Field::ReviewEmail,
    Field::ReviewNotes,
    Field::ReviewUserName,
    Field::ReviewPassword,
];

/// A binary uploaded for this version that may be submitted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBuild {
    pub build_version: String,
    pub train_version: String,
    /// Milliseconds since the Unix epoch.
    pub upload_date: i64,
}

/// Inputs of [`VersionRecord::upsert_trailer`].
#[derive(Debug, Clone, Copy)]
pub struct TrailerRequest<'a> {
    pub language: &'a str,
    pub device: &'a str,
    /// `None` removes the trailer.
    pub trailer: Option<&'a Path>,
    /// Explicit preview frame; extracted from the trailer when `None`.
    pub preview: Option<&'a Path>,
    /// `MM.SS` position of the preview frame.
    pub timestamp: &'a str,
}

impl<'a> TrailerRequest<'a> {
    #[must_use]
    pub fn new(language: &'a str, device: &'a str) -> Self {
        Self {
            language,
            device,
            trailer: None,
            preview: None,
            timestamp: DEFAULT_PREVIEW_TIMESTAMP,
        }
    }

    #[must_use]
    pub fn trailer(mut self, path: &'a Path) -> Self {
        self.trailer = Some(path);
        self
    }

    #[must_use]
    pub fn preview(mut self, path: &'a Path) -> Self {
        self.preview = Some(path);
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: &'a str) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Which icon slot an icon upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSlot {
    Large,
    Watch,
}

impl IconSlot {
    fn key(self) -> &'static str {
        match self {
            Self::Large => "largeAppIcon",
            Self::Watch => "watchAppIcon",
        }
    }

    fn kind(self) -> AssetKind {
        match self {
            Self::Large => AssetKind::LargeIcon,
            Self::Watch => AssetKind::WatchIcon,
        }
    }
}

impl fmt::Display for IconSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Large => "large app",
            Self::Watch => "Apple Watch",
        })
    }
}

/// One version of an app listing, backed by the raw service document.
///
/// The raw document is the source of truth. Typed collections are rebuilt
/// from it after every mutation, and only [`VersionRecord::load`] and
/// [`VersionRecord::refresh`] replace it.
#[derive(Debug, Clone)]
pub struct VersionRecord {
    raw: Value,
    status: AppStatus,
    large_app_icon: Option<AppImage>,
    watch_app_icon: Option<AppImage>,
    transit_app_file: Option<TransitAppFile>,
    screenshots: MediaCollection<Screenshot>,
    trailers: MediaCollection<Trailer>,
}

impl VersionRecord {
    /// Build a record from a freshly fetched document.
    ///
    /// # Errors
    /// Fails when the document lacks `status` or `details.value`, or when a
    /// collection has an unexpected shape.
    pub fn load(raw: Value) -> Result<Self, RecordError> {
        let mut record = Self {
            raw,
            status: AppStatus::Unknown(String::new()),
            large_app_icon: None,
            watch_app_icon: None,
            transit_app_file: None,
            screenshots: MediaCollection::default(),
            trailers: MediaCollection::default(),
        };
        record.setup()?;
        Ok(record)
    }

    /// Fetch `version_id` through `transport` and load it.
    ///
    /// # Errors
    /// Propagates transport failures and [`VersionRecord::load`] failures.
    pub async fn fetch(
        transport: &dyn VersionTransport,
        version_id: &str,
    ) -> Result<Self, RecordError> {
        let raw = transport.fetch_version(version_id).await?;
        log::info!("Fetched version {version_id}");
        Self::load(raw)
    }

    fn setup(&mut self) -> Result<(), RecordError> {
        let status = cursor::require(&self.raw, Field::Status.path())?;
        let status = status
            .as_str()
            .ok_or_else(|| DocumentError::invalid(Field::Status.path(), "string"))?;
        self.status = AppStatus::from_raw(status);
        self.setup_icons()?;
        self.rebuild()?;
        log::debug!(
            "Loaded version {} ({}) with {} languages",
            self.version().unwrap_or("?"),
            self.status,
            self.language_entries()?.len()
        );
        Ok(())
    }

    fn setup_icons(&mut self) -> Result<(), RecordError> {
        self.large_app_icon = parse_icon(&self.raw, IconSlot::Large)?;
        self.watch_app_icon = parse_icon(&self.raw, IconSlot::Watch)?;
        self.transit_app_file = match cursor::lookup(&self.raw, "transitAppFile.value") {
            Leaf::Present(payload) => TransitAppFile::parse("transitAppFile.value", payload)?,
            Leaf::Absent | Leaf::Null => None,
        };
        Ok(())
    }

    /// Re-materialize screenshots and trailers from the raw document.
    ///
    /// # Errors
    /// Fails when a collection has an unexpected shape.
    pub fn rebuild(&mut self) -> Result<(), RecordError> {
        let languages = self.language_entries()?;
        let screenshots: MediaCollection<Screenshot> = MediaCollection::rebuild(languages)?;
        let trailers: MediaCollection<Trailer> = MediaCollection::rebuild(languages)?;
        self.screenshots = screenshots;
        self.trailers = trailers;
        Ok(())
    }

    /// Replace the document with the service's current copy.
    ///
    /// # Errors
    /// Fails when the document has no `versionId`, or propagates transport
    /// and load failures.
    pub async fn refresh(&mut self, transport: &dyn VersionTransport) -> Result<(), RecordError> {
        let version_id = self.require_version_id()?;
        let raw = transport.fetch_version(&version_id).await?;
        *self = Self::load(raw)?;
        log::info!("Refreshed version {version_id}");
        Ok(())
    }

    /// Send the whole document back to the service.
    ///
    /// # Errors
    /// Fails when the document has no `versionId`, or propagates transport
    /// failures.
    pub async fn save(&self, transport: &dyn VersionTransport) -> Result<(), RecordError> {
        let version_id = self.require_version_id()?;
        transport.update_version(&version_id, &self.raw).await?;
        log::info!("Saved version {version_id}");
        Ok(())
    }

    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    #[must_use]
    pub fn into_raw(self) -> Value {
        self.raw
    }

    // Scalar fields

    #[must_use]
    pub fn text(&self, field: Field) -> Option<&str> {
        field.binding().get_str(&self.raw)
    }

    #[must_use]
    pub fn flag(&self, field: Field) -> bool {
        field.binding().flag(&self.raw)
    }

    /// Write a text field (copyright, version string, review contact).
    ///
    /// # Errors
    /// Returns `InvalidArgument` for non-text fields and `NotFound` when the
    /// field's wrapper is missing from the document.
    pub fn set_text(&mut self, field: Field, value: &str) -> Result<(), RecordError> {
        if !TEXT_FIELDS.contains(&field) {
            return Err(RecordError::invalid_argument(
                "field",
                field.path(),
                "only text fields can be set directly",
            ));
        }
        field.binding().set(&mut self.raw, json!(value))?;
        log::debug!("Set {}", field.path());
        Ok(())
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.text(Field::Version)
    }

    #[must_use]
    pub fn copyright(&self) -> Option<&str> {
        self.text(Field::Copyright)
    }

    /// `versionId`, which the service sends as a number or a string.
    #[must_use]
    pub fn version_id(&self) -> Option<String> {
        match Field::VersionId.binding().get(&self.raw) {
            Leaf::Present(Value::String(id)) => Some(id.clone()),
            Leaf::Present(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    }

    fn require_version_id(&self) -> Result<String, RecordError> {
        self.version_id()
            .ok_or_else(|| RecordError::not_found("Document path", Field::VersionId.path()))
    }

    #[must_use]
    pub fn status(&self) -> &AppStatus {
        &self.status
    }

    #[must_use]
    pub fn release_on_approval(&self) -> bool {
        self.flag(Field::ReleaseOnApproval)
    }

    /// # Errors
    /// Returns `NotFound` when `releaseOnApproval` is missing.
    pub fn set_release_on_approval(&mut self, release: bool) -> Result<(), RecordError> {
        let encoded = if release { "true" } else { "false" };
        Field::ReleaseOnApproval
            .binding()
            .set(&mut self.raw, json!(encoded))?;
        Ok(())
    }

    #[must_use]
    pub fn supports_apple_watch(&self) -> bool {
        self.flag(Field::SupportsAppleWatch)
    }

    #[must_use]
    pub fn build_version(&self) -> Option<&str> {
        self.text(Field::BuildVersion)
    }

    #[must_use]
    pub fn large_app_icon(&self) -> Option<&AppImage> {
        self.large_app_icon.as_ref()
    }

    #[must_use]
    pub fn watch_app_icon(&self) -> Option<&AppImage> {
        self.watch_app_icon.as_ref()
    }

    #[must_use]
    pub fn transit_app_file(&self) -> Option<&TransitAppFile> {
        self.transit_app_file.as_ref()
    }

    #[must_use]
    pub fn supports_app_transit(&self) -> bool {
        self.transit_app_file.is_some()
    }

    // Languages

    fn language_entries(&self) -> Result<&Vec<Value>, RecordError> {
        cursor::require(&self.raw, Field::Languages.path())?
            .as_array()
            .ok_or_else(|| DocumentError::invalid(Field::Languages.path(), "array").into())
    }

    fn language_entries_mut(&mut self) -> Result<&mut Vec<Value>, RecordError> {
        cursor::require_mut(&mut self.raw, Field::Languages.path())?
            .as_array_mut()
            .ok_or_else(|| DocumentError::invalid(Field::Languages.path(), "array").into())
    }

    /// Activated language identifiers, in document order.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        self.language_entries()
            .map(|entries| entries.iter().filter_map(entry_language).collect())
            .unwrap_or_default()
    }

    /// Activate `languages` by cloning the template language entry.
    ///
    /// Collections are not rebuilt: some fields of the new entries are only
    /// filled in by the service, so the record must be saved and fetched
    /// again before it reflects them.
    ///
    /// # Errors
    /// Returns `NotFound` when the document has no language to clone.
    pub fn create_languages<S: AsRef<str>>(&mut self, languages: &[S]) -> Result<usize, RecordError> {
        let entries = self.language_entries_mut()?;
        let mut added = 0;

        for language in languages {
            let language = language.as_ref();
            if entries
                .iter()
                .any(|entry| entry_language(entry) == Some(language))
            {
                continue;
            }

            let template = entries
                .iter()
                .find(|entry| entry_language(entry) == Some(TEMPLATE_LANGUAGE))
                .or_else(|| entries.first())
                .ok_or_else(|| RecordError::not_found("Language", TEMPLATE_LANGUAGE))?;

            let mut entry = template.clone();
            entry["language"] = json!(language);
            entries.push(entry);
            added += 1;
            log::info!("Activated language {language}");
        }

        Ok(added)
    }

    /// Read-only view of a localized text field.
    ///
    /// # Errors
    /// Fails when the document has no language list.
    pub fn localized(&self, field: Localizable) -> Result<LocalizedField<'_>, RecordError> {
        Ok(LocalizedField::new(field, self.language_entries()?))
    }

    /// Mutable view of a localized text field.
    ///
    /// # Errors
    /// Fails when the document has no language list.
    pub fn localized_mut(&mut self, field: Localizable) -> Result<LocalizedFieldMut<'_>, RecordError> {
        Ok(LocalizedFieldMut::new(field, self.language_entries_mut()?))
    }

    // Build

    /// Associate `build` with this version.
    ///
    /// # Errors
    /// Fails when a build field's parent is not a map.
    pub fn select_build(&mut self, build: &CandidateBuild) -> Result<(), RecordError> {
        Field::BuildVersion
            .binding()
            .set(&mut self.raw, json!(build.build_version))?;
        Field::BuildTrainVersion
            .binding()
            .set(&mut self.raw, json!(build.train_version))?;
        Field::BuildUploadDate
            .binding()
            .set(&mut self.raw, json!(build.upload_date))?;
        log::info!(
            "Selected build {} ({})",
            build.build_version,
            build.train_version
        );
        Ok(())
    }

    // Ratings

    /// # Errors
    /// Returns `NotFound` when the document has no `ratings` map.
    pub fn ratings(&mut self) -> Result<RatingDescriptorSet<'_>, RecordError> {
        Ok(RatingDescriptorSet::new(cursor::require_mut(
            &mut self.raw,
            "ratings",
        )?))
    }

    /// Apply `key -> severity` content-rating changes.
    ///
    /// # Errors
    /// See [`RatingDescriptorSet::apply`].
    pub fn update_rating<I, K>(&mut self, mapping: I) -> Result<usize, RecordError>
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        self.ratings()?.apply(mapping)
    }

    // Media

    #[must_use]
    pub fn screenshots(&self) -> &MediaCollection<Screenshot> {
        &self.screenshots
    }

    #[must_use]
    pub fn trailers(&self) -> &MediaCollection<Trailer> {
        &self.trailers
    }

    /// Add, replace or (with `path: None`) remove the screenshot at `order`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an unknown device or an order outside
    /// `1..=5`, `NotFound` for an unknown language, `InvalidState` when
    /// removing an unused order, and passes upload failures through.
    pub async fn upsert_screenshot(
        &mut self,
        language: &str,
        device: &str,
        order: u32,
        path: Option<&Path>,
        uploader: &dyn AssetUploader,
    ) -> Result<(), RecordError> {
        let device: Device = device.parse()?;
        media::validate_sort_order(order)?;
        media::screenshot_orders(self.language_entries()?, language, device)?;

        match path {
            None => {
                media::remove_screenshot(self.language_entries_mut()?, language, device, order)?;
            }
            Some(path) => {
                let file = UploadFile::read(path).await?;
                let asset = uploader
                    .upload_asset(&file, AssetKind::Screenshot { device })
                    .await?;
                log::info!("Uploaded screenshot {} for {language}/{device}", file.file_name);

                let payload = json!({
                    "assetToken": asset.token,
                    "sortOrder": order,
                    "url": null,
                    "thumbNailUrl": null,
                    "originalFileName": file.file_name,
                });
                media::put_screenshot(self.language_entries_mut()?, language, device, order, payload)?;
            }
        }

        self.rebuild()
    }

    /// Add, refresh the preview of, or remove the trailer of a language and
    /// device.
    ///
    /// When the slot already holds a trailer only the preview frame, its
    /// time code and orientation are replaced; the video stays.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for devices without trailer support,
    /// malformed timestamps or mismatched preview resolutions, `NotFound`
    /// for an unknown language, `InvalidState` when removing a missing
    /// trailer, and passes upload and media failures through.
    pub async fn upsert_trailer(
        &mut self,
        request: TrailerRequest<'_>,
        uploader: &dyn AssetUploader,
        tools: &dyn MediaUtility,
    ) -> Result<(), RecordError> {
        let TrailerRequest {
            language,
            device,
            trailer,
            preview,
            timestamp,
        } = request;
        let device: Device = device.parse()?;
        if !device.supports_trailer() {
            return Err(RecordError::invalid_argument(
                "device",
                device.as_str(),
                "app trailers are not supported on this device",
            ));
        }
        let existing = media::has_trailer(self.language_entries()?, language, device)?;

        let Some(trailer) = trailer else {
            if !existing {
                return Err(RecordError::InvalidState(format!(
                    "cannot remove non-existent trailer for {language}/{device}"
                )));
            }
            *media::trailer_payload_mut(self.language_entries_mut()?, language, device)? =
                Value::Null;
            log::info!("Removed trailer for {language}/{device}");
            return self.rebuild();
        };

        let time_code = preview_time_code(timestamp)?;
        let preview_path = match preview {
            Some(preview) => {
                check_preview_resolution(tools, preview, device).await?;
                preview.to_path_buf()
            }
            None => {
                let portrait = tools.is_portrait(trailer).await?;
                let resolution = device.preview_resolution(portrait).ok_or_else(|| {
                    RecordError::invalid_argument(
                        "device",
                        device.as_str(),
                        "no preview resolution is known for this device",
                    )
                })?;
                tools
                    .extract_preview_frame(trailer, timestamp, resolution)
                    .await?
            }
        };
        let is_portrait = tools.is_portrait(&preview_path).await?;

        let preview_file = UploadFile::read(&preview_path).await?;
        let picture = uploader
            .upload_asset(&preview_file, AssetKind::TrailerPreview { device })
            .await?;

        let video = if existing {
            None
        } else {
            let video_file = UploadFile::read(trailer).await?;
            let upload = uploader.upload_trailer(&video_file).await?;
            let response = upload.responses.into_iter().next().ok_or_else(|| {
                ServiceError::network_parse("upload trailer", "no upload result in response")
            })?;
            log::info!("Uploaded trailer {} for {language}/{device}", video_file.file_name);
            Some(json!({
                "videoAssetToken": response.token,
                "descriptionXML": response.description_doc,
                "contentType": video_file.content_type,
            }))
        };

        let payload = media::trailer_payload_mut(self.language_entries_mut()?, language, device)?;
        if let Some(video) = video {
            *payload = video;
        }
        let Value::Object(payload) = payload else {
            return Err(DocumentError::invalid(
                format!("details.value[{language}].appTrailers.value.{device}.value"),
                "trailer map",
            )
            .into());
        };
        payload.insert("pictureAssetToken".to_string(), json!(picture.token));
        payload.insert("previewFrameTimeCode".to_string(), json!(time_code));
        payload.insert("isPortrait".to_string(), json!(is_portrait));
        log::info!("Updated trailer preview for {language}/{device} at {time_code}");

        self.rebuild()
    }

    // Icons and transit file

    /// Upload a new icon, or clear the slot with `path: None`.
    ///
    /// # Errors
    /// Returns `InvalidState` for the watch icon of a version without watch
    /// support, `NotFound` when the icon wrapper is missing, and passes
    /// upload failures through.
    pub async fn upload_icon(
        &mut self,
        slot: IconSlot,
        path: Option<&Path>,
        uploader: &dyn AssetUploader,
    ) -> Result<(), RecordError> {
        if slot == IconSlot::Watch && !self.supports_apple_watch() {
            return Err(RecordError::InvalidState(
                "version does not support Apple Watch".to_string(),
            ));
        }
        cursor::require(&self.raw, slot.key())?;

        let (token, file_name) = match path {
            None => (None, None),
            Some(path) => {
                let file = UploadFile::read(path).await?;
                let asset = uploader.upload_asset(&file, slot.kind()).await?;
                log::info!("Uploaded {} {}", slot.kind().as_str(), file.file_name);
                (Some(asset.token), Some(file.file_name))
            }
        };

        let wrapper = cursor::require_mut(&mut self.raw, slot.key())?;
        let Value::Object(wrapper) = wrapper else {
            return Err(DocumentError::invalid(slot.key(), "icon wrapper map").into());
        };
        let image = wrapper
            .entry(WRAPPER_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !image.is_object() {
            *image = Value::Object(Map::new());
        }
        if let Value::Object(image) = image {
            image.insert("assetToken".to_string(), json!(token));
            image.insert("originalFileName".to_string(), json!(file_name));
            image.insert("sortOrder".to_string(), Value::Null);
            image.insert("url".to_string(), Value::Null);
        }

        self.setup_icons()
    }

    /// # Errors
    /// See [`VersionRecord::upload_icon`].
    pub async fn upload_large_icon(
        &mut self,
        path: Option<&Path>,
        uploader: &dyn AssetUploader,
    ) -> Result<(), RecordError> {
        self.upload_icon(IconSlot::Large, path, uploader).await
    }

    /// # Errors
    /// See [`VersionRecord::upload_icon`].
    pub async fn upload_watch_icon(
        &mut self,
        path: Option<&Path>,
        uploader: &dyn AssetUploader,
    ) -> Result<(), RecordError> {
        self.upload_icon(IconSlot::Watch, path, uploader).await
    }

    /// Upload a routing-coverage GeoJSON file, or remove it with `path: None`.
    ///
    /// # Errors
    /// Passes upload failures through.
    pub async fn upload_transit_file(
        &mut self,
        path: Option<&Path>,
        uploader: &dyn AssetUploader,
    ) -> Result<(), RecordError> {
        let Some(path) = path else {
            self.root_mut()?
                .insert("transitAppFile".to_string(), Value::Null);
            log::info!("Removed transit app file");
            return self.setup_icons();
        };

        let file = UploadFile::read(path).await?;
        let asset = uploader
            .upload_asset(&file, AssetKind::TransitFile)
            .await?;
        log::info!("Uploaded transit app file {}", file.file_name);

        let payload = json!({
            "assetToken": asset.token,
            "name": file.file_name,
            "url": null,
            "timeStamp": chrono::Utc::now().timestamp_millis(),
        });
        let root = self.root_mut()?;
        match root.get_mut("transitAppFile") {
            Some(Value::Object(wrapper)) => {
                wrapper.insert(WRAPPER_KEY.to_string(), payload);
            }
            _ => {
                root.insert("transitAppFile".to_string(), json!({ "value": payload }));
            }
        }

        self.setup_icons()
    }

    fn root_mut(&mut self) -> Result<&mut Map<String, Value>, RecordError> {
        self.raw
            .as_object_mut()
            .ok_or_else(|| DocumentError::invalid("", "document map").into())
    }
}

fn parse_icon(raw: &Value, slot: IconSlot) -> Result<Option<AppImage>, DocumentError> {
    let path = format!("{}.{WRAPPER_KEY}", slot.key());
    match cursor::lookup(raw, &path) {
        Leaf::Present(payload) => AppImage::parse(&path, payload),
        Leaf::Absent | Leaf::Null => Ok(None),
    }
}

/// Convert an `MM.SS` preview timestamp to the service's `00:MM:SS` form.
fn preview_time_code(timestamp: &str) -> Result<String, RecordError> {
    let bytes = timestamp.as_bytes();
    let well_formed = bytes.len() == 5
        && matches!(bytes[2], b'.' | b':')
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());

    if !well_formed {
        return Err(RecordError::invalid_argument(
            "timestamp",
            timestamp,
            "must have the form MM.SS",
        ));
    }
    Ok(format!("00:{}:{}", &timestamp[..2], &timestamp[3..]))
}

async fn check_preview_resolution(
    tools: &dyn MediaUtility,
    preview: &Path,
    device: Device,
) -> Result<(), RecordError> {
    let portrait = tools.is_portrait(preview).await?;
    let expected = device.preview_resolution(portrait).ok_or_else(|| {
        RecordError::invalid_argument(
            "device",
            device.as_str(),
            "no preview resolution is known for this device",
        )
    })?;
    let actual = tools.resolution(preview).await?;

    if actual != expected {
        return Err(RecordError::invalid_argument(
            "preview resolution",
            actual.to_string(),
            format!(
                "{} preview for {device} must be {expected}",
                expected.orientation()
            ),
        ));
    }
    Ok(())
}
