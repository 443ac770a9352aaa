use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use listing_core::{
    AppStatus, AssetKind, AssetUploader, CandidateBuild, Field, IconSlot, Localizable,
    MediaError, MediaUtility, RecordError, Resolution, ServiceError, TrailerRequest,
    TrailerUpload, TrailerUploadResponse, UploadFile, UploadedAsset, VersionRecord,
    VersionTransport,
};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

#[derive(Default)]
struct RecordingUploader {
    calls: Mutex<Vec<String>>,
}

impl RecordingUploader {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl AssetUploader for RecordingUploader {
    async fn upload_asset(
        &self,
        file: &UploadFile,
        kind: AssetKind,
    ) -> Result<UploadedAsset, ServiceError> {
        let token = format!("token-{}", file.file_name);
        self.calls
            .lock()
            .expect("calls lock")
            .push(format!("{}:{}", kind.as_str(), file.file_name));
        Ok(UploadedAsset {
            token,
            content_type: Some(file.content_type.to_string()),
        })
    }

    async fn upload_trailer(&self, file: &UploadFile) -> Result<TrailerUpload, ServiceError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(format!("trailer:{}", file.file_name));
        Ok(TrailerUpload {
            responses: vec![TrailerUploadResponse {
                token: format!("video-{}", file.file_name),
                description_doc: "<xml/>".to_string(),
            }],
        })
    }
}

struct FailingUploader;

#[async_trait]
impl AssetUploader for FailingUploader {
    async fn upload_asset(
        &self,
        _file: &UploadFile,
        _kind: AssetKind,
    ) -> Result<UploadedAsset, ServiceError> {
        Err(ServiceError::HttpStatus {
            operation: "upload asset",
            status: 503,
            body_snippet: String::new(),
        })
    }

    async fn upload_trailer(&self, _file: &UploadFile) -> Result<TrailerUpload, ServiceError> {
        Err(ServiceError::network_request("upload trailer", "connection reset"))
    }
}

/// Writes extracted frames next to the video and reports one fixed size for
/// every image.
struct FakeMedia {
    resolution: Resolution,
    extracted: Mutex<Vec<(String, Resolution)>>,
}

impl FakeMedia {
    fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            extracted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaUtility for FakeMedia {
    async fn extract_preview_frame(
        &self,
        video: &Path,
        timestamp: &str,
        resolution: Resolution,
    ) -> Result<PathBuf, MediaError> {
        let frame = video.with_extension("jpg");
        std::fs::write(&frame, b"frame")?;
        self.extracted
            .lock()
            .expect("extracted lock")
            .push((timestamp.to_string(), resolution));
        Ok(frame)
    }

    async fn resolution(&self, _path: &Path) -> Result<Resolution, MediaError> {
        Ok(self.resolution)
    }
}

#[derive(Default)]
struct MemoryTransport {
    stored: Mutex<Option<(String, Value)>>,
}

#[async_trait]
impl VersionTransport for MemoryTransport {
    async fn fetch_version(&self, version_id: &str) -> Result<Value, ServiceError> {
        match self.stored.lock().expect("stored lock").as_ref() {
            Some((id, document)) if id == version_id => Ok(document.clone()),
            _ => Err(ServiceError::HttpStatus {
                operation: "fetch version",
                status: 404,
                body_snippet: String::new(),
            }),
        }
    }

    async fn update_version(&self, version_id: &str, document: &Value) -> Result<(), ServiceError> {
        *self.stored.lock().expect("stored lock") = Some((version_id.to_string(), document.clone()));
        Ok(())
    }
}

fn shot(order: u32, token: &str) -> Value {
    json!({ "value": {
        "assetToken": token,
        "sortOrder": order,
        "url": format!("https://cdn.example/{token}.png"),
        "thumbNailUrl": null,
        "originalFileName": format!("{token}.png"),
    }})
}

fn language(code: &str) -> Value {
    json!({
        "language": code,
        "description": { "value": format!("Description {code}"), "isEditable": true },
        "keywords": { "value": "tools,notes" },
        "supportURL": { "value": "https://example.com/support" },
        "marketingURL": { "value": null },
        "releaseNotes": { "value": null },
        "screenshots": { "value": {
            "iphone35": { "value": [] },
            "iphone6": { "value": [shot(2, "b"), shot(1, "a")] },
            "ipad": { "value": null },
            "watch": { "value": [] },
        }},
        "appTrailers": { "value": {
            "iphone35": { "value": null },
            "iphone6": { "value": null },
            "ipad": { "value": {
                "videoAssetToken": "existing-video",
                "pictureAssetToken": "existing-picture",
                "previewFrameTimeCode": "00:00:05",
                "isPortrait": false,
                "descriptionXML": "<old/>",
            }},
            "watch": { "value": null },
        }},
    })
}

fn document() -> Value {
    json!({
        "versionId": 815,
        "status": "prepareForUpload",
        "appType": "iOS App",
        "canBetaTest": true,
        "version": { "value": "1.2.0", "isEditable": true },
        "copyright": { "value": "2026 Example Ltd" },
        "releaseOnApproval": { "value": "true" },
        "supportsAppleWatch": true,
        "largeAppIcon": { "value": { "assetToken": "icon", "originalFileName": "icon.png", "url": null } },
        "watchAppIcon": { "value": null },
        "details": { "value": [language("en-US"), language("de-DE")] },
        "appReviewInfo": {
            "firstName": { "value": "Ada" },
            "lastName": { "value": null },
            "phoneNumber": { "value": null },
            "emailAddress": { "value": "ada@example.com" },
            "reviewNotes": { "value": null },
            "userName": { "value": null },
            "password": { "value": null },
        },
        "ratings": {
            "nonBooleanDescriptors": [
                { "name": "ITC.apps.ratings.nonBooleanDescriptor.CARTOON_FANTASY_VIOLENCE", "level": "ITC.apps.ratings.level.NONE" },
                { "name": "ITC.apps.ratings.nonBooleanDescriptor.GAMBLING_CONTESTS", "level": "ITC.apps.ratings.level.NONE" },
            ],
            "booleanDescriptors": [
                { "name": "ITC.apps.ratings.booleanDescriptor.UNRESTRICTED_WEB_ACCESS", "level": "ITC.apps.ratings.level.NO" },
            ],
        },
    })
}

fn record() -> VersionRecord {
    VersionRecord::load(document()).expect("document loads")
}

fn asset(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, name.as_bytes()).expect("write asset");
    path
}

fn screenshot_orders(record: &VersionRecord, language: &str, device: &str) -> Vec<u32> {
    record
        .screenshots()
        .for_device(language, device)
        .map(|shot| shot.sort_order)
        .collect()
}

#[test]
fn load_exposes_scalar_fields_and_collections() {
    let record = record();

    assert_eq!(record.version(), Some("1.2.0"));
    assert_eq!(record.version_id().as_deref(), Some("815"));
    assert_eq!(record.status(), &AppStatus::PrepareForSubmission);
    assert!(record.release_on_approval());
    assert!(record.supports_apple_watch());
    assert_eq!(record.text(Field::ReviewEmail), Some("ada@example.com"));
    assert_eq!(record.languages(), vec!["en-US", "de-DE"]);
    assert_eq!(record.screenshots().len(), 4);
    assert_eq!(record.trailers().len(), 2);
    assert_eq!(
        record
            .large_app_icon()
            .and_then(|icon| icon.original_file_name.as_deref()),
        Some("icon.png")
    );
    assert!(record.watch_app_icon().is_none());
    assert!(!record.supports_app_transit());
}

#[tokio::test]
async fn save_without_mutation_returns_identical_document() {
    let transport = MemoryTransport::default();

    record().save(&transport).await.expect("save succeeds");

    let stored = transport.stored.lock().expect("stored lock").clone();
    assert_eq!(stored, Some(("815".to_string(), document())));
}

#[tokio::test]
async fn fetch_and_refresh_replace_the_document() {
    let transport = MemoryTransport::default();
    let mut record = record();
    record
        .set_text(Field::Copyright, "2027 Example Ltd")
        .expect("copyright exists");
    record.save(&transport).await.expect("save succeeds");

    let fetched = VersionRecord::fetch(&transport, "815").await.expect("fetch");
    assert_eq!(fetched.copyright(), Some("2027 Example Ltd"));

    record
        .set_text(Field::Copyright, "unsaved")
        .expect("copyright exists");
    record.refresh(&transport).await.expect("refresh");
    assert_eq!(record.copyright(), Some("2027 Example Ltd"));
}

#[tokio::test]
async fn screenshot_order_bounds_are_checked_before_upload() {
    let dir = tempdir().expect("create temp dir");
    let path = asset(&dir, "shot.png");
    let uploader = RecordingUploader::default();
    let mut record = record();

    for order in [0, 6] {
        let error = record
            .upsert_screenshot("en-US", "iphone6", order, Some(&path), &uploader)
            .await
            .expect_err("order out of range");
        assert!(matches!(
            error,
            RecordError::InvalidArgument { argument: "sort order", .. }
        ));
    }
    assert!(uploader.calls().is_empty());
    assert_eq!(record.raw(), &document());

    for order in [1, 5] {
        record
            .upsert_screenshot("en-US", "iphone6", order, Some(&path), &uploader)
            .await
            .expect("order in range");
    }
    assert_eq!(screenshot_orders(&record, "en-US", "iphone6"), vec![2, 1, 5]);
}

#[tokio::test]
async fn replacing_a_screenshot_keeps_one_slot_per_order() {
    let dir = tempdir().expect("create temp dir");
    let path = asset(&dir, "replacement.png");
    let uploader = RecordingUploader::default();
    let mut record = record();

    record
        .upsert_screenshot("en-US", "iphone6", 1, Some(&path), &uploader)
        .await
        .expect("replace order 1");

    let orders = screenshot_orders(&record, "en-US", "iphone6");
    assert_eq!(orders.iter().filter(|order| **order == 1).count(), 1);
    assert_eq!(orders.len(), 2);

    let replaced = record
        .screenshots()
        .for_device("en-US", "iphone6")
        .find(|shot| shot.sort_order == 1)
        .expect("order 1 present");
    assert_eq!(replaced.asset_token.as_deref(), Some("token-replacement.png"));
    assert_eq!(replaced.original_file_name.as_deref(), Some("replacement.png"));
    assert_eq!(replaced.url, None);
    assert_eq!(uploader.calls(), vec!["screenshot:replacement.png"]);
    assert_eq!(screenshot_orders(&record, "de-DE", "iphone6"), vec![2, 1]);
}

#[tokio::test]
async fn screenshot_into_null_slot_initializes_the_array() {
    let dir = tempdir().expect("create temp dir");
    let path = asset(&dir, "ipad.png");
    let mut record = record();

    record
        .upsert_screenshot("de-DE", "ipad", 3, Some(&path), &RecordingUploader::default())
        .await
        .expect("slot exists");

    assert_eq!(screenshot_orders(&record, "de-DE", "ipad"), vec![3]);
}

#[tokio::test]
async fn removing_a_missing_screenshot_fails_without_mutation() {
    let uploader = RecordingUploader::default();
    let mut record = record();

    record
        .upsert_screenshot("en-US", "iphone6", 2, None, &uploader)
        .await
        .expect("order 2 exists");
    assert_eq!(screenshot_orders(&record, "en-US", "iphone6"), vec![1]);
    let after_first_removal = record.raw().clone();

    let error = record
        .upsert_screenshot("en-US", "iphone6", 2, None, &uploader)
        .await
        .expect_err("order 2 already removed");

    assert!(matches!(error, RecordError::InvalidState(_)));
    assert_eq!(record.raw(), &after_first_removal);
    assert!(uploader.calls().is_empty());
}

#[tokio::test]
async fn screenshot_for_unknown_device_or_language_is_rejected() {
    let dir = tempdir().expect("create temp dir");
    let path = asset(&dir, "shot.png");
    let uploader = RecordingUploader::default();
    let mut record = record();

    let device_error = record
        .upsert_screenshot("en-US", "iphone7", 1, Some(&path), &uploader)
        .await
        .expect_err("unknown device");
    let language_error = record
        .upsert_screenshot("fr-FR", "iphone6", 1, Some(&path), &uploader)
        .await
        .expect_err("unknown language");

    assert!(matches!(
        device_error,
        RecordError::InvalidArgument { argument: "device", .. }
    ));
    assert_eq!(language_error, RecordError::not_found("Language", "fr-FR"));
    assert!(uploader.calls().is_empty());
}

#[tokio::test]
async fn upload_failures_pass_through_unchanged() {
    let dir = tempdir().expect("create temp dir");
    let path = asset(&dir, "shot.png");
    let mut record = record();

    let error = record
        .upsert_screenshot("en-US", "iphone6", 3, Some(&path), &FailingUploader)
        .await
        .expect_err("uploader fails");

    assert!(error.is_external());
    assert!(matches!(
        error,
        RecordError::Service(ServiceError::HttpStatus { status: 503, .. })
    ));
    assert_eq!(record.raw(), &document());
}

#[tokio::test]
async fn trailers_are_rejected_on_devices_without_trailer_support() {
    let dir = tempdir().expect("create temp dir");
    let video = asset(&dir, "trailer.mov");
    let uploader = RecordingUploader::default();
    let media = FakeMedia::new(Resolution::new(1334, 750));
    let mut record = record();

    for device in ["iphone35", "watch"] {
        let add = record
            .upsert_trailer(
                TrailerRequest::new("en-US", device).trailer(&video),
                &uploader,
                &media,
            )
            .await
            .expect_err("no trailer support");
        let remove = record
            .upsert_trailer(TrailerRequest::new("en-US", device), &uploader, &media)
            .await
            .expect_err("no trailer support");

        for error in [add, remove] {
            assert!(matches!(
                error,
                RecordError::InvalidArgument { argument: "device", .. }
            ));
        }
    }
    assert!(uploader.calls().is_empty());
    assert!(media.extracted.lock().expect("extracted lock").is_empty());
}

#[tokio::test]
async fn new_trailer_uploads_video_and_extracted_preview() {
    let dir = tempdir().expect("create temp dir");
    let video = asset(&dir, "trailer.mov");
    let uploader = RecordingUploader::default();
    let media = FakeMedia::new(Resolution::new(1334, 750));
    let mut record = record();

    record
        .upsert_trailer(
            TrailerRequest::new("en-US", "iphone6")
                .trailer(&video)
                .timestamp("12.34"),
            &uploader,
            &media,
        )
        .await
        .expect("trailer uploads");

    assert_eq!(
        media.extracted.lock().expect("extracted lock").clone(),
        vec![("12.34".to_string(), Resolution::new(1334, 750))]
    );
    assert_eq!(
        uploader.calls(),
        vec!["trailer preview:trailer.jpg", "trailer:trailer.mov"]
    );

    let trailer = record
        .trailers()
        .for_device("en-US", "iphone6")
        .next()
        .expect("trailer present");
    assert_eq!(trailer.video_asset_token.as_deref(), Some("video-trailer.mov"));
    assert_eq!(trailer.picture_asset_token.as_deref(), Some("token-trailer.jpg"));
    assert_eq!(trailer.preview_frame_time_code.as_deref(), Some("00:12:34"));
    assert_eq!(trailer.is_portrait, Some(false));
    assert_eq!(trailer.description_xml.as_deref(), Some("<xml/>"));
}

#[tokio::test]
async fn existing_trailer_only_refreshes_the_preview() {
    let dir = tempdir().expect("create temp dir");
    let video = asset(&dir, "trailer.mov");
    let preview = asset(&dir, "preview.png");
    let uploader = RecordingUploader::default();
    let media = FakeMedia::new(Resolution::new(768, 1024));
    let mut record = record();

    record
        .upsert_trailer(
            TrailerRequest::new("en-US", "ipad")
                .trailer(&video)
                .preview(&preview),
            &uploader,
            &media,
        )
        .await
        .expect("portrait preview matches");

    assert_eq!(uploader.calls(), vec!["trailer preview:preview.png"]);
    let trailer = record
        .trailers()
        .for_device("en-US", "ipad")
        .next()
        .expect("trailer present");
    assert_eq!(trailer.video_asset_token.as_deref(), Some("existing-video"));
    assert_eq!(trailer.picture_asset_token.as_deref(), Some("token-preview.png"));
    assert_eq!(trailer.preview_frame_time_code.as_deref(), Some("00:05:00"));
    assert_eq!(trailer.is_portrait, Some(true));
}

#[tokio::test]
async fn mismatched_preview_resolution_is_rejected_before_upload() {
    let dir = tempdir().expect("create temp dir");
    let video = asset(&dir, "trailer.mov");
    let preview = asset(&dir, "preview.png");
    let uploader = RecordingUploader::default();
    let media = FakeMedia::new(Resolution::new(1280, 720));
    let mut record = record();

    let error = record
        .upsert_trailer(
            TrailerRequest::new("en-US", "iphone6")
                .trailer(&video)
                .preview(&preview),
            &uploader,
            &media,
        )
        .await
        .expect_err("1280x720 is not an iphone6 preview");

    let RecordError::InvalidArgument {
        value, constraint, ..
    } = &error
    else {
        panic!("expected InvalidArgument, got {error:?}");
    };
    assert_eq!(value, "1280x720");
    assert!(constraint.contains("landscape"));
    assert!(constraint.contains("1334x750"));
    assert!(uploader.calls().is_empty());
    assert_eq!(record.raw(), &document());
}

#[tokio::test]
async fn malformed_timestamp_is_rejected() {
    let dir = tempdir().expect("create temp dir");
    let video = asset(&dir, "trailer.mov");
    let uploader = RecordingUploader::default();
    let mut record = record();

    let error = record
        .upsert_trailer(
            TrailerRequest::new("en-US", "iphone6")
                .trailer(&video)
                .timestamp("1:30"),
            &uploader,
            &FakeMedia::new(Resolution::new(1334, 750)),
        )
        .await
        .expect_err("timestamp must be MM.SS");

    assert!(matches!(
        error,
        RecordError::InvalidArgument { argument: "timestamp", .. }
    ));
    assert!(uploader.calls().is_empty());
}

#[tokio::test]
async fn trailer_removal_requires_an_existing_trailer() {
    let uploader = RecordingUploader::default();
    let media = FakeMedia::new(Resolution::new(1024, 768));
    let mut record = record();

    record
        .upsert_trailer(TrailerRequest::new("de-DE", "ipad"), &uploader, &media)
        .await
        .expect("ipad trailer exists");
    assert!(record.trailers().for_device("de-DE", "ipad").next().is_none());
    assert!(record.raw()["details"]["value"][1]["appTrailers"]["value"]["ipad"]["value"].is_null());

    let error = record
        .upsert_trailer(TrailerRequest::new("de-DE", "ipad"), &uploader, &media)
        .await
        .expect_err("already removed");
    assert!(matches!(error, RecordError::InvalidState(_)));
}

#[test]
fn create_languages_is_idempotent() {
    let mut record = record();

    assert_eq!(record.create_languages(&["fr-FR"]).expect("template exists"), 1);
    assert_eq!(record.create_languages(&["fr-FR", "en-US"]).expect("template exists"), 0);

    assert_eq!(record.languages(), vec!["en-US", "de-DE", "fr-FR"]);
    let mut expected = language("en-US");
    expected["language"] = json!("fr-FR");
    assert_eq!(record.raw()["details"]["value"][2], expected);
    let french = record
        .localized(Localizable::Description)
        .expect("languages exist")
        .get("fr-FR")
        .expect("fr-FR activated");
    assert_eq!(french, Some("Description en-US"));
}

#[test]
fn localized_fields_update_through_the_record() {
    let mut record = record();

    record
        .localized_mut(Localizable::ReleaseNotes)
        .expect("languages exist")
        .set("de-DE", "Fehlerbehebungen")
        .expect("de-DE activated");

    let notes = record
        .localized(Localizable::ReleaseNotes)
        .expect("languages exist");
    assert_eq!(notes.get("de-DE"), Ok(Some("Fehlerbehebungen")));
    assert_eq!(notes.get("en-US"), Ok(None));
    assert_eq!(
        notes.get("ja-JP"),
        Err(RecordError::not_found("Language", "ja-JP"))
    );
}

#[test]
fn ratings_apply_atomically() {
    let mut record = record();

    record
        .update_rating([("GAMBLING_CONTESTS", 2)])
        .expect("descriptor exists");
    assert_eq!(
        record.raw()["ratings"]["nonBooleanDescriptors"][1]["level"],
        json!("ITC.apps.ratings.level.FREQUENT_INTENSE")
    );
    let before = record.raw().clone();

    let error = record
        .update_rating([("GAMBLING_CONTESTS", 3)])
        .expect_err("3 is out of range");
    assert!(matches!(error, RecordError::InvalidArgument { .. }));
    assert_eq!(record.raw(), &before);
}

#[test]
fn select_build_creates_missing_build_fields() {
    let mut record = record();
    let build = CandidateBuild {
        build_version: "42".to_string(),
        train_version: "1.2.0".to_string(),
        upload_date: 1_791_000_000_000,
    };

    record.select_build(&build).expect("build fields writable");

    assert_eq!(record.build_version(), Some("42"));
    assert_eq!(
        record.raw()["preReleaseBuildTrainVersionString"],
        json!("1.2.0")
    );
    assert_eq!(
        record.raw()["preReleaseBuildUploadDate"],
        json!(1_791_000_000_000_i64)
    );
}

#[test]
fn select_build_fills_null_build_wrapper() {
    let mut raw = document();
    raw["preReleaseBuildVersionString"] = Value::Null;
    let mut record = VersionRecord::load(raw).expect("document loads");

    record
        .select_build(&CandidateBuild {
            build_version: "43".to_string(),
            train_version: "1.2.0".to_string(),
            upload_date: 1_791_000_000_000,
        })
        .expect("null build wrapper is writable");

    assert_eq!(record.build_version(), Some("43"));
    assert_eq!(
        record.raw()["preReleaseBuildVersionString"],
        json!({ "value": "43" })
    );
}

#[test]
fn release_on_approval_is_written_as_string() {
    let mut record = record();

    record
        .set_release_on_approval(false)
        .expect("field exists");

    assert!(!record.release_on_approval());
    assert_eq!(record.raw()["releaseOnApproval"]["value"], json!("false"));
}

#[test]
fn set_text_rejects_non_text_fields() {
    let mut record = record();

    let error = record
        .set_text(Field::Status, "readyForSale")
        .expect_err("status is read-only");

    assert!(matches!(error, RecordError::InvalidArgument { argument: "field", .. }));
}

#[tokio::test]
async fn watch_icon_requires_watch_support() {
    let dir = tempdir().expect("create temp dir");
    let icon = asset(&dir, "watch.png");
    let uploader = RecordingUploader::default();
    let mut raw = document();
    raw.as_object_mut()
        .expect("document is a map")
        .remove("supportsAppleWatch");
    let mut record = VersionRecord::load(raw).expect("document loads");

    let error = record
        .upload_icon(IconSlot::Watch, Some(&icon), &uploader)
        .await
        .expect_err("no watch support");

    assert!(matches!(error, RecordError::InvalidState(_)));
    assert!(uploader.calls().is_empty());
}

#[tokio::test]
async fn icons_and_transit_file_upload() {
    let dir = tempdir().expect("create temp dir");
    let icon = asset(&dir, "watch.png");
    let routes = asset(&dir, "routes.geojson");
    let uploader = RecordingUploader::default();
    let mut record = record();

    record
        .upload_icon(IconSlot::Watch, Some(&icon), &uploader)
        .await
        .expect("watch icon slot exists");
    record
        .upload_transit_file(Some(&routes), &uploader)
        .await
        .expect("transit file attaches");

    let watch_icon = record.watch_app_icon().expect("watch icon set");
    assert_eq!(watch_icon.asset_token.as_deref(), Some("token-watch.png"));
    let transit = record.transit_app_file().expect("transit file set");
    assert_eq!(transit.name.as_deref(), Some("routes.geojson"));
    assert!(transit.time_stamp.is_some());
    assert_eq!(
        uploader.calls(),
        vec!["watch app icon:watch.png", "transit app file:routes.geojson"]
    );

    record
        .upload_transit_file(None, &uploader)
        .await
        .expect("transit file removes");
    assert!(!record.supports_app_transit());
}
