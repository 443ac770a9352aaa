//! Version records of an app store listing.
//!
//! This crate layers typed views over the raw version document without
//! owning any I/O:
//! - Localized text fields per activated language.
//! - Screenshot and trailer collections keyed by language and device.
//! - Content-rating descriptors.
//! - Build selection, icons and the transit coverage file.
//!
//! Network access and video processing are supplied by the caller through
//! [`VersionTransport`], [`AssetUploader`] and [`MediaUtility`].

mod device;
mod error;
mod images;
mod localized;
mod media;
mod rating;
mod record;
mod status;
mod traits;

/// Device families that carry screenshots and trailers.
pub use device::{Device, Resolution};
pub use error::{MediaError, NetworkStage, RecordError, ServiceError};
pub use images::{AppImage, TransitAppFile};
/// Per-language text fields.
pub use localized::{Localizable, LocalizedField, LocalizedFieldMut};
pub use media::{MediaCollection, MediaKind, Screenshot, Trailer};
pub use rating::{DescriptorKind, LEVEL_PREFIX, RatingDescriptor, RatingDescriptorSet};
/// The version record and its mutation inputs.
pub use record::{
    CandidateBuild, DEFAULT_PREVIEW_TIMESTAMP, IconSlot, TEMPLATE_LANGUAGE, TrailerRequest,
    VersionRecord,
};
pub use status::AppStatus;
/// Collaborator seams implemented by the service client and media tooling.
pub use traits::{
    AssetKind, AssetUploader, MediaUtility, TrailerUpload, TrailerUploadResponse, UploadFile,
    UploadedAsset, VersionTransport,
};

pub use listing_document::Field;
