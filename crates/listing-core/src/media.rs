//! Screenshots and trailers, keyed by language and device.
//!
//! Raw shape, per language entry:
//!
//! ```text
//! screenshots.value.<device>.value[j].value = { assetToken, sortOrder, url, ... }
//! appTrailers.value.<device>.value          = { videoAssetToken, ... } | null
//! ```
//!
//! The typed collections are snapshots; [`MediaCollection::rebuild`] is the
//! only way they are refreshed.

use std::collections::BTreeMap;

use listing_document::{DocumentError, WRAPPER_KEY, cursor};
use serde_json::{Map, Value};

use crate::device::Device;
use crate::error::RecordError;
use crate::localized::{entry_language, find_language, find_language_mut};

pub const MIN_SORT_ORDER: u32 = 1;
pub const MAX_SORT_ORDER: u32 = 5;

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn slot_path(field: &str, language: &str, device: &str) -> String {
    format!("details.value[{language}].{field}.value.{device}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub language: String,
    pub device: String,
    pub sort_order: u32,
    pub asset_token: Option<String>,
    pub original_file_name: Option<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl Screenshot {
    /// Parse one `{value: {...}}` element of a device's screenshot array.
    ///
    /// # Errors
    /// Fails when the slot has no map payload or no integer `sortOrder`.
    pub fn parse(language: &str, device: &str, slot: &Value) -> Result<Self, DocumentError> {
        let path = slot_path(Self::FIELD, language, device);
        let payload = slot
            .get(WRAPPER_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| DocumentError::invalid(path.clone(), "screenshot map"))?;
        let sort_order = payload
            .get("sortOrder")
            .and_then(Value::as_u64)
            .and_then(|order| u32::try_from(order).ok())
            .ok_or_else(|| DocumentError::invalid(path, "integer sortOrder"))?;

        Ok(Self {
            language: language.to_string(),
            device: device.to_string(),
            sort_order,
            asset_token: text(payload, "assetToken"),
            original_file_name: text(payload, "originalFileName"),
            url: text(payload, "url"),
            thumbnail_url: text(payload, "thumbNailUrl"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub language: String,
    pub device: String,
    pub video_asset_token: Option<String>,
    pub picture_asset_token: Option<String>,
    pub preview_frame_time_code: Option<String>,
    pub is_portrait: Option<bool>,
    pub video_url: Option<String>,
    pub preview_image_url: Option<String>,
    pub full_sized_preview_image_url: Option<String>,
    pub content_type: Option<String>,
    pub description_xml: Option<String>,
}

impl Trailer {
    /// Parse the payload of a device's trailer wrapper.
    ///
    /// # Errors
    /// Fails when the payload is not a map.
    pub fn parse(language: &str, device: &str, payload: &Value) -> Result<Self, DocumentError> {
        let payload = payload.as_object().ok_or_else(|| {
            DocumentError::invalid(slot_path(Self::FIELD, language, device), "trailer map")
        })?;

        Ok(Self {
            language: language.to_string(),
            device: device.to_string(),
            video_asset_token: text(payload, "videoAssetToken"),
            picture_asset_token: text(payload, "pictureAssetToken"),
            preview_frame_time_code: text(payload, "previewFrameTimeCode"),
            is_portrait: payload.get("isPortrait").and_then(Value::as_bool),
            video_url: text(payload, "videoUrl"),
            preview_image_url: text(payload, "previewImageUrl"),
            full_sized_preview_image_url: text(payload, "fullSizedPreviewImageUrl"),
            content_type: text(payload, "contentType"),
            description_xml: text(payload, "descriptionXML"),
        })
    }
}

/// A media kind stored per language and device.
pub trait MediaKind: Sized {
    /// Key of the collection inside a language entry.
    const FIELD: &'static str;

    /// Items held by one device slot (`{value: ...}`).
    ///
    /// # Errors
    /// Fails when the slot does not have the expected shape.
    fn parse_slot(language: &str, device: &str, slot: &Value) -> Result<Vec<Self>, DocumentError>;

    fn device(&self) -> &str;
}

impl MediaKind for Screenshot {
    const FIELD: &'static str = "screenshots";

    fn parse_slot(language: &str, device: &str, slot: &Value) -> Result<Vec<Self>, DocumentError> {
        match slot.get(WRAPPER_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(slots)) => slots
                .iter()
                .map(|slot| Screenshot::parse(language, device, slot))
                .collect(),
            Some(_) => Err(DocumentError::invalid(
                slot_path(Self::FIELD, language, device),
                "screenshot array",
            )),
        }
    }

    fn device(&self) -> &str {
        &self.device
    }
}

impl MediaKind for Trailer {
    const FIELD: &'static str = "appTrailers";

    fn parse_slot(language: &str, device: &str, slot: &Value) -> Result<Vec<Self>, DocumentError> {
        match slot.get(WRAPPER_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(payload) => Ok(vec![Trailer::parse(language, device, payload)?]),
        }
    }

    fn device(&self) -> &str {
        &self.device
    }
}

/// Typed snapshot of one media kind, grouped by language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCollection<T> {
    by_language: BTreeMap<String, Vec<T>>,
}

impl<T> Default for MediaCollection<T> {
    fn default() -> Self {
        Self {
            by_language: BTreeMap::new(),
        }
    }
}

impl<T: MediaKind> MediaCollection<T> {
    /// Materialize the collection from the `details.value` language entries.
    ///
    /// # Errors
    /// Fails when a language entry or device slot has an unexpected shape.
    pub fn rebuild(languages: &[Value]) -> Result<Self, DocumentError> {
        let mut by_language = BTreeMap::new();

        for entry in languages {
            let language = entry_language(entry)
                .ok_or_else(|| DocumentError::invalid("details.value[].language", "string"))?;
            let mut items = Vec::new();

            if let Some(devices) = cursor::lookup(entry, T::FIELD).value() {
                let devices = devices
                    .get(WRAPPER_KEY)
                    .filter(|devices| !devices.is_null())
                    .map(|devices| {
                        devices.as_object().ok_or_else(|| {
                            DocumentError::invalid(
                                format!("details.value[{language}].{}.value", T::FIELD),
                                "device map",
                            )
                        })
                    })
                    .transpose()?;

                for (device, slot) in devices.into_iter().flatten() {
                    items.extend(T::parse_slot(language, device, slot)?);
                }
            }

            by_language.insert(language.to_string(), items);
        }

        Ok(Self { by_language })
    }

    /// Items for `language`, in document order.
    #[must_use]
    pub fn for_language(&self, language: &str) -> &[T] {
        self.by_language.get(language).map_or(&[], Vec::as_slice)
    }

    pub fn for_device<'a>(&'a self, language: &str, device: &'a str) -> impl Iterator<Item = &'a T> {
        self.for_language(language)
            .iter()
            .filter(move |item| item.device() == device)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.by_language
            .iter()
            .flat_map(|(language, items)| items.iter().map(move |item| (language.as_str(), item)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reject sort orders outside `1..=5`.
///
/// # Errors
/// Returns `InvalidArgument` naming the offending order.
pub fn validate_sort_order(order: u32) -> Result<(), RecordError> {
    if (MIN_SORT_ORDER..=MAX_SORT_ORDER).contains(&order) {
        Ok(())
    } else {
        Err(RecordError::invalid_argument(
            "sort order",
            order.to_string(),
            format!("must be between {MIN_SORT_ORDER} and {MAX_SORT_ORDER}"),
        ))
    }
}

fn device_slot<'a>(
    languages: &'a [Value],
    field: &str,
    language: &str,
    device: Device,
) -> Result<&'a Value, RecordError> {
    let entry = find_language(languages, language)?;
    cursor::require(entry, &format!("{field}.{WRAPPER_KEY}.{device}"))
        .map_err(|_| RecordError::not_found("Device slot", format!("{language}/{device}")))
}

fn device_slot_mut<'a>(
    languages: &'a mut [Value],
    field: &str,
    language: &str,
    device: Device,
) -> Result<&'a mut Value, RecordError> {
    let entry = find_language_mut(languages, language)?;
    cursor::require_mut(entry, &format!("{field}.{WRAPPER_KEY}.{device}"))
        .map_err(|_| RecordError::not_found("Device slot", format!("{language}/{device}")))
}

fn sort_order_of(slot: &Value) -> Option<u64> {
    slot.get(WRAPPER_KEY)?.get("sortOrder")?.as_u64()
}

/// Sort orders currently used by `(language, device)`, in array order.
///
/// # Errors
/// Returns `NotFound` for an unknown language or device slot.
pub fn screenshot_orders(
    languages: &[Value],
    language: &str,
    device: Device,
) -> Result<Vec<u32>, RecordError> {
    let slot = device_slot(languages, Screenshot::FIELD, language, device)?;
    let orders = match slot.get(WRAPPER_KEY) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(slots)) => slots
            .iter()
            .filter_map(sort_order_of)
            .filter_map(|order| u32::try_from(order).ok())
            .collect(),
        Some(_) => {
            return Err(RecordError::MalformedDocument(DocumentError::invalid(
                slot_path(Screenshot::FIELD, language, device.as_str()),
                "screenshot array",
            )));
        }
    };
    Ok(orders)
}

fn screenshot_array_mut<'a>(
    languages: &'a mut [Value],
    language: &str,
    device: Device,
) -> Result<&'a mut Vec<Value>, RecordError> {
    let path = slot_path(Screenshot::FIELD, language, device.as_str());
    let slot = device_slot_mut(languages, Screenshot::FIELD, language, device)?;
    let Value::Object(slot) = slot else {
        return Err(RecordError::MalformedDocument(DocumentError::invalid(
            path, "map",
        )));
    };

    let array = slot
        .entry(WRAPPER_KEY)
        .or_insert_with(|| Value::Array(Vec::new()));
    if array.is_null() {
        *array = Value::Array(Vec::new());
    }
    array.as_array_mut().ok_or_else(|| {
        RecordError::MalformedDocument(DocumentError::invalid(path, "screenshot array"))
    })
}

/// Replace the screenshot with `order`, or append it if the order is unused.
///
/// # Errors
/// Returns `NotFound` for an unknown language or device slot.
pub fn put_screenshot(
    languages: &mut [Value],
    language: &str,
    device: Device,
    order: u32,
    payload: Value,
) -> Result<(), RecordError> {
    let slots = screenshot_array_mut(languages, language, device)?;
    let mut wrapper = Map::new();
    wrapper.insert(WRAPPER_KEY.to_string(), payload);
    let wrapper = Value::Object(wrapper);

    match slots
        .iter()
        .position(|slot| sort_order_of(slot) == Some(u64::from(order)))
    {
        Some(index) => {
            log::debug!("Replacing screenshot {order} for {language}/{device}");
            slots[index] = wrapper;
        }
        None => {
            log::debug!("Adding screenshot {order} for {language}/{device}");
            slots.push(wrapper);
        }
    }
    Ok(())
}

/// Remove the screenshot with `order`.
///
/// # Errors
/// Returns `InvalidState` when no screenshot uses `order`, leaving the array
/// untouched, and `NotFound` for an unknown language or device slot.
pub fn remove_screenshot(
    languages: &mut [Value],
    language: &str,
    device: Device,
    order: u32,
) -> Result<(), RecordError> {
    if !screenshot_orders(languages, language, device)?.contains(&order) {
        return Err(RecordError::InvalidState(format!(
            "cannot remove non-existent screenshot {order} for {language}/{device}"
        )));
    }

    let slots = screenshot_array_mut(languages, language, device)?;
    slots.retain(|slot| sort_order_of(slot) != Some(u64::from(order)));
    log::debug!("Removed screenshot {order} for {language}/{device}");
    Ok(())
}

/// Whether `(language, device)` currently holds a trailer.
///
/// # Errors
/// Returns `NotFound` for an unknown language or device slot.
pub fn has_trailer(languages: &[Value], language: &str, device: Device) -> Result<bool, RecordError> {
    let slot = device_slot(languages, Trailer::FIELD, language, device)?;
    Ok(slot.get(WRAPPER_KEY).is_some_and(|payload| !payload.is_null()))
}

/// Mutable access to the trailer payload of `(language, device)`, which may
/// be null.
///
/// # Errors
/// Returns `NotFound` for an unknown language or device slot.
pub fn trailer_payload_mut<'a>(
    languages: &'a mut [Value],
    language: &str,
    device: Device,
) -> Result<&'a mut Value, RecordError> {
    let path = slot_path(Trailer::FIELD, language, device.as_str());
    let slot = device_slot_mut(languages, Trailer::FIELD, language, device)?;
    let Value::Object(slot) = slot else {
        return Err(RecordError::MalformedDocument(DocumentError::invalid(
            path, "map",
        )));
    };
    Ok(slot.entry(WRAPPER_KEY).or_insert(Value::Null))
}
