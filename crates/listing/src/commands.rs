//! Command handlers.
//!
//! Editing commands load the local document, apply one mutation through
//! [`VersionRecord`] and write the document back. `pull` and `push` are the
//! only commands that talk to the service without an upload.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use listing_client::ServiceClient;
use listing_core::{
    CandidateBuild, Field, IconSlot, Localizable, TrailerRequest, VersionRecord,
};
use listing_platform::{AppPaths, FfmpegMedia};
use log::info;

use crate::cli::Command;
use crate::error::AppError;
use crate::settings::Settings;

pub struct Context {
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub paths: AppPaths,
    pub document: Option<PathBuf>,
}

impl Context {
    fn document(&self) -> Result<&Path, AppError> {
        self.document.as_deref().ok_or(AppError::MissingDocument)
    }

    fn client(&self) -> Result<ServiceClient, AppError> {
        Ok(ServiceClient::new(self.settings.client_config()?)?)
    }

    fn media(&self) -> Result<FfmpegMedia, AppError> {
        let scratch = self.paths.media_dir();
        std::fs::create_dir_all(&scratch).map_err(|e| AppError::write(&scratch, e))?;
        Ok(FfmpegMedia::new(
            &self.settings.ffmpeg_path,
            &self.settings.ffprobe_path,
            &scratch,
        )?)
    }
}

pub async fn read_document(path: &Path) -> Result<VersionRecord, AppError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::read(path, e))?;
    let raw = serde_json::from_str(&content).map_err(|e| AppError::parse(path, e))?;
    Ok(VersionRecord::load(raw)?)
}

pub async fn write_document(path: &Path, record: &VersionRecord) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::write(path, e))?;
    }
    let content =
        serde_json::to_string_pretty(record.raw()).map_err(|e| AppError::parse(path, e))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::write(path, e))
}

/// Run `command`, returning what should be printed to stdout.
pub async fn run(command: Command, context: &Context) -> Result<String, AppError> {
    match command {
        Command::Pull { version_id } => pull(&version_id, context).await,
        Command::Push => {
            let record = read_document(context.document()?).await?;
            record.save(&context.client()?).await?;
            Ok(format!(
                "Pushed version {}",
                record.version_id().unwrap_or_default()
            ))
        }
        Command::Init => {
            context.settings.save_to(&context.settings_path)?;
            Ok(format!("Wrote {}", context.settings_path.display()))
        }
        Command::Show => {
            let record = read_document(context.document()?).await?;
            summary(&record)
        }
        command => {
            let path = context.document()?;
            let mut record = read_document(path).await?;
            let message = edit(command, &mut record, context).await?;
            write_document(path, &record).await?;
            info!("Updated {}", path.display());
            Ok(message)
        }
    }
}

async fn pull(version_id: &str, context: &Context) -> Result<String, AppError> {
    let record = VersionRecord::fetch(&context.client()?, version_id).await?;
    let path = context
        .document
        .clone()
        .unwrap_or_else(|| context.paths.snapshot_file(version_id));
    write_document(&path, &record).await?;
    Ok(format!("Saved version {version_id} to {}", path.display()))
}

async fn edit(
    command: Command,
    record: &mut VersionRecord,
    context: &Context,
) -> Result<String, AppError> {
    let message = match command {
        Command::Localize {
            field,
            language,
            value,
        } => {
            record.localized_mut(field)?.set(&language, &value)?;
            format!("Set {field} for {language}")
        }
        Command::Languages { languages } => {
            let added = record.create_languages(&languages)?;
            format!("Activated {added} new language(s); push and pull again to see them filled in")
        }
        Command::Rate { ratings } => {
            let applied = record.update_rating(ratings)?;
            format!("Updated {applied} rating descriptor(s)")
        }
        Command::Screenshot {
            language,
            device,
            order,
            file,
        } => {
            record
                .upsert_screenshot(&language, &device, order, file.as_deref(), &context.client()?)
                .await?;
            let action = if file.is_some() { "Uploaded" } else { "Removed" };
            format!("{action} screenshot {order} for {language}/{device}")
        }
        Command::Trailer {
            language,
            device,
            file,
            preview,
            timestamp,
        } => {
            let request = TrailerRequest {
                language: &language,
                device: &device,
                trailer: file.as_deref(),
                preview: preview.as_deref(),
                timestamp: &timestamp,
            };
            record
                .upsert_trailer(request, &context.client()?, &context.media()?)
                .await?;
            let action = if file.is_some() { "Updated" } else { "Removed" };
            format!("{action} trailer for {language}/{device}")
        }
        Command::Icon { watch, file } => {
            let slot = if watch { IconSlot::Watch } else { IconSlot::Large };
            record
                .upload_icon(slot, file.as_deref(), &context.client()?)
                .await?;
            format!("Updated {slot} icon")
        }
        Command::Transit { file } => {
            record
                .upload_transit_file(file.as_deref(), &context.client()?)
                .await?;
            if file.is_some() {
                "Attached transit app file".to_string()
            } else {
                "Removed transit app file".to_string()
            }
        }
        Command::SelectBuild {
            version,
            train,
            uploaded_at,
        } => {
            record.select_build(&CandidateBuild {
                build_version: version,
                train_version: train,
                upload_date: uploaded_at,
            })?;
            format!(
                "Selected build {}",
                record.build_version().unwrap_or_default()
            )
        }
        Command::Show | Command::Pull { .. } | Command::Push | Command::Init => String::new(),
    };
    Ok(message)
}

/// Human-readable overview of a version.
pub fn summary(record: &VersionRecord) -> Result<String, AppError> {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Version {} ({}), status: {}",
        record.version().unwrap_or("?"),
        record.version_id().unwrap_or_default(),
        record.status()
    );
    if let Some(copyright) = record.copyright() {
        let _ = writeln!(out, "Copyright: {copyright}");
    }
    let _ = writeln!(
        out,
        "Release on approval: {}",
        if record.release_on_approval() { "yes" } else { "no" }
    );
    if let Some(build) = record.text(Field::BuildVersion) {
        let _ = writeln!(out, "Build: {build}");
    }

    for language in record.languages() {
        let _ = writeln!(out, "\n[{language}]");
        for field in Localizable::ALL {
            let value = record.localized(field)?.get(language)?;
            let _ = writeln!(out, "  {field}: {}", value.unwrap_or("-"));
        }
        let screenshots = record.screenshots().for_language(language);
        let _ = writeln!(out, "  screenshots: {}", screenshots.len());
        for trailer in record.trailers().for_language(language) {
            let _ = writeln!(
                out,
                "  trailer ({}): preview at {}",
                trailer.device,
                trailer.preview_frame_time_code.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(out)
}
