use clap::{Parser, Subcommand};
use listing_core::{DEFAULT_PREVIEW_TIMESTAMP, Localizable};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "listing", version, about = "Edit app store version listings")]
pub struct Cli {
    #[arg(long, global = true, help = "Settings file (defaults to the config directory)")]
    pub settings: Option<PathBuf>,
    #[arg(long, global = true, help = "Log debug output to the terminal")]
    pub verbose: bool,
    #[arg(long, global = true, help = "Local version document to read and update")]
    pub document: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Summarize the version document.
    Show,
    /// Set a localized text field for one language.
    Localize {
        field: Localizable,
        language: String,
        value: String,
    },
    /// Activate languages by copying the en-US entry.
    Languages {
        #[arg(required = true)]
        languages: Vec<String>,
    },
    /// Set content-rating descriptors, e.g. `GAMBLING_CONTESTS=2`.
    Rate {
        #[arg(required = true, value_parser = parse_rating)]
        ratings: Vec<(String, i64)>,
    },
    /// Add, replace or (without --file) remove a screenshot.
    Screenshot {
        #[arg(long)]
        language: String,
        #[arg(long)]
        device: String,
        #[arg(long)]
        order: u32,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Add or update (without --file: remove) an app trailer.
    Trailer {
        #[arg(long)]
        language: String,
        #[arg(long)]
        device: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        preview: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_PREVIEW_TIMESTAMP)]
        timestamp: String,
    },
    /// Replace or (without --file) clear the app icon.
    Icon {
        #[arg(long, help = "Target the Apple Watch icon")]
        watch: bool,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Attach or (without --file) remove the routing coverage file.
    Transit {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Associate an uploaded build with the version.
    SelectBuild {
        #[arg(long)]
        version: String,
        #[arg(long)]
        train: String,
        #[arg(long, help = "Upload time in milliseconds since the Unix epoch")]
        uploaded_at: i64,
    },
    /// Download a version document from the service.
    Pull {
        #[arg(long)]
        version_id: String,
    },
    /// Send the local version document to the service.
    Push,
    /// Write the effective settings to the settings file.
    Init,
}

impl Command {
    /// Whether the command changes the local document.
    pub fn mutates_document(&self) -> bool {
        !matches!(self, Self::Show | Self::Pull { .. } | Self::Push | Self::Init)
    }
}

fn parse_rating(raw: &str) -> Result<(String, i64), String> {
    let (key, severity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=SEVERITY, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing descriptor key in `{raw}`"));
    }
    let severity = severity
        .trim()
        .parse()
        .map_err(|_| format!("severity in `{raw}` is not an integer"))?;
    Ok((key.to_string(), severity))
}
