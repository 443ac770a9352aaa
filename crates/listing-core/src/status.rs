use std::fmt;

/// Review/release state of a version, parsed from the raw `status` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppStatus {
    PrepareForSubmission,
    WaitingForReview,
    InReview,
    ReadyForSale,
    PendingDeveloperRelease,
    ProcessingForAppStore,
    PendingContract,
    UploadReceived,
    DeveloperRejected,
    DeveloperRemovedFromSale,
    RemovedFromSale,
    Rejected,
    MetadataRejected,
    InvalidBinary,
    Unknown(String),
}

const RAW_NAMES: [(&str, AppStatus); 14] = [
    ("prepareForUpload", AppStatus::PrepareForSubmission),
    ("waitingForReview", AppStatus::WaitingForReview),
    ("inReview", AppStatus::InReview),
    ("readyForSale", AppStatus::ReadyForSale),
    ("pendingDeveloperRelease", AppStatus::PendingDeveloperRelease),
    ("processingForAppStore", AppStatus::ProcessingForAppStore),
    ("pendingContract", AppStatus::PendingContract),
    ("uploadReceived", AppStatus::UploadReceived),
    ("devRejected", AppStatus::DeveloperRejected),
    ("developerRemovedFromSale", AppStatus::DeveloperRemovedFromSale),
    ("removedFromSale", AppStatus::RemovedFromSale),
    ("rejected", AppStatus::Rejected),
    ("metadataRejected", AppStatus::MetadataRejected),
    ("invalidBinary", AppStatus::InvalidBinary),
];

impl AppStatus {
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        RAW_NAMES
            .iter()
            .find(|(name, _)| *name == raw)
            .map_or_else(|| Self::Unknown(raw.to_string()), |(_, status)| status.clone())
    }

    /// The string the service uses for this status.
    #[must_use]
    pub fn raw(&self) -> &str {
        if let Self::Unknown(raw) = self {
            return raw;
        }
        RAW_NAMES
            .iter()
            .find(|(_, status)| status == self)
            .map_or("", |(name, _)| name)
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::ReadyForSale)
    }

    /// Metadata may only be edited before the version is submitted.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::PrepareForSubmission
                | Self::DeveloperRejected
                | Self::Rejected
                | Self::MetadataRejected
                | Self::InvalidBinary
        )
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PrepareForSubmission => "Prepare for Submission",
            Self::WaitingForReview => "Waiting For Review",
            Self::InReview => "In Review",
            Self::ReadyForSale => "Ready for Sale",
            Self::PendingDeveloperRelease => "Pending Developer Release",
            Self::ProcessingForAppStore => "Processing for App Store",
            Self::PendingContract => "Pending Contract",
            Self::UploadReceived => "Upload Received",
            Self::DeveloperRejected => "Developer Rejected",
            Self::DeveloperRemovedFromSale => "Developer Removed From Sale",
            Self::RemovedFromSale => "Removed From Sale",
            Self::Rejected => "Rejected",
            Self::MetadataRejected => "Metadata Rejected",
            Self::InvalidBinary => "Invalid Binary",
            Self::Unknown(raw) => raw,
        };
        f.write_str(label)
    }
}
