use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for listing deposits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepositId(pub u64);

/// Identifier wrapper for purchased deposit services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepositServiceId(pub u64);

/// Listing category. Each category is evaluated as its own partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositCategory {
    Rent,
    Sale,
}

impl DepositCategory {
    pub const ALL: [DepositCategory; 2] = [DepositCategory::Rent, DepositCategory::Sale];

    /// Advertisement service that keeps a listing of this category visible.
    pub fn advertisement_service(self) -> ServiceType {
        match self {
            DepositCategory::Rent => ServiceType::RentalAdvertisement,
            DepositCategory::Sale => ServiceType::SalesAdvertisement,
        }
    }

    /// Configuration key holding the display duration for this category.
    pub fn duration_key(self) -> &'static str {
        match self {
            DepositCategory::Rent => "ad_display_duration.rent",
            DepositCategory::Sale => "ad_display_duration.sale",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DepositCategory::Rent => "rent",
            DepositCategory::Sale => "sale",
        }
    }
}

impl std::fmt::Display for DepositCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status of a deposit. Only `Accepted` and `SystemArchived` are
/// managed by the archival job; the rest are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Pending,
    Accepted,
    Rejected,
    Archived,
    SystemArchived,
}

impl DepositStatus {
    pub const MANAGED: [DepositStatus; 2] = [DepositStatus::Accepted, DepositStatus::SystemArchived];

    pub fn is_managed(self) -> bool {
        Self::MANAGED.contains(&self)
    }

    pub fn label(self) -> &'static str {
        match self {
            DepositStatus::Pending => "Pending",
            DepositStatus::Accepted => "Accepted",
            DepositStatus::Rejected => "Rejected",
            DepositStatus::Archived => "Archived",
            DepositStatus::SystemArchived => "System archived",
        }
    }
}

/// Kind of service purchased for a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Renewal,
    RentalAdvertisement,
    SalesAdvertisement,
    Featured,
}

/// Purchased service attached to a deposit. Read-only for the archival job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositService {
    pub id: DepositServiceId,
    pub deposit_id: DepositId,
    pub service_type: ServiceType,
    pub created_at: NaiveDateTime,
    pub disabled: bool,
}

/// Listing deposit together with its service history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DepositId,
    pub category: DepositCategory,
    pub status: DepositStatus,
    pub disabled: bool,
    pub deleted: bool,
    pub services: Vec<DepositService>,
}

impl Deposit {
    /// Whether the archival job may evaluate this deposit at all.
    pub fn is_eligible(&self) -> bool {
        !self.disabled && !self.deleted && self.status.is_managed()
    }
}

/// Status mutation produced by the decision engine for a single deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub deposit_id: DepositId,
    pub category: DepositCategory,
    pub from: DepositStatus,
    pub to: DepositStatus,
}

impl StatusChange {
    pub fn archives(&self) -> bool {
        self.to == DepositStatus::SystemArchived
    }
}

/// Entry of the shared configuration set. Durations are stored as display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub display_title: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, display_title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_title: display_title.into(),
        }
    }
}

/// Query handed to the store when loading one partition of candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub category: DepositCategory,
    pub statuses: Vec<DepositStatus>,
    pub include_disabled: bool,
    pub include_deleted: bool,
}

impl CandidateQuery {
    /// Eligible, managed deposits of one category with their services attached.
    pub fn for_category(category: DepositCategory) -> Self {
        Self {
            category,
            statuses: DepositStatus::MANAGED.to_vec(),
            include_disabled: false,
            include_deleted: false,
        }
    }

    pub fn matches(&self, deposit: &Deposit) -> bool {
        deposit.category == self.category
            && self.statuses.contains(&deposit.status)
            && (self.include_disabled || !deposit.disabled)
            && (self.include_deleted || !deposit.deleted)
    }
}

/// Per-partition counts collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub evaluated: usize,
    pub archived: usize,
    pub reinstated: usize,
}

/// Outcome of a successful reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub rent: PartitionSummary,
    pub sale: PartitionSummary,
    pub committed: usize,
}

impl RunReport {
    pub fn partition(&self, category: DepositCategory) -> &PartitionSummary {
        match category {
            DepositCategory::Rent => &self.rent,
            DepositCategory::Sale => &self.sale,
        }
    }

    pub fn evaluated(&self) -> usize {
        self.rent.evaluated + self.sale.evaluated
    }
}
