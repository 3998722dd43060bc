use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One deposit line read off a bank statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankDeposit {
    /// Payer name exactly as printed, before carrier mapping.
    pub payer_name: String,
    pub amount_cents: i64,
}

/// Commission lines (carrier, cents) plus the month's bank deposits.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub commissions: Vec<(String, i64)>,
    pub deposits: Vec<BankDeposit>,
}

impl ReconInput {
    /// Build from any (carrier, cents) source, e.g. extracted entries.
    pub fn new<I, S>(commissions: I, deposits: Vec<BankDeposit>) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            commissions: commissions
                .into_iter()
                .map(|(carrier, cents)| (carrier.into(), cents))
                .collect(),
            deposits,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-carrier total on one side of the reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub carrier: String,
    pub total_cents: i64,
    pub record_count: usize,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconStatus {
    Matched,
    Variance,
    BankOnly,
    CommissionOnly,
}

impl ReconStatus {
    pub const ALL: [ReconStatus; 4] = [
        Self::Matched,
        Self::Variance,
        Self::BankOnly,
        Self::CommissionOnly,
    ];
}

impl std::fmt::Display for ReconStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "MATCHED"),
            Self::Variance => write!(f, "VARIANCE"),
            Self::BankOnly => write!(f, "BANK ONLY"),
            Self::CommissionOnly => write!(f, "COMMISSION ONLY"),
        }
    }
}

/// One carrier's comparison. `variance_cents = bank_cents - commission_cents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconRecord {
    pub carrier: String,
    pub commission_cents: i64,
    pub bank_cents: i64,
    pub variance_cents: i64,
    pub status: ReconStatus,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_carriers: usize,
    pub matched: usize,
    pub variance: usize,
    pub bank_only: usize,
    pub commission_only: usize,
    pub commission_total_cents: i64,
    pub bank_total_cents: i64,
    /// Deposits whose payer had no entry in the payer map.
    pub unmapped_payers: Vec<String>,
}

impl ReconSummary {
    pub fn count(&self, status: ReconStatus) -> usize {
        match status {
            ReconStatus::Matched => self.matched,
            ReconStatus::Variance => self.variance,
            ReconStatus::BankOnly => self.bank_only,
            ReconStatus::CommissionOnly => self.commission_only,
        }
    }

    pub fn variance_cents(&self) -> i64 {
        self.bank_total_cents - self.commission_total_cents
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    /// Sorted by carrier name.
    pub records: Vec<ReconRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
}
