use serde::{Deserialize, Serialize};

/// Informational tier label, derived from the validity duration at creation
/// time. Never consulted by the validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Trial,
    Monthly,
    Quarterly,
    Yearly,
    Lifetime,
}

impl Plan {
    /// Tier thresholds: trial <=7d, monthly <=30d, quarterly <=90d,
    /// yearly <=365d, lifetime beyond that.
    pub fn from_days(days: i64) -> Self {
        match days {
            ..=7 => Plan::Trial,
            8..=30 => Plan::Monthly,
            31..=90 => Plan::Quarterly,
            91..=365 => Plan::Yearly,
            _ => Plan::Lifetime,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Trial => "trial",
            Plan::Monthly => "monthly",
            Plan::Quarterly => "quarterly",
            Plan::Yearly => "yearly",
            Plan::Lifetime => "lifetime",
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(Plan::Trial),
            "monthly" => Ok(Plan::Monthly),
            "quarterly" => Ok(Plan::Quarterly),
            "yearly" => Ok(Plan::Yearly),
            "lifetime" => Ok(Plan::Lifetime),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "license_key")]
    pub key: String,
    pub plan: Plan,
    /// Device bound on first successful activation; None = never activated
    pub device_id: Option<String>,
    /// Free-text annotation (customer name, assignment note)
    pub owner_label: Option<String>,
    /// Operator identity that minted the key
    pub created_by: Option<String>,
    pub created_at: i64,
    pub activated_at: Option<i64>,
    pub expires_at: i64,
    /// Administrative flag, independent of expiry
    pub active: bool,
    /// True once a device has been bound; cleared only by deactivation
    pub used: bool,
}

impl License {
    pub fn expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}
