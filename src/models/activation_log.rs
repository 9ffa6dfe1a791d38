use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Activate,
    Verify,
    Deactivate,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Activate => "activate",
            LogAction::Verify => "verify",
            LogAction::Deactivate => "deactivate",
        }
    }
}

impl std::str::FromStr for LogAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activate" => Ok(LogAction::Activate),
            "verify" => Ok(LogAction::Verify),
            "deactivate" => Ok(LogAction::Deactivate),
            _ => Err(()),
        }
    }
}

/// One row of the append-only activation log.
///
/// Entries are immutable once written and are used for audit and admin
/// inspection only, never for authorization decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationLogEntry {
    pub id: String,
    pub license_key: String,
    pub device_id: Option<String>,
    pub action: LogAction,
    pub source_addr: Option<String>,
    pub timestamp: i64,
}
