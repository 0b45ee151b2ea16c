/// Statuses a campaign may carry when `CAMPAIGN_STATUSES` is not set.
pub const DEFAULT_CAMPAIGN_STATUSES: &[&str] =
    &["planned", "started", "completed", "on_hold", "called_off"];

/// Campaign settings loaded from environment variables.
///
/// The allowed-status list is passed explicitly into validation rather than
/// looked up from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSettings {
    /// Allowed values for `campaigns.status`.
    pub statuses: Vec<String>,
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            statuses: DEFAULT_CAMPAIGN_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CampaignSettings {
    /// Load settings from the environment.
    ///
    /// | Env Var             | Default                                           |
    /// |---------------------|---------------------------------------------------|
    /// | `CAMPAIGN_STATUSES` | `planned,started,completed,on_hold,called_off`   |
    pub fn from_env() -> Self {
        match std::env::var("CAMPAIGN_STATUSES") {
            Ok(raw) => Self::from_list(&raw),
            Err(_) => Self::default(),
        }
    }

    /// Parse a comma-separated status list. Empty entries are dropped and an
    /// entirely empty list falls back to the defaults.
    pub fn from_list(raw: &str) -> Self {
        let mut statuses: Vec<String> = Vec::new();
        for status in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !statuses.iter().any(|s| s == status) {
                statuses.push(status.to_string());
            }
        }

        if statuses.is_empty() {
            tracing::warn!("CAMPAIGN_STATUSES is empty, using default statuses");
            return Self::default();
        }
        Self { statuses }
    }

    pub fn is_allowed(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }
}
