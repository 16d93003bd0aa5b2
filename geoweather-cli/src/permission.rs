//! Location permission for a terminal host: the answer is asked once and
//! stored in the config file.

use std::{fmt, path::PathBuf};

use async_trait::async_trait;
use geoweather_core::{Config, Permission, PermissionGate, PermissionOutcome, StoredPermission};
use inquire::Select;
use tracing::{info, warn};

#[derive(Debug)]
pub struct PromptPermissionGate {
    stored: Option<StoredPermission>,
    config_path: PathBuf,
}

impl PromptPermissionGate {
    pub fn new(stored: Option<StoredPermission>, config_path: PathBuf) -> Self {
        Self { stored, config_path }
    }

    fn persist(&self, answer: StoredPermission) -> anyhow::Result<()> {
        let mut config = Config::load_from(&self.config_path)?;
        config.location.permission = Some(answer);
        config.save_to(&self.config_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Allow,
    Deny,
    DenyForever,
}

impl Answer {
    const ALL: [Answer; 3] = [Answer::Allow, Answer::Deny, Answer::DenyForever];

    fn stored(self) -> StoredPermission {
        match self {
            Answer::Allow => StoredPermission::Granted,
            Answer::Deny => StoredPermission::Denied,
            Answer::DenyForever => StoredPermission::DeniedForever,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Answer::Allow => "Allow",
            Answer::Deny => "Deny",
            Answer::DenyForever => "Deny, don't ask again",
        })
    }
}

pub fn outcome_for(stored: StoredPermission) -> PermissionOutcome {
    match stored {
        StoredPermission::Granted => PermissionOutcome::Granted,
        StoredPermission::Denied => PermissionOutcome::RationaleNeeded,
        StoredPermission::DeniedForever => PermissionOutcome::PermanentlyDenied,
    }
}

fn describe(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(|p| match p {
            Permission::FineLocation => "precise location",
            Permission::CoarseLocation => "approximate location",
        })
        .collect::<Vec<_>>()
        .join(" and ")
}

#[async_trait]
impl PermissionGate for PromptPermissionGate {
    async fn check(&self, permissions: &[Permission]) -> PermissionOutcome {
        if let Some(stored) = self.stored {
            return outcome_for(stored);
        }

        let question = format!("Allow geoweather to use your {}?", describe(permissions));
        let answer = tokio::task::spawn_blocking(move || {
            Select::new(&question, Answer::ALL.to_vec()).prompt()
        })
        .await;

        let answer = match answer {
            Ok(Ok(answer)) => answer.stored(),
            Ok(Err(e)) => {
                warn!(error = %e, "permission prompt failed");
                return PermissionOutcome::RationaleNeeded;
            }
            Err(e) => {
                warn!(error = %e, "permission prompt task failed");
                return PermissionOutcome::RationaleNeeded;
            }
        };

        match self.persist(answer) {
            Ok(()) => info!(?answer, "stored location permission answer"),
            Err(e) => warn!(error = %e, "could not store location permission answer"),
        }

        outcome_for(answer)
    }
}
