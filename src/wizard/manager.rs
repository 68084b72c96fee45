//! WizardManager: in-memory registry of wizard instances.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::model::{AgentConfig, AgentType, Personality, VoiceStyle};
use super::observer::WizardObserver;
use super::state::{Navigation, WizardState};
use crate::error::WizardError;

/// Partial draft update. Present fields overwrite; absent ones are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftUpdate {
    pub name: Option<String>,
    pub agent_type: Option<AgentType>,
    pub personality: Option<Personality>,
    pub voice_style: Option<VoiceStyle>,
}

/// A wizard transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardAction {
    Next,
    Back,
    Restart,
    Deploy,
}

impl std::fmt::Display for WizardAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Next => "next",
            Self::Back => "back",
            Self::Restart => "restart",
            Self::Deploy => "deploy",
        };
        write!(f, "{s}")
    }
}

/// Snapshot returned to callers after every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardView {
    pub id: Uuid,
    #[serde(flatten)]
    pub state: WizardState,
    pub can_proceed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<AgentConfig>,
}

impl WizardView {
    fn new(id: Uuid, state: &WizardState) -> Self {
        Self {
            id,
            state: state.clone(),
            can_proceed: state.can_proceed(),
            action_label: state.current_step.action_label(),
            config: state
                .current_step
                .is_terminal()
                .then(|| state.config())
                .flatten(),
        }
    }
}

/// Result of a transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    /// Whether the wizard state changed.
    pub moved: bool,
    pub wizard: WizardView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate: Option<Navigation>,
}

/// Most wizards held at once; creating past this drops the stalest.
pub const MAX_LIVE_WIZARDS: usize = 10_000;

/// How often the background sweep looks for idle wizards.
const SWEEP_EVERY: Duration = Duration::from_secs(60);

struct Entry {
    state: WizardState,
    touched: Instant,
}

impl Entry {
    fn touch(&mut self) -> &mut WizardState {
        self.touched = Instant::now();
        &mut self.state
    }
}

/// Holds every live wizard, keyed by id.
pub struct WizardManager {
    wizards: RwLock<HashMap<Uuid, Entry>>,
    observers: Vec<Arc<dyn WizardObserver>>,
    capacity: usize,
}

impl WizardManager {
    pub fn new(observers: Vec<Arc<dyn WizardObserver>>) -> Arc<Self> {
        Self::with_capacity(observers, MAX_LIVE_WIZARDS)
    }

    pub fn with_capacity(observers: Vec<Arc<dyn WizardObserver>>, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            wizards: RwLock::new(HashMap::new()),
            observers,
            capacity: capacity.max(1),
        })
    }

    /// Start a wizard on step 1 with an empty draft.
    pub async fn create(&self) -> WizardView {
        let id = Uuid::new_v4();
        let state = WizardState::new();
        for observer in &self.observers {
            observer.on_step(state.current_step, None);
        }
        let view = WizardView::new(id, &state);

        let mut wizards = self.wizards.write().await;
        if wizards.len() >= self.capacity {
            let stalest = wizards
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| *id);
            if let Some(stalest) = stalest {
                wizards.remove(&stalest);
                debug!(wizard_id = %stalest, "Wizard evicted at capacity");
            }
        }
        wizards.insert(
            id,
            Entry {
                state,
                touched: Instant::now(),
            },
        );
        info!(wizard_id = %id, "Wizard started");
        view
    }

    pub async fn get(&self, id: Uuid) -> Result<WizardView, WizardError> {
        let mut wizards = self.wizards.write().await;
        let entry = wizards.get_mut(&id).ok_or(WizardError::NotFound(id))?;
        Ok(WizardView::new(id, entry.touch()))
    }

    pub async fn update_draft(
        &self,
        id: Uuid,
        update: DraftUpdate,
    ) -> Result<WizardView, WizardError> {
        let mut wizards = self.wizards.write().await;
        let state = wizards
            .get_mut(&id)
            .ok_or(WizardError::NotFound(id))?
            .touch();
        if let Some(name) = update.name {
            state.set_name(name);
        }
        if let Some(agent_type) = update.agent_type {
            state.set_agent_type(agent_type);
        }
        if let Some(personality) = update.personality {
            state.set_personality(personality);
        }
        if let Some(voice_style) = update.voice_style {
            state.set_voice_style(voice_style);
        }
        debug!(wizard_id = %id, step = %state.current_step, "Wizard draft updated");
        Ok(WizardView::new(id, state))
    }

    pub async fn transition(
        &self,
        id: Uuid,
        action: WizardAction,
    ) -> Result<TransitionOutcome, WizardError> {
        let mut wizards = self.wizards.write().await;
        let state = wizards
            .get_mut(&id)
            .ok_or(WizardError::NotFound(id))?
            .touch();
        let (moved, navigate) = match action {
            WizardAction::Next => (state.next(&self.observers), None),
            WizardAction::Back => (state.back(&self.observers), None),
            WizardAction::Restart => (state.restart(&self.observers), None),
            WizardAction::Deploy => {
                let nav = state.deploy();
                (false, nav)
            }
        };
        debug!(
            wizard_id = %id,
            action = %action,
            moved,
            step = state.current_step.number(),
            "Wizard transition"
        );
        Ok(TransitionOutcome {
            moved,
            wizard: WizardView::new(id, state),
            navigate,
        })
    }

    /// Drop a wizard. Returns whether it existed.
    pub async fn discard(&self, id: Uuid) -> bool {
        let removed = self.wizards.write().await.remove(&id).is_some();
        if removed {
            info!(wizard_id = %id, "Wizard discarded");
        }
        removed
    }

    /// Drop wizards nobody has touched for `max_idle`. Returns how many went.
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        let mut wizards = self.wizards.write().await;
        let before = wizards.len();
        wizards.retain(|id, entry| {
            let keep = entry.touched.elapsed() < max_idle;
            if !keep {
                debug!(wizard_id = %id, "Wizard expired");
            }
            keep
        });
        let expired = before - wizards.len();
        if expired > 0 {
            info!(expired, live = wizards.len(), "Idle wizards discarded");
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.wizards.read().await.len()
    }
}

/// Spawn a background task that periodically discards idle wizards.
pub fn spawn_expiry_task(
    manager: Arc<WizardManager>,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_EVERY);
        loop {
            interval.tick().await;
            manager.expire_idle(max_idle).await;
        }
    })
}
