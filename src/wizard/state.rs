//! Agent wizard state machine: five steps, gated forward, free backward.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::model::{AgentConfig, AgentDraft, AgentType, Personality, VoiceStyle};
use super::observer::WizardObserver;

/// Where the deploy action sends the visitor.
pub const CONTACT_TARGET: &str = "/#contact";

/// The wizard steps, numbered 1 through 5 on the wire.
///
/// Progresses linearly: Name → AgentType → Personality → VoiceStyle → Summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    #[default]
    Name,
    AgentType,
    Personality,
    VoiceStyle,
    Summary,
}

impl WizardStep {
    pub const COUNT: u8 = 5;

    pub fn number(&self) -> u8 {
        match self {
            Self::Name => 1,
            Self::AgentType => 2,
            Self::Personality => 3,
            Self::VoiceStyle => 4,
            Self::Summary => 5,
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        self.next() == Some(target) || self.prev() == Some(target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Summary)
    }

    pub fn next(&self) -> Option<WizardStep> {
        match self {
            Self::Name => Some(Self::AgentType),
            Self::AgentType => Some(Self::Personality),
            Self::Personality => Some(Self::VoiceStyle),
            Self::VoiceStyle => Some(Self::Summary),
            Self::Summary => None,
        }
    }

    pub fn prev(&self) -> Option<WizardStep> {
        match self {
            Self::Name => None,
            Self::AgentType => Some(Self::Name),
            Self::Personality => Some(Self::AgentType),
            Self::VoiceStyle => Some(Self::Personality),
            Self::Summary => Some(Self::VoiceStyle),
        }
    }

    /// Label of the forward button on this step.
    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            Self::VoiceStyle => Some("Finish"),
            Self::Summary => None,
            _ => Some("Continue"),
        }
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::Name),
            2 => Ok(Self::AgentType),
            3 => Ok(Self::Personality),
            4 => Ok(Self::VoiceStyle),
            5 => Ok(Self::Summary),
            other => Err(format!("Wizard step out of range: {other}")),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::AgentType => "agent_type",
            Self::Personality => "personality",
            Self::VoiceStyle => "voice_style",
            Self::Summary => "summary",
        };
        write!(f, "{s}")
    }
}

/// Navigation handed back by `deploy`. Carries no agent data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub to: &'static str,
}

/// One visitor's pass through the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub draft: AgentDraft,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current step's answer is complete.
    pub fn can_proceed(&self) -> bool {
        match self.current_step {
            WizardStep::Name => !self.draft.name.trim().is_empty(),
            WizardStep::AgentType => self.draft.agent_type.is_some(),
            WizardStep::Personality => self.draft.personality.is_some(),
            WizardStep::VoiceStyle => self.draft.voice_style.is_some(),
            WizardStep::Summary => true,
        }
    }

    /// Advance one step if the current answer is complete.
    ///
    /// Observers hear about the advance before the step changes. Returns
    /// whether the wizard moved.
    pub fn next(&mut self, observers: &[Arc<dyn WizardObserver>]) -> bool {
        if !self.can_proceed() {
            return false;
        }
        let Some(target) = self.current_step.next() else {
            return false;
        };
        for observer in observers {
            observer.on_advance(self.current_step);
        }
        self.current_step = target;
        self.notify(observers);
        true
    }

    /// Go back one step, keeping every answer.
    pub fn back(&mut self, observers: &[Arc<dyn WizardObserver>]) -> bool {
        match self.current_step.prev() {
            Some(prev) => {
                self.current_step = prev;
                self.notify(observers);
                true
            }
            None => false,
        }
    }

    /// Start over from the summary step with an empty draft.
    pub fn restart(&mut self, observers: &[Arc<dyn WizardObserver>]) -> bool {
        if !self.current_step.is_terminal() {
            return false;
        }
        *self = Self::new();
        self.notify(observers);
        true
    }

    /// From the summary step, hand the visitor to the contact flow.
    pub fn deploy(&self) -> Option<Navigation> {
        self.current_step
            .is_terminal()
            .then_some(Navigation { to: CONTACT_TARGET })
    }

    /// The finished configuration shown on the summary step.
    pub fn config(&self) -> Option<AgentConfig> {
        self.draft.finalize()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_agent_type(&mut self, agent_type: AgentType) {
        self.draft.agent_type = Some(agent_type);
    }

    pub fn set_personality(&mut self, personality: Personality) {
        self.draft.personality = Some(personality);
    }

    pub fn set_voice_style(&mut self, voice_style: VoiceStyle) {
        self.draft.voice_style = Some(voice_style);
    }

    fn notify(&self, observers: &[Arc<dyn WizardObserver>]) {
        for observer in observers {
            observer.on_step(self.current_step, self.draft.agent_type);
        }
    }
}
