//! Read-only hooks into wizard progress.

use tracing::info;

use super::model::AgentType;
use super::state::WizardStep;

/// Receives wizard progress. Observers cannot change the wizard.
pub trait WizardObserver: Send + Sync {
    /// The wizard now shows `step`, with the agent type picked so far.
    fn on_step(&self, step: WizardStep, agent_type: Option<AgentType>);

    /// The visitor completed `from` and is about to move on.
    fn on_advance(&self, _from: WizardStep) {}
}

/// Logs each transition.
pub struct TracingObserver;

impl WizardObserver for TracingObserver {
    fn on_step(&self, step: WizardStep, agent_type: Option<AgentType>) {
        info!(step = %step, number = step.number(), agent_type = ?agent_type, "Wizard step shown");
    }

    fn on_advance(&self, from: WizardStep) {
        info!(from = %from, "Wizard step completed");
    }
}
