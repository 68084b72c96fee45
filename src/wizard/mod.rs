//! Build-your-agent wizard.
//!
//! Five steps: name, agent type, personality, voice style, then a summary.
//! Forward moves are gated on the current step's answer; back moves keep
//! every answer. Wizards nobody touches for a while are discarded.

pub mod manager;
pub mod model;
pub mod observer;
pub mod routes;
pub mod state;

pub use manager::{
    DraftUpdate, MAX_LIVE_WIZARDS, TransitionOutcome, WizardAction, WizardManager, WizardView,
    spawn_expiry_task,
};
pub use model::{AgentConfig, AgentDraft, AgentType, OptionInfo, Personality, VoiceStyle};
pub use observer::{TracingObserver, WizardObserver};
pub use routes::{WizardRouteState, wizard_routes};
pub use state::{Navigation, WizardState, WizardStep};
