//! Agent configuration model: the options a visitor picks and the draft
//! that accumulates them.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// What the agent is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    CustomerSupport,
    PersonalAssistant,
    Teacher,
    Creative,
}

/// How the agent comes across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Personality {
    Friendly,
    Professional,
    Energetic,
    Calm,
}

/// How the agent phrases things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceStyle {
    Casual,
    Formal,
    Humorous,
    Direct,
}

/// Display copy for one selectable option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionInfo {
    pub label: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<&'static str>,
    /// Sample line the agent might say.
    pub example: &'static str,
}

impl AgentType {
    pub const ALL: [AgentType; 4] = [
        Self::CustomerSupport,
        Self::PersonalAssistant,
        Self::Teacher,
        Self::Creative,
    ];

    pub fn info(&self) -> OptionInfo {
        match self {
            Self::CustomerSupport => OptionInfo {
                label: "Customer Support",
                description: "Help customers 24/7",
                emoji: None,
                example: "Hi! How can I help you today? I'm here to answer questions and solve problems!",
            },
            Self::PersonalAssistant => OptionInfo {
                label: "Personal Assistant",
                description: "Organize your life",
                emoji: None,
                example: "Good morning! I've organized your schedule and have some reminders for you.",
            },
            Self::Teacher => OptionInfo {
                label: "Teacher",
                description: "Explain and educate",
                emoji: None,
                example: "Let me break that down for you step by step. First, let's understand the basics...",
            },
            Self::Creative => OptionInfo {
                label: "Creative Helper",
                description: "Generate ideas",
                emoji: None,
                example: "I love brainstorming! Here are 5 creative ideas for your project...",
            },
        }
    }
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Self::Friendly,
        Self::Professional,
        Self::Energetic,
        Self::Calm,
    ];

    pub fn info(&self) -> OptionInfo {
        match self {
            Self::Friendly => OptionInfo {
                label: "Friendly & Casual",
                description: "Warm and approachable",
                emoji: Some("😊"),
                example: "Hey there! I'd love to help you out with that. Let me see what I can do!",
            },
            Self::Professional => OptionInfo {
                label: "Professional & Concise",
                description: "Clear and efficient",
                emoji: Some("💼"),
                example: "I can assist you with that. Here's the information you need.",
            },
            Self::Energetic => OptionInfo {
                label: "Energetic & Enthusiastic",
                description: "Exciting and motivating",
                emoji: Some("🚀"),
                example: "Awesome question! I'm so excited to help you with this! Let's dive in!",
            },
            Self::Calm => OptionInfo {
                label: "Calm & Thoughtful",
                description: "Peaceful and wise",
                emoji: Some("🧘"),
                example: "Take a moment. Let's think through this together, step by step.",
            },
        }
    }
}

impl VoiceStyle {
    pub const ALL: [VoiceStyle; 4] = [Self::Casual, Self::Formal, Self::Humorous, Self::Direct];

    pub fn info(&self) -> OptionInfo {
        match self {
            Self::Casual => OptionInfo {
                label: "Casual & Fun",
                description: "Uses casual language and emojis",
                emoji: Some("😄"),
                example: "Uses casual language and emojis",
            },
            Self::Formal => OptionInfo {
                label: "Formal & Polite",
                description: "Professional communication style",
                emoji: Some("🎩"),
                example: "Professional communication style",
            },
            Self::Humorous => OptionInfo {
                label: "Witty & Playful",
                description: "Adds humor and personality",
                emoji: Some("😂"),
                example: "Adds humor and personality",
            },
            Self::Direct => OptionInfo {
                label: "Direct & Clear",
                description: "Gets straight to the point",
                emoji: Some("🎯"),
                example: "Gets straight to the point",
            },
        }
    }
}

/// Name ideas offered on the first step.
pub const NAME_SUGGESTIONS: [&str; 8] = [
    "BuddyBot", "Helper", "Genius", "Spark", "Atlas", "Nova", "Echo", "Sage",
];

/// Pick a random name idea.
pub fn suggest_name() -> &'static str {
    NAME_SUGGESTIONS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("BuddyBot")
}

/// In-progress wizard answers. Unvisited steps are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub name: String,
    pub agent_type: Option<AgentType>,
    pub personality: Option<Personality>,
    pub voice_style: Option<VoiceStyle>,
}

impl AgentDraft {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The finished configuration, once every answer is present.
    pub fn finalize(&self) -> Option<AgentConfig> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(AgentConfig {
            name: name.to_string(),
            agent_type: self.agent_type?,
            personality: self.personality?,
            voice_style: self.voice_style?,
        })
    }
}

/// A fully answered configuration, shown on the summary step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub agent_type: AgentType,
    pub personality: Personality,
    pub voice_style: VoiceStyle,
}

impl AgentConfig {
    /// One-paragraph summary for the terminal step.
    pub fn summary(&self) -> String {
        format!(
            "{} is ready! A {} agent with a {} personality that speaks in a {} voice.",
            self.name,
            self.agent_type.info().label,
            self.personality.info().label.to_lowercase(),
            self.voice_style.info().label.to_lowercase(),
        )
    }
}
