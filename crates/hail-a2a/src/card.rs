use hail_core::config::AgentRole;

use crate::types::{AgentCapabilities, AgentCard, AgentSkill};

pub const CARD_VERSION: &str = "1.0.0";

pub struct AgentCardBuilder {
    name: String,
    description: String,
    url: String,
    version: String,
    capabilities: AgentCapabilities,
    skills: Vec<AgentSkill>,
    input_modes: Vec<String>,
    output_modes: Vec<String>,
}

impl AgentCardBuilder {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            url: url.into(),
            version: version.into(),
            capabilities: AgentCapabilities::default(),
            skills: Vec::new(),
            input_modes: Vec::new(),
            output_modes: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    #[must_use]
    pub fn streaming(mut self, enabled: bool) -> Self {
        self.capabilities.streaming = enabled;
        self
    }

    #[must_use]
    pub fn skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    #[must_use]
    pub fn default_input_modes(mut self, modes: Vec<String>) -> Self {
        self.input_modes = modes;
        self
    }

    #[must_use]
    pub fn default_output_modes(mut self, modes: Vec<String>) -> Self {
        self.output_modes = modes;
        self
    }

    #[must_use]
    pub fn build(self) -> AgentCard {
        AgentCard {
            name: self.name,
            description: self.description,
            url: self.url,
            version: self.version,
            capabilities: self.capabilities,
            default_input_modes: self.input_modes,
            default_output_modes: self.output_modes,
            skills: self.skills,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn greeter_skill() -> AgentSkill {
    AgentSkill {
        id: "greet_user".into(),
        name: "Greet User".into(),
        description: "Greets a person by name with a warm, friendly message.".into(),
        tags: strings(&["greeting", "hello", "welcome"]),
        examples: strings(&[
            "Please greet John",
            "Say hello to Maria",
            "Welcome our guest Alex",
        ]),
    }
}

fn caller_skill() -> AgentSkill {
    AgentSkill {
        id: "call_greeter".into(),
        name: "Call Greeter Agent".into(),
        description: "Asks the Greeter Agent for a greeting and reports its answer.".into(),
        tags: strings(&["greeting", "a2a", "communication"]),
        examples: strings(&[
            "Ask the greeter to say hello to John",
            "Get a greeting for Maria from the other agent",
            "Call the greeter agent to welcome Alex",
        ]),
    }
}

/// Card for an agent of `role` published at `url`.
#[must_use]
pub fn card_for(role: AgentRole, name: &str, url: &str) -> AgentCard {
    let (description, skill) = match role {
        AgentRole::Greeter => (
            "A friendly agent that greets people by name.",
            greeter_skill(),
        ),
        AgentRole::Caller => (
            "Demonstrates agent-to-agent communication by asking the Greeter Agent for greetings.",
            caller_skill(),
        ),
    };
    AgentCardBuilder::new(name, url, CARD_VERSION)
        .description(description)
        .streaming(true)
        .default_input_modes(strings(&["text", "text/plain"]))
        .default_output_modes(strings(&["text", "text/plain"]))
        .skill(skill)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let card = AgentCardBuilder::new("bare", "http://localhost", "0.1.0").build();
        assert!(card.description.is_empty());
        assert!(!card.capabilities.streaming);
        assert!(card.skills.is_empty());
        assert!(card.default_input_modes.is_empty());
    }

    #[test]
    fn greeter_card_advertises_greet_skill() {
        let card = card_for(AgentRole::Greeter, "Greeter Agent", "http://localhost:8081");
        assert_eq!(card.name, "Greeter Agent");
        assert_eq!(card.url, "http://localhost:8081");
        assert_eq!(card.version, "1.0.0");
        assert!(card.capabilities.streaming);
        assert_eq!(card.default_input_modes, vec!["text", "text/plain"]);
        assert_eq!(card.skills.len(), 1);
        assert_eq!(card.skills[0].id, "greet_user");
        assert_eq!(card.skills[0].examples[1], "Say hello to Maria");
    }

    #[test]
    fn caller_card_advertises_a2a_skill() {
        let card = card_for(AgentRole::Caller, "Caller Agent", "http://localhost:8082");
        let skill = &card.skills[0];
        assert_eq!(skill.id, "call_greeter");
        assert_eq!(skill.name, "Call Greeter Agent");
        assert!(skill.tags.contains(&"a2a".to_owned()));
    }
}
