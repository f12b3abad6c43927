use std::fmt;

use crate::models::ToolType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolStep {
    Basics,
    Config,
    Sources,
    Access,
    Review,
}

impl fmt::Display for ToolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolStep::Basics => "basics",
            ToolStep::Config => "config",
            ToolStep::Sources => "sources",
            ToolStep::Access => "access",
            ToolStep::Review => "review",
        };
        f.write_str(s)
    }
}

/// Which optional wizard sections a tool type uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCapabilities {
    pub has_config: bool,
    pub has_sources: bool,
}

impl ToolCapabilities {
    pub fn of(tool_type: &ToolType) -> Self {
        match tool_type {
            ToolType::Website => Self {
                has_config: true,
                has_sources: true,
            },
            ToolType::Knowledge | ToolType::Spreadsheet => Self {
                has_config: false,
                has_sources: true,
            },
            ToolType::Api
            | ToolType::Database
            | ToolType::Email
            | ToolType::Webhook
            | ToolType::Slack
            | ToolType::Other(_) => Self {
                has_config: true,
                has_sources: false,
            },
        }
    }

    pub fn step_count(&self) -> usize {
        3 + usize::from(self.has_config) + usize::from(self.has_sources)
    }

    /// Map a logical position (0-based) to the concrete step it shows.
    pub fn actual_step(&self, logical: usize) -> Option<ToolStep> {
        let mut steps = [ToolStep::Basics; 5];
        let mut len = 0;
        for (step, present) in [
            (ToolStep::Basics, true),
            (ToolStep::Config, self.has_config),
            (ToolStep::Sources, self.has_sources),
            (ToolStep::Access, true),
            (ToolStep::Review, true),
        ] {
            if present {
                steps[len] = step;
                len += 1;
            }
        }
        steps[..len].get(logical).copied()
    }

    pub fn position_of(&self, step: ToolStep) -> Option<usize> {
        (0..self.step_count()).find(|&i| self.actual_step(i) == Some(step))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentStep {
    Basics,
    Tasks,
    Tools,
    Personality,
    Guardrails,
    Access,
    Review,
}

impl AgentStep {
    pub const ALL: [AgentStep; 7] = [
        AgentStep::Basics,
        AgentStep::Tasks,
        AgentStep::Tools,
        AgentStep::Personality,
        AgentStep::Guardrails,
        AgentStep::Access,
        AgentStep::Review,
    ];
}

impl fmt::Display for AgentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStep::Basics => "basics",
            AgentStep::Tasks => "tasks",
            AgentStep::Tools => "tools",
            AgentStep::Personality => "personality",
            AgentStep::Guardrails => "guardrails",
            AgentStep::Access => "access",
            AgentStep::Review => "review",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table() {
        let website = ToolCapabilities::of(&ToolType::Website);
        assert!(website.has_config && website.has_sources);

        let knowledge = ToolCapabilities::of(&ToolType::Knowledge);
        assert!(!knowledge.has_config && knowledge.has_sources);

        for t in [ToolType::Api, ToolType::Database, ToolType::Email] {
            let caps = ToolCapabilities::of(&t);
            assert!(caps.has_config && !caps.has_sources, "{}", t);
        }

        let unfamiliar = ToolCapabilities::of(&ToolType::Other("calendar".into()));
        assert!(unfamiliar.has_config && !unfamiliar.has_sources);
    }

    #[test]
    fn test_actual_step_skips_missing_sections() {
        let api = ToolCapabilities::of(&ToolType::Api);
        assert_eq!(api.step_count(), 4);
        assert_eq!(api.actual_step(0), Some(ToolStep::Basics));
        assert_eq!(api.actual_step(1), Some(ToolStep::Config));
        assert_eq!(api.actual_step(2), Some(ToolStep::Access));
        assert_eq!(api.actual_step(3), Some(ToolStep::Review));
        assert_eq!(api.actual_step(4), None);

        let sheet = ToolCapabilities::of(&ToolType::Spreadsheet);
        assert_eq!(sheet.actual_step(1), Some(ToolStep::Sources));
        assert_eq!(sheet.position_of(ToolStep::Config), None);

        let website = ToolCapabilities::of(&ToolType::Website);
        assert_eq!(website.step_count(), 5);
        assert_eq!(website.actual_step(2), Some(ToolStep::Sources));
        assert_eq!(website.position_of(ToolStep::Review), Some(4));
    }

    #[test]
    fn test_every_type_starts_at_basics_and_ends_at_review() {
        for t in ToolType::ALL {
            let caps = ToolCapabilities::of(&t);
            assert_eq!(caps.actual_step(0), Some(ToolStep::Basics));
            assert_eq!(
                caps.actual_step(caps.step_count() - 1),
                Some(ToolStep::Review)
            );
        }
    }
}
