use async_trait::async_trait;

use super::error::AgentError;

/// A single role-scoped prompt for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTask {
    /// 1-based position of the stage that issued this task.
    pub stage_index: u8,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub description: String,
    pub expected_output: String,
}

impl AgentTask {
    /// System message establishing the agent's persona.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }

    /// User message carrying the work order.
    pub fn user_prompt(&self) -> String {
        format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        )
    }
}

/// Runs one agent task against a language model and returns its final text.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, task: &AgentTask) -> Result<String, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> AgentTask {
        AgentTask {
            stage_index: 1,
            role: "Company Existence Validator".into(),
            goal: "Verify Acme".into(),
            backstory: "You are a verification agent.".into(),
            description: "Check whether Acme exists.".into(),
            expected_output: "A status line.".into(),
        }
    }

    #[test]
    fn test_system_prompt_includes_role_and_goal() {
        let prompt = task().system_prompt();
        assert!(prompt.starts_with("You are Company Existence Validator."));
        assert!(prompt.contains("You are a verification agent."));
        assert!(prompt.contains("Your personal goal is: Verify Acme"));
    }

    #[test]
    fn test_user_prompt_includes_description_and_criteria() {
        let prompt = task().user_prompt();
        assert!(prompt.starts_with("Current Task: Check whether Acme exists."));
        assert!(prompt.contains("expected criteria for your final answer: A status line."));
    }
}
