use async_trait::async_trait;
use tracing::info;

use crate::gemini::GeminiClient;
use crate::types::{AgentReply, AnalysisInput};

use super::{Agent, AgentError};

/// The four fixed response generators. Identical input shape, distinct
/// instruction and message templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Therapist,
    Closure,
    Routine,
    Honesty,
}

impl Persona {
    /// Invocation order is part of the contract: therapist → closure →
    /// routine → honesty.
    pub const ALL: [Persona; 4] = [
        Persona::Therapist,
        Persona::Closure,
        Persona::Routine,
        Persona::Honesty,
    ];

    /// Key of this persona's slot in the response `data` mapping.
    pub fn key(self) -> &'static str {
        match self {
            Persona::Therapist => "therapist",
            Persona::Closure => "closure",
            Persona::Routine => "routine",
            Persona::Honesty => "honesty",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Persona::Therapist => "Therapist Agent",
            Persona::Closure => "Closure Agent",
            Persona::Routine => "Routine Planner Agent",
            Persona::Honesty => "Brutal Honesty Agent",
        }
    }

    /// System instructions sent with every call for this persona.
    pub fn instructions(self) -> &'static str {
        match self {
            Persona::Therapist => {
                "You are an empathetic therapist that listens and validates the user's \
                 feelings. Acknowledge what they are going through, offer comforting words, \
                 and share gentle coping suggestions grounded in what they told you. Never \
                 dismiss or minimize their emotions. Respond in markdown."
            }
            Persona::Closure => {
                "You are a closure specialist that crafts emotional messages the user needs \
                 to express but should not send. Write a heartfelt unsent letter addressed \
                 to the other person, voicing the user's unspoken feelings so they can let \
                 go. Keep it sincere and human. Respond in markdown."
            }
            Persona::Routine => {
                "You are a recovery routine planner. Design a concrete 7-day recovery \
                 challenge tailored to the user's situation, one actionable activity per \
                 day, mixing self-care, social connection, and small personal wins. \
                 Respond in markdown."
            }
            Persona::Honesty => {
                "You are a direct feedback specialist that gives blunt truth. Tell the user \
                 objectively what happened and why, without sugar-coating and without \
                 cruelty, so they can face reality and move forward. Respond in markdown."
            }
        }
    }

    /// Wraps the user's text in this persona's message template.
    pub fn message(self, user_text: &str) -> String {
        match self {
            Persona::Therapist => format!("Analyze and support user feeling: {}", user_text),
            Persona::Closure => format!("Help user with closure: {}", user_text),
            Persona::Routine => format!("Create 7-day recovery plan: {}", user_text),
            Persona::Honesty => format!("Give honest feedback about: {}", user_text),
        }
    }
}

#[derive(Clone)]
pub struct PersonaAgent {
    client: GeminiClient,
    persona: Persona,
}

impl PersonaAgent {
    pub fn new(client: GeminiClient, persona: Persona) -> Self {
        Self { client, persona }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }
}

#[async_trait]
impl Agent for PersonaAgent {
    type Input = AnalysisInput;
    type Output = AgentReply;

    async fn execute(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        info!(
            "{}: sending request ({} images)",
            self.persona.display_name(),
            input.images.len()
        );
        let reply = self
            .client
            .generate(
                self.persona.instructions(),
                &self.persona.message(&input.user_text),
                &input.images,
            )
            .await?;

        Ok(match reply {
            Some(text) => {
                info!(
                    "{}: received {} chars",
                    self.persona.display_name(),
                    text.len()
                );
                AgentReply::success(text)
            }
            None => {
                info!("{}: model returned no content", self.persona.display_name());
                AgentReply::no_response()
            }
        })
    }
}
