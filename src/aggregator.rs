use tracing::{info, warn};

use crate::agents::{Agent, Persona, PersonaAgent};
use crate::config::Config;
use crate::gemini::{GeminiClient, GeminiError};
use crate::types::{AgentReply, AnalysisData, AnalysisInput};

/// Runs the four persona agents for one request and assembles their
/// replies. Agents are built once at startup from configuration; nothing
/// here is shared mutably across requests.
pub struct Aggregator {
    therapist: PersonaAgent,
    closure: PersonaAgent,
    routine: PersonaAgent,
    honesty: PersonaAgent,
}

impl Aggregator {
    pub fn new(config: Config) -> Result<Self, GeminiError> {
        let base_client = GeminiClient::new(config.clone())?;

        // Search capability is resolved here, once, not during request
        // handling. Its absence degrades the Honesty Agent, never startup.
        let honesty_client = if config.enable_search {
            info!("Brutal Honesty Agent: search grounding enabled");
            GeminiClient::new(config)?.with_search_grounding()
        } else {
            warn!(
                "Search grounding disabled; Brutal Honesty Agent will run without search capabilities"
            );
            base_client.clone()
        };

        Ok(Self {
            therapist: PersonaAgent::new(base_client.clone(), Persona::Therapist),
            closure: PersonaAgent::new(base_client.clone(), Persona::Closure),
            routine: PersonaAgent::new(base_client, Persona::Routine),
            honesty: PersonaAgent::new(honesty_client, Persona::Honesty),
        })
    }

    /// Invoke the four personas sequentially with the same text and image
    /// set. Every slot is always filled: a failed call degrades its own
    /// entry and never aborts the other three.
    pub async fn analyze(&self, input: &AnalysisInput) -> AnalysisData {
        AnalysisData {
            therapist: run_agent(&self.therapist, input).await,
            closure: run_agent(&self.closure, input).await,
            routine: run_agent(&self.routine, input).await,
            honesty: run_agent(&self.honesty, input).await,
        }
    }
}

async fn run_agent(agent: &PersonaAgent, input: &AnalysisInput) -> AgentReply {
    match agent.execute(input).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("{}: call failed: {}", agent.persona().display_name(), e);
            AgentReply::failure(e.to_string())
        }
    }
}
