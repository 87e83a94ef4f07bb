//! Wire types for the Mentor backend JSON API.
//!
//! Plain serde mirrors of what the backend sends and receives. Optional
//! response fields are `Option` (or defaulted collections) so that older
//! backend variants that omit the gamification payload still parse.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::progress::{PathPosition, RecentEvent};

// -- Chat -------------------------------------------------------------------

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
}

/// One retrieved-source citation attached to a reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceHit {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Progress fields embedded in a chat reply. Always partial: the full
/// snapshot is assembled client-side together with `total_xp` / `badges`
/// from the response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressPayload {
    #[serde(default)]
    pub goal: Option<u32>,
    #[serde(default, rename = "pathPosition")]
    pub path_position: Option<PathPosition>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default, rename = "recentEvents")]
    pub recent_events: Vec<RecentEvent>,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text. Absent or empty means the backend had nothing
    /// to say; the UI renders its own notice for that case.
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceHit>,
    #[serde(default, rename = "xpAwarded")]
    pub xp_awarded: Option<i64>,
    #[serde(default, rename = "nextTask")]
    pub next_task: Option<String>,
    #[serde(default, rename = "totalXp")]
    pub total_xp: Option<u32>,
    #[serde(default)]
    pub progress: Option<ProgressPayload>,
    #[serde(default)]
    pub badges: Option<Vec<String>>,
}

// -- Agents -----------------------------------------------------------------

/// Per-agent configuration, read from `GET /api/agents` and written back
/// via `POST /api/agents/config`. Field names are snake_case on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "defaults::model")]
    pub model: String,
    #[serde(default = "defaults::temperature")]
    pub temperature: f32,
    #[serde(default = "defaults::max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "defaults::embed_model")]
    pub embed_model: String,
    #[serde(default = "defaults::rag_k")]
    pub rag_k: u32,
    #[serde(default = "defaults::rag_chunk_size")]
    pub rag_chunk_size: u32,
    #[serde(default = "defaults::rag_overlap")]
    pub rag_overlap: u32,
    #[serde(default = "defaults::tools_enabled")]
    pub tools_enabled: bool,
    #[serde(default)]
    pub system_prompt: String,
}

mod defaults {
    pub fn model() -> String {
        "gpt-4o-mini".to_string()
    }
    pub fn temperature() -> f32 {
        0.7
    }
    pub fn max_tokens() -> u32 {
        2000
    }
    pub fn embed_model() -> String {
        "text-embedding-3-large".to_string()
    }
    pub fn rag_k() -> u32 {
        6
    }
    pub fn rag_chunk_size() -> u32 {
        800
    }
    pub fn rag_overlap() -> u32 {
        150
    }
    pub fn tools_enabled() -> bool {
        true
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            agent_id: None,
            name: String::new(),
            model: defaults::model(),
            temperature: defaults::temperature(),
            max_tokens: defaults::max_tokens(),
            embed_model: defaults::embed_model(),
            rag_k: defaults::rag_k(),
            rag_chunk_size: defaults::rag_chunk_size(),
            rag_overlap: defaults::rag_overlap(),
            tools_enabled: defaults::tools_enabled(),
            system_prompt: String::new(),
        }
    }
}

/// Response of `GET /api/agents`: agent id → configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentsResponse {
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,
}

// -- API key ----------------------------------------------------------------

/// Body of `POST /api/config/api-key`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyRequest {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub persist: bool,
}

// -- Retriever debug --------------------------------------------------------

/// One hit from `GET /api/debug/retriever`.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieverHit {
    pub source: String,
    pub score: f64,
    #[serde(default)]
    pub snippet: String,
}

/// Response of `GET /api/debug/retriever`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieverResponse {
    #[serde(default)]
    pub hits: Vec<RetrieverHit>,
}

// -- Error envelope ---------------------------------------------------------

/// Non-2xx bodies carry a human-readable detail. FastAPI variants of the
/// backend use `detail`, the plain-HTTP variant uses `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "error")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_camel_case() {
        let req = ChatRequest {
            message: "Olá".to_string(),
            session_id: "S1".to_string(),
            agent_id: "tutor".to_string(),
        };
        let json = serde_json::to_string(&req).expect("serialization failed");
        assert!(json.contains("\"message\":\"Olá\""));
        assert!(json.contains("\"sessionId\":\"S1\""));
        assert!(json.contains("\"agentId\":\"tutor\""));
    }

    #[test]
    fn test_chat_response_minimal_reply_only() {
        let json = r#"{"reply":"Oi!"}"#;
        let resp: ChatResponse = serde_json::from_str(json).expect("deser failed");
        assert_eq!(resp.reply.as_deref(), Some("Oi!"));
        assert!(resp.sources.is_empty());
        assert!(resp.xp_awarded.is_none());
        assert!(resp.progress.is_none());
    }

    #[test]
    fn test_chat_response_full_envelope() {
        let json = r#"{
            "reply": "Oi!",
            "sources": [{"source": "bncc.pdf", "score": 0.91, "snippet": "..."}],
            "xpAwarded": 5,
            "nextTask": "Resolver 2 exercícios",
            "totalXp": 55,
            "badges": ["Bronze"],
            "progress": {
                "goal": 300,
                "pathPosition": {"level": 1, "label": "Fundamentos", "xpToNext": 45},
                "gaps": ["frações"],
                "recentEvents": []
            }
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).expect("deser failed");
        assert_eq!(resp.xp_awarded, Some(5));
        assert_eq!(resp.next_task.as_deref(), Some("Resolver 2 exercícios"));
        assert_eq!(resp.total_xp, Some(55));
        assert_eq!(resp.badges.as_deref(), Some(&["Bronze".to_string()][..]));
        let progress = resp.progress.expect("progress");
        assert_eq!(progress.goal, Some(300));
        assert_eq!(
            progress.path_position.as_ref().map(|p| p.level),
            Some(1)
        );
        assert_eq!(progress.gaps, vec!["frações".to_string()]);
        assert_eq!(resp.sources[0].source, "bncc.pdf");
    }

    #[test]
    fn test_chat_response_empty_object_parses() {
        let resp: ChatResponse = serde_json::from_str("{}").expect("deser failed");
        assert!(resp.reply.is_none());
        assert!(resp.sources.is_empty());
    }

    #[test]
    fn test_source_hit_score_optional() {
        let hit: SourceHit = serde_json::from_str(r#"{"source":"a.md"}"#).expect("deser");
        assert_eq!(hit.source, "a.md");
        assert!(hit.score.is_none());
        assert!(hit.snippet.is_none());
    }

    #[test]
    fn test_agent_config_defaults() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert!((cfg.temperature - 0.7).abs() < 1e-6);
        assert_eq!(cfg.max_tokens, 2000);
        assert_eq!(cfg.embed_model, "text-embedding-3-large");
        assert_eq!(cfg.rag_k, 6);
        assert_eq!(cfg.rag_chunk_size, 800);
        assert_eq!(cfg.rag_overlap, 150);
        assert!(cfg.tools_enabled);
        assert!(cfg.system_prompt.is_empty());
    }

    #[test]
    fn test_agent_config_partial_body_fills_defaults() {
        let cfg: AgentConfig =
            serde_json::from_str(r#"{"name":"Tutor Manduvi"}"#).expect("deser failed");
        assert_eq!(cfg.name, "Tutor Manduvi");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.rag_k, 6);
    }

    #[test]
    fn test_agent_config_roundtrip() {
        let cfg = AgentConfig {
            agent_id: Some("tutor".to_string()),
            name: "Tutor Manduvi".to_string(),
            temperature: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).expect("serialize");
        let back: AgentConfig = serde_json::from_str(&json).expect("deser");
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_agents_response_map() {
        let json = r#"{"agents":{"tutor":{"name":"Tutor"},"planner":{"name":"Planner"}}}"#;
        let resp: AgentsResponse = serde_json::from_str(json).expect("deser failed");
        assert_eq!(resp.agents.len(), 2);
        assert_eq!(resp.agents["tutor"].name, "Tutor");
    }

    #[test]
    fn test_api_key_request_serializes() {
        let req = ApiKeyRequest {
            api_key: "sk-test".to_string(),
            persist: true,
        };
        let json = serde_json::to_string(&req).expect("serialize");
        assert!(json.contains("\"apiKey\":\"sk-test\""));
        assert!(json.contains("\"persist\":true"));
    }

    #[test]
    fn test_retriever_response_hits() {
        let json = r#"{"hits":[{"source":"bncc.pdf","score":0.8123,"snippet":"trecho"}]}"#;
        let resp: RetrieverResponse = serde_json::from_str(json).expect("deser failed");
        assert_eq!(resp.hits.len(), 1);
        assert_eq!(resp.hits[0].source, "bncc.pdf");
        assert!((resp.hits[0].score - 0.8123).abs() < 1e-9);
    }

    #[test]
    fn test_retriever_response_empty() {
        let resp: RetrieverResponse = serde_json::from_str("{}").expect("deser failed");
        assert!(resp.hits.is_empty());
    }

    #[test]
    fn test_error_body_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"OPENAI_API_KEY não definido"}"#).expect("deser");
        assert_eq!(body.detail.as_deref(), Some("OPENAI_API_KEY não definido"));
    }

    #[test]
    fn test_error_body_error_alias() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"message é obrigatório"}"#).expect("deser");
        assert_eq!(body.detail.as_deref(), Some("message é obrigatório"));
    }

    #[test]
    fn test_error_body_empty() {
        let body: ErrorBody = serde_json::from_str("{}").expect("deser");
        assert!(body.detail.is_none());
    }
}
