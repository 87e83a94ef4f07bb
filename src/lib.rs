pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod progress;
pub mod session;
pub mod surfaces;
pub mod transcript;

use std::time::Duration;

use tracing::{debug, warn};

use api::{AgentConfig, ApiKeyRequest, ChatRequest, ChatResponse, RetrieverResponse};
use config::{validate_agent_config, ClientConfig};
use error::ClientError;
use gateway::{ApiGateway, GatewayError};
use progress::{ProgressSnapshot, ProgressView};
use session::{SessionContext, SubmitPolicy};
use surfaces::{terminal_board, ProgressBoard, SurfaceId};
use transcript::{Author, MessageMeta, Transcript};

// ---------------------------------------------------------------------------
// Fixed UI strings (PT-BR, as the product ships them)
// ---------------------------------------------------------------------------

/// Greeting appended to the transcript at startup.
pub const GREETING: &str = "Olá! Eu sou seu Mentor Virtual. Como posso te ajudar hoje?\n\n- [Quero criar um plano de estudos]\n- [Preciso de ajuda com um conceito específico]\n- [Estou buscando novas habilidades para minha carreira]";

/// Canonical quick replies, selectable by number.
pub const QUICK_REPLIES: [&str; 3] = [
    "Quero criar um plano de estudos",
    "Preciso de ajuda com um conceito específico",
    "Estou buscando novas habilidades para minha carreira",
];

/// Generic failure bubble. The specific error is logged, never shown.
pub const ERROR_BUBBLE: &str = "Erro ao conectar com o servidor.";

/// Shown when the backend answered 2xx but with no reply text.
pub const EMPTY_REPLY_BUBBLE: &str = "Erro: resposta vazia";

/// Status notice for a submit rejected by [`SubmitPolicy::Block`].
pub const BUSY_NOTICE: &str = "Aguarde a resposta anterior antes de enviar outra mensagem.";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Navigable sections of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Chat,
    Progress,
    Missions,
    Profile,
    Retriever,
    Config,
    Health,
}

impl Section {
    /// Parse a navigation command. Accepts the English section names and
    /// the PT-BR aliases the product uses.
    pub fn parse(name: &str) -> Option<Section> {
        match name.trim().to_lowercase().as_str() {
            "chat" => Some(Section::Chat),
            "progress" | "progresso" => Some(Section::Progress),
            "missions" | "missoes" | "missões" => Some(Section::Missions),
            "profile" | "perfil" => Some(Section::Profile),
            "retriever" | "acervo" => Some(Section::Retriever),
            "config" => Some(Section::Config),
            "health" | "saude" | "saúde" => Some(Section::Health),
            _ => None,
        }
    }

    /// The progress surfaces visible while this section is active.
    pub fn visible_surfaces(self) -> &'static [SurfaceId] {
        match self {
            Section::Chat => &[SurfaceId::Header],
            Section::Progress => &[SurfaceId::Header, SurfaceId::Sidebar],
            Section::Missions => &[SurfaceId::Missions],
            Section::Profile => &[SurfaceId::Profile],
            Section::Retriever | Section::Config | Section::Health => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Send cycle outcomes
// ---------------------------------------------------------------------------

/// Why a submit was rejected before any transcript mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendReject {
    /// Empty or whitespace-only input. Silently ignored.
    EmptyInput,
    /// A chat request is already in flight and the policy blocks.
    Busy,
}

// ---------------------------------------------------------------------------
// Health / status lines
// ---------------------------------------------------------------------------

/// The three status lines of the health panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub server: &'static str,
    pub embeddings: &'static str,
    pub index: &'static str,
}

impl HealthReport {
    /// Derive the panel lines from the two probes: the liveness endpoint
    /// and a one-hit retriever query (reachable → embeddings work, hits
    /// present → index populated).
    pub fn from_probes(
        server: Result<(), &GatewayError>,
        retriever: Result<&RetrieverResponse, &GatewayError>,
    ) -> Self {
        let server = match server {
            Ok(()) => "✅ Online",
            Err(GatewayError::Http { .. }) => "❌ Erro",
            Err(_) => "❌ Offline",
        };
        let (embeddings, index) = match retriever {
            Ok(resp) => (
                "✅ Funcionando",
                if resp.hits.is_empty() { "⚠️ Vazio" } else { "✅ Indexado" },
            ),
            Err(_) => ("❌ Erro", "❌ Erro"),
        };
        HealthReport { server, embeddings, index }
    }
}

/// One-line API status for the config panel and startup probe.
pub fn api_status_line(probe: Result<(), &GatewayError>) -> &'static str {
    match probe {
        Ok(()) => "✅ Conectado",
        Err(GatewayError::Http { .. }) => "❌ Erro de conexão",
        Err(_) => "❌ Servidor offline",
    }
}

/// Render retriever hits the way the debug panel shows them.
pub fn format_retriever_hits(response: &RetrieverResponse) -> Vec<String> {
    if response.hits.is_empty() {
        return vec![
            "Nenhum resultado encontrado. Verifique se a ingestão foi executada.".to_string(),
        ];
    }
    let mut lines = Vec::with_capacity(response.hits.len() * 3);
    for hit in &response.hits {
        lines.push(hit.source.clone());
        lines.push(format!("Score: {:.4}", hit.score));
        lines.push(hit.snippet.clone());
    }
    lines
}

// ---------------------------------------------------------------------------
// MentorApp: view controller
// ---------------------------------------------------------------------------

/// The client: session, transcript, progress board, and gateway, wired
/// together behind the section/navigation surface.
pub struct MentorApp {
    config: ClientConfig,
    session: SessionContext,
    transcript: Transcript,
    board: ProgressBoard,
    gateway: ApiGateway,
    section: Section,
    in_flight: bool,
    /// Transcript entries already rendered to the terminal.
    printed: usize,
    /// Last loaded agent configuration, for the reset action.
    loaded_agent_config: Option<AgentConfig>,
}

impl MentorApp {
    /// Build the app with the terminal surfaces.
    pub fn new(config: ClientConfig) -> Self {
        let board = terminal_board();
        MentorApp::with_board(config, board)
    }

    /// Build the app around an explicit board (tests pass recording
    /// surfaces here).
    pub fn with_board(config: ClientConfig, board: ProgressBoard) -> Self {
        let gateway = ApiGateway::builder(config.base_url.as_str())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .request_timeout(Duration::from_secs(config.request_timeout_secs))
            .build();
        let session = SessionContext::new(config.agent.clone());
        MentorApp {
            config,
            session,
            transcript: Transcript::new(),
            board,
            gateway,
            section: Section::Chat,
            in_flight: false,
            printed: 0,
            loaded_agent_config: None,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn board(&self) -> &ProgressBoard {
        &self.board
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn select_agent(&mut self, agent_id: impl Into<String>) {
        self.session.select_agent(agent_id);
    }

    /// Append the product greeting. Called once at startup.
    pub fn greet(&mut self) {
        self.transcript
            .append(GREETING, Author::Assistant, MessageMeta::default());
    }

    /// Quick reply text by 1-based index.
    pub fn quick_reply(index: usize) -> Option<&'static str> {
        QUICK_REPLIES.get(index.checked_sub(1)?).copied()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Activate a section and lazily refresh its progress surfaces from the
    /// cached view. Health and progress fetches are separate async steps
    /// the caller triggers after activation.
    pub fn activate(&mut self, section: Section) {
        self.section = section;
        let surfaces = section.visible_surfaces();
        if !surfaces.is_empty() {
            self.board.reapply(surfaces);
        }
    }

    // -----------------------------------------------------------------------
    // Send cycle
    // -----------------------------------------------------------------------

    /// Steps (a) and (b) of the send protocol: validate input and submit
    /// policy, then append the user bubble and the typing placeholder.
    /// Rejection leaves the transcript untouched.
    pub fn begin_send(&mut self, text: &str) -> Result<ChatRequest, SendReject> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendReject::EmptyInput);
        }
        if self.in_flight && self.config.submit_policy == SubmitPolicy::Block {
            return Err(SendReject::Busy);
        }

        self.transcript
            .append(text, Author::User, MessageMeta::default());
        self.transcript.show_typing();
        self.in_flight = true;

        Ok(ChatRequest {
            message: text.to_string(),
            session_id: self.session.session_id().to_string(),
            agent_id: self.session.selected_agent_id().to_string(),
        })
    }

    /// Step (d): replace the placeholder with the annotated reply and fold
    /// any embedded progress payload into the board.
    pub fn complete_send(&mut self, response: ChatResponse) {
        self.in_flight = false;
        self.transcript.clear_typing();

        match response.reply.as_deref() {
            Some(reply) if !reply.is_empty() => {
                let meta = MessageMeta {
                    sources: response.sources.clone(),
                    xp_awarded: response.xp_awarded,
                    next_task: response.next_task.clone(),
                };
                self.transcript.append(reply, Author::Assistant, meta);
            }
            _ => {
                self.transcript
                    .append(EMPTY_REPLY_BUBBLE, Author::Assistant, MessageMeta::default());
            }
        }

        self.fold_reply_progress(&response);
    }

    /// Step (e): remove the placeholder and append the single generic
    /// failure bubble. The classified error goes to the log only.
    pub fn fail_send(&mut self, error: &GatewayError) {
        self.in_flight = false;
        self.transcript.clear_typing();
        warn!(error = %error, "chat request failed");
        self.transcript
            .append(ERROR_BUBBLE, Author::Assistant, MessageMeta::default());
    }

    /// Full send cycle against the backend.
    pub async fn send_message(&mut self, text: &str) -> Result<(), SendReject> {
        let request = self.begin_send(text)?;
        debug!(agent = %request.agent_id, "sending chat message");
        match self.gateway.send_chat(&request).await {
            Ok(response) => self.complete_send(response),
            Err(error) => self.fail_send(&error),
        }
        Ok(())
    }

    /// Send the canonical agent test message through the normal cycle.
    pub async fn test_agent(&mut self, agent_id: &str) -> Result<(), SendReject> {
        let text = format!("Teste do agente {agent_id}: \"Olá, como você pode me ajudar?\"");
        self.send_message(&text).await
    }

    fn fold_reply_progress(&mut self, response: &ChatResponse) {
        if response.total_xp.is_none() && response.progress.is_none() && response.badges.is_none()
        {
            return;
        }
        let xp = response
            .total_xp
            .or_else(|| self.board.last_view().map(|v| v.xp))
            .unwrap_or(0);
        let snapshot = ProgressSnapshot::from_chat_reply(
            xp,
            response.badges.clone(),
            response.progress.clone(),
        );
        self.apply_snapshot(&snapshot);
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Render a full snapshot into the surfaces visible in the current
    /// section; hidden surfaces pick the cached view up on activation.
    pub fn apply_snapshot(&mut self, snapshot: &ProgressSnapshot) {
        let view = ProgressView::compute(snapshot);
        self.board.apply(view, self.section.visible_surfaces());
    }

    /// Explicit `GET /api/progress` refresh for the active section.
    pub async fn refresh_progress(&mut self) -> Result<(), GatewayError> {
        let snapshot = self
            .gateway
            .fetch_progress(self.session.session_id(), self.session.selected_agent_id())
            .await?;
        self.apply_snapshot(&snapshot);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Health / retriever / config operations
    // -----------------------------------------------------------------------

    /// Probe the backend and derive the health panel lines.
    pub async fn health_report(&self) -> HealthReport {
        let server = self.gateway.health().await;
        let retriever = self.gateway.query_retriever("test", 1).await;
        HealthReport::from_probes(server.as_ref().map(|_| ()), retriever.as_ref())
    }

    /// One-line API status probe.
    pub async fn api_status(&self) -> &'static str {
        let probe = self.gateway.health().await;
        api_status_line(probe.as_ref().map(|_| ()))
    }

    /// Retriever debug search; failures collapse to the generic panel
    /// message.
    pub async fn search_retriever(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self
            .gateway
            .query_retriever(query, self.config.retriever_k)
            .await
        {
            Ok(response) => format_retriever_hits(&response),
            Err(error) => {
                warn!(error = %error, "retriever query failed");
                vec!["Erro ao buscar no acervo.".to_string()]
            }
        }
    }

    /// Load one agent's configuration; a missing id is the
    /// missing-configuration error with the product's alert text.
    pub async fn load_agent_config(&mut self, agent_id: &str) -> Result<AgentConfig, ClientError> {
        let agents = self.gateway.fetch_agents().await?;
        match agents.agents.get(agent_id) {
            Some(config) => {
                self.loaded_agent_config = Some(config.clone());
                Ok(config.clone())
            }
            None => Err(ClientError::Validation {
                field: "agent_id",
                detail: "Configuração não encontrada para este agente.".to_string(),
            }),
        }
    }

    /// Validate and save one agent's configuration.
    pub async fn save_agent_config(&mut self, config: &AgentConfig) -> Result<(), ClientError> {
        validate_agent_config(config)?;
        self.gateway.save_agent_config(config).await?;
        self.loaded_agent_config = Some(config.clone());
        Ok(())
    }

    /// The reset action: the last loaded configuration, else the defaults.
    pub fn reset_agent_config(&self) -> AgentConfig {
        self.loaded_agent_config.clone().unwrap_or_default()
    }

    /// Save the backend API key. Empty keys are rejected locally.
    pub async fn save_api_key(&self, key: &str, persist: bool) -> Result<(), ClientError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ClientError::Validation {
                field: "api_key",
                detail: "Cole sua OPENAI_API_KEY.".to_string(),
            });
        }
        self.gateway
            .save_api_key(&ApiKeyRequest {
                api_key: key.to_string(),
                persist,
            })
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    /// Lines for transcript entries appended since the last call; the
    /// terminal equivalent of scrolling to the newest bubble.
    pub fn take_new_lines(&mut self) -> Vec<String> {
        let entries = self.transcript.entries();
        let mut lines = Vec::new();
        for entry in entries.iter().skip(self.printed) {
            lines.extend(transcript::render_entry(entry));
        }
        self.printed = entries.len();
        lines
    }
}
