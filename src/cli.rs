use clap::Parser;

use crate::config::ClientConfig;

#[derive(Parser)]
#[command(name = "mentor")]
#[command(version = "0.3.0")]
#[command(about = "Terminal client for the Mentor Virtual tutoring assistant")]
pub struct Args {
    /// Message to send before entering the interactive loop
    pub message: Option<String>,

    /// Backend base URL (overrides the config file and MENTOR_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Agent to chat with (e.g. tutor, planner, helper)
    #[arg(long, short)]
    pub agent: Option<String>,

    /// Path to the client config file (default: mentor.toml, optional)
    #[arg(long)]
    pub config: Option<String>,

    /// Open this section instead of the chat (progress, missions, profile,
    /// retriever, config, health)
    #[arg(long)]
    pub section: Option<String>,

    /// Run the health panel probes and exit
    #[arg(long)]
    pub health: bool,

    /// Run one retriever debug query and exit
    #[arg(long)]
    pub query: Option<String>,

    /// Number of retriever hits to request with --query
    #[arg(long, default_value = "5")]
    pub k: u32,

    /// Exit after the one-shot message instead of entering the loop
    #[arg(long)]
    pub once: bool,
}

/// Path of the config file plus whether its absence is an error (it is
/// only when the user named one explicitly).
pub fn config_source(args: &Args) -> (String, bool) {
    match &args.config {
        Some(path) => (path.clone(), true),
        None => ("mentor.toml".to_string(), false),
    }
}

/// Fold command-line overrides into the loaded configuration. CLI flags
/// beat both the file and the environment.
pub fn apply_overrides(config: &mut ClientConfig, args: &Args) {
    if let Some(url) = &args.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(agent) = &args.agent {
        config.agent = agent.clone();
    }
    if args.query.is_some() {
        config.retriever_k = args.k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SubmitPolicy;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::parse_from(["mentor"]);
        assert!(args.message.is_none());
        assert!(args.base_url.is_none());
        assert!(args.agent.is_none());
        assert!(args.config.is_none());
        assert!(!args.health);
        assert!(!args.once);
        assert_eq!(args.k, 5);
    }

    #[test]
    fn test_args_parse_message_positional() {
        let args = Args::parse_from(["mentor", "Olá, mentor!"]);
        assert_eq!(args.message.as_deref(), Some("Olá, mentor!"));
    }

    #[test]
    fn test_args_parse_full() {
        let args = Args::parse_from([
            "mentor",
            "Olá",
            "--base-url",
            "http://10.0.0.5:8000",
            "--agent",
            "planner",
            "--config",
            "custom.toml",
            "--section",
            "progress",
            "--once",
        ]);
        assert_eq!(args.message.as_deref(), Some("Olá"));
        assert_eq!(args.base_url.as_deref(), Some("http://10.0.0.5:8000"));
        assert_eq!(args.agent.as_deref(), Some("planner"));
        assert_eq!(args.config.as_deref(), Some("custom.toml"));
        assert_eq!(args.section.as_deref(), Some("progress"));
        assert!(args.once);
    }

    #[test]
    fn test_args_parse_short_agent() {
        let args = Args::parse_from(["mentor", "-a", "helper"]);
        assert_eq!(args.agent.as_deref(), Some("helper"));
    }

    #[test]
    fn test_args_parse_health_flag() {
        let args = Args::parse_from(["mentor", "--health"]);
        assert!(args.health);
    }

    #[test]
    fn test_args_parse_query_with_k() {
        let args = Args::parse_from(["mentor", "--query", "frações", "--k", "3"]);
        assert_eq!(args.query.as_deref(), Some("frações"));
        assert_eq!(args.k, 3);
    }

    #[test]
    fn test_config_source_default_is_optional() {
        let args = Args::parse_from(["mentor"]);
        let (path, required) = config_source(&args);
        assert_eq!(path, "mentor.toml");
        assert!(!required);
    }

    #[test]
    fn test_config_source_explicit_is_required() {
        let args = Args::parse_from(["mentor", "--config", "custom.toml"]);
        let (path, required) = config_source(&args);
        assert_eq!(path, "custom.toml");
        assert!(required);
    }

    #[test]
    fn test_apply_overrides_base_url_and_agent() {
        let args = Args::parse_from([
            "mentor",
            "--base-url",
            "http://backend:8000/",
            "--agent",
            "planner",
        ]);
        let mut config = ClientConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.base_url, "http://backend:8000");
        assert_eq!(config.agent, "planner");
        assert_eq!(config.submit_policy, SubmitPolicy::Block);
    }

    #[test]
    fn test_apply_overrides_nothing_set_keeps_config() {
        let args = Args::parse_from(["mentor"]);
        let mut config = ClientConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_apply_overrides_k_only_with_query() {
        let args = Args::parse_from(["mentor", "--k", "9"]);
        let mut config = ClientConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.retriever_k, 5);

        let args = Args::parse_from(["mentor", "--query", "x", "--k", "9"]);
        apply_overrides(&mut config, &args);
        assert_eq!(config.retriever_k, 9);
    }
}
