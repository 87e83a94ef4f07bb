use std::path::Path;

use clap::Parser;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use mentor_client::api::AgentConfig;
use mentor_client::cli::{apply_overrides, config_source, Args};
use mentor_client::config::ClientConfig;
use mentor_client::error::ClientError;
use mentor_client::{MentorApp, Section, SendReject, BUSY_NOTICE};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (config_path, required) = config_source(&args);
    let mut config = match ClientConfig::load(Path::new(&config_path), required) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", format!("Erro de configuração: {error}").red());
            std::process::exit(1);
        }
    };
    config.apply_env();
    apply_overrides(&mut config, &args);

    let mut app = MentorApp::new(config);

    // One-shot modes: probe or query, print, leave.
    if args.health {
        print_health(&app).await;
        return;
    }
    if let Some(query) = &args.query {
        for line in app.search_retriever(query).await {
            println!("{line}");
        }
        return;
    }

    app.greet();
    flush_transcript(&mut app);
    println!("{} {}", "API:".dimmed(), app.api_status().await);

    if let Some(section) = args.section.as_deref().and_then(Section::parse) {
        enter_section(&mut app, section).await;
    }

    if let Some(message) = &args.message {
        submit(&mut app, message).await;
        if args.once {
            return;
        }
    }

    println!(
        "{}",
        "Digite sua mensagem, /ajuda para comandos, /sair para encerrar.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Working copy of the agent-config form, edited via /definir.
    let mut form: Option<AgentConfig> = None;

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(&mut app, &mut form, command).await {
                break;
            }
        } else {
            submit(&mut app, &line).await;
        }
    }
}

/// Run one send cycle and print whatever the transcript gained.
async fn submit(app: &mut MentorApp, text: &str) {
    match app.send_message(text).await {
        Ok(()) => flush_transcript(app),
        Err(SendReject::Busy) => println!("{}", BUSY_NOTICE.yellow()),
        // Empty input is silently ignored, like the widget's submit handler.
        Err(SendReject::EmptyInput) => {}
    }
}

fn flush_transcript(app: &mut MentorApp) {
    for line in app.take_new_lines() {
        println!("{line}");
    }
}

fn alert(message: &str) {
    println!("{}", format!("[alerta] {message}").red().bold());
}

async fn print_health(app: &MentorApp) {
    let report = app.health_report().await;
    println!("Servidor: {}", report.server);
    println!("Embeddings: {}", report.embeddings);
    println!("Acervo (RAG): {}", report.index);
}

async fn enter_section(app: &mut MentorApp, section: Section) {
    app.activate(section);
    match section {
        Section::Health => print_health(app).await,
        Section::Progress => {
            if let Err(error) = app.refresh_progress().await {
                tracing::warn!(error = %error, "progress refresh failed");
                println!("Erro ao conectar com o servidor.");
            }
        }
        Section::Retriever => {
            println!("{}", "Use /buscar <termo> para pesquisar o acervo.".dimmed());
        }
        Section::Config => {
            println!(
                "{}",
                "Use /config <agente> para carregar, /definir <campo> <valor> para editar, /salvar para gravar.".dimmed()
            );
        }
        _ => {}
    }
}

fn print_form(config: &AgentConfig) {
    println!("name: {}", config.name);
    println!("model: {}", config.model);
    println!("temperature: {}", config.temperature);
    println!("max_tokens: {}", config.max_tokens);
    println!("embed_model: {}", config.embed_model);
    println!("rag_k: {}", config.rag_k);
    println!("rag_chunk_size: {}", config.rag_chunk_size);
    println!("rag_overlap: {}", config.rag_overlap);
    println!("tools_enabled: {}", config.tools_enabled);
    println!("system_prompt: {}", config.system_prompt);
}

fn set_form_field(form: &mut AgentConfig, field: &str, value: &str) -> Result<(), String> {
    match field {
        "name" => form.name = value.to_string(),
        "model" => form.model = value.to_string(),
        "temperature" => {
            form.temperature = value.parse().map_err(|_| "número inválido".to_string())?
        }
        "max_tokens" => {
            form.max_tokens = value.parse().map_err(|_| "inteiro inválido".to_string())?
        }
        "embed_model" => form.embed_model = value.to_string(),
        "rag_k" => form.rag_k = value.parse().map_err(|_| "inteiro inválido".to_string())?,
        "rag_chunk_size" => {
            form.rag_chunk_size = value.parse().map_err(|_| "inteiro inválido".to_string())?
        }
        "rag_overlap" => {
            form.rag_overlap = value.parse().map_err(|_| "inteiro inválido".to_string())?
        }
        "tools_enabled" => {
            form.tools_enabled = value.parse().map_err(|_| "use true ou false".to_string())?
        }
        "system_prompt" => form.system_prompt = value.to_string(),
        other => return Err(format!("campo desconhecido: {other}")),
    }
    Ok(())
}

fn print_help() {
    println!("Comandos:");
    println!("  /1 /2 /3             respostas rápidas");
    println!("  /chat /progresso /missoes /perfil /acervo /config /saude");
    println!("  /agente <id>         troca o agente da sessão");
    println!("  /teste <id>          envia a mensagem de teste do agente");
    println!("  /buscar <termo>      pesquisa o acervo (debug do retriever)");
    println!("  /atualizar           recarrega o progresso do servidor");
    println!("  /config <agente>     carrega a configuração do agente");
    println!("  /definir <campo> <valor>   edita o formulário carregado");
    println!("  /redefinir           restaura o formulário");
    println!("  /salvar              grava o formulário no servidor");
    println!("  /chave <key> [persistir]   salva a OPENAI_API_KEY");
    println!("  /sair                encerra");
}

/// Dispatch one slash command. Returns false to leave the loop.
async fn handle_command(
    app: &mut MentorApp,
    form: &mut Option<AgentConfig>,
    command: &str,
) -> bool {
    let mut parts = command.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or("").to_lowercase();
    let rest = parts.next().unwrap_or("").trim();

    match head.as_str() {
        "sair" | "quit" => return false,
        "ajuda" | "help" => print_help(),
        "1" | "2" | "3" => {
            let index: usize = head.parse().unwrap_or(0);
            if let Some(text) = MentorApp::quick_reply(index) {
                submit(app, text).await;
            }
        }
        "agente" if !rest.is_empty() => {
            app.select_agent(rest);
            println!("Agente ativo: {rest}");
        }
        "teste" if !rest.is_empty() => {
            let agent = rest.to_string();
            match app.test_agent(&agent).await {
                Ok(()) => flush_transcript(app),
                Err(SendReject::Busy) => println!("{}", BUSY_NOTICE.yellow()),
                Err(SendReject::EmptyInput) => {}
            }
        }
        "buscar" => {
            for line in app.search_retriever(rest).await {
                println!("{line}");
            }
        }
        "atualizar" => {
            if let Err(error) = app.refresh_progress().await {
                tracing::warn!(error = %error, "progress refresh failed");
                println!("Erro ao conectar com o servidor.");
            }
        }
        "config" if !rest.is_empty() => match app.load_agent_config(rest).await {
            Ok(config) => {
                print_form(&config);
                *form = Some(config);
            }
            Err(ClientError::Validation { detail, .. }) => alert(&detail),
            Err(ClientError::Gateway(error)) => {
                let detail = error
                    .detail()
                    .map(str::to_string)
                    .or_else(|| error.status().map(|s| s.to_string()))
                    .unwrap_or_else(|| "servidor inacessível".to_string());
                alert(&format!("Erro ao carregar configuração: {detail}"));
            }
            Err(error) => alert(&format!("Erro ao carregar configuração: {error}")),
        },
        "definir" => {
            let mut fields = rest.splitn(2, char::is_whitespace);
            let field = fields.next().unwrap_or("");
            let value = fields.next().unwrap_or("").trim();
            match form.as_mut() {
                Some(config) => match set_form_field(config, field, value) {
                    Ok(()) => println!("{field} = {value}"),
                    Err(detail) => alert(&format!("Valor inválido: {detail}")),
                },
                None => alert("Carregue uma configuração primeiro com /config <agente>."),
            }
        }
        "redefinir" => {
            let config = app.reset_agent_config();
            print_form(&config);
            *form = Some(config);
        }
        "salvar" => match form.as_ref() {
            Some(config) => match app.save_agent_config(config).await {
                Ok(()) => println!("Configuração salva com sucesso!"),
                Err(ClientError::Gateway(error)) => {
                    let detail = error
                        .detail()
                        .map(str::to_string)
                        .or_else(|| error.status().map(|s| s.to_string()))
                        .unwrap_or_else(|| "servidor inacessível".to_string());
                    alert(&format!("Falha ao salvar: {detail}"));
                }
                Err(error) => alert(&format!("Falha ao salvar: {error}")),
            },
            None => alert("Nada para salvar. Carregue uma configuração com /config <agente>."),
        },
        "chave" => {
            let mut fields = rest.splitn(2, char::is_whitespace);
            let key = fields.next().unwrap_or("");
            let persist = fields
                .next()
                .map(|flag| flag.trim() == "persistir")
                .unwrap_or(false);
            match app.save_api_key(key, persist).await {
                Ok(()) => {
                    if persist {
                        println!("Chave salva no processo e no .env.");
                    } else {
                        println!("Chave salva no processo.");
                    }
                    println!("{} {}", "API:".dimmed(), app.api_status().await);
                }
                Err(ClientError::Validation { detail, .. }) => alert(&detail),
                Err(ClientError::Gateway(error)) => {
                    let detail = error
                        .detail()
                        .map(str::to_string)
                        .or_else(|| error.status().map(|s| s.to_string()))
                        .unwrap_or_else(|| "erro de conexão".to_string());
                    alert(&format!("Falha ao salvar chave: {detail}"));
                }
                Err(error) => alert(&format!("Falha ao salvar chave: {error}")),
            }
        }
        other => match Section::parse(other) {
            Some(section) => enter_section(app, section).await,
            None => println!("Comando desconhecido: /{other} (veja /ajuda)"),
        },
    }
    true
}
