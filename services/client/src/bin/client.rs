//! services/client/src/bin/client.rs
//!
//! Thin terminal shell around the session orchestration layer. Everything in
//! here is presentation glue; the behavior lives in `client_lib::session`.

use std::path::Path;
use std::sync::Arc;

use client_lib::{
    adapters::{FileTokenStore, HttpGateway},
    config::Config,
    error::ClientError,
    session::{
        transcript::GENERATING_PLACEHOLDER, AppState, AuthFlow, ChatError, DashboardState,
        DocumentError, SubmitOutcome,
    },
};
use rag_chat_core::domain::{TurnRole, UploadFile};
use rag_chat_core::ports::{BackendGateway, CredentialStore, PortError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// What the shell should do after a screen finishes.
enum ShellFlow {
    /// Re-evaluate the credential and show the matching screen.
    Continue,
    /// Exit the process.
    Quit,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Backend at {}.", config.api_base_url);

    // --- 2. Initialize Port Adapters ---
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileTokenStore::open(config.credentials_path.clone()).await);
    let gateway: Arc<dyn BackendGateway> = Arc::new(HttpGateway::new(
        config.api_base_url.clone(),
        credentials.clone(),
    ));

    // --- 3. Build the Shared AppState ---
    let state = AppState {
        gateway,
        credentials,
        config,
    };

    // --- 4. Run the Terminal Shell ---
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let flow = if state.credentials.get().await.is_some() {
            run_dashboard(&state, &mut input).await?
        } else {
            run_entry(&state, &mut input).await?
        };
        if matches!(flow, ShellFlow::Quit) {
            break;
        }
    }
    Ok(())
}

/// The unauthenticated entry point: login, signup, or quit.
async fn run_entry(state: &AppState, input: &mut Input) -> Result<ShellFlow, ClientError> {
    let auth = AuthFlow::new(state.gateway.clone(), state.credentials.clone());
    println!("RAG Chat. Type 'login', 'signup', or 'quit'.");

    loop {
        let Some(choice) = read_line(input, "auth> ").await? else {
            return Ok(ShellFlow::Quit);
        };
        match choice.trim() {
            "login" => {
                let Some(username) = read_line(input, "username: ").await? else {
                    return Ok(ShellFlow::Quit);
                };
                let Some(password) = read_line(input, "password: ").await? else {
                    return Ok(ShellFlow::Quit);
                };
                match auth.login(username.trim(), password.trim()).await {
                    Ok(identity) => {
                        println!("Welcome, {}.", identity.username);
                        return Ok(ShellFlow::Continue);
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "signup" => {
                let Some(username) = read_line(input, "username: ").await? else {
                    return Ok(ShellFlow::Quit);
                };
                let Some(password) = read_line(input, "password: ").await? else {
                    return Ok(ShellFlow::Quit);
                };
                let Some(email) = read_line(input, "email: ").await? else {
                    return Ok(ShellFlow::Quit);
                };
                let Some(name) = read_line(input, "name: ").await? else {
                    return Ok(ShellFlow::Quit);
                };
                match auth
                    .signup(username.trim(), password.trim(), email.trim(), name.trim())
                    .await
                {
                    Ok(identity) => {
                        println!("Welcome, {}.", identity.username);
                        return Ok(ShellFlow::Continue);
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "quit" => return Ok(ShellFlow::Quit),
            "" => {}
            other => println!("Unknown command '{other}'."),
        }
    }
}

/// One dashboard activation: fresh session id, fresh caches, command loop.
async fn run_dashboard(state: &AppState, input: &mut Input) -> Result<ShellFlow, ClientError> {
    let auth = AuthFlow::new(state.gateway.clone(), state.credentials.clone());
    let gateway = state.gateway.as_ref();
    let mut dashboard = DashboardState::new();
    info!("Dashboard activated with session {}.", dashboard.session_id);

    if let Err(e) = dashboard.documents.refresh(gateway).await {
        if session_expired(&e) {
            println!("Your session has expired. Please log in again.");
            return Ok(ShellFlow::Continue);
        }
        println!("Could not load documents: {}", describe_document_error(&e));
    }
    print_help();

    loop {
        let Some(line) = read_line(input, "> ").await? else {
            return Ok(ShellFlow::Quit);
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            return Ok(ShellFlow::Quit);
        }
        if line == "/logout" {
            auth.logout().await.map_err(|e| {
                ClientError::Internal(format!("failed to log out: {e}"))
            })?;
            // The dashboard state (session id, caches) is dropped here; the
            // next login starts from scratch.
            return Ok(ShellFlow::Continue);
        }
        if line == "/help" {
            print_help();
            continue;
        }
        if line == "/refresh" {
            // Token refresh is never automatic; this is the deliberate trigger.
            match auth.refresh().await {
                Ok(()) => println!("Credential refreshed."),
                Err(e) => println!("{e}"),
            }
            continue;
        }
        if line == "/docs" {
            print_documents(&dashboard);
            continue;
        }
        if let Some(argument) = line.strip_prefix("/doc ") {
            match argument.trim().parse::<i64>() {
                Ok(id) => match dashboard.documents.fetch_document(gateway, id).await {
                    Ok(document) => println!(
                        "  [{}] {} ({})",
                        document.id,
                        document.original_filename,
                        document.status.label()
                    ),
                    Err(e) if session_expired(&e) => {
                        println!("Your session has expired. Please log in again.");
                        return Ok(ShellFlow::Continue);
                    }
                    Err(e) => println!("{}", describe_document_error(&e)),
                },
                Err(_) => println!("Usage: /doc <id>"),
            }
            continue;
        }
        if let Some(argument) = line.strip_prefix("/upload ") {
            if upload(&mut dashboard, gateway, argument.trim()).await? {
                println!("Your session has expired. Please log in again.");
                return Ok(ShellFlow::Continue);
            }
            continue;
        }
        if let Some(argument) = line.strip_prefix("/delete ") {
            if delete(&mut dashboard, gateway, input, argument.trim()).await? {
                println!("Your session has expired. Please log in again.");
                return Ok(ShellFlow::Continue);
            }
            continue;
        }

        // Anything else is a chat message.
        println!("{GENERATING_PLACEHOLDER}");
        match dashboard.transcript.submit(gateway, line).await {
            Ok(SubmitOutcome::Completed) => print_last_answer(&dashboard),
            // The serial shell never races submissions; nothing to do.
            Ok(SubmitOutcome::InFlight) => {}
            Err(ChatError::EmptyMessage) => println!("Please enter a message."),
            Err(ChatError::AuthExpired) => {
                println!("Your session has expired. Please log in again.");
                return Ok(ShellFlow::Continue);
            }
        }
    }
}

/// Reads the file and hands it to the registry; validation lives there.
/// Returns `Ok(true)` when the session was torn down mid-call.
async fn upload(
    dashboard: &mut DashboardState,
    gateway: &dyn BackendGateway,
    raw_path: &str,
) -> Result<bool, ClientError> {
    let path = Path::new(raw_path);
    let filename = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => {
            println!("Usage: /upload <path-to-pdf>");
            return Ok(false);
        }
    };
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) => {
            println!("Could not read '{raw_path}': {e}");
            return Ok(false);
        }
    };
    let file = UploadFile {
        filename,
        media_type: media_type_for(path),
        data: data.into(),
    };

    match dashboard.documents.request_upload(gateway, &file).await {
        Ok(()) => {
            println!("Upload accepted; the document is being processed.");
            Ok(false)
        }
        Err(e) if session_expired(&e) => Ok(true),
        Err(e) => {
            println!("{}", describe_document_error(&e));
            Ok(false)
        }
    }
}

/// Asks for the confirmation the registry contract requires, then deletes.
/// Returns `Ok(true)` when the session was torn down mid-call.
async fn delete(
    dashboard: &mut DashboardState,
    gateway: &dyn BackendGateway,
    input: &mut Input,
    raw_id: &str,
) -> Result<bool, ClientError> {
    let Ok(id) = raw_id.parse::<i64>() else {
        println!("Usage: /delete <id>");
        return Ok(false);
    };
    let Some(answer) = read_line(input, &format!("Delete document {id}? [y/N] ")).await? else {
        return Ok(false);
    };
    if !matches!(answer.trim(), "y" | "Y" | "yes") {
        return Ok(false);
    }

    match dashboard.documents.request_delete(gateway, id).await {
        Ok(()) => {
            println!("Document {id} deleted.");
            Ok(false)
        }
        Err(e) if session_expired(&e) => Ok(true),
        Err(e) => {
            println!("{}", describe_document_error(&e));
            Ok(false)
        }
    }
}

fn print_help() {
    println!(
        "Commands: /docs, /doc <id>, /upload <path>, /delete <id>, /refresh, /logout, /quit."
    );
    println!("Anything else is sent to the assistant.");
}

fn print_documents(dashboard: &DashboardState) {
    if dashboard.documents.documents().is_empty() {
        println!("No documents uploaded yet.");
        return;
    }
    for document in dashboard.documents.documents() {
        println!(
            "  [{}] {} ({})",
            document.id,
            document.original_filename,
            document.status.label()
        );
    }
}

fn print_last_answer(dashboard: &DashboardState) {
    if let Some(turn) = dashboard.transcript.turns().last() {
        if turn.role == TurnRole::Assistant {
            println!("assistant: {}", turn.content);
            if !turn.sources.is_empty() {
                println!("  sources: {}", turn.sources.join(", "));
            }
        }
    }
}

fn media_type_for(path: &Path) -> String {
    match path.extension() {
        Some(extension) if extension.eq_ignore_ascii_case("pdf") => {
            "application/pdf".to_string()
        }
        _ => "application/octet-stream".to_string(),
    }
}

fn session_expired(error: &DocumentError) -> bool {
    matches!(error, DocumentError::Port(PortError::AuthExpired))
}

/// Failure messages from document operations, preferring whatever the server
/// said over the generic wrapper.
fn describe_document_error(error: &DocumentError) -> String {
    match error {
        DocumentError::UploadFailed(source) | DocumentError::DeleteFailed(source) => {
            match source.server_message() {
                Some(message) => format!("{error}: {message}"),
                None => error.to_string(),
            }
        }
        other => other.to_string(),
    }
}

async fn read_line(input: &mut Input, prompt: &str) -> Result<Option<String>, ClientError> {
    use std::io::Write;
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}
