use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rustls::crypto::ring::default_provider;

use docchat_client::{
    AuthClient, AuthGate, ChatInterface, HttpChatApi, Role, Route, SessionStore, SupabaseAuth,
};
use docchat_utils::env::env_string_or;

const HELP: &str = "commands: /signin [<email> <password>] | /signup [<email> <password>] | \
/signout | /goto <path> | /pdf <path> | /clear | /quit; anything else is sent as a prompt";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();

    let http = reqwest::Client::new();
    let server_url = env_string_or("DOCCHAT_SERVER_URL", "http://127.0.0.1:3000");
    let auth = SupabaseAuth::from_env(http.clone())?;
    let api = Arc::new(HttpChatApi::new(http, server_url.clone()));
    info!(%server_url, "docchat client starting");

    let sessions = SessionStore::new();
    let mut auth_events = sessions.subscribe();
    let mut gate = AuthGate::new(Route::Chat);
    let mut chat = ChatInterface::new(api.clone());
    let mut mounted_for: Option<String> = None;

    if let Some(placeholder) = gate.placeholder() {
        println!("{placeholder}");
    }
    let signed_in = auth_events.borrow_and_update().is_some();
    gate.on_auth_state(signed_in);
    println!("{HELP}");
    render_route(&gate);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = auth_events.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = auth_events.borrow_and_update().clone();
                if let Some(route) = gate.on_auth_state(session.is_some()) {
                    info!(route = route.path(), "auth gate redirect");
                }
                match session {
                    Some(session) if mounted_for.as_deref() != Some(session.user_id.as_str()) => {
                        chat = ChatInterface::new(api.clone());
                        chat.mount(Some(&session.access_token)).await;
                        mounted_for = Some(session.user_id);
                    }
                    Some(_) => {}
                    None => {
                        chat = ChatInterface::new(api.clone());
                        mounted_for = None;
                    }
                }
                render_route(&gate);
                if gate.route() == &Route::Chat {
                    render_chat(&chat);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if !handle_line(line.trim(), &auth, &sessions, &mut gate, &mut chat).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns `false` when the user asked to quit.
async fn handle_line(
    line: &str,
    auth: &SupabaseAuth,
    sessions: &SessionStore,
    gate: &mut AuthGate,
    chat: &mut ChatInterface,
) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

    match command {
        "" => {}
        "/quit" => return false,
        "/help" => println!("{HELP}"),
        "/goto" if rest.trim().is_empty() => println!("usage: /goto <path>"),
        "/goto" => navigate_to(gate, chat, Route::from_path(rest.trim())),
        "/signin" | "/signup" if rest.trim().is_empty() => {
            navigate_to(gate, chat, Route::from_path(command));
        }
        "/signin" | "/signup" if gate.route().is_auth_page() => {
            let Some((email, password)) = rest.trim().split_once(' ') else {
                println!("usage: {command} <email> <password>");
                return true;
            };
            let result = if command == "/signin" {
                auth.sign_in(email, password.trim()).await.map(Some)
            } else {
                auth.sign_up(email, password.trim()).await
            };
            match result {
                Ok(Some(session)) => sessions.set(Some(session)),
                Ok(None) => println!("Check your email to confirm your account, then /signin."),
                Err(e) => println!("Authentication failed: {e:#}"),
            }
        }
        "/signin" | "/signup" => println!("Already signed in; /signout first."),
        _ if gate.route() != &Route::Chat => {
            if sessions.current().is_some() {
                println!("Not on the chat page; /goto /chat first.");
            } else {
                println!("Please /signin or /signup first.");
            }
        }
        "/signout" => {
            if let Some(session) = sessions.current() {
                if let Err(e) = auth.sign_out(&session).await {
                    warn!(?e, "sign-out request failed; clearing local session anyway");
                }
            }
            sessions.set(None);
        }
        "/pdf" => {
            let path = Path::new(rest.trim());
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| rest.trim().to_owned());
                    println!("Uploading {name}...");
                    chat.select_file(name, bytes).await;
                    if let Some(err) = chat.last_error() {
                        println!("Error parsing PDF: {err}");
                    }
                    render_chat(chat);
                }
                Err(e) => println!("Could not read {}: {e}", path.display()),
            }
        }
        "/clear" => {
            chat.clear_pdf();
            render_chat(chat);
        }
        _ => {
            let before = chat.messages().len();
            chat.set_input(line);
            println!("{}", chat.submit_label());
            chat.submit(sessions.access_token().as_deref()).await;
            for message in &chat.messages()[before..] {
                print_message(message.role, &message.content);
            }
        }
    }

    true
}

fn navigate_to(gate: &mut AuthGate, chat: &ChatInterface, route: Route) {
    if let Some(redirect) = gate.navigate(route) {
        info!(route = redirect.path(), "auth gate redirect");
    }
    render_route(gate);
    if gate.route() == &Route::Chat {
        render_chat(chat);
    }
}

fn render_route(gate: &AuthGate) {
    match gate.route() {
        Route::SignIn => println!("[sign in] /signin <email> <password> (or /signup)"),
        Route::SignUp => println!("[sign up] /signup <email> <password>"),
        other => println!("[{}]", other.path()),
    }
}

fn render_chat(chat: &ChatInterface) {
    println!("PDF Chatbot  [{}]", chat.upload_label());
    if let Some(hint) = chat.empty_state_hint() {
        println!("  {hint}");
    }
    for message in chat.messages() {
        print_message(message.role, &message.content);
    }
}

fn print_message(role: Role, content: &str) {
    let label = match role {
        Role::User => "you",
        Role::Assistant => "bot",
    };
    println!("{label:>4}: {content}");
}
