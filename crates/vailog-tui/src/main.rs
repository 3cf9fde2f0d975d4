//! vailog - terminal client for the Vai Logística decision assistant.
//!
//! Log in, chat with the assistant, browse past conversations and edit the
//! profile, all from the keyboard.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vailog_core::forms::LoginForm;
use vailog_core::{ApiClient, Config, SessionStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file inside the data directory
const LOG_FILE: &str = "vailog.log";

const USAGE: &str = "\
Uso: vailog [opção]

Sem opções abre a interface de terminal.

Opções:
  --login    Entrar pela linha de comando
  --logout   Encerrar a sessão salva
  --whoami   Mostrar o usuário da sessão atual
  --help     Mostrar esta ajuda

Variáveis de ambiente:
  VAILOG_API_URL  Endereço do backend (padrão http://localhost:3000)
  VAILOG_EMAIL    E-mail sugerido no login
  RUST_LOG        Nível de log (padrão warn)";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a file in the data
/// directory. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config_result = Config::load();
    let config = config_result.as_ref().cloned().unwrap_or_default();
    let data_dir = config.data_dir()?;
    let _log_guard = match init_tracing(&data_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Aviso: log desativado ({:#})", e);
            None
        }
    };
    if let Err(ref e) = config_result {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        return match args[1].as_str() {
            "--help" | "-h" => {
                println!("{}", USAGE);
                Ok(())
            }
            "--login" => login_cli(config, &data_dir).await,
            "--logout" => {
                SessionStore::new(&data_dir).clear();
                println!("Sessão encerrada.");
                Ok(())
            }
            "--whoami" => {
                whoami(&SessionStore::new(&data_dir));
                Ok(())
            }
            other => {
                eprintln!("Opção desconhecida: {}\n\n{}", other, USAGE);
                std::process::exit(2);
            }
        };
    }

    info!("vailog starting");

    // Create app before touching the terminal so setup errors print normally
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Erro: {:#}", e);
    }

    info!("vailog shutting down");
    Ok(())
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Interactive login for scripted or headless use.
async fn login_cli(mut config: Config, data_dir: &Path) -> Result<()> {
    let suggested = std::env::var("VAILOG_EMAIL")
        .ok()
        .or_else(|| config.last_email.clone())
        .unwrap_or_default();

    let email = if suggested.is_empty() {
        prompt_line("E-mail: ")?
    } else {
        let input = prompt_line(&format!("E-mail [{}]: ", suggested))?;
        if input.is_empty() { suggested } else { input }
    };
    let password = rpassword::prompt_password("Senha: ")?;

    let mut form = LoginForm::new(email);
    form.password = password;
    form.remember = config.remember;
    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => {
            for message in errors.values() {
                eprintln!("{}", message);
            }
            std::process::exit(1);
        }
    };

    let session = SessionStore::new(data_dir);
    let api = ApiClient::new(&config, session.clone())?;
    let auth = match api.login(&request.email, &request.senha).await {
        Ok(auth) => auth,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    // A process-only session would end with this command
    session.establish(auth, true);
    info!("Login successful (cli)");

    config.last_email = Some(request.email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    whoami(&session);
    Ok(())
}

fn whoami(session: &SessionStore) {
    match session.read() {
        Some(record) => {
            let user = record.user().unwrap_or_default();
            match user.email {
                Some(ref email) => println!("{} <{}>", user.display_name(), email),
                None => println!("{}", user.display_name()),
            }
        }
        None => println!("Não autenticado."),
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
