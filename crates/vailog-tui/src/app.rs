//! Application state management for vailog.
//!
//! This module contains the core `App` struct that holds the shared services
//! (session store, gateway client, single-flight registry), the state of each
//! screen, and the background task channel through which network calls report
//! back to the UI loop.

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use vailog_core::auth::resolve;
use vailog_core::chat::{ChatSession, SUGGESTIONS};
use vailog_core::forms::profile::{MSG_NOTHING_TO_UPDATE, MSG_PROFILE_SAVED};
use vailog_core::forms::{
    FieldErrors, LoginField, LoginForm, ProfileError, ProfileField, ProfileForm,
    ProfileSubmission, RegisterField, RegisterForm,
};
use vailog_core::models::{AuthResponse, ConversationSummary, UserProfile, WireMessage};
use vailog_core::{ApiClient, Config, Decision, Operation, Route, SessionStore, SingleFlight};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// At most one task per operation is in flight, so a handful is plenty.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Environment variable pre-filling the login e-mail
const EMAIL_ENV: &str = "VAILOG_EMAIL";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Remember,
    Button,
    Register,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Remember,
            LoginFocus::Remember => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Register,
            LoginFocus::Register => LoginFocus::Email,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Register,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Remember => LoginFocus::Password,
            LoginFocus::Button => LoginFocus::Remember,
            LoginFocus::Register => LoginFocus::Button,
        }
    }
}

/// Which pane of the home screen receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeFocus {
    Input,
    History,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned network tasks.
///
/// Every task holds the `FlightPermit` of its operation and releases it right
/// before sending, so a result is always observed with the operation idle.
#[derive(Debug)]
enum TaskResult {
    LoggedIn {
        auth: AuthResponse,
        email: String,
        remember: bool,
    },
    LoginFailed(String),
    Registered(AuthResponse),
    RegisterFailed(String),
    ChatReply(String),
    ChatFailed(String),
    History(Vec<ConversationSummary>),
    HistoryFailed(String),
    Conversation(Vec<WireMessage>),
    ConversationFailed(String),
    ProfileSaved(Value),
    ProfileFailed(String),
}

/// A task result tagged with the session generation that started the task.
#[derive(Debug)]
struct TaskMessage {
    generation: u64,
    result: TaskResult,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    pub session: SessionStore,
    api: ApiClient,
    pub flights: SingleFlight,

    // UI state
    pub state: AppState,
    pub route: Route,
    /// Protected route the user was redirected away from, restored after login
    pub return_to: Option<Route>,
    /// Bumped on every login and logout; results from older tasks are dropped
    session_generation: u64,

    // Login screen
    pub login: LoginForm,
    pub login_focus: LoginFocus,
    pub login_errors: FieldErrors<LoginField>,
    pub login_error: Option<String>,

    // Register screen; focus indexes RegisterField::ALL, one past the end is the button
    pub register: RegisterForm,
    pub register_focus: usize,
    pub register_errors: FieldErrors<RegisterField>,
    pub register_error: Option<String>,

    // Home screen
    pub chat: ChatSession,
    pub chat_input: String,
    pub home_focus: HomeFocus,
    pub suggestion_selection: Option<usize>,
    pub drawer_open: bool,
    pub history: Vec<ConversationSummary>,
    pub history_selection: usize,
    pub history_error: Option<String>,

    // Profile screen; focus indexes ProfileField::ALL, one past the end is the button
    pub profile: ProfileForm,
    pub profile_focus: usize,
    pub profile_errors: FieldErrors<ProfileField>,
    pub profile_error: Option<String>,
    pub profile_success: Option<String>,

    // Status message
    pub status_message: Option<String>,

    // Background task channel
    task_rx: Option<mpsc::Receiver<TaskMessage>>,
    task_tx: mpsc::Sender<TaskMessage>,
}

impl App {
    /// Create the application from the loaded config and the on-disk session.
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let session = SessionStore::new(&data_dir);
        debug!(?data_dir, authenticated = session.is_authenticated(), "Session store opened");

        let api = ApiClient::new(&config, session.clone())?;
        debug!(base_url = api.base_url(), "API client configured");

        let email = std::env::var(EMAIL_ENV)
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();

        Ok(Self::with_services(config, session, api, email))
    }

    /// Assemble the app from already-built services.
    pub fn with_services(config: Config, session: SessionStore, api: ApiClient, email: String) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let mut login = LoginForm::new(email);
        login.remember = config.remember;

        let mut app = Self {
            config,
            session,
            api,
            flights: SingleFlight::new(),

            state: AppState::Normal,
            route: Route::Home,
            return_to: None,
            session_generation: 0,

            login,
            login_focus: LoginFocus::Email,
            login_errors: FieldErrors::new(),
            login_error: None,

            register: RegisterForm::default(),
            register_focus: 0,
            register_errors: FieldErrors::new(),
            register_error: None,

            chat: ChatSession::new(),
            chat_input: String::new(),
            home_focus: HomeFocus::Input,
            suggestion_selection: None,
            drawer_open: false,
            history: Vec::new(),
            history_selection: 0,
            history_error: None,

            profile: ProfileForm::default(),
            profile_focus: 0,
            profile_errors: FieldErrors::new(),
            profile_error: None,
            profile_success: None,

            status_message: None,

            task_rx: Some(rx),
            task_tx: tx,
        };
        // The landing page is protected; the guard decides where we start.
        app.navigate(Route::Home);
        app
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Move to `requested`, subject to its route guard.
    pub fn navigate(&mut self, requested: Route) {
        match resolve(&self.session, requested) {
            Decision::Allow => self.enter(requested),
            Decision::Redirect { to, from } => {
                debug!(?requested, ?to, "Navigation redirected");
                if from.is_some() {
                    self.return_to = from;
                }
                self.enter(to);
            }
        }
    }

    fn enter(&mut self, route: Route) {
        self.route = route;
        match route {
            Route::Login => {
                self.login_errors.clear();
                self.login_focus = if self.login.email.is_empty() {
                    LoginFocus::Email
                } else {
                    LoginFocus::Password
                };
            }
            Route::Register => {
                self.register_focus = 0;
                self.register_errors.clear();
                self.register_error = None;
            }
            Route::Home => {
                self.home_focus = if self.drawer_open { HomeFocus::History } else { HomeFocus::Input };
            }
            Route::ProfileEdit => {
                let user = self.current_user();
                self.profile = ProfileForm::from_user(user.as_ref());
                self.profile_focus = 0;
                self.profile_errors.clear();
                self.profile_error = None;
                self.profile_success = None;
            }
        }
    }

    /// Re-run the guard for the current screen, e.g. after the backend
    /// rejected the token.
    fn enforce_guard(&mut self) {
        if resolve(&self.session, self.route) != Decision::Allow {
            info!(route = ?self.route, "Session no longer valid for current screen");
            self.navigate(self.route);
        }
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.current_user()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Validate the login form and start the request.
    pub fn attempt_login(&mut self) {
        self.login_error = None;
        let request = match self.login.validate() {
            Ok(request) => request,
            Err(errors) => {
                self.login_errors = errors;
                return;
            }
        };
        self.login_errors.clear();

        let Some(permit) = self.flights.begin(Operation::Login) else {
            return;
        };
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let generation = self.session_generation;
        let remember = self.login.remember;

        tokio::spawn(async move {
            let result = match api.login(&request.email, &request.senha).await {
                Ok(auth) => TaskResult::LoggedIn {
                    auth,
                    email: request.email,
                    remember,
                },
                Err(e) => TaskResult::LoginFailed(e.to_string()),
            };
            drop(permit);
            Self::send_result(&tx, generation, result).await;
        });
    }

    /// Validate the registration form and start the request.
    pub fn attempt_register(&mut self) {
        self.register_error = None;
        let request = match self.register.validate() {
            Ok(request) => request,
            Err(errors) => {
                self.register_errors = errors;
                return;
            }
        };
        self.register_errors.clear();

        let Some(permit) = self.flights.begin(Operation::Register) else {
            return;
        };
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let generation = self.session_generation;

        tokio::spawn(async move {
            let result = match api.register(&request).await {
                Ok(auth) => TaskResult::Registered(auth),
                Err(e) => TaskResult::RegisterFailed(e.to_string()),
            };
            drop(permit);
            Self::send_result(&tx, generation, result).await;
        });
    }

    fn start_session(&mut self, auth: AuthResponse, remember: bool) {
        self.session.establish(auth, remember);
        self.session_generation += 1;
        self.chat = ChatSession::new();
        self.chat_input.clear();
        self.history.clear();
        self.drawer_open = false;
        let target = self.return_to.take().unwrap_or(Route::Home);
        self.navigate(target);
    }

    /// Forget the session and go back to the login screen.
    pub fn logout(&mut self) {
        self.session.clear();
        self.session_generation += 1;
        info!("Logged out");
        self.chat = ChatSession::new();
        self.chat_input.clear();
        self.history.clear();
        self.drawer_open = false;
        self.return_to = None;
        self.login.password.clear();
        self.login_error = None;
        self.navigate(Route::Login);
    }

    // =========================================================================
    // Assistant
    // =========================================================================

    /// Send `prompt`, or the typed input when `None`. Blank text is ignored.
    pub fn send_chat(&mut self, prompt: Option<&str>) {
        let Some(permit) = self.flights.begin(Operation::SendChat) else {
            return;
        };
        let text = prompt.map(str::to_string).unwrap_or_else(|| self.chat_input.clone());
        let Some(payload) = self.chat.begin_send(&text) else {
            return;
        };
        self.chat_input.clear();
        self.suggestion_selection = None;

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let generation = self.session_generation;
        tokio::spawn(async move {
            let result = match api.chat(&payload).await {
                Ok(reply) => TaskResult::ChatReply(reply),
                Err(e) => TaskResult::ChatFailed(e.to_string()),
            };
            drop(permit);
            Self::send_result(&tx, generation, result).await;
        });
    }

    /// Open the history drawer and fetch the conversation list.
    pub fn toggle_drawer(&mut self) {
        self.drawer_open = !self.drawer_open;
        if self.drawer_open {
            self.home_focus = HomeFocus::History;
            self.load_history();
        } else {
            self.home_focus = HomeFocus::Input;
        }
    }

    pub fn load_history(&mut self) {
        let Some(permit) = self.flights.begin(Operation::LoadHistory) else {
            return;
        };
        self.history_error = None;

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let generation = self.session_generation;
        tokio::spawn(async move {
            let result = match api.history().await {
                Ok(items) => TaskResult::History(items),
                Err(e) => TaskResult::HistoryFailed(e.to_string()),
            };
            drop(permit);
            Self::send_result(&tx, generation, result).await;
        });
    }

    /// Load the selected history entry into the transcript.
    pub fn open_conversation(&mut self) {
        let Some(id) = self.history.get(self.history_selection).map(|c| c.id.clone()) else {
            return;
        };
        let Some(permit) = self.flights.begin(Operation::OpenConversation) else {
            return;
        };
        self.chat.error = None;

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let generation = self.session_generation;
        tokio::spawn(async move {
            let result = match api.conversation(&id).await {
                Ok(messages) => TaskResult::Conversation(messages),
                Err(e) => TaskResult::ConversationFailed(e.to_string()),
            };
            drop(permit);
            Self::send_result(&tx, generation, result).await;
        });
    }

    /// Start a fresh transcript.
    pub fn new_conversation(&mut self) {
        if self.flights.is_busy(Operation::SendChat) {
            return;
        }
        self.chat = ChatSession::new();
        self.chat_input.clear();
        self.suggestion_selection = None;
    }

    /// Move the highlighted suggestion; only meaningful while they are shown.
    pub fn cycle_suggestion(&mut self, forward: bool) {
        if !self.chat.show_suggestions() {
            self.suggestion_selection = None;
            return;
        }
        let last = SUGGESTIONS.len() - 1;
        self.suggestion_selection = Some(match (self.suggestion_selection, forward) {
            (None, true) => 0,
            (None, false) => last,
            (Some(i), true) => if i >= last { 0 } else { i + 1 },
            (Some(i), false) => if i == 0 { last } else { i - 1 },
        });
    }

    /// Text a bare Enter should send: the input, else the highlighted suggestion.
    pub fn selected_suggestion(&self) -> Option<&'static str> {
        if !self.chat_input.trim().is_empty() || !self.chat.show_suggestions() {
            return None;
        }
        self.suggestion_selection.and_then(|i| SUGGESTIONS.get(i).copied())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub fn save_profile(&mut self) {
        self.profile_error = None;
        self.profile_success = None;
        self.profile_errors.clear();

        let slug = self.current_user().and_then(|u| u.slug);
        let (slug, update) = match self.profile.prepare(slug.as_deref()) {
            Ok(ProfileSubmission::Send { slug, update }) => (slug, update),
            Ok(ProfileSubmission::NothingToUpdate) => {
                self.profile_success = Some(MSG_NOTHING_TO_UPDATE.to_string());
                return;
            }
            Err(ProfileError::Invalid(errors)) => {
                self.profile_errors = errors;
                return;
            }
            Err(e) => {
                self.profile_error = Some(e.to_string());
                return;
            }
        };

        let Some(permit) = self.flights.begin(Operation::SaveProfile) else {
            return;
        };
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let generation = self.session_generation;
        tokio::spawn(async move {
            let result = match api.update_profile(&slug, update).await {
                Ok(user) => TaskResult::ProfileSaved(user),
                Err(e) => TaskResult::ProfileFailed(e.to_string()),
            };
            drop(permit);
            Self::send_result(&tx, generation, result).await;
        });
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Whether any network operation is outstanding (drives the spinner).
    pub fn is_busy(&self) -> bool {
        self.flights.any_busy()
    }

    async fn send_result(tx: &mpsc::Sender<TaskMessage>, generation: u64, result: TaskResult) {
        if tx.send(TaskMessage { generation, result }).await.is_err() {
            debug!("Task result dropped, receiver closed");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let results: Vec<TaskMessage> = {
            if let Some(ref mut rx) = self.task_rx {
                let mut results = Vec::new();
                while let Ok(result) = rx.try_recv() {
                    results.push(result);
                }
                results
            } else {
                Vec::new()
            }
        };

        if results.is_empty() {
            return;
        }
        for message in results {
            // Compared per message: a login earlier in this batch bumps it
            if message.generation != self.session_generation {
                debug!(result = ?message.result, "Dropping result from an ended session");
                continue;
            }
            self.process_task_result(message.result);
        }
        self.enforce_guard();
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::LoggedIn { auth, email, remember } => {
                info!(remember, "Login successful");
                self.config.last_email = Some(email);
                self.config.remember = remember;
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.login.password.clear();
                self.login_error = None;
                self.start_session(auth, remember);
            }
            TaskResult::LoginFailed(msg) => {
                error!(error = %msg, "Login failed");
                self.login_error = Some(msg);
            }
            TaskResult::Registered(auth) => {
                info!("Registration successful");
                self.register = RegisterForm::default();
                self.start_session(auth, true);
            }
            TaskResult::RegisterFailed(msg) => {
                error!(error = %msg, "Registration failed");
                self.register_error = Some(msg);
            }
            TaskResult::ChatReply(reply) => self.chat.receive_reply(reply),
            TaskResult::ChatFailed(msg) => {
                error!(error = %msg, "Chat request failed");
                self.lost_session_notice(&msg);
                self.chat.receive_error(msg);
            }
            TaskResult::History(items) => {
                debug!(count = items.len(), "History loaded");
                self.history = items;
                self.history_selection = self
                    .history_selection
                    .min(self.history.len().saturating_sub(1));
            }
            TaskResult::HistoryFailed(msg) => {
                warn!(error = %msg, "Failed to load history");
                self.lost_session_notice(&msg);
                self.history_error = Some(msg);
            }
            TaskResult::Conversation(messages) => {
                self.chat.load_conversation(messages);
                self.drawer_open = false;
                self.home_focus = HomeFocus::Input;
            }
            TaskResult::ConversationFailed(msg) => {
                warn!(error = %msg, "Failed to open conversation");
                self.lost_session_notice(&msg);
                self.chat.error = Some(msg);
            }
            TaskResult::ProfileSaved(user) => {
                let merged = self.profile.apply_saved(&user);
                if !self.session.merge_user(&merged) {
                    warn!("Profile saved but no session to update");
                }
                info!("Profile updated");
                self.profile_success = Some(MSG_PROFILE_SAVED.to_string());
            }
            TaskResult::ProfileFailed(msg) => {
                error!(error = %msg, "Profile update failed");
                self.lost_session_notice(&msg);
                self.profile_error = Some(msg);
            }
        }
    }

    /// Carry `message` over to the login screen when the failed request
    /// ended the session.
    fn lost_session_notice(&mut self, message: &str) {
        if !self.session.is_authenticated() {
            self.login_error = Some(message.to_string());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
