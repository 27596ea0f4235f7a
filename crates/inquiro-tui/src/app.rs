use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use inquiro_core::{
    Answer, ApiError, ChatLog, DocumentRef, DocumentSelection, Flashcard, FlashcardBatch,
    FlashcardDeck, InFlight, InquiroApi, Navigator, Notification, Registration, Route,
    SessionEvent, Severity, StudyStats, DEFAULT_FLASHCARDS,
};

use crate::input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Dashboard tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Upload,
    Chat,
    Flashcards,
    Documents,
    Analytics,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Upload,
        Tab::Chat,
        Tab::Flashcards,
        Tab::Documents,
        Tab::Analytics,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Upload => "Upload",
            Tab::Chat => "Chat",
            Tab::Flashcards => "Flashcards",
            Tab::Documents => "Documents",
            Tab::Analytics => "Analytics",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn previous(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Username,
    Email,
    Password,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub api: InquiroApi,
    pub navigator: Navigator,
    pub input_mode: InputMode,
    pub notification: Notification,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Login / register forms
    pub username: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub form_field: FormField,

    // Dashboard
    pub tab: Tab,
    pub upload_path: TextInput,
    pub question: TextInput,
    pub flashcard_count: TextInput,
    pub chat: ChatLog,
    pub chat_scroll: u16,
    pub documents: DocumentSelection,
    pub deck: FlashcardDeck,
    pub stats: StudyStats,

    // One slot per action type
    pub login_task: InFlight<()>,
    pub register_task: InFlight<Registration>,
    pub documents_task: InFlight<Vec<DocumentRef>>,
    pub upload_task: InFlight<DocumentRef>,
    pub query_task: InFlight<Answer>,
    pub generate_task: InFlight<FlashcardBatch>,
    pub saved_cards_task: InFlight<Vec<Flashcard>>,
}

impl App {
    pub fn new(api: InquiroApi, notification_duration: Duration) -> Self {
        let authenticated = api.is_authenticated();
        let mut app = Self {
            should_quit: false,
            navigator: Navigator::new(Route::Root, authenticated),
            api,
            input_mode: InputMode::Normal,
            notification: Notification::new(notification_duration),
            animation_frame: 0,

            username: TextInput::new(),
            email: TextInput::new(),
            password: TextInput::new(),
            form_field: FormField::Username,

            tab: Tab::Upload,
            upload_path: TextInput::new(),
            question: TextInput::new(),
            flashcard_count: TextInput::with_value(&DEFAULT_FLASHCARDS.to_string()),
            chat: ChatLog::new(),
            chat_scroll: 0,
            documents: DocumentSelection::new(),
            deck: FlashcardDeck::new(),
            stats: StudyStats::new(),

            login_task: InFlight::new("login"),
            register_task: InFlight::new("register"),
            documents_task: InFlight::new("documents"),
            upload_task: InFlight::new("upload"),
            query_task: InFlight::new("query"),
            generate_task: InFlight::new("generate flashcards"),
            saved_cards_task: InFlight::new("saved flashcards"),
        };
        if app.route() == Route::Dashboard {
            app.enter_dashboard();
        } else {
            app.input_mode = InputMode::Editing;
        }
        app
    }

    pub fn route(&self) -> Route {
        self.navigator.current()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.is_authenticated()
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.notification.show(message, severity);
    }

    // Navigation

    /// Push `route` through the guard.
    pub fn navigate(&mut self, route: Route) {
        let before = self.route();
        let authenticated = self.is_authenticated();
        self.navigator.navigate(route, authenticated);
        self.apply_transition(before);
    }

    /// Replace the current entry with `route`, so going back cannot return.
    pub fn replace(&mut self, route: Route) {
        let before = self.route();
        let authenticated = self.is_authenticated();
        self.navigator.replace(route, authenticated);
        self.apply_transition(before);
    }

    pub fn back(&mut self) {
        let before = self.route();
        let authenticated = self.is_authenticated();
        self.navigator.back(authenticated);
        self.apply_transition(before);
    }

    /// Re-check the current view against the store. The store may have
    /// changed under us, e.g. a login or logout from the command line.
    pub fn sync_route(&mut self) {
        let before = self.route();
        let authenticated = self.is_authenticated();
        self.navigator.revalidate(authenticated);
        self.apply_transition(before);
    }

    fn apply_transition(&mut self, before: Route) {
        let after = self.route();
        if before == after {
            return;
        }
        debug!("route {} -> {}", before.to_path(), after.to_path());
        if before == Route::Dashboard {
            self.leave_dashboard();
        }
        match after {
            Route::Dashboard => self.enter_dashboard(),
            Route::Login | Route::Register => {
                self.form_field = FormField::Username;
                self.password.clear();
                self.input_mode = InputMode::Editing;
            }
            Route::Root => {}
        }
    }

    fn enter_dashboard(&mut self) {
        info!("entering dashboard");
        self.tab = Tab::Upload;
        self.input_mode = InputMode::Normal;
        self.chat.clear();
        self.chat_scroll = 0;
        self.deck.clear();
        self.documents.clear();
        self.stats.start(Instant::now());
        self.refresh_documents();
    }

    /// Drop everything tied to the dashboard. Outstanding requests are
    /// aborted so their results are never applied.
    fn leave_dashboard(&mut self) {
        info!("leaving dashboard");
        self.documents_task.cancel();
        self.upload_task.cancel();
        self.query_task.cancel();
        self.generate_task.cancel();
        self.saved_cards_task.cancel();
        self.chat.clear();
        self.chat_scroll = 0;
        self.deck.clear();
        self.documents.clear();
        self.upload_path.clear();
        self.question.clear();
        self.flashcard_count.set(&DEFAULT_FLASHCARDS.to_string());
        self.stats.stop();
        self.input_mode = InputMode::Normal;
    }

    // Session

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Expired { path } => {
                warn!("session expired on {}", path);
                self.handle_unauthorized();
            }
            SessionEvent::LoggedIn | SessionEvent::LoggedOut => self.sync_route(),
        }
    }

    /// Clear the credential and return to the login view. Safe to run more
    /// than once for the same expiry.
    pub fn handle_unauthorized(&mut self) {
        if let Err(err) = self.api.session().clear() {
            warn!("failed to clear session: {}", err);
        }
        let was_dashboard = self.route() == Route::Dashboard;
        self.replace(Route::Login);
        if was_dashboard {
            self.notify("Session expired. Please log in again.", Severity::Warning);
        }
    }

    pub fn logout(&mut self) {
        match self.api.logout() {
            Ok(()) => {
                self.replace(Route::Login);
                self.notify("Logged out", Severity::Info);
            }
            Err(err) => self.notify(err.to_string(), Severity::Error),
        }
    }

    // Actions

    pub fn submit_login(&mut self) {
        let api = self.api.clone();
        let username = self.username.value().to_string();
        let password = self.password.value().to_string();
        self.login_task
            .start(async move { api.login(&username, &password).await });
    }

    pub fn submit_register(&mut self) {
        let api = self.api.clone();
        let username = self.username.value().to_string();
        let email = self.email.value().to_string();
        let password = self.password.value().to_string();
        self.register_task
            .start(async move { api.register(&username, &email, &password).await });
    }

    pub fn refresh_documents(&mut self) {
        let api = self.api.clone();
        self.documents_task
            .start(async move { api.list_documents().await });
    }

    pub fn upload(&mut self) {
        if self.upload_task.is_busy() {
            return;
        }
        let raw = self.upload_path.value().trim();
        if raw.is_empty() {
            self.notify("Please select a file to upload", Severity::Warning);
            return;
        }
        let path = PathBuf::from(expand_home(raw));
        let api = self.api.clone();
        self.upload_task
            .start(async move { api.upload_document(Some(&path)).await });
    }

    pub fn ask(&mut self) {
        let question = self.question.value().trim().to_string();
        if question.is_empty() || self.query_task.is_busy() {
            return;
        }
        let Some(doc_id) = self.documents.selected_id().map(str::to_string) else {
            self.notify(
                "No document selected. Please upload or select a document.",
                Severity::Warning,
            );
            return;
        };

        self.chat.push_user(&question);
        self.question.clear();
        self.stats.questions_asked += 1;
        self.input_mode = InputMode::Normal;

        let api = self.api.clone();
        self.query_task
            .start(async move { api.query(&question, Some(&doc_id)).await });
    }

    pub fn generate_flashcards(&mut self) {
        if self.generate_task.is_busy() {
            return;
        }
        if self.documents.is_empty() {
            self.notify("No documents available to generate flashcards", Severity::Error);
            return;
        }
        // Unparseable input is reported through the same bounds check.
        let count = self.flashcard_count.value().trim().parse::<u32>().unwrap_or(0);
        if let Err(err) = inquiro_core::api::validate_flashcard_count(count) {
            self.notify(err.to_string(), Severity::Warning);
            return;
        }
        let doc_id = self.documents.selected_id().map(str::to_string);
        let api = self.api.clone();
        self.generate_task
            .start(async move { api.generate_flashcards(doc_id.as_deref(), count).await });
    }

    pub fn load_saved_flashcards(&mut self) {
        if self.saved_cards_task.is_busy() {
            return;
        }
        let doc_id = self.documents.selected_id().map(str::to_string);
        let api = self.api.clone();
        self.saved_cards_task
            .start(async move { api.fetch_flashcards(doc_id.as_deref()).await });
    }

    pub fn adjust_flashcard_count(&mut self, delta: i64) {
        let current = self
            .flashcard_count
            .value()
            .trim()
            .parse::<i64>()
            .unwrap_or(DEFAULT_FLASHCARDS as i64);
        let next = (current + delta).max(0);
        self.flashcard_count.set(&next.to_string());
    }

    pub fn flip_card(&mut self) {
        self.deck.flip();
        if self.deck.is_flipped() {
            self.stats.cards_reviewed += 1;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.login_task.is_busy()
            || self.register_task.is_busy()
            || self.documents_task.is_busy()
            || self.upload_task.is_busy()
            || self.query_task.is_busy()
            || self.generate_task.is_busy()
            || self.saved_cards_task.is_busy()
    }

    /// Tick animation frame and timers (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.notification.tick(now);
        self.sync_route();
    }

    // Results

    /// Apply any finished requests.
    pub async fn poll_tasks(&mut self) {
        if let Some(result) = self.login_task.poll().await {
            self.on_login(result);
        }
        if let Some(result) = self.register_task.poll().await {
            self.on_register(result);
        }
        if let Some(result) = self.documents_task.poll().await {
            self.on_documents(result);
        }
        if let Some(result) = self.upload_task.poll().await {
            self.on_upload(result);
        }
        if let Some(result) = self.query_task.poll().await {
            self.on_answer(result);
        }
        if let Some(result) = self.generate_task.poll().await {
            self.on_generated(result);
        }
        if let Some(result) = self.saved_cards_task.poll().await {
            self.on_saved_cards(result);
        }
    }

    pub fn on_login(&mut self, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                self.password.clear();
                self.replace(Route::Dashboard);
                self.notify("Login successful!", Severity::Success);
            }
            Err(err) => self.report(None, err),
        }
    }

    pub fn on_register(&mut self, result: Result<Registration, ApiError>) {
        match result {
            Ok(_) => {
                self.email.clear();
                self.password.clear();
                self.replace(Route::Login);
                self.notify("Registration successful! Please log in.", Severity::Success);
            }
            Err(err) => self.report(None, err),
        }
    }

    pub fn on_documents(&mut self, result: Result<Vec<DocumentRef>, ApiError>) {
        match result {
            Ok(docs) => {
                self.documents.replace(docs);
                self.stats.documents = self.documents.documents().len();
            }
            Err(err) => self.report(Some("Failed to fetch documents"), err),
        }
    }

    pub fn on_upload(&mut self, result: Result<DocumentRef, ApiError>) {
        match result {
            Ok(doc) => {
                self.documents.add(doc);
                self.stats.uploads += 1;
                self.stats.documents = self.documents.documents().len();
                self.upload_path.clear();
                self.notify("Document uploaded successfully!", Severity::Success);
            }
            Err(err) => self.report(Some("Upload failed"), err),
        }
    }

    pub fn on_answer(&mut self, result: Result<Answer, ApiError>) {
        match result {
            Ok(answer) => {
                self.chat.push_bot(&answer.answer);
                self.stats.answers_received += 1;
                self.notify("Query answered successfully!", Severity::Success);
            }
            Err(err) if err.is_unauthorized() => self.sync_route(),
            Err(err) => {
                self.chat.push_error(&err.to_string());
                self.report(Some("Query failed"), err);
            }
        }
    }

    pub fn on_generated(&mut self, result: Result<FlashcardBatch, ApiError>) {
        match result {
            Ok(batch) if batch.flashcards.is_empty() => {
                self.deck.clear();
                let message = batch
                    .message
                    .unwrap_or_else(|| "No flashcards could be generated".to_string());
                self.notify(message, Severity::Warning);
            }
            Ok(batch) => {
                self.stats.flashcards_generated += batch.flashcards.len();
                self.deck.load(batch.flashcards);
                self.notify("Flashcards generated successfully!", Severity::Success);
            }
            Err(err) => self.report(Some("Failed to generate flashcards"), err),
        }
    }

    pub fn on_saved_cards(&mut self, result: Result<Vec<Flashcard>, ApiError>) {
        match result {
            Ok(cards) => {
                let count = cards.len();
                self.deck.load(cards);
                self.notify(format!("Loaded {} saved flashcards", count), Severity::Info);
            }
            Err(err) => self.report(Some("Failed to load flashcards"), err),
        }
    }

    /// Surface a failed action. An expired session is not reported here: the
    /// session event drives that, and the route check catches the rest.
    fn report(&mut self, context: Option<&str>, err: ApiError) {
        let severity = match &err {
            ApiError::AuthenticationExpired | ApiError::AuthenticationMissing => {
                self.sync_route();
                if err.is_unauthorized() {
                    return;
                }
                Severity::Error
            }
            ApiError::Invalid(_) => Severity::Warning,
            _ => Severity::Error,
        };
        let message = match context {
            Some(context) if !err.is_validation() => format!("{}: {}", context, err),
            _ => err.to_string(),
        };
        self.notify(message, severity);
    }
}

fn expand_home(raw: &str) -> String {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).display().to_string(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inquiro_core::{MemorySessionStore, SessionEvents, SessionStore};
    use std::sync::Arc;

    // Nothing listens on port 9; these tests never wait for a response.
    fn app_with(token: Option<&str>) -> (App, Arc<MemorySessionStore>) {
        let store = Arc::new(match token {
            Some(token) => MemorySessionStore::with_token(token),
            None => MemorySessionStore::new(),
        });
        let api = InquiroApi::new("http://127.0.0.1:9", store.clone(), SessionEvents::default());
        (App::new(api, Duration::from_secs(6)), store)
    }

    fn doc(id: &str) -> DocumentRef {
        DocumentRef {
            id: id.to_string(),
            title: format!("{}.pdf", id),
        }
    }

    #[tokio::test]
    async fn test_starts_on_view_matching_session() {
        let (app, _) = app_with(Some("t"));
        assert_eq!(app.route(), Route::Dashboard);
        assert!(app.documents_task.is_busy());

        let (app, _) = app_with(None);
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_and_returns_to_login() {
        let (mut app, store) = app_with(Some("t"));
        app.chat.push_user("hello");

        app.handle_session_event(SessionEvent::Expired {
            path: "/query".to_string(),
        });
        assert!(!store.is_authenticated());
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.navigator.depth(), 1);
        assert!(app.chat.is_empty());
        assert!(!app.documents_task.is_busy());
        assert_eq!(app.notification.severity, Severity::Warning);

        // A second 401 from a concurrent request changes nothing.
        app.handle_unauthorized();
        assert_eq!(app.route(), Route::Login);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_from_elsewhere_is_noticed_on_tick() {
        let (mut app, store) = app_with(Some("t"));
        store.clear().unwrap();
        app.tick(Instant::now());
        assert_eq!(app.route(), Route::Login);
    }

    #[tokio::test]
    async fn test_upload_without_path_warns() {
        let (mut app, _) = app_with(Some("t"));
        app.upload();
        assert!(!app.upload_task.is_busy());
        assert!(app.notification.visible);
        assert_eq!(app.notification.message, "Please select a file to upload");
        assert_eq!(app.notification.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_ask_without_document_warns() {
        let (mut app, _) = app_with(Some("t"));
        app.question.set("What is mitosis?");
        app.ask();
        assert!(app.chat.is_empty());
        assert!(!app.query_task.is_busy());
        assert_eq!(
            app.notification.message,
            "No document selected. Please upload or select a document."
        );
    }

    #[tokio::test]
    async fn test_ask_appends_user_message_and_ignores_second_trigger() {
        let (mut app, _) = app_with(Some("t"));
        app.on_documents(Ok(vec![doc("d1")]));
        app.question.set("What is mitosis?");
        app.ask();
        assert_eq!(app.chat.len(), 1);
        assert!(app.query_task.is_busy());

        app.question.set("Another?");
        app.ask();
        assert_eq!(app.chat.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_answer_adds_inline_error() {
        let (mut app, _) = app_with(Some("t"));
        app.on_answer(Err(ApiError::RequestRejected {
            status: 500,
            message: "Failed to process query".to_string(),
        }));
        assert_eq!(app.chat.messages()[0].text, "Error: Failed to process query");
        assert_eq!(app.notification.message, "Query failed: Failed to process query");
        assert_eq!(app.notification.severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_flashcard_count_bounds_checked_locally() {
        let (mut app, _) = app_with(Some("t"));
        app.generate_flashcards();
        assert_eq!(
            app.notification.message,
            "No documents available to generate flashcards"
        );

        app.on_documents(Ok(vec![doc("d1")]));
        app.flashcard_count.set("25");
        app.generate_flashcards();
        assert!(!app.generate_task.is_busy());
        assert_eq!(app.notification.severity, Severity::Warning);
        assert!(app.notification.message.contains("between 1 and 20"));
    }

    #[tokio::test]
    async fn test_new_batch_resets_deck() {
        let (mut app, _) = app_with(Some("t"));
        app.on_generated(Ok(FlashcardBatch {
            flashcards: vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")],
            message: None,
        }));
        app.deck.next();
        app.flip_card();
        assert_eq!(app.stats.cards_reviewed, 1);

        app.on_generated(Ok(FlashcardBatch {
            flashcards: vec![Flashcard::new("Q3", "A3")],
            message: None,
        }));
        assert_eq!(app.deck.position(), Some((1, 1)));
        assert!(!app.deck.is_flipped());
        assert_eq!(app.stats.flashcards_generated, 3);
    }

    #[tokio::test]
    async fn test_login_success_opens_dashboard() {
        let (mut app, store) = app_with(None);
        store.set("fresh").unwrap();
        app.on_login(Ok(()));
        assert_eq!(app.route(), Route::Dashboard);
        assert_eq!(app.notification.message, "Login successful!");
    }

    #[tokio::test]
    async fn test_login_failure_shows_server_detail() {
        let (mut app, store) = app_with(None);
        app.on_login(Err(ApiError::RequestRejected {
            status: 401,
            message: "Invalid username or password".to_string(),
        }));
        assert_eq!(app.route(), Route::Login);
        assert!(!store.is_authenticated());
        assert_eq!(app.notification.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_register_view_is_public_only() {
        let (mut app, _) = app_with(None);
        app.navigate(Route::Register);
        assert_eq!(app.route(), Route::Register);
        app.back();
        assert_eq!(app.route(), Route::Login);

        let (mut app, _) = app_with(Some("t"));
        app.navigate(Route::Register);
        assert_eq!(app.route(), Route::Dashboard);
    }

    #[tokio::test]
    async fn test_logout_replaces_history() {
        let (mut app, store) = app_with(Some("t"));
        app.logout();
        assert!(!store.is_authenticated());
        assert_eq!(app.route(), Route::Login);
        app.back();
        assert_eq!(app.route(), Route::Login);
    }
}
