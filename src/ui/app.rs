//! Main application state, async plumbing and top-level layout.

use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Local, NaiveDate};
use eframe::egui::{self, Align, Layout};
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;

use crate::config::{AppConfig, DatabaseConfig};
use crate::db::{self, ServerInfo};
use crate::entities::{customer, favorites, marks_as_favorite, profile, title, watch_history};
use crate::models::customer::{CreateCustomer, UpdateCustomer};
use crate::models::profile::{
    AccountStatus, CreateProfile, ProfileFilter, ProfileRow, ProfileStatistics, ProfileSummary, ReviewRow,
    UpdateProfile,
};
use crate::models::watch_history::{
    CategoryTrend, CompletionBucket, CreateWatchHistory, UpdateWatchHistory, ViewingCategory, WatchAnalytics,
    WatchHistoryFilter, WatchHistoryRow,
};
use crate::models::{DashboardStats, MarkRow};
use crate::profiles::{ConnectionProfile, ProfileStore};
use crate::reports::{self, CustomOutcome, ResultTable};
use crate::routines::{self, Routine};

use super::components::{colors, parse_number, parse_optional_id};
use super::login::LoginState;
use super::queries_panel::QueryState;
use super::routines_panel::RoutineState;
use super::{customer_panel, dashboard, favorites_panel, login, profile_panel, queries_panel, routines_panel, watch_history_panel};

/// Current panel being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Dashboard,
    Customers,
    Profiles,
    WatchHistory,
    Favorites,
    Queries,
    Routines,
}

impl Panel {
    /// Get the display name for the panel.
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Dashboard => "Dashboard",
            Panel::Customers => "Customers",
            Panel::Profiles => "Profiles",
            Panel::WatchHistory => "Watch History",
            Panel::Favorites => "Favorites",
            Panel::Queries => "Queries & Reports",
            Panel::Routines => "Functions & Procedures",
        }
    }
}

/// An open database session.
pub struct Session {
    pub pool: DatabaseConnection,
    pub database: DatabaseConfig,
    pub info: ServerInfo,
    pub connected_at: DateTime<Local>,
}

/// Watch analytics shown above the watch history table.
#[derive(Debug, Clone, Default)]
pub struct WatchInsights {
    pub analytics: WatchAnalytics,
    pub distribution: Vec<(CompletionBucket, u64)>,
    pub trends: Vec<CategoryTrend>,
    pub daily_hours: Vec<(NaiveDate, f64)>,
}

/// Messages from async tasks to UI.
pub enum UiMessage {
    // Connection
    ConnectionTested(Result<ServerInfo, String>),
    Connected {
        pool: DatabaseConnection,
        info: ServerInfo,
        database: DatabaseConfig,
    },
    ConnectFailed(String),

    // Data loading
    DashboardLoaded(DashboardStats),
    DashboardFailed(String),
    CustomersLoaded(Vec<customer::Model>, u64),
    ProfilesLoaded(Vec<ProfileRow>, ProfileSummary),
    ProfileDetailsLoaded(i32, ProfileStatistics, Vec<ReviewRow>),
    WatchHistoryLoaded(Vec<WatchHistoryRow>, u64),
    WatchInsightsLoaded(WatchInsights),
    TitlesLoaded(Vec<title::Model>),
    MarksLoaded(Vec<MarkRow>),
    FavoritesLoaded(Vec<favorites::Model>),
    LoadError(String),

    // CRUD operations
    CustomerSaved(customer::Model),
    CustomerDeleted(i32),
    ProfileSaved(profile::Model),
    ProfileDeleted(i32),
    ProfileOnlineToggled(i32, bool),
    WatchHistorySaved(watch_history::Model),
    WatchHistoryDeleted(i32),
    CompletionSuggested(f64),
    MarkAdded(marks_as_favorite::Model),
    MarkRemoved(i32, i32),
    OperationFailed(String),

    // Queries and routines
    QueryFinished {
        label: String,
        result: Result<(ResultTable, u128), String>,
    },
    CustomFinished {
        label: String,
        result: Result<(CustomOutcome, u128), String>,
    },
    SqlValidated(Result<Vec<String>, String>),
    RoutineFinished {
        routine: &'static Routine,
        params: Vec<String>,
        started: Instant,
        result: Result<String, String>,
    },
}

/// Form state for customer CRUD.
#[derive(Default, Clone)]
pub struct CustomerForm {
    pub id: Option<i32>,
    pub id_input: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_birth_input: String,
    pub customer_since: Option<NaiveDate>,
    pub customer_since_input: String,
    pub subscription_type: Option<String>,
    pub payment_status: Option<String>,
    pub is_open: bool,
    pub is_editing: bool,
    pub read_only: bool,
}

impl CustomerForm {
    /// Reset the form to default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Blank form for a new customer who joins today.
    pub fn create(today: NaiveDate) -> Self {
        Self {
            customer_since: Some(today),
            customer_since_input: today.format("%Y-%m-%d").to_string(),
            is_open: true,
            ..Default::default()
        }
    }

    /// Create a form pre-filled from an existing customer.
    pub fn edit(customer: &customer::Model, read_only: bool) -> Self {
        Self {
            id: Some(customer.customer_id),
            id_input: customer.customer_id.to_string(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            date_of_birth: Some(customer.date_of_birth),
            date_of_birth_input: customer.date_of_birth.format("%Y-%m-%d").to_string(),
            customer_since: Some(customer.customer_since),
            customer_since_input: customer.customer_since.format("%Y-%m-%d").to_string(),
            subscription_type: customer.subscription_type.clone(),
            payment_status: customer.payment_status.clone(),
            is_open: true,
            is_editing: true,
            read_only,
        }
    }

    fn dates(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let dob = self.date_of_birth.ok_or("Date of birth is required")?;
        let since = self.customer_since.ok_or("Customer since date is required")?;
        Ok((dob, since))
    }

    pub fn to_create(&self) -> Result<CreateCustomer, String> {
        let (date_of_birth, customer_since) = self.dates()?;
        Ok(CreateCustomer {
            customer_id: parse_optional_id(&self.id_input, "Customer ID")?,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth,
            customer_since,
            subscription_type: self.subscription_type.clone(),
            payment_status: self.payment_status.clone(),
        })
    }

    pub fn to_update(&self) -> Result<UpdateCustomer, String> {
        let (date_of_birth, customer_since) = self.dates()?;
        Ok(UpdateCustomer {
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            date_of_birth: Some(date_of_birth),
            customer_since: Some(customer_since),
            subscription_type: Some(self.subscription_type.clone()),
            payment_status: Some(self.payment_status.clone()),
            last_login_date: None,
        })
    }
}

/// Form state for profile CRUD.
#[derive(Default, Clone)]
pub struct ProfileForm {
    pub id: Option<i32>,
    pub id_input: String,
    pub profile_name: String,
    pub profile_picture: String,
    pub is_online: bool,
    pub watch_history_id_input: String,
    pub customer_id_input: String,
    pub account_status: AccountStatus,
    pub is_open: bool,
    pub is_editing: bool,
}

impl ProfileForm {
    /// Reset the form to default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Create a form pre-filled for editing an existing profile.
    pub fn edit(row: &ProfileRow) -> Self {
        Self {
            id: Some(row.profile_id),
            id_input: row.profile_id.to_string(),
            profile_name: row.profile_name.clone(),
            profile_picture: row.profile_picture.clone(),
            is_online: row.is_online,
            watch_history_id_input: row.watch_history_id.to_string(),
            customer_id_input: row.customer_id.to_string(),
            account_status: row.status(),
            is_open: true,
            is_editing: true,
        }
    }

    fn references(&self) -> Result<(i32, i32), String> {
        let watch_history_id =
            parse_optional_id(&self.watch_history_id_input, "Watch history ID")?.ok_or("Watch history ID is required")?;
        let customer_id = parse_optional_id(&self.customer_id_input, "Customer ID")?.ok_or("Customer ID is required")?;
        Ok((watch_history_id, customer_id))
    }

    pub fn to_create(&self) -> Result<CreateProfile, String> {
        let (watch_history_id, customer_id) = self.references()?;
        Ok(CreateProfile {
            profile_id: parse_optional_id(&self.id_input, "Profile ID")?,
            profile_name: self.profile_name.trim().to_string(),
            profile_picture: self.profile_picture.trim().to_string(),
            is_online: self.is_online,
            watch_history_id,
            customer_id,
            account_status: self.account_status,
        })
    }

    pub fn to_update(&self) -> Result<UpdateProfile, String> {
        let (watch_history_id, customer_id) = self.references()?;
        if self.profile_name.trim().is_empty() {
            return Err("Profile name is required".to_string());
        }
        Ok(UpdateProfile {
            profile_name: Some(self.profile_name.trim().to_string()),
            profile_picture: Some(self.profile_picture.trim().to_string()),
            is_online: Some(self.is_online),
            watch_history_id: Some(watch_history_id),
            customer_id: Some(customer_id),
            account_status: Some(self.account_status),
        })
    }
}

/// Form state for watch history CRUD.
#[derive(Default, Clone)]
pub struct WatchHistoryForm {
    pub id: Option<i32>,
    pub id_input: String,
    pub movie_id_input: String,
    pub watch_date: Option<NaiveDate>,
    pub watch_date_input: String,
    pub duration_input: String,
    pub completion_input: String,
    pub viewing_category: ViewingCategory,
    pub is_open: bool,
    pub is_editing: bool,
    pub estimating: bool,
}

impl WatchHistoryForm {
    /// Reset the form to default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Blank form for a session watched today.
    pub fn create(today: NaiveDate) -> Self {
        Self {
            watch_date: Some(today),
            watch_date_input: today.format("%Y-%m-%d").to_string(),
            duration_input: "0".to_string(),
            is_open: true,
            ..Default::default()
        }
    }

    /// Create a form pre-filled for editing an existing record.
    pub fn edit(row: &WatchHistoryRow) -> Self {
        Self {
            id: Some(row.watch_history_id),
            id_input: row.watch_history_id.to_string(),
            movie_id_input: row.movie_id.to_string(),
            watch_date: Some(row.watch_date),
            watch_date_input: row.watch_date.format("%Y-%m-%d").to_string(),
            duration_input: format!("{:.1}", row.duration_watched),
            completion_input: row
                .completion_percentage
                .map(|p| format!("{:.1}", p))
                .unwrap_or_default(),
            viewing_category: row.category(),
            is_open: true,
            is_editing: true,
            estimating: false,
        }
    }

    pub fn movie_id(&self) -> Result<i32, String> {
        parse_optional_id(&self.movie_id_input, "Movie ID")?.ok_or_else(|| "Movie ID is required".to_string())
    }

    pub fn duration(&self) -> Result<f64, String> {
        parse_number(&self.duration_input, "Duration")
    }

    fn completion(&self) -> Result<Option<f64>, String> {
        if self.completion_input.trim().is_empty() {
            Ok(None)
        } else {
            parse_number(&self.completion_input, "Completion").map(Some)
        }
    }

    pub fn to_create(&self) -> Result<CreateWatchHistory, String> {
        Ok(CreateWatchHistory {
            watch_history_id: parse_optional_id(&self.id_input, "Watch history ID")?,
            movie_id: self.movie_id()?,
            watch_date: self.watch_date.ok_or("Watch date is required")?,
            duration_watched: self.duration()?,
            completion_percentage: self.completion()?,
            viewing_category: self.viewing_category,
        })
    }

    pub fn to_update(&self) -> Result<UpdateWatchHistory, String> {
        Ok(UpdateWatchHistory {
            movie_id: Some(self.movie_id()?),
            watch_date: Some(self.watch_date.ok_or("Watch date is required")?),
            duration_watched: Some(self.duration()?),
            completion_percentage: Some(self.completion()?),
            viewing_category: Some(self.viewing_category),
        })
    }
}

/// Form state for adding a favorite mark.
#[derive(Default, Clone)]
pub struct MarkForm {
    pub profile_id_input: String,
    pub movie_id: Option<i32>,
    pub is_open: bool,
}

impl MarkForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Watch history filter inputs, including page position.
#[derive(Clone)]
pub struct WatchHistoryView {
    pub filter: WatchHistoryFilter,
    pub from_input: String,
    pub to_input: String,
    pub page: u64,
    pub total: u64,
}

impl WatchHistoryView {
    pub fn new(today: NaiveDate) -> Self {
        let filter = WatchHistoryFilter::last_days(today, 30);
        Self {
            from_input: filter.date_from.format("%Y-%m-%d").to_string(),
            to_input: filter.date_to.format("%Y-%m-%d").to_string(),
            filter,
            page: 0,
            total: 0,
        }
    }

    pub fn total_pages(&self, page_size: u64) -> u64 {
        self.total.div_ceil(page_size.max(1))
    }
}

/// Profile selected in the details window.
#[derive(Clone)]
pub struct ProfileDetails {
    pub profile: ProfileRow,
    pub statistics: Option<ProfileStatistics>,
    pub reviews: Vec<ReviewRow>,
}

/// Log level for UI messages.
#[derive(Clone, Copy, Debug)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Log entry for display in the UI.
#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub level: LogLevel,
}

/// Target for delete confirmation dialog.
#[derive(Clone)]
pub enum DeleteTarget {
    Customer(i32, String),
    Profile(i32, String),
    WatchHistory(i32),
    Mark { profile_id: i32, movie_id: i32 },
}

/// Main application state.
pub struct App {
    // Runtime and database
    pub rt: tokio::runtime::Runtime,
    pub session: Option<Session>,

    // Message channel for async communication
    pub tx: mpsc::UnboundedSender<UiMessage>,
    pub rx: mpsc::UnboundedReceiver<UiMessage>,

    // Navigation
    pub current_panel: Panel,

    // Login
    pub login: LoginState,
    pub connections: ProfileStore,

    // Cached data
    pub dashboard: Option<DashboardStats>,
    pub dashboard_loading: bool,
    pub dashboard_updated: Option<DateTime<Local>>,
    pub customers: Vec<customer::Model>,
    pub customer_total: u64,
    pub profiles: Vec<ProfileRow>,
    pub profile_summary: ProfileSummary,
    pub watch_rows: Vec<WatchHistoryRow>,
    pub watch_insights: Option<WatchInsights>,
    pub titles: Vec<title::Model>,
    pub marks: Vec<MarkRow>,
    pub favorites: Vec<favorites::Model>,

    // Loading states
    pub is_loading: bool,
    pub loading_message: String,

    // Forms
    pub customer_form: CustomerForm,
    pub profile_form: ProfileForm,
    pub watch_form: WatchHistoryForm,
    pub mark_form: MarkForm,
    pub profile_details: Option<ProfileDetails>,

    // Search/filter state
    pub customer_search: String,
    pub profile_filter: ProfileFilter,
    pub profile_customer_input: String,
    pub watch_view: WatchHistoryView,
    pub mark_profile_input: String,

    // Queries and routines
    pub queries: QueryState,
    pub routines: RoutineState,

    // Log messages
    pub log_messages: Vec<LogEntry>,

    // Configuration
    pub config: AppConfig,

    // Dialogs
    pub show_delete_confirm: bool,
    pub delete_target: Option<DeleteTarget>,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
}

impl App {
    pub fn new(config: AppConfig, connections: ProfileStore, rt: tokio::runtime::Runtime) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let today = Local::now().date_naive();

        Self {
            rt,
            session: None,
            tx,
            rx,
            current_panel: Panel::default(),
            login: LoginState::new(&config.database, config.ui.save_connections),
            connections,
            dashboard: None,
            dashboard_loading: false,
            dashboard_updated: None,
            customers: Vec::new(),
            customer_total: 0,
            profiles: Vec::new(),
            profile_summary: ProfileSummary::default(),
            watch_rows: Vec::new(),
            watch_insights: None,
            titles: Vec::new(),
            marks: Vec::new(),
            favorites: Vec::new(),
            is_loading: false,
            loading_message: String::new(),
            customer_form: CustomerForm::default(),
            profile_form: ProfileForm::default(),
            watch_form: WatchHistoryForm::default(),
            mark_form: MarkForm::default(),
            profile_details: None,
            customer_search: String::new(),
            profile_filter: ProfileFilter::default(),
            profile_customer_input: String::new(),
            watch_view: WatchHistoryView::new(today),
            mark_profile_input: String::new(),
            queries: QueryState::new(today),
            routines: RoutineState::default(),
            log_messages: Vec::new(),
            config,
            show_delete_confirm: false,
            delete_target: None,
            error_message: None,
            success_message: None,
        }
    }

    /// Log a message to the UI log.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log_messages.push(LogEntry {
            timestamp: Local::now(),
            message: message.into(),
            level,
        });

        // Keep only last 100 messages
        if self.log_messages.len() > 100 {
            self.log_messages.remove(0);
        }
    }

    /// Log an info message.
    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Log a success message.
    pub fn log_success(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    /// Log a warning message.
    pub fn log_warning(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    /// Log an error message.
    pub fn log_error(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn clear_log(&mut self) {
        self.log_messages.clear();
    }

    /// Run `task` on the runtime with a clone of the pool and post its message.
    ///
    /// Returns `false` when there is no open session.
    fn spawn_db<F, Fut>(&mut self, task: F) -> bool
    where
        F: FnOnce(DatabaseConnection) -> Fut,
        Fut: Future<Output = UiMessage> + Send + 'static,
    {
        let Some(session) = &self.session else {
            self.log_warning("Not connected to a database");
            return false;
        };
        let pool = session.pool.clone();
        let tx = self.tx.clone();
        let fut = task(pool);

        self.rt.spawn(async move {
            let _ = tx.send(fut.await);
        });
        true
    }

    fn start_loading(&mut self, message: &str) {
        self.is_loading = true;
        self.loading_message = message.to_string();
    }

    fn page_size(&self) -> u64 {
        self.config.ui.page_size
    }

    // ---- Connection ----

    /// Try the login form's settings without keeping the connection.
    pub fn test_connection(&mut self) {
        let database = match self.login.database_config() {
            Ok(db) => db,
            Err(e) => {
                self.login.push_status(format!("Invalid settings: {}", e));
                self.error_message = Some(e);
                return;
            }
        };

        self.login.testing = true;
        self.login.push_status(format!("Testing {}...", database.display_string()));
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            let result = async {
                let pool = db::connect(&database.connection_string()).await?;
                db::test_connection(&pool).await?;
                let info = db::server_info(&pool).await;
                let _ = pool.close().await;
                info
            }
            .await;
            let _ = tx.send(UiMessage::ConnectionTested(result.map_err(|e| e.to_string())));
        });
    }

    /// Open a session with the login form's settings.
    pub fn login(&mut self) {
        let database = match self.login.database_config() {
            Ok(db) => db,
            Err(e) => {
                self.login.push_status(format!("Invalid settings: {}", e));
                self.error_message = Some(e);
                return;
            }
        };

        self.login.connecting = true;
        self.login.push_status(format!("Connecting to {}...", database.display_string()));
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            let connected = async {
                let pool = db::connect(&database.connection_string()).await?;
                let info = db::server_info(&pool).await?;
                Ok::<_, sea_orm::DbErr>((pool, info))
            }
            .await;

            let msg = match connected {
                Ok((pool, info)) => UiMessage::Connected { pool, info, database },
                Err(e) => UiMessage::ConnectFailed(e.to_string()),
            };
            let _ = tx.send(msg);
        });
    }

    /// Close the session and return to the login screen.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!("Logging out of {}", session.database.display_string());
            self.rt.spawn(async move {
                if let Err(e) = session.pool.close().await {
                    tracing::warn!("Error closing connection pool: {}", e);
                }
            });
        }

        let today = Local::now().date_naive();
        self.current_panel = Panel::Dashboard;
        self.dashboard = None;
        self.dashboard_loading = false;
        self.dashboard_updated = None;
        self.customers.clear();
        self.profiles.clear();
        self.profile_summary = ProfileSummary::default();
        self.watch_rows.clear();
        self.watch_insights = None;
        self.titles.clear();
        self.marks.clear();
        self.favorites.clear();
        self.profile_details = None;
        self.watch_view = WatchHistoryView::new(today);
        self.queries = QueryState::new(today);
        self.is_loading = false;
        self.login.password.clear();
        self.login.push_status("Logged out");
        self.log_info("Logged out");
    }

    /// Switch panels, loading whatever the new panel shows.
    pub fn navigate(&mut self, panel: Panel) {
        self.current_panel = panel;
        match panel {
            Panel::Dashboard => self.refresh_dashboard(),
            Panel::Customers => self.load_customers(),
            Panel::Profiles => self.load_profiles(),
            Panel::WatchHistory => {
                self.load_watch_history();
                self.load_watch_insights();
                if self.titles.is_empty() {
                    self.load_titles();
                }
            }
            Panel::Favorites => {
                self.load_marks();
                self.load_favorites();
            }
            Panel::Queries | Panel::Routines => {}
        }
    }

    // ---- Dashboard ----

    /// Reload dashboard statistics unless a refresh is already running.
    pub fn refresh_dashboard(&mut self) {
        if self.dashboard_loading {
            return;
        }
        let started = self.spawn_db(|pool| async move {
            match db::stats::load_dashboard_now(&pool).await {
                Ok(stats) => UiMessage::DashboardLoaded(stats),
                Err(e) => UiMessage::DashboardFailed(e.to_string()),
            }
        });
        self.dashboard_loading = started;
    }

    // ---- Customers ----

    /// Load customers matching the current search.
    pub fn load_customers(&mut self) {
        let search = self.customer_search.clone();
        let limit = self.page_size();
        self.start_loading("Loading customers...");

        self.spawn_db(|pool| async move {
            let rows = db::customer::list(&pool, &search, Some(limit), 0).await;
            let total = db::customer::count(&pool, &search).await;
            match (rows, total) {
                (Ok(rows), Ok(total)) => UiMessage::CustomersLoaded(rows, total),
                (Err(e), _) | (_, Err(e)) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    pub fn create_customer(&mut self, data: CreateCustomer) {
        self.spawn_db(|pool| async move {
            match db::customer::create(&pool, data).await {
                Ok(customer) => UiMessage::CustomerSaved(customer),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn update_customer(&mut self, id: i32, data: UpdateCustomer) {
        self.spawn_db(|pool| async move {
            match db::customer::update(&pool, id, data).await {
                Ok(Some(customer)) => UiMessage::CustomerSaved(customer),
                Ok(None) => UiMessage::OperationFailed("Customer not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    /// Delete a customer together with everything that references it.
    pub fn delete_customer(&mut self, id: i32) {
        self.spawn_db(|pool| async move {
            match db::customer::delete(&pool, id).await {
                Ok(true) => UiMessage::CustomerDeleted(id),
                Ok(false) => UiMessage::OperationFailed("Customer not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    // ---- Profiles ----

    pub fn load_profiles(&mut self) {
        let filter = self.profile_filter.clone();
        self.start_loading("Loading profiles...");

        self.spawn_db(|pool| async move {
            let loaded = async {
                let rows = db::profile::list(&pool, &filter).await?;
                let summary = db::profile::summary(&pool).await?;
                Ok::<_, sea_orm::DbErr>((rows, summary))
            }
            .await;
            match loaded {
                Ok((rows, summary)) => UiMessage::ProfilesLoaded(rows, summary),
                Err(e) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    pub fn create_profile(&mut self, data: CreateProfile) {
        self.spawn_db(|pool| async move {
            match db::profile::create(&pool, data).await {
                Ok(profile) => UiMessage::ProfileSaved(profile),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn update_profile(&mut self, id: i32, data: UpdateProfile) {
        self.spawn_db(|pool| async move {
            match db::profile::update(&pool, id, data).await {
                Ok(Some(profile)) => UiMessage::ProfileSaved(profile),
                Ok(None) => UiMessage::OperationFailed("Profile not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn delete_profile(&mut self, id: i32) {
        self.spawn_db(|pool| async move {
            match db::profile::delete(&pool, id).await {
                Ok(true) => UiMessage::ProfileDeleted(id),
                Ok(false) => UiMessage::OperationFailed("Profile not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn toggle_profile_online(&mut self, id: i32) {
        self.spawn_db(|pool| async move {
            match db::profile::toggle_online(&pool, id).await {
                Ok(Some(online)) => UiMessage::ProfileOnlineToggled(id, online),
                Ok(None) => UiMessage::OperationFailed("Profile not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    /// Open the details window for a profile and load its statistics and reviews.
    pub fn show_profile_details(&mut self, row: ProfileRow) {
        let id = row.profile_id;
        self.profile_details = Some(ProfileDetails {
            profile: row,
            statistics: None,
            reviews: Vec::new(),
        });

        self.spawn_db(|pool| async move {
            let statistics = db::profile::statistics(&pool, id).await;
            let reviews = db::profile::reviews_for(&pool, id).await;
            match (statistics, reviews) {
                (Ok(statistics), Ok(reviews)) => UiMessage::ProfileDetailsLoaded(id, statistics, reviews),
                (Err(e), _) => UiMessage::LoadError(e.to_string()),
                (_, Err(e)) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    // ---- Watch history ----

    /// Load the current page of watch history.
    pub fn load_watch_history(&mut self) {
        let filter = self.watch_view.filter.clone();
        let limit = self.page_size();
        let offset = self.watch_view.page * limit;
        self.start_loading("Loading watch history...");

        self.spawn_db(|pool| async move {
            let rows = db::watch_history::list(&pool, &filter, limit, offset).await;
            let total = db::watch_history::count(&pool, &filter).await;
            match (rows, total) {
                (Ok(rows), Ok(total)) => UiMessage::WatchHistoryLoaded(rows, total),
                (Err(e), _) | (_, Err(e)) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    /// Load analytics for the filter's date range.
    pub fn load_watch_insights(&mut self) {
        let from = self.watch_view.filter.date_from;
        let to = self.watch_view.filter.date_to;

        self.spawn_db(|pool| async move {
            let insights = async {
                Ok::<_, sea_orm::DbErr>(WatchInsights {
                    analytics: db::watch_history::analytics(&pool, from, to).await?,
                    distribution: db::watch_history::completion_distribution(&pool, from, to).await?,
                    trends: db::watch_history::category_trends(&pool, from, to).await?,
                    daily_hours: db::watch_history::daily_hours(&pool, from, to).await?,
                })
            }
            .await;
            match insights {
                Ok(insights) => UiMessage::WatchInsightsLoaded(insights),
                Err(e) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    pub fn load_titles(&mut self) {
        self.spawn_db(|pool| async move {
            match db::watch_history::list_titles(&pool).await {
                Ok(titles) => UiMessage::TitlesLoaded(titles),
                Err(e) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    pub fn create_watch_history(&mut self, data: CreateWatchHistory) {
        self.spawn_db(|pool| async move {
            match db::watch_history::create(&pool, data).await {
                Ok(record) => UiMessage::WatchHistorySaved(record),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn update_watch_history(&mut self, id: i32, data: UpdateWatchHistory) {
        self.spawn_db(|pool| async move {
            match db::watch_history::update(&pool, id, data).await {
                Ok(Some(record)) => UiMessage::WatchHistorySaved(record),
                Ok(None) => UiMessage::OperationFailed("Watch history record not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn mark_rewatch(&mut self, id: i32) {
        self.spawn_db(|pool| async move {
            match db::watch_history::mark_rewatch(&pool, id).await {
                Ok(Some(record)) => UiMessage::WatchHistorySaved(record),
                Ok(None) => UiMessage::OperationFailed("Watch history record not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn delete_watch_history(&mut self, id: i32) {
        self.spawn_db(|pool| async move {
            match db::watch_history::delete(&pool, id).await {
                Ok(true) => UiMessage::WatchHistoryDeleted(id),
                Ok(false) => UiMessage::OperationFailed("Watch history record not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    /// Fill the form's completion from the title's running time.
    pub fn suggest_completion(&mut self) {
        let (movie_id, minutes) = match (self.watch_form.movie_id(), self.watch_form.duration()) {
            (Ok(movie_id), Ok(minutes)) => (movie_id, minutes),
            (Err(e), _) | (_, Err(e)) => {
                self.error_message = Some(e);
                return;
            }
        };

        self.watch_form.estimating = self.spawn_db(|pool| async move {
            match db::watch_history::suggest_completion(&pool, movie_id, minutes).await {
                Ok(pct) => UiMessage::CompletionSuggested(pct),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    // ---- Favorites ----

    pub fn load_marks(&mut self) {
        let profile_id = match parse_optional_id(&self.mark_profile_input, "Profile ID") {
            Ok(id) => id,
            Err(e) => {
                self.error_message = Some(e);
                return;
            }
        };
        self.start_loading("Loading favorites...");

        self.spawn_db(|pool| async move {
            match db::favorites::list_marks(&pool, profile_id).await {
                Ok(rows) => UiMessage::MarksLoaded(rows),
                Err(e) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    pub fn load_favorites(&mut self) {
        self.spawn_db(|pool| async move {
            match db::favorites::list_favorites(&pool).await {
                Ok(rows) => UiMessage::FavoritesLoaded(rows),
                Err(e) => UiMessage::LoadError(e.to_string()),
            }
        });
    }

    pub fn add_mark(&mut self, profile_id: i32, movie_id: i32) {
        self.spawn_db(|pool| async move {
            match db::favorites::add_mark(&pool, profile_id, movie_id).await {
                Ok(mark) => UiMessage::MarkAdded(mark),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    pub fn remove_mark(&mut self, profile_id: i32, movie_id: i32) {
        self.spawn_db(|pool| async move {
            match db::favorites::remove_mark(&pool, profile_id, movie_id).await {
                Ok(true) => UiMessage::MarkRemoved(profile_id, movie_id),
                Ok(false) => UiMessage::OperationFailed("Favorite mark not found".to_string()),
                Err(e) => UiMessage::OperationFailed(e.to_string()),
            }
        });
    }

    // ---- Queries & reports ----

    /// Run the selected predefined query with the current arguments.
    pub fn run_predefined_query(&mut self) {
        let Some(query) = self.queries.selected_query() else {
            return;
        };
        let args = match self.queries.query_args() {
            Ok(args) => args,
            Err(e) => {
                self.error_message = Some(e);
                return;
            }
        };

        let label = query.name.to_string();
        self.queries.running = self.spawn_db(|pool| async move {
            let result = reports::run_predefined(&pool, query, &args).await;
            UiMessage::QueryFinished {
                label,
                result: result.map_err(|e| e.to_string()),
            }
        });
    }

    /// Run the selected report over the chosen date range.
    pub fn run_report(&mut self) {
        let kind = self.queries.report_kind;
        let (from, to) = (self.queries.report_from, self.queries.report_to);

        let label = format!("{} ({} to {})", kind, from, to);
        self.queries.running = self.spawn_db(|pool| async move {
            let result = reports::run_report(&pool, kind, from, to).await;
            UiMessage::QueryFinished {
                label,
                result: result.map_err(|e| e.to_string()),
            }
        });
    }

    /// Execute the custom SQL editor contents.
    pub fn run_custom_sql(&mut self) {
        let sql = self.queries.custom_sql.clone();
        if sql.trim().is_empty() {
            self.error_message = Some("Please enter a SQL query".to_string());
            return;
        }

        let label = custom_label(&sql);
        self.queries.running = self.spawn_db(|pool| async move {
            let started = Instant::now();
            let result = reports::run_custom(&pool, &sql).await;
            UiMessage::CustomFinished {
                label,
                result: result
                    .map(|outcome| (outcome, started.elapsed().as_millis()))
                    .map_err(|e| e.to_string()),
            }
        });
    }

    /// Check the custom SQL with `EXPLAIN` without running it.
    pub fn validate_custom_sql(&mut self) {
        let sql = self.queries.custom_sql.clone();
        self.spawn_db(|pool| async move {
            UiMessage::SqlValidated(reports::validate(&pool, &sql).await.map_err(|e| e.to_string()))
        });
    }

    // ---- Routines ----

    /// Execute the selected routine with the form's parameter text.
    pub fn execute_routine(&mut self) {
        let Some(routine) = self.routines.selected() else {
            self.error_message = Some("Please select a function or procedure".to_string());
            return;
        };
        let params = self.routines.inputs.clone();
        if let Err(e) = routine.parse_args(&params) {
            self.routines.result = Some(Err(e.to_string()));
            self.error_message = Some(e.to_string());
            return;
        }

        self.routines.running = self.spawn_db(|pool| async move {
            let started = Instant::now();
            let result = routines::execute(&pool, routine, &params).await;
            UiMessage::RoutineFinished {
                routine,
                params,
                started,
                result: result.map_err(|e| e.to_string()),
            }
        });
    }

    /// Poll async operation results.
    fn poll_async_results(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                UiMessage::ConnectionTested(result) => {
                    self.login.testing = false;
                    match result {
                        Ok(info) => {
                            self.login.push_status(format!(
                                "Connection successful: database '{}' as user '{}'",
                                info.database, info.user
                            ));
                            self.login.push_status(format!("Server: {}", info.version));
                            if let Some(time) = info.server_time {
                                self.login.push_status(format!(
                                    "Server time: {}",
                                    time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                                ));
                            }
                            self.success_message = Some("Connection successful".to_string());
                        }
                        Err(e) => {
                            self.login.push_status(format!("Connection failed: {}", e));
                            self.error_message = Some(format!("Connection failed: {}", e));
                        }
                    }
                }
                UiMessage::Connected { pool, info, database } => {
                    self.login.connecting = false;
                    self.login.push_status(format!("Connected to {}", database.display_string()));
                    tracing::info!("Connected to {} as {}", info.database, info.user);

                    if self.login.save_connection {
                        match self.connections.remember(ConnectionProfile::from(&database)) {
                            Ok(name) => self.login.selected_profile = Some(name),
                            Err(e) => {
                                tracing::warn!("Could not save connection: {}", e);
                                self.log_warning(format!("Could not save connection: {}", e));
                            }
                        }
                    }

                    self.log_success(format!("Logged in to {}", info.database));
                    self.session = Some(Session {
                        pool,
                        database,
                        info,
                        connected_at: Local::now(),
                    });
                    self.navigate(Panel::Dashboard);
                }
                UiMessage::ConnectFailed(e) => {
                    self.login.connecting = false;
                    self.login.push_status(format!("Login failed: {}", e));
                    tracing::error!("Login failed: {}", e);
                    self.error_message = Some(format!("Login failed: {}", e));
                }
                UiMessage::DashboardLoaded(stats) => {
                    self.dashboard_loading = false;
                    self.dashboard = Some(stats);
                    self.dashboard_updated = Some(Local::now());
                }
                UiMessage::DashboardFailed(e) => {
                    self.dashboard_loading = false;
                    tracing::error!("Dashboard refresh failed: {}", e);
                    self.log_error(format!("Dashboard refresh failed: {}", e));
                }
                UiMessage::CustomersLoaded(rows, total) => {
                    self.customers = rows;
                    self.customer_total = total;
                    self.is_loading = false;
                }
                UiMessage::ProfilesLoaded(rows, summary) => {
                    self.profiles = rows;
                    self.profile_summary = summary;
                    self.is_loading = false;
                }
                UiMessage::ProfileDetailsLoaded(id, statistics, reviews) => {
                    if let Some(details) = &mut self.profile_details
                        && details.profile.profile_id == id
                    {
                        details.statistics = Some(statistics);
                        details.reviews = reviews;
                    }
                }
                UiMessage::WatchHistoryLoaded(rows, total) => {
                    self.watch_rows = rows;
                    self.watch_view.total = total;
                    self.is_loading = false;
                }
                UiMessage::WatchInsightsLoaded(insights) => {
                    self.watch_insights = Some(insights);
                }
                UiMessage::TitlesLoaded(titles) => {
                    self.titles = titles;
                }
                UiMessage::MarksLoaded(rows) => {
                    self.marks = rows;
                    self.is_loading = false;
                }
                UiMessage::FavoritesLoaded(rows) => {
                    self.favorites = rows;
                }
                UiMessage::LoadError(e) => {
                    tracing::error!("{}", e);
                    self.error_message = Some(e.clone());
                    self.log_error(e);
                    self.is_loading = false;
                }
                UiMessage::CustomerSaved(customer) => {
                    self.success_message = Some(format!("Customer '{}' saved", customer.full_name()));
                    self.log_success(format!("Saved customer {}", customer.customer_id));
                    self.customer_form.reset();
                    self.load_customers();
                }
                UiMessage::CustomerDeleted(id) => {
                    self.customers.retain(|c| c.customer_id != id);
                    self.customer_total = self.customer_total.saturating_sub(1);
                    self.success_message = Some("Customer deleted".to_string());
                    self.log_success(format!("Deleted customer {}", id));
                }
                UiMessage::ProfileSaved(profile) => {
                    self.success_message = Some(format!("Profile '{}' saved", profile.profile_name));
                    self.log_success(format!("Saved profile {}", profile.profile_id));
                    self.profile_form.reset();
                    self.load_profiles();
                }
                UiMessage::ProfileDeleted(id) => {
                    self.profiles.retain(|p| p.profile_id != id);
                    if self.profile_details.as_ref().is_some_and(|d| d.profile.profile_id == id) {
                        self.profile_details = None;
                    }
                    self.success_message = Some("Profile deleted".to_string());
                    self.log_success(format!("Deleted profile {}", id));
                }
                UiMessage::ProfileOnlineToggled(id, online) => {
                    if let Some(row) = self.profiles.iter_mut().find(|p| p.profile_id == id) {
                        row.is_online = online;
                    }
                    if online {
                        self.profile_summary.online += 1;
                    } else {
                        self.profile_summary.online = self.profile_summary.online.saturating_sub(1);
                    }
                    self.log_info(format!(
                        "Profile {} is now {}",
                        id,
                        if online { "online" } else { "offline" }
                    ));
                }
                UiMessage::WatchHistorySaved(record) => {
                    self.success_message = Some(format!("Watch history {} saved", record.watch_history_id));
                    self.log_success(format!("Saved watch history {}", record.watch_history_id));
                    self.watch_form.reset();
                    self.load_watch_history();
                    self.load_watch_insights();
                }
                UiMessage::WatchHistoryDeleted(id) => {
                    self.watch_rows.retain(|w| w.watch_history_id != id);
                    self.watch_view.total = self.watch_view.total.saturating_sub(1);
                    self.success_message = Some("Watch history record deleted".to_string());
                    self.log_success(format!("Deleted watch history {}", id));
                }
                UiMessage::CompletionSuggested(pct) => {
                    self.watch_form.estimating = false;
                    self.watch_form.completion_input = format!("{:.1}", pct);
                }
                UiMessage::MarkAdded(mark) => {
                    self.success_message = Some(format!(
                        "Movie {} added to favorites of profile {}",
                        mark.movie_id, mark.profile_id
                    ));
                    self.mark_form.reset();
                    self.load_marks();
                }
                UiMessage::MarkRemoved(profile_id, movie_id) => {
                    self.marks
                        .retain(|m| !(m.profile_id == profile_id && m.movie_id == movie_id));
                    self.log_success(format!("Removed movie {} from profile {}", movie_id, profile_id));
                }
                UiMessage::OperationFailed(e) => {
                    tracing::error!("{}", e);
                    self.watch_form.estimating = false;
                    self.error_message = Some(e.clone());
                    self.log_error(e);
                }
                UiMessage::QueryFinished { label, result } => {
                    self.queries.running = false;
                    match result {
                        Ok((table, elapsed_ms)) => {
                            self.log_info(format!("{}: {} rows in {} ms", label, table.row_count(), elapsed_ms));
                            self.queries.finish_rows(label, table, elapsed_ms);
                        }
                        Err(e) => self.query_failed(label, e),
                    }
                }
                UiMessage::CustomFinished { label, result } => {
                    self.queries.running = false;
                    match result {
                        Ok((CustomOutcome::Rows(table), elapsed_ms)) => {
                            self.log_info(format!("{}: {} rows in {} ms", label, table.row_count(), elapsed_ms));
                            self.queries.finish_rows(label, table, elapsed_ms);
                        }
                        Ok((outcome @ CustomOutcome::Affected(_), elapsed_ms)) => {
                            let summary = outcome.summary();
                            self.log_success(format!("{}: {}", label, summary));
                            self.queries.history.record(label, elapsed_ms, Ok(summary.clone()));
                            self.success_message = Some(summary);
                        }
                        Err(e) => self.query_failed(label, e),
                    }
                }
                UiMessage::SqlValidated(result) => {
                    match &result {
                        Ok(_) => self.log_success("SQL validated"),
                        Err(e) => self.log_warning(format!("SQL validation failed: {}", e)),
                    }
                    self.queries.validation = Some(result);
                }
                UiMessage::RoutineFinished {
                    routine,
                    params,
                    started,
                    result,
                } => {
                    self.routines.running = false;
                    match &result {
                        Ok(value) => self.log_success(format!("{}: {}", routine.title, value)),
                        Err(e) => {
                            tracing::error!("{} failed: {}", routine.name, e);
                            self.log_error(format!("{} failed: {}", routine.title, e));
                            self.error_message = Some(e.clone());
                        }
                    }
                    self.routines.log.record(routine, &params, result.clone(), started);
                    self.routines.result = Some(result);
                }
            }
        }
    }

    fn query_failed(&mut self, label: String, error: String) {
        tracing::error!("{} failed: {}", label, error);
        self.log_error(format!("{} failed: {}", label, error));
        self.queries.history.record(label, 0, Err(error.clone()));
        self.error_message = Some(error);
    }

    /// Render menu bar.
    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("Session", |ui| {
                    if ui.button("Refresh Dashboard").clicked() {
                        self.navigate(Panel::Dashboard);
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Logout").clicked() {
                        self.logout();
                        ui.close();
                    }
                });
                ui.menu_button("View", |ui| {
                    for panel in [
                        Panel::Dashboard,
                        Panel::Customers,
                        Panel::Profiles,
                        Panel::WatchHistory,
                        Panel::Favorites,
                        Panel::Queries,
                        Panel::Routines,
                    ] {
                        if ui
                            .selectable_label(self.current_panel == panel, panel.name())
                            .clicked()
                        {
                            self.navigate(panel);
                            ui.close();
                        }
                    }
                });
                ui.menu_button("Log", |ui| {
                    if ui.button("Clear Activity Log").clicked() {
                        self.clear_log();
                        ui.close();
                    }
                });
            });
        });
    }

    /// Render status bar (display only, no interaction).
    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .min_height(28.0)
            .show(ctx, |ui| {
                ui.disable();
                ui.horizontal(|ui| {
                    match &self.session {
                        Some(session) => {
                            ui.colored_label(
                                colors::SUCCESS,
                                format!("Connected: {}", session.database.display_string()),
                            );
                            ui.label(format!("since {}", session.connected_at.format("%H:%M:%S")));
                        }
                        None => {
                            ui.colored_label(colors::NEUTRAL, "Not connected");
                        }
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.is_loading {
                            ui.label(&self.loading_message);
                            ui.spinner();
                        } else if self.queries.running || self.routines.running || self.dashboard_loading {
                            ui.label("Working...");
                            ui.spinner();
                        }
                    });
                });
            });
    }

    /// Render modal dialogs (error, success, delete confirmation).
    fn show_dialogs(&mut self, ctx: &egui::Context) {
        // Error dialog
        if let Some(ref error) = self.error_message.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(colors::ERROR, error);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.error_message = None;
                    }
                });
        }

        // Success dialog
        if let Some(ref msg) = self.success_message.clone() {
            egui::Window::new("Success")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(colors::SUCCESS, msg);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.success_message = None;
                    }
                });
        }

        // Delete confirmation dialog
        if self.show_delete_confirm
            && let Some(ref target) = self.delete_target.clone()
        {
            let (title, message) = match target {
                DeleteTarget::Customer(_, name) => (
                    "Delete Customer",
                    format!("Delete customer '{}' with all profiles, devices and payments?", name),
                ),
                DeleteTarget::Profile(_, name) => (
                    "Delete Profile",
                    format!("Delete profile '{}' with its reviews and favorites?", name),
                ),
                DeleteTarget::WatchHistory(id) => ("Delete Watch History", format!("Delete watch history record {}?", id)),
                DeleteTarget::Mark { profile_id, movie_id } => (
                    "Remove Favorite",
                    format!("Remove movie {} from the favorites of profile {}?", movie_id, profile_id),
                ),
            };

            egui::Window::new(title)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            self.show_delete_confirm = false;
                            self.delete_target = None;
                        }
                        if ui.button("Delete").clicked() {
                            self.confirm_delete();
                            self.show_delete_confirm = false;
                            self.delete_target = None;
                        }
                    });
                });
        }
    }

    /// Execute the confirmed delete operation.
    fn confirm_delete(&mut self) {
        if let Some(target) = self.delete_target.take() {
            match target {
                DeleteTarget::Customer(id, name) => {
                    self.log_info(format!("Deleting customer: {}", name));
                    self.delete_customer(id);
                }
                DeleteTarget::Profile(id, name) => {
                    self.log_info(format!("Deleting profile: {}", name));
                    self.delete_profile(id);
                }
                DeleteTarget::WatchHistory(id) => {
                    self.log_info(format!("Deleting watch history: {}", id));
                    self.delete_watch_history(id);
                }
                DeleteTarget::Mark { profile_id, movie_id } => {
                    self.log_info(format!("Removing favorite {} from profile {}", movie_id, profile_id));
                    self.remove_mark(profile_id, movie_id);
                }
            }
        }
    }
}

/// History label for custom SQL: the first line, shortened.
fn custom_label(sql: &str) -> String {
    let first = sql
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("--"))
        .unwrap_or("Custom SQL");
    if first.chars().count() > 60 {
        format!("{}...", first.chars().take(60).collect::<String>())
    } else {
        first.to_string()
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll async results
        self.poll_async_results();

        // Request repaint during async operations
        if self.is_loading
            || self.dashboard_loading
            || self.login.testing
            || self.login.connecting
            || self.queries.running
            || self.routines.running
            || self.watch_form.estimating
        {
            ctx.request_repaint();
        }

        if self.session.is_none() {
            self.show_dialogs(ctx);
            egui::CentralPanel::default().show(ctx, |ui| login::show(self, ui));
            return;
        }

        self.show_menu_bar(ctx);
        self.show_status_bar(ctx);
        self.show_dialogs(ctx);

        // Main content
        egui::CentralPanel::default().show(ctx, |ui| match self.current_panel {
            Panel::Dashboard => {
                if let Some(next) = dashboard::show(self, ui) {
                    self.navigate(next);
                }
            }
            Panel::Customers => {
                if customer_panel::show(self, ui) {
                    self.navigate(Panel::Dashboard);
                }
            }
            Panel::Profiles => {
                if profile_panel::show(self, ui) {
                    self.navigate(Panel::Dashboard);
                }
            }
            Panel::WatchHistory => {
                if watch_history_panel::show(self, ui) {
                    self.navigate(Panel::Dashboard);
                }
            }
            Panel::Favorites => {
                if favorites_panel::show(self, ui) {
                    self.navigate(Panel::Dashboard);
                }
            }
            Panel::Queries => {
                if queries_panel::show(self, ui) {
                    self.navigate(Panel::Dashboard);
                }
            }
            Panel::Routines => {
                if routines_panel::show(self, ui) {
                    self.navigate(Panel::Dashboard);
                }
            }
        });
    }
}

/// Today's date as the forms see it.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_customer_form_round_trip() {
        let model = customer::Model {
            customer_id: 7,
            first_name: "Noa".to_string(),
            last_name: "Kim".to_string(),
            date_of_birth: date(1991, 2, 3),
            customer_since: date(2021, 4, 5),
            subscription_type: Some("Premium".to_string()),
            payment_status: None,
            last_login_date: None,
        };

        let form = CustomerForm::edit(&model, false);
        assert!(form.is_editing);
        assert_eq!(form.date_of_birth_input, "1991-02-03");

        let update = form.to_update().unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Noa"));
        assert_eq!(update.subscription_type, Some(Some("Premium".to_string())));
        assert_eq!(update.last_login_date, None);
    }

    #[test]
    fn test_customer_form_requires_dates_and_numeric_id() {
        let mut form = CustomerForm::create(date(2024, 1, 1));
        form.first_name = "A".to_string();
        form.last_name = "B".to_string();
        assert!(form.to_create().is_err());

        form.date_of_birth = Some(date(1990, 1, 1));
        let create = form.to_create().unwrap();
        assert_eq!(create.customer_id, None);
        assert_eq!(create.customer_since, date(2024, 1, 1));

        form.id_input = "x1".to_string();
        assert!(form.to_create().is_err());
    }

    #[test]
    fn test_profile_form_requires_references() {
        let mut form = ProfileForm {
            profile_name: "Kids".to_string(),
            ..Default::default()
        };
        assert!(form.to_create().is_err());

        form.watch_history_id_input = "3".to_string();
        form.customer_id_input = "9".to_string();
        let create = form.to_create().unwrap();
        assert_eq!((create.watch_history_id, create.customer_id), (3, 9));
        assert_eq!(create.account_status, AccountStatus::Active);
    }

    #[test]
    fn test_watch_form_blank_completion_clears_value() {
        let mut form = WatchHistoryForm::create(date(2024, 5, 1));
        form.movie_id_input = "12".to_string();
        form.duration_input = "30".to_string();

        let create = form.to_create().unwrap();
        assert_eq!(create.completion_percentage, None);

        let update = form.to_update().unwrap();
        assert_eq!(update.completion_percentage, Some(None));

        form.completion_input = "55.5".to_string();
        assert_eq!(form.to_update().unwrap().completion_percentage, Some(Some(55.5)));

        form.duration_input = "long".to_string();
        assert!(form.to_create().is_err());
    }

    #[test]
    fn test_watch_view_pages() {
        let mut view = WatchHistoryView::new(date(2024, 5, 1));
        assert_eq!(view.filter.date_from, date(2024, 4, 1));
        view.total = 201;
        assert_eq!(view.total_pages(100), 3);
        view.total = 0;
        assert_eq!(view.total_pages(100), 0);
    }

    #[test]
    fn test_custom_label() {
        assert_eq!(custom_label("-- note\n  SELECT * FROM customer\n"), "SELECT * FROM customer");
        assert_eq!(custom_label("   "), "Custom SQL");
        assert!(custom_label(&format!("SELECT {}", "x".repeat(100))).ends_with("..."));
    }
}
