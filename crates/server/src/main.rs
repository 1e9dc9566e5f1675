// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod gateway;

use anarchy::RollbackConfig;
use anarchy_api::{
    AcceptCaseRequest, AddNoteRequest, ApiError, CaseInfo, CaseLawyerRequest, ChangeRoleRequest,
    CloseCaseRequest, CommandHandlers, CommandResponse, ConfirmBypassRequest, ConfirmedCommand,
    CreateCaseRequest, DeclineCaseRequest, FireStaffRequest, GuildConfigInfo,
    HandlerDependencies, HireStaffRequest, InvocationContext, ListCasesRequest,
    PermissionSummaryInfo, ReassignLawyerRequest, ReassignmentInfo, StaffInfo,
    UpdateGuildConfigRequest, UpdatePriorityRequest,
};
use anarchy_persistence::{Database, Repositories};
use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::gateway::LoggingDiscord;

/// Anarchy & Associates Server - HTTP delivery for the law-firm bot's slash commands
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Attempts per compensating action when a case transaction rolls back
    #[arg(long, default_value_t = 3)]
    compensation_attempts: u32,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The command layer. Its repositories serialize database access.
    handlers: Arc<CommandHandlers>,
}

/// A slash command as delivered by the gateway: who invoked it, and its options.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct Invocation<T> {
    context: InvocationContext,
    #[serde(flatten)]
    request: T,
}

/// A command with no options.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ContextOnly {
    context: InvocationContext,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
    /// Individual validation errors, when there are several.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    /// Token the guild owner passes to `/bypass/confirm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confirmation_token: Option<String>,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
    errors: Vec<String>,
    confirmation_token: Option<String>,
}

impl HttpError {
    const fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            errors: Vec::new(),
            confirmation_token: None,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            errors: self.errors,
            confirmation_token: self.confirmation_token,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let message: String = err.to_string();
        match err {
            ApiError::Unauthorized { .. } => Self::new(StatusCode::FORBIDDEN, message),
            ApiError::ValidationFailed { errors } => Self {
                errors,
                ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
            },
            ApiError::ConfirmationRequired { token, errors } => Self {
                errors,
                confirmation_token: Some(token),
                ..Self::new(StatusCode::CONFLICT, message)
            },
            ApiError::ResourceNotFound { .. } => Self::new(StatusCode::NOT_FOUND, message),
            ApiError::DomainRuleViolation { .. } => Self::new(StatusCode::CONFLICT, message),
            ApiError::InvalidInput { .. } => Self::new(StatusCode::BAD_REQUEST, message),
            ApiError::Internal { .. } => Self::new(StatusCode::INTERNAL_SERVER_ERROR, message),
        }
    }
}

/// Runs a command on the blocking pool; the command layer is synchronous.
async fn run_command<T, F>(app_state: &AppState, command: F) -> Result<Json<T>, HttpError>
where
    T: Send + 'static,
    F: FnOnce(&CommandHandlers) -> Result<T, ApiError> + Send + 'static,
{
    let handlers: Arc<CommandHandlers> = Arc::clone(&app_state.handlers);
    let outcome: Result<T, ApiError> = tokio::task::spawn_blocking(move || command(&handlers))
        .await
        .map_err(|err| {
            error!(error = %err, "Command task failed");
            HttpError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("Command task failed"),
            )
        })?;
    outcome.map(Json).map_err(HttpError::from)
}

/// Handler for POST `/staff/hire` endpoint.
async fn handle_hire_staff(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<HireStaffRequest>>,
) -> Result<Json<CommandResponse<StaffInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        target = %req.request.user_id,
        role = %req.request.role,
        "Handling hire_staff request"
    );
    run_command(&app_state, move |handlers| {
        handlers.hire_staff(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/staff/fire` endpoint.
async fn handle_fire_staff(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<FireStaffRequest>>,
) -> Result<Json<CommandResponse<StaffInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        target = %req.request.user_id,
        "Handling fire_staff request"
    );
    run_command(&app_state, move |handlers| {
        handlers.fire_staff(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/staff/promote` endpoint.
async fn handle_promote_staff(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<ChangeRoleRequest>>,
) -> Result<Json<CommandResponse<StaffInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        target = %req.request.user_id,
        role = %req.request.role,
        "Handling promote_staff request"
    );
    run_command(&app_state, move |handlers| {
        handlers.promote_staff(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/staff/demote` endpoint.
async fn handle_demote_staff(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<ChangeRoleRequest>>,
) -> Result<Json<CommandResponse<StaffInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        target = %req.request.user_id,
        role = %req.request.role,
        "Handling demote_staff request"
    );
    run_command(&app_state, move |handlers| {
        handlers.demote_staff(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/staff/list` endpoint.
async fn handle_list_staff(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ContextOnly>,
) -> Result<Json<Vec<StaffInfo>>, HttpError> {
    info!(guild_id = %req.context.guild_id, "Handling list_staff request");
    run_command(&app_state, move |handlers| handlers.list_staff(&req.context)).await
}

/// Handler for POST `/cases/create` endpoint.
async fn handle_create_case(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<CreateCaseRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        client_id = %req.context.user_id,
        "Handling create_case request"
    );
    run_command(&app_state, move |handlers| {
        handlers.create_case(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/accept` endpoint.
async fn handle_accept_case(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<AcceptCaseRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        case_id = req.request.case_id,
        "Handling accept_case request"
    );
    run_command(&app_state, move |handlers| {
        handlers.accept_case(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/decline` endpoint.
async fn handle_decline_case(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<DeclineCaseRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        case_id = req.request.case_id,
        "Handling decline_case request"
    );
    run_command(&app_state, move |handlers| {
        handlers.decline_case(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/close` endpoint.
async fn handle_close_case(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<CloseCaseRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        case_id = req.request.case_id,
        result = %req.request.result,
        "Handling close_case request"
    );
    run_command(&app_state, move |handlers| {
        handlers.close_case(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/assign` endpoint.
async fn handle_assign_lawyer(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<CaseLawyerRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        case_id = req.request.case_id,
        lawyer_id = %req.request.lawyer_id,
        "Handling assign_lawyer request"
    );
    run_command(&app_state, move |handlers| {
        handlers.assign_lawyer(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/unassign` endpoint.
async fn handle_unassign_lawyer(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<CaseLawyerRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        case_id = req.request.case_id,
        lawyer_id = %req.request.lawyer_id,
        "Handling unassign_lawyer request"
    );
    run_command(&app_state, move |handlers| {
        handlers.unassign_lawyer(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/reassign` endpoint.
async fn handle_reassign_lawyer(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<ReassignLawyerRequest>>,
) -> Result<Json<CommandResponse<ReassignmentInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        from_case_id = req.request.from_case_id,
        to_case_id = req.request.to_case_id,
        lawyer_id = %req.request.lawyer_id,
        "Handling reassign_lawyer request"
    );
    run_command(&app_state, move |handlers| {
        handlers.reassign_lawyer(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/lead` endpoint.
async fn handle_set_lead_attorney(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<CaseLawyerRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        case_id = req.request.case_id,
        lawyer_id = %req.request.lawyer_id,
        "Handling set_lead_attorney request"
    );
    run_command(&app_state, move |handlers| {
        handlers.set_lead_attorney(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/notes` endpoint.
async fn handle_add_note(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<AddNoteRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        case_id = req.request.case_id,
        internal = req.request.is_internal,
        "Handling add_note request"
    );
    run_command(&app_state, move |handlers| {
        handlers.add_note(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/priority` endpoint.
async fn handle_update_priority(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<UpdatePriorityRequest>>,
) -> Result<Json<CommandResponse<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        case_id = req.request.case_id,
        priority = %req.request.priority,
        "Handling update_priority request"
    );
    run_command(&app_state, move |handlers| {
        handlers.update_priority(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/list` endpoint.
async fn handle_list_cases(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<ListCasesRequest>>,
) -> Result<Json<CommandResponse<Vec<CaseInfo>>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        status = %req.request.status,
        "Handling list_cases request"
    );
    run_command(&app_state, move |handlers| {
        handlers.list_cases(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/cases/mine` endpoint.
async fn handle_my_cases(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ContextOnly>,
) -> Result<Json<Vec<CaseInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        "Handling my_cases request"
    );
    run_command(&app_state, move |handlers| handlers.my_cases(&req.context)).await
}

/// Handler for POST `/cases/{case_id}` endpoint.
async fn handle_get_case(
    AxumState(app_state): AxumState<AppState>,
    Path(case_id): Path<i64>,
    Json(req): Json<ContextOnly>,
) -> Result<Json<CaseInfo>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        case_id = case_id,
        "Handling get_case request"
    );
    run_command(&app_state, move |handlers| {
        handlers.get_case(&req.context, case_id)
    })
    .await
}

/// Handler for POST `/config` endpoint.
async fn handle_get_guild_config(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ContextOnly>,
) -> Result<Json<GuildConfigInfo>, HttpError> {
    info!(guild_id = %req.context.guild_id, "Handling get_guild_config request");
    run_command(&app_state, move |handlers| {
        handlers.get_guild_config(&req.context)
    })
    .await
}

/// Handler for POST `/config/update` endpoint.
async fn handle_update_guild_config(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<UpdateGuildConfigRequest>>,
) -> Result<Json<CommandResponse<GuildConfigInfo>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        "Handling update_guild_config request"
    );
    run_command(&app_state, move |handlers| {
        handlers.update_guild_config(&req.context, &req.request)
    })
    .await
}

/// Handler for POST `/permissions` endpoint.
async fn handle_permission_summary(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ContextOnly>,
) -> Result<Json<PermissionSummaryInfo>, HttpError> {
    run_command(&app_state, move |handlers| {
        Ok(handlers.permission_summary(&req.context))
    })
    .await
}

/// Handler for POST `/bypass/confirm` endpoint.
///
/// Re-runs a command the guild owner was asked to confirm.
async fn handle_confirm_bypass(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Invocation<ConfirmBypassRequest>>,
) -> Result<Json<CommandResponse<ConfirmedCommand>>, HttpError> {
    info!(
        guild_id = %req.context.guild_id,
        user_id = %req.context.user_id,
        "Handling confirm_bypass request"
    );
    run_command(&app_state, move |handlers| {
        handlers.confirm_bypass(&req.context, &req.request)
    })
    .await
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/staff/hire", post(handle_hire_staff))
        .route("/staff/fire", post(handle_fire_staff))
        .route("/staff/promote", post(handle_promote_staff))
        .route("/staff/demote", post(handle_demote_staff))
        .route("/staff/list", post(handle_list_staff))
        .route("/cases/create", post(handle_create_case))
        .route("/cases/accept", post(handle_accept_case))
        .route("/cases/decline", post(handle_decline_case))
        .route("/cases/close", post(handle_close_case))
        .route("/cases/assign", post(handle_assign_lawyer))
        .route("/cases/unassign", post(handle_unassign_lawyer))
        .route("/cases/reassign", post(handle_reassign_lawyer))
        .route("/cases/lead", post(handle_set_lead_attorney))
        .route("/cases/notes", post(handle_add_note))
        .route("/cases/priority", post(handle_update_priority))
        .route("/cases/list", post(handle_list_cases))
        .route("/cases/mine", post(handle_my_cases))
        .route("/cases/{case_id}", post(handle_get_case))
        .route("/config", post(handle_get_guild_config))
        .route("/config/update", post(handle_update_guild_config))
        .route("/permissions", post(handle_permission_summary))
        .route("/bypass/confirm", post(handle_confirm_bypass))
        .with_state(app_state)
}

/// Wires the command layer over one database with a logging Discord gateway.
fn build_handlers(database: &Arc<Database>, rollback: RollbackConfig) -> CommandHandlers {
    let repos: Repositories = Repositories::new(database);
    let discord: Arc<LoggingDiscord> = Arc::new(LoggingDiscord);
    CommandHandlers::new(HandlerDependencies {
        staff: repos.staff.clone(),
        cases: repos.cases.clone(),
        counters: repos.counters.clone(),
        guild_configs: repos.guild_configs.clone(),
        reminders: repos.reminders.clone(),
        audit: repos.audit_sink(),
        unit_of_work_factory: repos.unit_of_work_factory.clone(),
        channels: discord.clone(),
        notifier: discord,
        rollback,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Anarchy & Associates Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let database: Database = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Database::new(db_path)
    } else {
        info!("Using in-memory database");
        Database::new_in_memory()
    };
    database.connect()?;
    let database: Arc<Database> = Arc::new(database);

    let rollback: RollbackConfig = RollbackConfig {
        max_attempts: args.compensation_attempts.max(1),
    };
    let app_state: AppState = AppState {
        handlers: Arc::new(build_handlers(&database, rollback)),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
