//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    AgentStatusResponse, ChatReplyDto, ChatRequest, ChatResponse, CreateSessionResponse,
    HistoryResponse, JoinWaitlistRequest, MessageDto, ProfileDto, ProfileRequest,
    SuccessResponse, TransactionDto, TransactionListResponse, TransactionRequest,
    UpdateStatusRequest, WaitlistCheckResponse, WaitlistCountResponse, WaitlistEntryDto,
    WaitlistListResponse,
};
use crate::api::handlers::{admin, agent, system, users, waitlist};
use crate::domain::WaitlistStatus;
use crate::error::ErrorResponse;

/// Generated OpenAPI description, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "cryptochat-gateway",
        description = "Chat relay, session history, user profiles and waitlist API"
    ),
    paths(
        system::health_handler,
        agent::chat,
        agent::create_session,
        agent::history,
        agent::delete_session,
        agent::status,
        users::get_profile,
        users::upsert_profile,
        users::list_transactions,
        users::add_transaction,
        waitlist::check,
        waitlist::join,
        waitlist::count,
        admin::list_waitlist,
        admin::update_status,
    ),
    components(schemas(
        ErrorResponse,
        system::HealthResponse,
        ChatRequest,
        ChatResponse,
        ChatReplyDto,
        CreateSessionResponse,
        HistoryResponse,
        MessageDto,
        AgentStatusResponse,
        SuccessResponse,
        ProfileRequest,
        ProfileDto,
        TransactionRequest,
        TransactionDto,
        TransactionListResponse,
        JoinWaitlistRequest,
        WaitlistEntryDto,
        WaitlistCheckResponse,
        WaitlistCountResponse,
        WaitlistListResponse,
        UpdateStatusRequest,
        WaitlistStatus,
    )),
    tags(
        (name = "System", description = "Health"),
        (name = "Agent", description = "Chat relay and sessions"),
        (name = "Users", description = "Profiles and transactions"),
        (name = "Waitlist", description = "Pre-launch registration"),
        (name = "Admin", description = "Waitlist review"),
    )
)]
pub struct ApiDoc;
