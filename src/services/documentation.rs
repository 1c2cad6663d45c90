use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the pickleball scoreboard.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::board::get_board,
        crate::routes::board::start_rally,
        crate::routes::board::record_rally,
        crate::routes::board::undo,
        crate::routes::board::reset,
        crate::routes::board::call_timeout,
        crate::routes::board::get_tally,
        crate::routes::board::update_setup,
        crate::routes::board::pick_serve,
        crate::routes::board::swap_sides,
        crate::routes::board::swap_rows,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::board::BoardView,
            crate::dto::board::ScoresView,
            crate::dto::board::TimeoutsView,
            crate::dto::board::RallyRequest,
            crate::dto::board::RallyResponse,
            crate::dto::board::TimeoutRequest,
            crate::dto::board::TimeoutResponse,
            crate::dto::board::ServePickRequest,
            crate::dto::board::SetupRequest,
            crate::dto::board::UndoResponse,
            crate::dto::board::TallyView,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::BoardResetEvent,
            crate::state::tally::TallyBox,
            crate::state::tally::Mark,
            crate::state::rally::UiTeam,
            crate::state::rally::Row,
            crate::state::rally::Badge,
            crate::state::rally::Badges,
            crate::state::rally::Orientation,
            crate::state::rally::Players,
            crate::state::rally::Corner,
            crate::state::rally::ServePick,
            crate::state::rally::RallyOutcome,
            crate::state::board::MatchPhase,
            crate::state::board::RallyStatus,
            crate::state::undo::UndoOutcome,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "board", description = "Scoring, undo and tally"),
        (name = "setup", description = "Pre-match names, sides and serve pick"),
    )
)]
pub struct ApiDoc;
