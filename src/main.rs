use std::io::Error;
use std::sync::Arc;

use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing_subscriber::EnvFilter;

use sms_dispatch::{
    application::{
        handlers::message_dispatcher::MessageDispatchHandler,
        services::sms::SmsGateway,
        usecases::{
            get_message::GetMessageUseCase,
            get_message_logs::GetMessageLogsUseCase,
            list_messages::ListMessagesUseCase,
            reset_message::ResetMessageUseCase,
            run_dispatch_cycle::{DispatchCycleConfig, RunDispatchCycleUseCase},
            schedule_message::ScheduleMessageUseCase,
        },
    },
    config::{Config, StorageKind},
    domain::repositories::{
        MemberDirectory, MessageRepository, OutcomeLogRepository, SmsProviderRepository,
    },
    infrastructure::{
        messaging::{console::ConsoleTransport, twilio::TwilioTransport},
        repositories::{
            in_memory::{
                InMemoryMemberDirectory, InMemoryMessageRepository, InMemoryOutcomeLogRepository,
                InMemorySmsProviderRepository,
            },
            postgres::{
                PostgresMemberDirectory, PostgresMessageRepository, PostgresOutcomeLogRepository,
                PostgresSmsProviderRepository,
            },
        },
    },
    presentation::http::endpoints::root::{ApiState, endpoints},
};

struct Repositories {
    messages: Arc<dyn MessageRepository>,
    outcomes: Arc<dyn OutcomeLogRepository>,
    members: Arc<dyn MemberDirectory>,
    providers: Arc<dyn SmsProviderRepository>,
}

async fn repositories(config: &Config) -> anyhow::Result<Repositories> {
    match (config.storage, config.database_url.as_deref()) {
        (StorageKind::Postgres, Some(url)) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("database migrations applied");

            Ok(Repositories {
                messages: PostgresMessageRepository::new(pool.clone()),
                outcomes: PostgresOutcomeLogRepository::new(pool.clone()),
                members: PostgresMemberDirectory::new(pool.clone()),
                providers: PostgresSmsProviderRepository::new(pool),
            })
        }
        (StorageKind::Postgres, None) => anyhow::bail!("DATABASE_URL is required for postgres storage"),
        (StorageKind::Memory, _) => {
            tracing::warn!("using in-memory storage, nothing will be persisted");
            Ok(Repositories {
                messages: Arc::new(InMemoryMessageRepository::new()),
                outcomes: Arc::new(InMemoryOutcomeLogRepository::new()),
                members: Arc::new(InMemoryMemberDirectory::new()),
                providers: Arc::new(InMemorySmsProviderRepository::new()),
            })
        }
    }
}

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::try_parse().map_err(Error::other)?;
    let repos = repositories(&config).await.map_err(Error::other)?;

    let gateway = SmsGateway::new(vec![
        TwilioTransport::new().map_err(Error::other)?,
        ConsoleTransport::new(),
    ]);

    let run_dispatch_cycle_usecase = RunDispatchCycleUseCase::new(
        repos.messages.clone(),
        repos.providers.clone(),
        repos.members.clone(),
        MessageDispatchHandler::new(repos.outcomes.clone()),
        gateway,
        DispatchCycleConfig {
            lookback: config.lookback,
            stale_after: config.stale_after,
        },
    );

    let state = Arc::new(ApiState {
        run_dispatch_cycle_usecase: Arc::new(run_dispatch_cycle_usecase),
        schedule_message_usecase: Arc::new(ScheduleMessageUseCase::new(repos.messages.clone())),
        list_messages_usecase: Arc::new(ListMessagesUseCase::new(repos.messages.clone())),
        get_message_usecase: Arc::new(GetMessageUseCase::new(repos.messages.clone())),
        get_message_logs_usecase: Arc::new(GetMessageLogsUseCase::new(
            repos.messages.clone(),
            repos.outcomes.clone(),
        )),
        reset_message_usecase: Arc::new(ResetMessageUseCase::new(repos.messages.clone())),
        cron_secret: config.cron_secret.clone(),
        admin_token: config.admin_token.clone(),
    });

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);
    tracing::info!(%server_url, "starting server");

    let api_service = OpenApiService::new(endpoints(state), "SMS Dispatch API", "0.1.0")
        .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await
}
