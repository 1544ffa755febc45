use std::sync::Arc;

use poem_openapi::{OpenApi, Tags};

use crate::application::usecases::{
    get_message::GetMessageUseCase, get_message_logs::GetMessageLogsUseCase,
    list_messages::ListMessagesUseCase, reset_message::ResetMessageUseCase,
    run_dispatch_cycle::RunDispatchCycleUseCase, schedule_message::ScheduleMessageUseCase,
};
use crate::presentation::http::endpoints::{
    dispatch::DispatchEndpoints, health::HealthEndpoints, messages::MessagesEndpoints,
};

pub struct ApiState {
    pub run_dispatch_cycle_usecase: Arc<RunDispatchCycleUseCase>,
    pub schedule_message_usecase: Arc<ScheduleMessageUseCase>,
    pub list_messages_usecase: Arc<ListMessagesUseCase>,
    pub get_message_usecase: Arc<GetMessageUseCase>,
    pub get_message_logs_usecase: Arc<GetMessageLogsUseCase>,
    pub reset_message_usecase: Arc<ResetMessageUseCase>,
    pub cron_secret: String,
    pub admin_token: String,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Dispatch,
    Messages,
}

pub fn endpoints(state: Arc<ApiState>) -> impl OpenApi {
    (
        HealthEndpoints,
        DispatchEndpoints::new(state.clone()),
        MessagesEndpoints::new(state),
    )
}
