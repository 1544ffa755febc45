pub mod get_message;
pub mod get_message_logs;
pub mod list_messages;
pub mod reset_message;
pub mod run_dispatch_cycle;
pub mod schedule_message;
