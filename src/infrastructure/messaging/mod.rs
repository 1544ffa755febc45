pub mod console;
pub mod twilio;
