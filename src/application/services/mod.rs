pub mod recipient_resolver;
pub mod rescheduler;
pub mod sms;
pub mod template;
