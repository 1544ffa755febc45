pub mod member;
pub mod message;
pub mod outcome;
pub mod provider;
pub mod recipient;

pub use member::{Member, MemberStatus};
pub use message::{Message, MessageCategory, MessageStatus, NewMessage, Recurrence};
pub use outcome::{DeliveryStatus, NewOutcomeLog, OutcomeLog};
pub use provider::{SmsProviderConfig, SmsProviderKind};
pub use recipient::{NewRecipientSpec, RecipientKind, RecipientSpec};
