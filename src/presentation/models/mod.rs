use poem_openapi::Enum;

use crate::{
    application::usecases::run_dispatch_cycle::MessageCycleStatus,
    domain::models::{DeliveryStatus, MessageCategory, MessageStatus, RecipientKind, Recurrence},
};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[oai(rename_all = "snake_case")]
pub enum MessageCategoryKind {
    OneOff,
    RecurringGroup,
    Birthday,
}

impl From<MessageCategoryKind> for MessageCategory {
    fn from(value: MessageCategoryKind) -> Self {
        match value {
            MessageCategoryKind::OneOff => MessageCategory::OneOff,
            MessageCategoryKind::RecurringGroup => MessageCategory::RecurringGroup,
            MessageCategoryKind::Birthday => MessageCategory::Birthday,
        }
    }
}

impl From<MessageCategory> for MessageCategoryKind {
    fn from(value: MessageCategory) -> Self {
        match value {
            MessageCategory::OneOff => MessageCategoryKind::OneOff,
            MessageCategory::RecurringGroup => MessageCategoryKind::RecurringGroup,
            MessageCategory::Birthday => MessageCategoryKind::Birthday,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[oai(rename_all = "snake_case")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Default for RecurrenceKind {
    fn default() -> Self {
        RecurrenceKind::None
    }
}

impl From<RecurrenceKind> for Recurrence {
    fn from(value: RecurrenceKind) -> Self {
        match value {
            RecurrenceKind::None => Recurrence::None,
            RecurrenceKind::Daily => Recurrence::Daily,
            RecurrenceKind::Weekly => Recurrence::Weekly,
            RecurrenceKind::Monthly => Recurrence::Monthly,
            RecurrenceKind::Yearly => Recurrence::Yearly,
        }
    }
}

impl From<Recurrence> for RecurrenceKind {
    fn from(value: Recurrence) -> Self {
        match value {
            Recurrence::None => RecurrenceKind::None,
            Recurrence::Daily => RecurrenceKind::Daily,
            Recurrence::Weekly => RecurrenceKind::Weekly,
            Recurrence::Monthly => RecurrenceKind::Monthly,
            Recurrence::Yearly => RecurrenceKind::Yearly,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[oai(rename_all = "snake_case")]
pub enum RecipientKindDto {
    Member,
    Group,
}

impl From<RecipientKindDto> for RecipientKind {
    fn from(value: RecipientKindDto) -> Self {
        match value {
            RecipientKindDto::Member => RecipientKind::Member,
            RecipientKindDto::Group => RecipientKind::Group,
        }
    }
}

impl From<RecipientKind> for RecipientKindDto {
    fn from(value: RecipientKind) -> Self {
        match value {
            RecipientKind::Member => RecipientKindDto::Member,
            RecipientKind::Group => RecipientKindDto::Group,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[oai(rename_all = "snake_case")]
pub enum MessageStatusDto {
    Active,
    Scheduled,
    Processing,
    Completed,
    Error,
}

impl From<MessageStatus> for MessageStatusDto {
    fn from(value: MessageStatus) -> Self {
        match value {
            MessageStatus::Active => MessageStatusDto::Active,
            MessageStatus::Scheduled => MessageStatusDto::Scheduled,
            MessageStatus::Processing => MessageStatusDto::Processing,
            MessageStatus::Completed => MessageStatusDto::Completed,
            MessageStatus::Error => MessageStatusDto::Error,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[oai(rename_all = "snake_case")]
pub enum DeliveryStatusDto {
    Sent,
    Failed,
    SkippedDuplicate,
}

impl From<DeliveryStatus> for DeliveryStatusDto {
    fn from(value: DeliveryStatus) -> Self {
        match value {
            DeliveryStatus::Sent => DeliveryStatusDto::Sent,
            DeliveryStatus::Failed => DeliveryStatusDto::Failed,
            DeliveryStatus::SkippedDuplicate => DeliveryStatusDto::SkippedDuplicate,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[oai(rename_all = "snake_case")]
pub enum CycleStatusDto {
    Completed,
    Scheduled,
    Active,
    Error,
    Skipped,
}

impl From<MessageCycleStatus> for CycleStatusDto {
    fn from(value: MessageCycleStatus) -> Self {
        match value {
            MessageCycleStatus::Completed => CycleStatusDto::Completed,
            MessageCycleStatus::Scheduled => CycleStatusDto::Scheduled,
            MessageCycleStatus::Active => CycleStatusDto::Active,
            MessageCycleStatus::Error => CycleStatusDto::Error,
            MessageCycleStatus::Skipped => CycleStatusDto::Skipped,
        }
    }
}
