use crate::{
    application::{
        handlers::message_dispatcher::RecipientOutcome,
        usecases::run_dispatch_cycle::{CycleReport, MessageReport},
    },
    domain::models::{DeliveryStatus, Message, OutcomeLog, RecipientSpec},
    presentation::http::responses::{
        DispatchSummaryDto, DispatchTotalsDto, MessageDto, MessageResultDto, OutcomeLogDto,
        RecipientResultDto, RecipientSpecDto,
    },
};

pub fn map_message(message: &Message) -> MessageDto {
    MessageDto {
        id: message.id,
        name: message.name.clone(),
        body: message.body.clone(),
        category: message.category.into(),
        recurrence: message.recurrence.into(),
        next_fire_at: message.next_fire_at,
        recurrence_end_at: message.recurrence_end_at,
        status: message.status.into(),
        last_error: message.last_error.clone(),
        recipients: message.recipients.iter().map(map_recipient_spec).collect(),
        created_at: message.created_at,
        updated_at: message.updated_at,
    }
}

fn map_recipient_spec(spec: &RecipientSpec) -> RecipientSpecDto {
    RecipientSpecDto {
        id: spec.id,
        kind: spec.kind.into(),
        target_id: spec.target_id,
    }
}

pub fn map_outcome_log(log: &OutcomeLog) -> OutcomeLogDto {
    OutcomeLogDto {
        id: log.id,
        message_id: log.message_id,
        member_id: log.member_id,
        occurrence_at: log.occurrence_at,
        status: log.status.into(),
        provider_message_id: log.provider_message_id.clone(),
        error: log.error.clone(),
        created_at: log.created_at,
    }
}

pub fn map_cycle_report(report: &CycleReport) -> DispatchSummaryDto {
    let totals = report.totals();
    DispatchSummaryDto {
        success: true,
        processed: report.processed(),
        reclaimed: report.reclaimed,
        expired: report.expired,
        totals: DispatchTotalsDto {
            sent: totals.sent,
            failed: totals.failed,
            skipped: totals.skipped,
        },
        results: report.results.iter().map(map_message_report).collect(),
        error: None,
    }
}

fn map_message_report(report: &MessageReport) -> MessageResultDto {
    MessageResultDto {
        message_id: report.message_id,
        name: report.name.clone(),
        status: report.status.into(),
        error: report.error.clone(),
        sent: report.count(DeliveryStatus::Sent),
        failed: report.count(DeliveryStatus::Failed),
        skipped: report.count(DeliveryStatus::SkippedDuplicate),
        recipient_results: report.recipients.iter().map(map_recipient_outcome).collect(),
    }
}

fn map_recipient_outcome(outcome: &RecipientOutcome) -> RecipientResultDto {
    RecipientResultDto {
        member_id: outcome.member_id,
        recipient_spec_id: outcome.spec_id,
        phone: outcome.phone.clone(),
        status: outcome.status.into(),
        provider_message_id: outcome.provider_message_id.clone(),
        error: outcome.error.clone(),
    }
}
