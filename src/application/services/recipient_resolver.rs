use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    models::{Member, MemberStatus, RecipientKind, RecipientSpec},
    repositories::MemberDirectory,
    value_objects::PhoneNumber,
};

/// A member that passed eligibility checks, with its normalised number.
#[derive(Debug, Clone)]
pub struct ResolvedRecipient {
    pub spec_id: Option<Uuid>,
    pub member: Member,
    pub phone: PhoneNumber,
}

/// A recipient spec (or one member of it) that could not be addressed.
#[derive(Debug, Clone)]
pub struct RecipientFailure {
    pub spec_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub recipients: Vec<ResolvedRecipient>,
    pub failures: Vec<RecipientFailure>,
}

pub struct RecipientResolver {
    directory: Arc<dyn MemberDirectory>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn MemberDirectory>) -> Self {
        Self { directory }
    }

    /// Resolves every spec of a message. Members reachable through more than
    /// one spec are kept once, at their first position.
    pub async fn resolve_all(&self, specs: &[RecipientSpec]) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();

        for spec in specs {
            match self.resolve(spec).await {
                Ok(recipients) => {
                    for recipient in recipients {
                        if seen.insert(recipient.member.id) {
                            resolution.recipients.push(recipient);
                        }
                    }
                }
                Err(failure) => {
                    tracing::warn!(
                        spec_id = %spec.id,
                        target_id = %spec.target_id,
                        reason = %failure.reason,
                        "recipient spec could not be resolved"
                    );
                    resolution.failures.push(failure);
                }
            }
        }

        resolution
    }

    pub async fn resolve(
        &self,
        spec: &RecipientSpec,
    ) -> Result<Vec<ResolvedRecipient>, RecipientFailure> {
        match spec.kind {
            RecipientKind::Member => self.resolve_member(spec).await.map(|r| vec![r]),
            RecipientKind::Group => self.resolve_group(spec).await,
        }
    }

    async fn resolve_member(&self, spec: &RecipientSpec) -> Result<ResolvedRecipient, RecipientFailure> {
        let fail = |member_id: Option<Uuid>, reason: String| RecipientFailure {
            spec_id: Some(spec.id),
            member_id,
            reason,
        };

        let member = self
            .directory
            .get(spec.target_id)
            .await
            .map_err(|err| fail(Some(spec.target_id), format!("member lookup failed: {err}")))?
            .ok_or_else(|| fail(Some(spec.target_id), "member not found".to_string()))?;

        eligible(member, Some(spec.id)).map_err(|(member_id, reason)| fail(Some(member_id), reason))
    }

    async fn resolve_group(
        &self,
        spec: &RecipientSpec,
    ) -> Result<Vec<ResolvedRecipient>, RecipientFailure> {
        let members = self.group_members(spec.target_id).await.map_err(|err| RecipientFailure {
            spec_id: Some(spec.id),
            member_id: None,
            reason: format!("group lookup failed: {err}"),
        })?;

        let mut seen = HashSet::new();
        let mut recipients = Vec::new();
        for member in members {
            if !seen.insert(member.id) {
                continue;
            }
            match eligible(member, Some(spec.id)) {
                Ok(recipient) => recipients.push(recipient),
                Err((member_id, reason)) => {
                    tracing::debug!(%member_id, group_id = %spec.target_id, %reason, "skipping group member");
                }
            }
        }

        if recipients.is_empty() {
            return Err(RecipientFailure {
                spec_id: Some(spec.id),
                member_id: None,
                reason: "no members found".to_string(),
            });
        }
        Ok(recipients)
    }

    /// Membership table first; the denormalised `group_id` column when the
    /// table is absent or has no rows for the group.
    async fn group_members(&self, group_id: Uuid) -> anyhow::Result<Vec<Member>> {
        if let Some(members) = self.directory.members_via_membership(group_id).await? {
            if !members.is_empty() {
                return Ok(members);
            }
        }
        self.directory.members_via_group_key(group_id).await
    }
}

/// Checks status and contact address. On rejection returns the member id and
/// the reason.
pub fn eligible(
    member: Member,
    spec_id: Option<Uuid>,
) -> Result<ResolvedRecipient, (Uuid, String)> {
    if member.status != MemberStatus::Active {
        return Err((member.id, "member not active".to_string()));
    }
    let phone = member.contact().map_err(|reason| (member.id, reason))?;
    Ok(ResolvedRecipient {
        spec_id,
        member,
        phone,
    })
}
