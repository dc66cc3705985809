//! Resource lifecycle state machine.
//!
//! Governs how a resource moves between ownership/acknowledgment states:
//! Unassigned → Assigned → Acknowledged/Disputed. Transitions mutate the
//! in-memory resource and report which notifications must go out; the caller
//! persists the resource through a single save so the change-history engine
//! journals the transition atomically with the field changes.

use thiserror::Error;
use uuid::Uuid;

use crate::models::resource::{Resource, ResourceStatus, UserRef};
use crate::services::notification::NotificationRequest;

/// Per-request actor and tenant, threaded explicitly through every lifecycle
/// operation. Built once at the request boundary.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: UserRef,
    pub org_id: Uuid,
}

/// Rejections surfaced to the caller before any mutation happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Outcome of a lifecycle operation.
#[derive(Debug, PartialEq)]
pub enum Transition {
    /// Fields changed; the resource must be saved and the listed
    /// notifications dispatched after the save commits.
    Applied {
        notifications: Vec<NotificationRequest>,
    },
    /// Logged no-op; nothing to save, nothing to send.
    NoOp,
}

impl Transition {
    fn applied(notifications: Vec<NotificationRequest>) -> Self {
        Transition::Applied { notifications }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// Cross-tenant isolation check, run before any lifecycle logic.
///
/// A resource outside the acting user's org is reported as not found rather
/// than forbidden so its existence is not revealed.
pub fn ensure_same_org(resource: &Resource, ctx: &RequestContext) -> Result<(), LifecycleError> {
    if resource.org_id == ctx.org_id {
        Ok(())
    } else {
        Err(LifecycleError::NotFound(format!(
            "Resource {} not found",
            resource.id
        )))
    }
}

/// Reassign the resource to a new owner.
///
/// Snapshots the prior owner into `previous_user`, resets the status to
/// Assigned and requests an assignment notification to the new owner with
/// acknowledge/deny action links.
pub fn reassign(resource: &mut Resource, new_owner: UserRef) -> Transition {
    let prior_owner = std::mem::replace(&mut resource.current_user, new_owner);
    resource.previous_user = Some(prior_owner);
    resource.status = ResourceStatus::Assigned;

    tracing::info!(
        device = %resource.name,
        cur_user = %resource.current_user.email,
        prev_user = %resource.previous_user.as_ref().map(|u| u.email.as_str()).unwrap_or("-"),
        "Resource reassigned"
    );

    Transition::applied(vec![NotificationRequest::Assignment {
        to: resource.current_user.email.clone(),
        cur_user: resource.current_user.name.clone(),
        prev_user: resource.previous_user.as_ref().map(|u| u.name.clone()),
        device_name: resource.name.clone(),
        ack_path: resource.acknowledge_path(),
        deny_path: resource.deny_path(),
    }])
}

/// Acknowledge possession of the resource.
///
/// Only the current owner may acknowledge. Re-acknowledging an already
/// acknowledged resource is a logged no-op.
pub fn acknowledge(
    resource: &mut Resource,
    ctx: &RequestContext,
) -> Result<Transition, LifecycleError> {
    ensure_same_org(resource, ctx)?;
    if resource.current_user.id != ctx.actor.id {
        return Err(LifecycleError::Forbidden(
            "Trying to ack a resource which you do not own".into(),
        ));
    }

    if resource.status == ResourceStatus::Acknowledged {
        tracing::info!(
            device = %resource.name,
            user = %ctx.actor.email,
            "Device already in ACKd state"
        );
        return Ok(Transition::NoOp);
    }

    resource.status = ResourceStatus::Acknowledged;
    tracing::info!(device = %resource.name, user = %ctx.actor.email, "Device ACKd by user");
    Ok(Transition::applied(Vec::new()))
}

/// Deny possessing the resource, placing it in dispute.
///
/// Only the current owner may dispute. A resource already in dispute is a
/// logged no-op. A dispute notifies the current user, the device admin and
/// the previous user (when there is one).
pub fn dispute(
    resource: &mut Resource,
    ctx: &RequestContext,
) -> Result<Transition, LifecycleError> {
    ensure_same_org(resource, ctx)?;
    if resource.current_user.id != ctx.actor.id {
        return Err(LifecycleError::Forbidden(
            "Trying to deny a resource which you do not own".into(),
        ));
    }

    if resource.status == ResourceStatus::Disputed {
        tracing::info!(
            device = %resource.name,
            user = %ctx.actor.email,
            "Device already in Disputed state"
        );
        return Ok(Transition::NoOp);
    }

    resource.status = ResourceStatus::Disputed;
    tracing::info!(device = %resource.name, user = %ctx.actor.email, "Device disputed by user");

    let mut to = vec![
        resource.current_user.email.clone(),
        resource.device_admin.email.clone(),
    ];
    if let Some(prev) = &resource.previous_user {
        to.push(prev.email.clone());
    }

    Ok(Transition::applied(vec![NotificationRequest::Dispute {
        to,
        cur_user: resource.current_user.name.clone(),
        prev_user: resource.previous_user.as_ref().map(|u| u.name.clone()),
        device_admin: resource.device_admin.name.clone(),
        device_name: resource.name.clone(),
        device_path: resource.detail_path(),
    }]))
}

/// Only the device admin may delete a resource.
pub fn authorize_delete(resource: &Resource, ctx: &RequestContext) -> Result<(), LifecycleError> {
    ensure_same_org(resource, ctx)?;
    if resource.device_admin.id != ctx.actor.id {
        return Err(LifecycleError::Forbidden(
            "Only the device admin may delete a resource".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::{HistoryLog, StoredHistory};
    use crate::services::history::{Audited, ChangeTracker, HistoryPolicy};
    use chrono::Utc;
    use serde_json::json;

    fn user(name: &str) -> UserRef {
        UserRef {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn resource(owner: &UserRef, admin: &UserRef, org_id: Uuid) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            name: "Laptop-12".into(),
            serial_num: "SN-12".into(),
            current_user: owner.clone(),
            previous_user: None,
            device_admin: admin.clone(),
            status: ResourceStatus::Assigned,
            description: String::new(),
            org_id,
            history: StoredHistory::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ctx_for(actor: &UserRef, org_id: Uuid) -> RequestContext {
        RequestContext {
            actor: actor.clone(),
            org_id,
        }
    }

    #[test]
    fn test_reassign_sets_previous_user_and_status() {
        let alice = user("Alice");
        let bob = user("Bob");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&alice, &admin, org);
        res.status = ResourceStatus::Acknowledged;

        let transition = reassign(&mut res, bob.clone());

        assert_eq!(res.current_user, bob);
        assert_eq!(res.previous_user, Some(alice));
        assert_eq!(res.status, ResourceStatus::Assigned);

        match transition {
            Transition::Applied { notifications } => {
                assert_eq!(notifications.len(), 1);
                match &notifications[0] {
                    NotificationRequest::Assignment { to, ack_path, .. } => {
                        assert_eq!(to, &bob.email);
                        assert!(ack_path.ends_with("/acknowledge"));
                    }
                    other => panic!("expected assignment notification, got {:?}", other),
                }
            }
            Transition::NoOp => panic!("reassignment must apply"),
        }
    }

    #[test]
    fn test_reassignment_journal_captures_all_three_fields() {
        let alice = user("Alice");
        let bob = user("Bob");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&alice, &admin, org);
        res.status = ResourceStatus::Acknowledged;

        let mut tracker = ChangeTracker::new(&res, HistoryPolicy::bounded(100));
        reassign(&mut res, bob.clone());

        let mut log = HistoryLog::new();
        tracker.record(&res, &mut log, Some(&admin.email));

        assert_eq!(log.len(), 1);
        let what = &log.entries()[0].what;
        let changed: Vec<&str> = what.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(changed, vec!["current_user", "previous_user", "status"]);

        let cur_user = what.iter().find(|c| c.field == "current_user").unwrap();
        assert_eq!(cur_user.prev, json!(alice.email));
        assert_eq!(cur_user.cur, json!(bob.email));

        let status = what.iter().find(|c| c.field == "status").unwrap();
        assert_eq!(status.prev, json!("R_ACK"));
        assert_eq!(status.cur, json!("R_ASS"));
    }

    #[test]
    fn test_acknowledge_by_owner() {
        let alice = user("Alice");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&alice, &admin, org);

        let transition = acknowledge(&mut res, &ctx_for(&alice, org)).unwrap();

        assert_eq!(res.status, ResourceStatus::Acknowledged);
        assert_eq!(
            transition,
            Transition::Applied {
                notifications: Vec::new()
            }
        );
    }

    #[test]
    fn test_acknowledge_twice_is_noop() {
        let alice = user("Alice");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&alice, &admin, org);
        let ctx = ctx_for(&alice, org);

        assert!(acknowledge(&mut res, &ctx).unwrap().is_applied());
        assert_eq!(acknowledge(&mut res, &ctx).unwrap(), Transition::NoOp);
        assert_eq!(res.status, ResourceStatus::Acknowledged);
    }

    #[test]
    fn test_acknowledge_from_dispute() {
        let alice = user("Alice");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&alice, &admin, org);
        res.status = ResourceStatus::Disputed;

        assert!(acknowledge(&mut res, &ctx_for(&alice, org)).unwrap().is_applied());
        assert_eq!(res.status, ResourceStatus::Acknowledged);
    }

    #[test]
    fn test_acknowledge_by_non_owner_is_forbidden() {
        let alice = user("Alice");
        let bob = user("Bob");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&alice, &admin, org);
        let before = res.audit_fields();

        let err = acknowledge(&mut res, &ctx_for(&bob, org)).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
        // No mutation on rejection
        assert_eq!(res.audit_fields(), before);
        assert_eq!(res.status, ResourceStatus::Assigned);
    }

    #[test]
    fn test_dispute_notifies_all_parties() {
        let alice = user("Alice");
        let bob = user("Bob");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&bob, &admin, org);
        res.previous_user = Some(alice.clone());

        let transition = dispute(&mut res, &ctx_for(&bob, org)).unwrap();

        assert_eq!(res.status, ResourceStatus::Disputed);
        match transition {
            Transition::Applied { notifications } => match &notifications[0] {
                NotificationRequest::Dispute { to, .. } => {
                    assert_eq!(to.len(), 3);
                    assert!(to.contains(&bob.email));
                    assert!(to.contains(&admin.email));
                    assert!(to.contains(&alice.email));
                }
                other => panic!("expected dispute notification, got {:?}", other),
            },
            Transition::NoOp => panic!("dispute must apply"),
        }
    }

    #[test]
    fn test_dispute_without_previous_user_skips_them() {
        let bob = user("Bob");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&bob, &admin, org);

        let transition = dispute(&mut res, &ctx_for(&bob, org)).unwrap();
        match transition {
            Transition::Applied { notifications } => match &notifications[0] {
                NotificationRequest::Dispute { to, .. } => assert_eq!(to.len(), 2),
                other => panic!("expected dispute notification, got {:?}", other),
            },
            Transition::NoOp => panic!("dispute must apply"),
        }
    }

    #[test]
    fn test_dispute_twice_is_noop() {
        let bob = user("Bob");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&bob, &admin, org);
        let ctx = ctx_for(&bob, org);

        assert!(dispute(&mut res, &ctx).unwrap().is_applied());
        assert_eq!(dispute(&mut res, &ctx).unwrap(), Transition::NoOp);
    }

    #[test]
    fn test_dispute_by_non_owner_is_forbidden() {
        let alice = user("Alice");
        let bob = user("Bob");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let mut res = resource(&alice, &admin, org);
        res.status = ResourceStatus::Acknowledged;

        let err = dispute(&mut res, &ctx_for(&bob, org)).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
        assert_eq!(res.status, ResourceStatus::Acknowledged);
    }

    #[test]
    fn test_cross_org_access_reports_not_found() {
        let alice = user("Alice");
        let admin = user("Root");
        let mut res = resource(&alice, &admin, Uuid::new_v4());
        let foreign_ctx = ctx_for(&alice, Uuid::new_v4());

        assert!(matches!(
            acknowledge(&mut res, &foreign_ctx).unwrap_err(),
            LifecycleError::NotFound(_)
        ));
        assert!(matches!(
            dispute(&mut res, &foreign_ctx).unwrap_err(),
            LifecycleError::NotFound(_)
        ));
    }

    #[test]
    fn test_delete_requires_device_admin() {
        let alice = user("Alice");
        let admin = user("Root");
        let org = Uuid::new_v4();
        let res = resource(&alice, &admin, org);

        assert!(authorize_delete(&res, &ctx_for(&admin, org)).is_ok());
        assert!(matches!(
            authorize_delete(&res, &ctx_for(&alice, org)).unwrap_err(),
            LifecycleError::Forbidden(_)
        ));
    }
}
