use chrono::NaiveDateTime;

use super::domain::{Deposit, DepositService, DepositStatus, ServiceType, StatusChange};

/// Pick the service that decides whether a listing is still visible.
///
/// Disabled services never qualify. A renewal takes precedence over the
/// category advertisement; among services of the same type the most recent
/// one is used so the result does not depend on collection order.
pub fn qualifying_service(
    services: &[DepositService],
    advertisement: ServiceType,
) -> Option<&DepositService> {
    latest_enabled(services, ServiceType::Renewal)
        .or_else(|| latest_enabled(services, advertisement))
}

fn latest_enabled(services: &[DepositService], service_type: ServiceType) -> Option<&DepositService> {
    services
        .iter()
        .filter(|service| !service.disabled && service.service_type == service_type)
        .max_by_key(|service| (service.created_at, service.id))
}

/// Status a deposit should carry given its services and the category cutoff.
pub fn target_status(
    services: &[DepositService],
    cutoff: NaiveDateTime,
    advertisement: ServiceType,
) -> DepositStatus {
    match qualifying_service(services, advertisement) {
        Some(service) if service.created_at >= cutoff => DepositStatus::Accepted,
        _ => DepositStatus::SystemArchived,
    }
}

/// Evaluate one deposit, returning a change only when its status must move.
///
/// Deposits outside the managed lifecycle (disabled, deleted, or in a status
/// other than accepted/system archived) are never touched.
pub fn plan_change(deposit: &Deposit, cutoff: NaiveDateTime) -> Option<StatusChange> {
    if !deposit.is_eligible() {
        return None;
    }

    let target = target_status(
        &deposit.services,
        cutoff,
        deposit.category.advertisement_service(),
    );

    (target != deposit.status).then_some(StatusChange {
        deposit_id: deposit.id,
        category: deposit.category,
        from: deposit.status,
        to: target,
    })
}
