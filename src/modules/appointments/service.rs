use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::{
    ActorRole, Appointment, AppointmentStatus, InvalidTimeRange, NewAppointment, TimeRange,
};
use crate::db::DatabaseError;

use super::conflict;
use super::store::{AppointmentStore, InsertOutcome};

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error(transparent)]
    InvalidTimeRange(#[from] InvalidTimeRange),

    #[error("time slot unavailable: {} conflicting appointment(s)", .0.len())]
    TimeSlotUnavailable(Vec<Appointment>),

    #[error("appointment {0} not found")]
    NotFound(Uuid),

    #[error("{role:?} may not set status {status:?}")]
    Unauthorized {
        role: ActorRole,
        status: AppointmentStatus,
    },

    #[error("invalid transition from {} to {}", .from.display_name(), .to.display_name())]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Validate and persist a proposed appointment. Range validation happens
/// before any I/O; the conflict list carries exactly the overlapping subset
/// of the dietitian's non-cancelled appointments.
pub async fn propose(
    store: &dyn AppointmentStore,
    request: NewAppointment,
) -> Result<Appointment, AppointmentError> {
    let range: TimeRange = request.time_range()?;

    let existing = store
        .list_active_for_dietitian(request.dietitian_id)
        .await?;
    let conflicts = conflict::conflicting(&range, &existing);
    if !conflicts.is_empty() {
        warn!(
            dietitian_id = %request.dietitian_id,
            conflicts = conflicts.len(),
            "proposed slot unavailable"
        );
        return Err(AppointmentError::TimeSlotUnavailable(conflicts));
    }

    let status = if request.direct_booking {
        AppointmentStatus::Confirmed
    } else {
        AppointmentStatus::Pending
    };
    let appointment = Appointment::new(
        request.dietitian_id,
        request.client_id,
        request.client_name,
        range,
        status,
        request.notes,
    );

    // The store rechecks inside its own transaction; a concurrent proposal
    // for an overlapping slot cannot also succeed.
    match store.insert_if_free(&appointment).await? {
        InsertOutcome::Created => {
            info!(
                appointment_id = %appointment.id,
                dietitian_id = %appointment.dietitian_id,
                "appointment created"
            );
            Ok(appointment)
        }
        InsertOutcome::SlotTaken(conflicts) => {
            warn!(
                dietitian_id = %appointment.dietitian_id,
                "slot taken by a concurrent proposal"
            );
            Err(AppointmentError::TimeSlotUnavailable(conflicts))
        }
    }
}

/// Move an appointment to a new status, enforcing the role permission
/// matrix and the transition table.
pub async fn transition(
    store: &dyn AppointmentStore,
    id: Uuid,
    to: AppointmentStatus,
    actor_role: ActorRole,
    now: OffsetDateTime,
) -> Result<Appointment, AppointmentError> {
    if !role_may_set(actor_role, to) {
        return Err(AppointmentError::Unauthorized {
            role: actor_role,
            status: to,
        });
    }

    let appointment = store
        .get(id)
        .await?
        .ok_or(AppointmentError::NotFound(id))?;

    if !transition_allowed(appointment.status, to) {
        return Err(AppointmentError::InvalidTransition {
            from: appointment.status,
            to,
        });
    }

    // A no-show can only be recorded once the slot has actually started.
    if to == AppointmentStatus::NoShow && now < appointment.time_range.start() {
        return Err(AppointmentError::InvalidTransition {
            from: appointment.status,
            to,
        });
    }

    let updated = store.update_status(id, to).await?;
    info!(
        appointment_id = %id,
        from = appointment.status.display_name(),
        to = to.display_name(),
        "appointment status changed"
    );
    Ok(updated)
}

pub async fn list_for_dietitian(
    store: &dyn AppointmentStore,
    dietitian_id: Uuid,
    include_cancelled: bool,
) -> Result<Vec<Appointment>, AppointmentError> {
    let appointments = if include_cancelled {
        store.list_for_dietitian(dietitian_id).await?
    } else {
        store.list_active_for_dietitian(dietitian_id).await?
    };
    Ok(appointments)
}

/// Clients may cancel; dietitians run the rest of the lifecycle.
fn role_may_set(role: ActorRole, to: AppointmentStatus) -> bool {
    match role {
        ActorRole::Client => matches!(to, AppointmentStatus::Cancelled),
        ActorRole::Dietitian => matches!(
            to,
            AppointmentStatus::Confirmed
                | AppointmentStatus::Scheduled
                | AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::NoShow
        ),
    }
}

fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Scheduled)
            | (Pending, Cancelled)
            | (Confirmed, Completed)
            | (Confirmed, Cancelled)
            | (Confirmed, NoShow)
            | (Scheduled, Confirmed)
            | (Scheduled, Completed)
            | (Scheduled, Cancelled)
            | (Scheduled, NoShow)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::appointments::store::MockAppointmentStore;
    use time::macros::datetime;
    use time::Duration;

    fn at(hour_offset: i64) -> OffsetDateTime {
        datetime!(2026-03-02 08:00 UTC) + Duration::hours(hour_offset)
    }

    fn range(start_h: i64, end_h: i64) -> TimeRange {
        TimeRange::new(at(start_h), at(end_h)).unwrap()
    }

    fn appointment(start_h: i64, end_h: i64, status: AppointmentStatus) -> Appointment {
        Appointment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Alex".to_string(),
            range(start_h, end_h),
            status,
            None,
        )
    }

    fn request(start_h: i64, end_h: i64) -> NewAppointment {
        NewAppointment {
            dietitian_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_name: "Alex".to_string(),
            start_time: at(start_h),
            end_time: at(end_h),
            notes: None,
            direct_booking: false,
        }
    }

    #[tokio::test]
    async fn propose_rejects_inverted_range_before_touching_the_store() {
        // No expectations set; any store call would panic.
        let store = MockAppointmentStore::new();
        let result = propose(&store, request(2, 1)).await;
        assert!(matches!(
            result,
            Err(AppointmentError::InvalidTimeRange(_))
        ));

        let result = propose(&store, request(1, 1)).await;
        assert!(matches!(
            result,
            Err(AppointmentError::InvalidTimeRange(_))
        ));
    }

    #[tokio::test]
    async fn propose_reports_exactly_the_overlapping_subset() {
        let overlapping = appointment(1, 3, AppointmentStatus::Confirmed);
        let disjoint = appointment(5, 6, AppointmentStatus::Confirmed);
        let existing = vec![overlapping.clone(), disjoint];

        let mut store = MockAppointmentStore::new();
        store
            .expect_list_active_for_dietitian()
            .returning(move |_| Ok(existing.clone()));

        let result = propose(&store, request(2, 4)).await;
        match result {
            Err(AppointmentError::TimeSlotUnavailable(conflicts)) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].id, overlapping.id);
            }
            other => panic!("expected TimeSlotUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn propose_creates_pending_appointment_on_free_slot() {
        let mut store = MockAppointmentStore::new();
        store
            .expect_list_active_for_dietitian()
            .returning(|_| Ok(Vec::new()));
        store
            .expect_insert_if_free()
            .withf(|appointment| appointment.status == AppointmentStatus::Pending)
            .returning(|_| Ok(InsertOutcome::Created));

        let created = propose(&store, request(2, 4)).await.unwrap();
        assert_eq!(created.status, AppointmentStatus::Pending);
        assert_eq!(created.duration_string(), "2h");
    }

    #[tokio::test]
    async fn direct_booking_starts_confirmed() {
        let mut store = MockAppointmentStore::new();
        store
            .expect_list_active_for_dietitian()
            .returning(|_| Ok(Vec::new()));
        store
            .expect_insert_if_free()
            .returning(|_| Ok(InsertOutcome::Created));

        let mut req = request(2, 4);
        req.direct_booking = true;
        let created = propose(&store, req).await.unwrap();
        assert_eq!(created.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn propose_surfaces_a_lost_race_as_slot_unavailable() {
        let winner = appointment(2, 4, AppointmentStatus::Pending);
        let mut store = MockAppointmentStore::new();
        store
            .expect_list_active_for_dietitian()
            .returning(|_| Ok(Vec::new()));
        let conflicts = vec![winner];
        store
            .expect_insert_if_free()
            .returning(move |_| Ok(InsertOutcome::SlotTaken(conflicts.clone())));

        let result = propose(&store, request(2, 4)).await;
        assert!(matches!(
            result,
            Err(AppointmentError::TimeSlotUnavailable(c)) if c.len() == 1
        ));
    }

    #[tokio::test]
    async fn clients_may_only_cancel() {
        let store = MockAppointmentStore::new();
        let result = transition(
            &store,
            Uuid::new_v4(),
            AppointmentStatus::Confirmed,
            ActorRole::Client,
            at(0),
        )
        .await;
        assert!(matches!(result, Err(AppointmentError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn transition_fails_for_unknown_appointment() {
        let mut store = MockAppointmentStore::new();
        store.expect_get().returning(|_| Ok(None));

        let id = Uuid::new_v4();
        let result = transition(
            &store,
            id,
            AppointmentStatus::Confirmed,
            ActorRole::Dietitian,
            at(0),
        )
        .await;
        assert!(matches!(result, Err(AppointmentError::NotFound(found)) if found == id));
    }

    #[tokio::test]
    async fn completed_appointments_cannot_be_cancelled() {
        let completed = appointment(1, 2, AppointmentStatus::Completed);
        let mut store = MockAppointmentStore::new();
        let stored = completed.clone();
        store.expect_get().returning(move |_| Ok(Some(stored.clone())));

        let result = transition(
            &store,
            completed.id,
            AppointmentStatus::Cancelled,
            ActorRole::Dietitian,
            at(3),
        )
        .await;
        assert!(matches!(
            result,
            Err(AppointmentError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn no_show_requires_the_start_time_to_have_passed() {
        let confirmed = appointment(2, 3, AppointmentStatus::Confirmed);
        let mut store = MockAppointmentStore::new();
        let stored = confirmed.clone();
        store.expect_get().returning(move |_| Ok(Some(stored.clone())));

        // Before the slot starts: rejected.
        let result = transition(
            &store,
            confirmed.id,
            AppointmentStatus::NoShow,
            ActorRole::Dietitian,
            at(1),
        )
        .await;
        assert!(matches!(
            result,
            Err(AppointmentError::InvalidTransition { .. })
        ));

        // After the start time: recorded.
        let mut updated = confirmed.clone();
        updated.status = AppointmentStatus::NoShow;
        store
            .expect_update_status()
            .returning(move |_, _| Ok(updated.clone()));

        let result = transition(
            &store,
            confirmed.id,
            AppointmentStatus::NoShow,
            ActorRole::Dietitian,
            at(2) + Duration::minutes(10),
        )
        .await
        .unwrap();
        assert_eq!(result.status, AppointmentStatus::NoShow);
    }

    #[tokio::test]
    async fn pending_can_be_confirmed_by_the_dietitian() {
        let pending = appointment(1, 2, AppointmentStatus::Pending);
        let mut store = MockAppointmentStore::new();
        let stored = pending.clone();
        store.expect_get().returning(move |_| Ok(Some(stored.clone())));
        let mut confirmed = pending.clone();
        confirmed.status = AppointmentStatus::Confirmed;
        store
            .expect_update_status()
            .withf(|_, status| *status == AppointmentStatus::Confirmed)
            .returning(move |_, _| Ok(confirmed.clone()));

        let result = transition(
            &store,
            pending.id,
            AppointmentStatus::Confirmed,
            ActorRole::Dietitian,
            at(0),
        )
        .await
        .unwrap();
        assert_eq!(result.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn clients_can_cancel_their_pending_appointment() {
        let pending = appointment(1, 2, AppointmentStatus::Pending);
        let mut store = MockAppointmentStore::new();
        let stored = pending.clone();
        store.expect_get().returning(move |_| Ok(Some(stored.clone())));
        let mut cancelled = pending.clone();
        cancelled.status = AppointmentStatus::Cancelled;
        store
            .expect_update_status()
            .returning(move |_, _| Ok(cancelled.clone()));

        let result = transition(
            &store,
            pending.id,
            AppointmentStatus::Cancelled,
            ActorRole::Client,
            at(0),
        )
        .await
        .unwrap();
        assert_eq!(result.status, AppointmentStatus::Cancelled);
    }

    #[test]
    fn transition_table_keeps_terminal_states_terminal() {
        use AppointmentStatus::*;
        for terminal in [Completed, Cancelled, NoShow] {
            for target in AppointmentStatus::ALL {
                assert!(!transition_allowed(terminal, target));
            }
        }
    }
}
