use crate::db::models::{Appointment, AppointmentStatus, TimeRange};

/// Every existing range that overlaps the candidate. Empty means the
/// candidate is bookable.
#[allow(unused)]
pub fn overlapping_ranges(candidate: &TimeRange, existing: &[TimeRange]) -> Vec<TimeRange> {
    existing
        .iter()
        .filter(|range| candidate.overlaps(range))
        .copied()
        .collect()
}

/// The subset of appointments that block the candidate slot. Cancelled
/// appointments never block.
pub fn conflicting(candidate: &TimeRange, existing: &[Appointment]) -> Vec<Appointment> {
    existing
        .iter()
        .filter(|appointment| appointment.status != AppointmentStatus::Cancelled)
        .filter(|appointment| candidate.overlaps(&appointment.time_range))
        .cloned()
        .collect()
}
