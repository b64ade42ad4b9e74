//! Event lifecycle reconciliation
//!
//! Capacity edits, event cancellation and the other owner-side changes, with
//! the registration adjustments each of them implies.

use chrono::{DateTime, Utc};

use super::EventLedger;
use crate::models::{EventStatus, Reconciliation, Registration, RegistrationStatus, UpdateEventRequest};
use crate::utils::errors::{Result, RollcallError};

/// Capacity must allow at least one registration
pub fn validate_capacity(capacity: i32) -> Result<()> {
    if capacity < 1 {
        return Err(RollcallError::InvalidInput(format!(
            "capacity must be a positive number, got {}",
            capacity
        )));
    }
    Ok(())
}

/// Longest title or location the events table stores
pub const MAX_TEXT_LEN: usize = 255;

/// Titles are required and, like locations, bounded by the column width
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(RollcallError::InvalidInput("title is required".to_string()));
    }
    validate_text_len("title", title)
}

pub fn validate_location(location: Option<&str>) -> Result<()> {
    match location {
        Some(location) => validate_text_len("location", location),
        None => Ok(()),
    }
}

fn validate_text_len(field: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(RollcallError::InvalidInput(format!(
            "{} is {} characters long, at most {} are allowed",
            field, len, MAX_TEXT_LEN
        )));
    }
    Ok(())
}

/// Events are always scheduled in the future at the time they are written
pub fn validate_event_date(event_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if event_date <= now {
        return Err(RollcallError::InvalidInput(
            "event date cannot be in the past".to_string(),
        ));
    }
    Ok(())
}

impl EventLedger {
    /// Change capacity. Decreases below the active count are rejected
    /// outright; increases promote waitlisted registrations into the new
    /// slots, oldest first.
    pub fn update_capacity(
        &mut self,
        caller_id: i64,
        new_capacity: i32,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation> {
        self.ensure_owner(caller_id, "change the capacity of")?;
        self.check_capacity(new_capacity)?;

        let promoted = self.apply_capacity(new_capacity, now);

        Ok(Reconciliation {
            event: self.event.clone(),
            promoted,
            cancelled: Vec::new(),
        })
    }

    /// Cancel the event and every registration still active or waitlisted.
    /// Calling this on an already cancelled event changes nothing.
    pub fn cancel_event(&mut self, caller_id: i64, now: DateTime<Utc>) -> Result<Reconciliation> {
        self.ensure_owner(caller_id, "cancel")?;

        let cancelled = self.apply_cancellation(now);

        Ok(Reconciliation {
            event: self.event.clone(),
            promoted: Vec::new(),
            cancelled,
        })
    }

    /// Move a draft event to published
    pub fn publish(&mut self, caller_id: i64, now: DateTime<Utc>) -> Result<()> {
        self.ensure_owner(caller_id, "publish")?;

        if self.event.status != EventStatus::Published {
            self.event.status = EventStatus::Published;
            self.touch_event(now);
        }
        Ok(())
    }

    /// Owner edit of event details, capacity and status as one unit.
    ///
    /// Every check runs before anything is changed. A status change to
    /// cancelled cancels all registrations; a capacity increase on an event
    /// that stays open promotes from the waitlist. Republishing a cancelled
    /// event leaves its cancelled registrations as they are.
    pub fn update_details(
        &mut self,
        caller_id: i64,
        request: UpdateEventRequest,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation> {
        self.ensure_owner(caller_id, "edit")?;

        if let Some(title) = &request.title {
            validate_title(title)?;
        }
        validate_location(request.location.as_deref())?;
        if let Some(event_date) = request.event_date {
            validate_event_date(event_date, now)?;
        }
        if let Some(capacity) = request.capacity {
            self.check_capacity(capacity)?;
        }

        let mut changed = false;
        if let Some(title) = request.title {
            self.event.title = title;
            changed = true;
        }
        if let Some(description) = request.description {
            self.event.description = Some(description);
            changed = true;
        }
        if let Some(location) = request.location {
            self.event.location = Some(location);
            changed = true;
        }
        if let Some(event_date) = request.event_date {
            self.event.event_date = event_date;
            changed = true;
        }
        if changed {
            self.touch_event(now);
        }

        let cancelled = match request.status {
            Some(EventStatus::Cancelled) => self.apply_cancellation(now),
            Some(status) => {
                if self.event.status != status {
                    self.event.status = status;
                    self.touch_event(now);
                }
                Vec::new()
            }
            None => Vec::new(),
        };

        let promoted = match request.capacity {
            Some(capacity) => self.apply_capacity(capacity, now),
            None => Vec::new(),
        };

        Ok(Reconciliation {
            event: self.event.clone(),
            promoted,
            cancelled,
        })
    }

    /// Mark the event for deletion together with all of its registrations
    pub fn delete(&mut self, caller_id: i64) -> Result<()> {
        self.ensure_owner(caller_id, "delete")?;
        self.changes.event_deleted = true;
        Ok(())
    }

    fn check_capacity(&self, new_capacity: i32) -> Result<()> {
        validate_capacity(new_capacity)?;

        let active = self.active_count();
        if i64::from(new_capacity) < active {
            return Err(RollcallError::CapacityBelowDemand {
                requested: new_capacity,
                active,
            });
        }
        Ok(())
    }

    fn apply_capacity(&mut self, new_capacity: i32, now: DateTime<Utc>) -> Vec<Registration> {
        let previous = self.event.capacity;
        if new_capacity == previous {
            return Vec::new();
        }

        self.event.capacity = new_capacity;
        self.touch_event(now);

        if new_capacity > previous && self.event.status != EventStatus::Cancelled {
            let new_slots = i64::from(new_capacity) - self.active_count();
            self.promote_waitlisted(new_slots)
        } else {
            Vec::new()
        }
    }

    fn apply_cancellation(&mut self, now: DateTime<Utc>) -> Vec<Registration> {
        if self.event.status != EventStatus::Cancelled {
            self.event.status = EventStatus::Cancelled;
            self.touch_event(now);
        }

        let active: Vec<usize> = self
            .registrations
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.status.is_cancelled())
            .map(|(idx, _)| idx)
            .collect();

        active
            .into_iter()
            .map(|idx| self.set_status(idx, RegistrationStatus::Cancelled))
            .collect()
    }
}
