use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::{Activity, ActivityMap};

pub const SELECT_PLACEHOLDER: &str = "-- Select an activity --";
pub const LOAD_FAILED: &str = "Failed to load activities. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub email: String,
    /// Set while an unregister request for this row is in flight.
    pub removal_pending: bool,
}

impl ParticipantRow {
    fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            removal_pending: false,
        }
    }
}

/// Display projection of one activity. `max_participants` is kept as data so
/// the labels never have to be recovered from rendered text.
#[derive(Debug, Clone)]
pub struct ActivityCardView {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    pub rows: Vec<ParticipantRow>,
}

impl ActivityCardView {
    pub fn from_activity(name: &str, activity: &Activity) -> Self {
        Self {
            name: name.to_string(),
            description: activity.description.clone(),
            schedule: activity.schedule.clone(),
            max_participants: activity.max_participants,
            rows: activity
                .participants
                .iter()
                .map(|email| ParticipantRow::new(email))
                .collect(),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.rows.len()
    }

    /// Negative when the backend reports more participants than seats.
    pub fn spots_left(&self) -> i64 {
        self.max_participants - self.rows.len() as i64
    }

    pub fn availability_label(&self) -> String {
        format!("{} spots left", self.spots_left())
    }

    pub fn participants_label(&self) -> String {
        format!(
            "Participants ({}/{}):",
            self.participant_count(),
            self.max_participants
        )
    }

    pub fn emails(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.email.as_str()).collect()
    }

    fn row_mut(&mut self, email: &str) -> Option<&mut ParticipantRow> {
        self.rows.iter_mut().find(|r| r.email == email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption {
    pub value: String,
    pub label: String,
}

impl SelectorOption {
    fn placeholder() -> Self {
        Self {
            value: String::new(),
            label: SELECT_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub activity: String,
}

impl SignupForm {
    pub fn clear(&mut self) {
        self.email.clear();
        self.activity.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStart {
    Started,
    /// A removal for this row is already in flight; the click is dropped.
    AlreadyPending,
    /// No such row on screen. The request still goes out; the backend decides.
    NotRendered,
}

#[derive(Debug)]
pub struct RosterView {
    cards: Vec<ActivityCardView>,
    options: Vec<SelectorOption>,
    load_error: Option<String>,
    loaded: bool,
    latest_load: u64,
    pub form: SignupForm,
}

impl Default for RosterView {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterView {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            options: vec![SelectorOption::placeholder()],
            load_error: None,
            loaded: false,
            latest_load: 0,
            form: SignupForm::default(),
        }
    }

    pub fn cards(&self) -> &[ActivityCardView] {
        &self.cards
    }

    pub fn card(&self, name: &str) -> Option<&ActivityCardView> {
        self.cards.iter().find(|c| c.name == name)
    }

    fn card_mut(&mut self, name: &str) -> Option<&mut ActivityCardView> {
        self.cards.iter_mut().find(|c| c.name == name)
    }

    pub fn options(&self) -> &[SelectorOption] {
        &self.options
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    /// Registers a new full load and returns its sequence number.
    pub fn begin_load(&mut self) -> u64 {
        self.latest_load += 1;
        self.latest_load
    }

    /// Applies a load result. Only the newest requested load is applied;
    /// returns `false` for a superseded one.
    pub fn apply_load(&mut self, seq: u64, result: Result<ActivityMap, ApiError>) -> bool {
        if seq != self.latest_load {
            debug!(seq, latest = self.latest_load, "roster_load_superseded");
            return false;
        }
        match result {
            Ok(activities) => {
                self.replace_all(&activities);
                self.load_error = None;
                self.loaded = true;
            }
            Err(e) => {
                warn!(error = %e, "roster_load_failed");
                // Previously rendered cards stay as they were.
                self.load_error = Some(LOAD_FAILED.to_string());
            }
        }
        true
    }

    /// Rebuilds every card. Rows with a removal still in flight keep their
    /// guard if they survive the reload.
    pub fn replace_all(&mut self, activities: &ActivityMap) {
        let in_flight: Vec<(String, String)> = self
            .cards
            .iter()
            .flat_map(|card| {
                card.rows
                    .iter()
                    .filter(|row| row.removal_pending)
                    .map(move |row| (card.name.clone(), row.email.clone()))
            })
            .collect();

        self.cards = activities
            .iter()
            .map(|(name, activity)| ActivityCardView::from_activity(name, activity))
            .collect();

        for (activity, email) in &in_flight {
            if let Some(row) = self.card_mut(activity).and_then(|c| c.row_mut(email)) {
                row.removal_pending = true;
            }
        }

        self.options = std::iter::once(SelectorOption::placeholder())
            .chain(activities.keys().map(|name| SelectorOption {
                value: name.clone(),
                label: name.clone(),
            }))
            .collect();
    }

    /// Appends a confirmed signup to its card. Returns `false` when the card
    /// is not on screen, in which case the caller reloads everything.
    pub fn append_participant(&mut self, activity: &str, email: &str) -> bool {
        let Some(card) = self.card_mut(activity) else {
            return false;
        };
        if card.row_mut(email).is_none() {
            card.rows.push(ParticipantRow::new(email));
        }
        true
    }

    pub fn begin_removal(&mut self, activity: &str, email: &str) -> RemovalStart {
        let Some(row) = self.card_mut(activity).and_then(|c| c.row_mut(email)) else {
            return RemovalStart::NotRendered;
        };
        if row.removal_pending {
            return RemovalStart::AlreadyPending;
        }
        row.removal_pending = true;
        RemovalStart::Started
    }

    pub fn cancel_removal(&mut self, activity: &str, email: &str) {
        if let Some(row) = self.card_mut(activity).and_then(|c| c.row_mut(email)) {
            row.removal_pending = false;
        }
    }

    /// Drops a confirmed removal from its card. Returns whether a row was removed.
    pub fn remove_participant(&mut self, activity: &str, email: &str) -> bool {
        let Some(card) = self.card_mut(activity) else {
            return false;
        };
        let before = card.rows.len();
        card.rows.retain(|r| r.email != email);
        card.rows.len() != before
    }
}
