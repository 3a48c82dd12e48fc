#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use roster::config::Config;
use roster::error::ApiError;
use roster::models::{Activity, ActivityMap, SignupResult};
use roster::services::activities_api_service::ActivitiesApi;
use roster::ui::app::App;

/// In-memory stand-in for the activities backend, with the same rejection
/// rules as the real one.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    activities: ActivityMap,
    offline: bool,
    list_calls: usize,
    signup_calls: usize,
    unregister_calls: usize,
}

impl FakeBackend {
    pub fn seeded(self, name: &str, max: i64, participants: &[&str]) -> Self {
        self.add_activity(name, max, participants);
        self
    }

    /// "Chess Club" with `a@x.com` and five seats, next to an empty "Art Club".
    pub fn chess_club() -> Arc<Self> {
        Arc::new(
            Self::default()
                .seeded("Chess Club", 5, &["a@x.com"])
                .seeded("Art Club", 15, &[]),
        )
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn add_activity(&self, name: &str, max: i64, participants: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .activities
            .insert(name.to_string(), activity(max, participants));
    }

    pub fn participants(&self, name: &str) -> Vec<String> {
        self.state.lock().unwrap().activities[name].participants.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn signup_calls(&self) -> usize {
        self.state.lock().unwrap().signup_calls
    }

    pub fn unregister_calls(&self) -> usize {
        self.state.lock().unwrap().unregister_calls
    }
}

fn activity(max: i64, participants: &[&str]) -> Activity {
    Activity {
        description: "Weekly club meeting".into(),
        schedule: "Fridays, 3:30 PM - 5:00 PM".into(),
        max_participants: max,
        participants: participants.iter().map(|p| p.to_string()).collect(),
    }
}

fn offline_error(path: &str) -> ApiError {
    ApiError::Unreachable {
        url: format!("http://fake.invalid{path}"),
        reason: "connection refused".into(),
    }
}

fn rejected(status: StatusCode, detail: &str) -> ApiError {
    ApiError::Rejected {
        status,
        detail: Some(detail.to_string()),
    }
}

#[async_trait]
impl ActivitiesApi for FakeBackend {
    async fn list_activities(&self) -> Result<ActivityMap, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.offline {
            return Err(offline_error("/activities"));
        }
        Ok(state.activities.clone())
    }

    async fn signup(&self, activity: &str, email: &str) -> Result<SignupResult, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.signup_calls += 1;
        if state.offline {
            return Err(offline_error("/activities/signup"));
        }
        let Some(entry) = state.activities.get_mut(activity) else {
            return Err(rejected(StatusCode::NOT_FOUND, "Activity not found"));
        };
        if entry.participants.iter().any(|p| p == email) {
            return Err(rejected(
                StatusCode::BAD_REQUEST,
                "Student is already signed up",
            ));
        }
        if entry.participants.len() as i64 >= entry.max_participants {
            return Err(rejected(StatusCode::BAD_REQUEST, "Activity is full"));
        }
        entry.participants.push(email.to_string());
        Ok(SignupResult {
            message: Some(format!("Signed up {email} for {activity}")),
        })
    }

    async fn unregister(&self, activity: &str, email: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.unregister_calls += 1;
        if state.offline {
            return Err(offline_error("/activities/unregister"));
        }
        let Some(entry) = state.activities.get_mut(activity) else {
            return Err(rejected(StatusCode::NOT_FOUND, "Activity not found"));
        };
        let before = entry.participants.len();
        entry.participants.retain(|p| p != email);
        if entry.participants.len() == before {
            return Err(rejected(
                StatusCode::BAD_REQUEST,
                "Student is not signed up for this activity",
            ));
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        undo_window: Duration::from_secs(5),
        notice_delay: Duration::from_secs(5),
        undo_notice_delay: Duration::from_secs(3),
        ..Config::default()
    }
}

/// App with the first full load already applied.
pub async fn loaded_app(backend: &Arc<FakeBackend>) -> App {
    let api: Arc<dyn ActivitiesApi> = backend.clone();
    let mut app = App::new(api, &test_config());
    app.load_all();
    app.settle().await;
    app
}

pub fn emails(app: &App, activity: &str) -> Vec<String> {
    app.roster()
        .card(activity)
        .map(|card| card.rows.iter().map(|r| r.email.clone()).collect())
        .unwrap_or_default()
}
