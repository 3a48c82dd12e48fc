use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{ActivityMap, SignupResult};
use crate::services::activities_api_service::ActivitiesApi;
use crate::services::banner_service::{Banner, BannerKind};
use crate::services::roster_service::{RemovalStart, RosterView};
use crate::services::undo_service::{ExpiryCallback, PendingDeletion, UndoController};
use crate::ui::commands::Command;

/// Everything that can change the screen. Network calls and timers run as
/// detached tasks and report back through this queue; only [`App::handle`]
/// mutates state.
#[derive(Debug)]
pub enum AppEvent {
    Command(Command),
    ActivitiesLoaded {
        seq: u64,
        result: Result<ActivityMap, ApiError>,
    },
    SignupFinished {
        activity: String,
        email: String,
        result: Result<SignupResult, ApiError>,
    },
    UnregisterFinished {
        activity: String,
        email: String,
        result: Result<(), ApiError>,
    },
    RestoreFinished {
        deletion: PendingDeletion,
        result: Result<SignupResult, ApiError>,
    },
    UndoExpired {
        generation: u64,
    },
    BannerElapsed {
        generation: u64,
        /// Keep the banner while a deletion is still undoable.
        unless_pending: bool,
    },
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Redraw,
    Help,
    Quit,
}

pub struct App {
    api: Arc<dyn ActivitiesApi>,
    roster: RosterView,
    undo: UndoController,
    banner: Banner,
    notice_delay: Duration,
    undo_notice_delay: Duration,
    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,
    in_flight: usize,
}

impl App {
    pub fn new(api: Arc<dyn ActivitiesApi>, config: &Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let expiry_tx = tx.clone();
        let on_expire: ExpiryCallback = Arc::new(move |generation| {
            let _ = expiry_tx.send(AppEvent::UndoExpired { generation });
        });

        Self {
            api,
            roster: RosterView::new(),
            undo: UndoController::new(config.undo_window, on_expire),
            banner: Banner::default(),
            notice_delay: config.notice_delay,
            undo_notice_delay: config.undo_notice_delay,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub fn roster(&self) -> &RosterView {
        &self.roster
    }

    pub fn undo_controller(&self) -> &UndoController {
        &self.undo
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    /// Number of backend requests whose response has not been handled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// Handles events until no backend request is outstanding.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            let Some(event) = self.rx.recv().await else {
                break;
            };
            self.handle(event);
        }
    }

    /// Handles every event that arrives within `duration`, timers included.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let event = tokio::select! {
                biased;
                event = self.rx.recv() => event,
                _ = tokio::time::sleep_until(deadline) => None,
            };
            match event {
                Some(event) => {
                    self.handle(event);
                }
                None => break,
            }
        }
    }

    pub fn handle(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Command(command) => return self.run_command(command),
            AppEvent::ActivitiesLoaded { seq, result } => {
                self.request_done();
                self.roster.apply_load(seq, result);
            }
            AppEvent::SignupFinished {
                activity,
                email,
                result,
            } => {
                self.request_done();
                self.on_signup_finished(&activity, &email, result);
            }
            AppEvent::UnregisterFinished {
                activity,
                email,
                result,
            } => {
                self.request_done();
                self.on_unregister_finished(&activity, &email, result);
            }
            AppEvent::RestoreFinished { deletion, result } => {
                self.request_done();
                self.on_restore_finished(deletion, result);
            }
            AppEvent::UndoExpired { generation } => self.expire(generation),
            AppEvent::BannerElapsed {
                generation,
                unless_pending,
            } => {
                if !(unless_pending && self.undo.pending().is_some()) {
                    self.banner.hide_if_current(generation);
                }
            }
            AppEvent::InputClosed => return Flow::Quit,
        }
        Flow::Redraw
    }

    fn run_command(&mut self, command: Command) -> Flow {
        match command {
            Command::List => {}
            Command::Refresh => self.load_all(),
            Command::Signup { email, activity } => {
                self.roster.form.email = email;
                self.roster.form.activity = activity;
                self.submit_form();
            }
            Command::SetEmail(email) => self.roster.form.email = email,
            Command::SelectActivity(activity) => self.roster.form.activity = activity,
            Command::Submit => self.submit_form(),
            Command::Remove { email, activity } => self.unregister(&activity, &email),
            Command::Undo => self.invoke_undo(),
            Command::Help => return Flow::Help,
            Command::Quit => return Flow::Quit,
        }
        Flow::Redraw
    }

    fn spawn_request<F>(&mut self, request: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(request.await);
        });
    }

    fn request_done(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn schedule_hide(&self, generation: u64, after: Duration, unless_pending: bool) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(AppEvent::BannerElapsed {
                generation,
                unless_pending,
            });
        });
    }

    fn notify(&mut self, kind: BannerKind, message: String) {
        let generation = self.banner.show(kind, message);
        self.schedule_hide(generation, self.notice_delay, false);
    }

    /// Fetches the whole collection; the newest load wins.
    pub fn load_all(&mut self) {
        let seq = self.roster.begin_load();
        debug!(seq, "roster_load_requested");
        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.list_activities().await;
            AppEvent::ActivitiesLoaded { seq, result }
        });
    }

    pub fn submit_form(&mut self) {
        let email = self.roster.form.email.trim().to_string();
        let activity = self.roster.form.activity.trim().to_string();
        if email.is_empty() || activity.is_empty() {
            self.notify(
                BannerKind::Error,
                "Enter an email and select an activity".to_string(),
            );
            return;
        }
        self.signup(&activity, &email);
    }

    pub fn signup(&mut self, activity: &str, email: &str) {
        info!(activity = %activity, email = %email, "signup_requested");
        let api = Arc::clone(&self.api);
        let (activity, email) = (activity.to_string(), email.to_string());
        self.spawn_request(async move {
            let result = api.signup(&activity, &email).await;
            AppEvent::SignupFinished {
                activity,
                email,
                result,
            }
        });
    }

    fn on_signup_finished(
        &mut self,
        activity: &str,
        email: &str,
        result: Result<SignupResult, ApiError>,
    ) {
        match result {
            Ok(body) => {
                let message = body
                    .message
                    .unwrap_or_else(|| format!("Signed up {email} for {activity}"));
                self.notify(BannerKind::Success, message);
                if !self.roster.append_participant(activity, email) {
                    debug!(activity = %activity, "signup_card_missing_reloading");
                    self.load_all();
                }
                self.roster.form.clear();
            }
            Err(e) => {
                let message =
                    e.user_message("An error occurred", "Failed to sign up. Please try again.");
                self.notify(BannerKind::Error, message);
            }
        }
    }

    pub fn unregister(&mut self, activity: &str, email: &str) {
        if self.roster.begin_removal(activity, email) == RemovalStart::AlreadyPending {
            debug!(activity = %activity, email = %email, "unregister_already_pending");
            return;
        }
        info!(activity = %activity, email = %email, "unregister_requested");
        let api = Arc::clone(&self.api);
        let (activity, email) = (activity.to_string(), email.to_string());
        self.spawn_request(async move {
            let result = api.unregister(&activity, &email).await;
            AppEvent::UnregisterFinished {
                activity,
                email,
                result,
            }
        });
    }

    fn on_unregister_finished(
        &mut self,
        activity: &str,
        email: &str,
        result: Result<(), ApiError>,
    ) {
        match result {
            Ok(()) => {
                self.roster.remove_participant(activity, email);
                self.undo.offer(activity, email);
                self.banner
                    .show_with_undo(format!("Unregistered {email} from {activity}"));
            }
            Err(e) => {
                self.roster.cancel_removal(activity, email);
                let message = e.user_message(
                    "Failed to unregister",
                    "Failed to unregister. Please try again.",
                );
                self.notify(BannerKind::Error, message);
            }
        }
    }

    pub fn invoke_undo(&mut self) {
        let Some(deletion) = self.undo.invoke() else {
            return;
        };
        let api = Arc::clone(&self.api);
        self.spawn_request(async move {
            let result = api.signup(&deletion.activity, &deletion.email).await;
            AppEvent::RestoreFinished { deletion, result }
        });
    }

    fn on_restore_finished(
        &mut self,
        deletion: PendingDeletion,
        result: Result<SignupResult, ApiError>,
    ) {
        let generation = match result {
            Ok(_) => {
                self.undo.restore_succeeded(&deletion);
                let generation = self.banner.show(
                    BannerKind::Success,
                    format!("Restored {} to {}", deletion.email, deletion.activity),
                );
                self.load_all();
                generation
            }
            Err(e) => {
                let message = if e.is_rejection() {
                    "Failed to restore participant"
                } else {
                    "Failed to restore participant. Please try again."
                };
                self.undo.restore_failed(deletion);
                self.banner.show(BannerKind::Error, message)
            }
        };
        self.schedule_hide(generation, self.undo_notice_delay, true);
    }

    fn expire(&mut self, generation: u64) {
        if self.undo.expire(generation).is_none() {
            return;
        }
        // Whatever is showing may have had its own hide skipped while this
        // deletion was pending.
        self.banner.hide();
        self.load_all();
    }
}
