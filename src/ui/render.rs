use askama::Template;

use crate::services::banner_service::Banner;
use crate::services::roster_service::{ActivityCardView, SignupForm, SELECT_PLACEHOLDER};
use crate::services::undo_service::PendingDeletion;
use crate::ui::app::App;

#[derive(Template)]
#[template(path = "roster.txt")]
pub struct RosterTemplate<'a> {
    pub cards: &'a [ActivityCardView],
    pub load_error: Option<&'a str>,
    pub loading: bool,
    pub form: &'a SignupForm,
    pub form_activity: &'a str,
    pub options: String,
    pub pending: Option<&'a PendingDeletion>,
    pub banner: &'a Banner,
}

impl<'a> RosterTemplate<'a> {
    pub fn from_app(app: &'a App) -> Self {
        let roster = app.roster();
        let form_activity = if roster.form.activity.is_empty() {
            SELECT_PLACEHOLDER
        } else {
            roster.form.activity.as_str()
        };
        let options = roster
            .options()
            .iter()
            .filter(|o| !o.value.is_empty())
            .map(|o| o.label.as_str())
            .collect::<Vec<_>>()
            .join(" | ");

        Self {
            cards: roster.cards(),
            load_error: roster.load_error(),
            loading: !roster.has_loaded(),
            form: &roster.form,
            form_activity,
            options,
            pending: app.undo_controller().pending(),
            banner: app.banner(),
        }
    }
}

pub fn render_screen(app: &App) -> askama::Result<String> {
    RosterTemplate::from_app(app).render()
}
