#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BannerKind {
    #[default]
    Success,
    Error,
}

impl BannerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        }
    }
}

/// Transient message area. Every `show` bumps the generation so a hide timer
/// scheduled for an older message leaves a newer one alone.
#[derive(Debug, Clone, Default)]
pub struct Banner {
    message: String,
    kind: BannerKind,
    visible: bool,
    undo_offered: bool,
    generation: u64,
}

impl Banner {
    pub fn show(&mut self, kind: BannerKind, message: impl Into<String>) -> u64 {
        self.generation += 1;
        self.message = message.into();
        self.kind = kind;
        self.visible = true;
        self.undo_offered = false;
        self.generation
    }

    /// Success message carrying the undo action.
    pub fn show_with_undo(&mut self, message: impl Into<String>) -> u64 {
        let generation = self.show(BannerKind::Success, message);
        self.undo_offered = true;
        generation
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.undo_offered = false;
    }

    pub fn hide_if_current(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.visible {
            return false;
        }
        self.hide();
        true
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn undo_offered(&self) -> bool {
        self.visible && self.undo_offered
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> BannerKind {
        self.kind
    }
}
