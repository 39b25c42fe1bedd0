use askbox_core::{ChatController, Submission};
use ratatui::layout::Rect;

/// Frames of the loading animation
const SPINNER: [&str; 4] = ["", ".", "..", "..."];

pub struct App {
    pub should_quit: bool,
    pub controller: ChatController,

    // Chat pane scrolling
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    /// Controller revision the view last scrolled to
    pub seen_revision: u64,

    pub animation_frame: usize,

    // Areas from the last draw, for mouse hit-testing
    pub chat_area: Option<Rect>,
    pub input_area: Option<Rect>,
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(controller: ChatController) -> Self {
        Self {
            should_quit: false,
            seen_revision: controller.revision(),
            controller,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            chat_area: None,
            input_area: None,
            send_area: None,
        }
    }

    pub fn submit(&mut self) -> Submission {
        let submission = self.controller.submit();
        if submission == Submission::Sent {
            self.animation_frame = 0;
        }
        tracing::debug!(?submission, "submit requested");
        submission
    }

    /// Advance the loading animation (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % SPINNER.len();
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.animation_frame % SPINNER.len()]
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        // Clamped against content height on the next draw
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn page(&self) -> u16 {
        self.chat_height.saturating_sub(1).max(1)
    }
}
