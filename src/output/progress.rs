use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_red, bright_yellow};

/// Progress tracking for the two phases of a run
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_processing(template: &str) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(
            bright_yellow(format!("Phase 1/2: Processing template {template}")).to_string(),
        );
        Self { pb }
    }

    pub fn finish_processing_start_creation(self, resources: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/2: Mapped {resources} resources ✓")).to_string(),
        );
        let pb = create_spinner(
            bright_yellow(format!("Phase 2/2: Creating {resources} resources")).to_string(),
        );
        Self { pb }
    }

    pub fn finish_processing(self, resources: usize, ok: bool) {
        let message = if ok {
            bright_green(format!("Phase 1/2: Mapped {resources} resources ✓")).to_string()
        } else {
            bright_red("Phase 1/2: Processing failed ✗").to_string()
        };
        self.pb.finish_with_message(message);
        eprintln!();
    }

    pub fn finish_creation(self, created: usize, total: usize) {
        let message = if created == total {
            bright_green(format!("Phase 2/2: Created {created} of {total} resources ✓"))
        } else {
            bright_red(format!("Phase 2/2: Created {created} of {total} resources ✗"))
        };
        self.pb.finish_with_message(message.to_string());
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
