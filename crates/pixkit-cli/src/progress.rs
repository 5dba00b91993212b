use std::cell::RefCell;

use indicatif::{ProgressBar, ProgressStyle};
use pixkit_core::jobs::{JobStage, ProgressReporter};

/// Drives one indicatif bar per job stage.
pub struct BarReporter {
    bar: RefCell<Option<ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            bar: RefCell::new(None),
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: JobStage, total_items: Option<usize>) {
        let bar = match total_items {
            Some(total) => {
                let pb = ProgressBar::new(total as u64);
                let style = ProgressStyle::default_bar().template("{msg:20} [{bar:40}] {pos}/{len}");
                if let Ok(style) = style {
                    pb.set_style(style.progress_chars("=> "));
                }
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(stage.to_string());
        if let Some(previous) = self.bar.replace(Some(bar)) {
            previous.finish_and_clear();
        }
    }

    fn advance(&self, items_done: usize) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.set_position(items_done as u64);
        }
    }

    fn finish_stage(&self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}
