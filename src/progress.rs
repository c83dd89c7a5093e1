//! Progress reporting
//!
//! Walkers over paragraphs and embedded objects report `(current, total)`
//! to a sink. Reporting never influences processing.

use tracing::info;

pub trait ProgressInformer {
    /// `current`/`total` of `None` mean "not known"; both `None` announces a stage
    fn inform(&mut self, current: Option<usize>, total: Option<usize>);

    fn set_stage(&mut self, _stage: &str) {}
}

/// Prints progress lines through the log, unless silenced
#[derive(Debug, Clone)]
pub struct DefaultProgressInformer {
    stage: String,
    silent: bool,
}

impl DefaultProgressInformer {
    pub fn new(stage: impl Into<String>) -> Self {
        DefaultProgressInformer {
            stage: stage.into(),
            silent: false,
        }
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn format(&self, current: Option<usize>, total: Option<usize>) -> String {
        match (current, total) {
            (Some(current), Some(total)) => format!("{} ({current}/{total})...", self.stage),
            (Some(current), None) => format!("{} ({current})...", self.stage),
            _ => format!("{}...", self.stage),
        }
    }
}

impl ProgressInformer for DefaultProgressInformer {
    fn inform(&mut self, current: Option<usize>, total: Option<usize>) {
        if self.silent {
            return;
        }
        info!("{}", self.format(current, total));
    }

    fn set_stage(&mut self, stage: &str) {
        self.stage = stage.to_string();
    }
}

/// A sink that drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressInformer for NoProgress {
    fn inform(&mut self, _current: Option<usize>, _total: Option<usize>) {}
}
