//! Progress reporting for a dispatch.
//!
//! The dispatcher owns the counters; a reporter only receives `init(total)`
//! once and then one `tick` per launch (delta 0) and per settlement (delta 1).
//! Ticks are delivered one at a time, never concurrently. Each dispatch call
//! gets its own reporter.

mod bar;

pub use bar::{to_indicatif_template, TemplateBar};

use std::sync::Arc;

use crate::config::ProgressSetting;

/// Receives progress events from a dispatch.
pub trait ProgressReporter: Send + Sync {
    /// Called once before any job starts, with the number of jobs.
    fn init(&self, total: usize);

    /// `delta` jobs just completed; `pending` jobs are launched but unsettled.
    fn tick(&self, delta: usize, pending: usize);
}

/// Reporter that ignores every event; used when progress is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn init(&self, _total: usize) {}

    fn tick(&self, _delta: usize, _pending: usize) {}
}

/// Builds a fresh reporter for each dispatch call.
pub type ReporterFactory = Arc<dyn Fn() -> Arc<dyn ProgressReporter> + Send + Sync>;

/// Reporter matching a progress setting: a stderr bar when enabled, otherwise [`NoProgress`].
pub fn reporter_for(setting: &ProgressSetting) -> Arc<dyn ProgressReporter> {
    match setting.template() {
        Some(template) => Arc::new(TemplateBar::stderr(template)),
        None => Arc::new(NoProgress),
    }
}

/// Factory that calls [`reporter_for`] with `setting` on every dispatch.
pub fn factory_for(setting: &ProgressSetting) -> ReporterFactory {
    let setting = setting.clone();
    Arc::new(move || reporter_for(&setting))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_setting_yields_silent_reporter() {
        let reporter = reporter_for(&ProgressSetting::Enabled(false));
        reporter.init(3);
        reporter.tick(1, 0);
    }

    #[test]
    fn factory_builds_a_new_reporter_each_call() {
        let make = factory_for(&ProgressSetting::Template(":current".into()));
        let first = make();
        let second = make();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
