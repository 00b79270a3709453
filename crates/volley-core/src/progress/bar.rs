//! Progress bar on stderr, driven by an `indicatif` template.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::ProgressReporter;

/// Progress tokens and the indicatif keys that render them.
/// `:etas` must come before its prefix `:eta`.
const TOKENS: &[(&str, &str)] = &[
    (":pendingCount", "{msg}"),
    (":current", "{pos}"),
    (":total", "{len}"),
    (":percent", "{percent}%"),
    (":rate", "{per_sec}"),
    (":elapsed", "{elapsed}"),
    (":etas", "{eta}"),
    (":eta", "{eta}"),
    (":bar", "{bar:30}"),
];

/// Translate a `:token` progress template into an indicatif template.
///
/// Literal braces are escaped so they print as written. The pending count
/// travels in the bar's message.
pub fn to_indicatif_template(template: &str) -> String {
    let escaped = template.replace('{', "{{").replace('}', "}}");
    TOKENS
        .iter()
        .fold(escaped, |acc, (token, key)| acc.replace(token, key))
}

fn style_for(template: &str) -> ProgressStyle {
    match ProgressStyle::with_template(&to_indicatif_template(template)) {
        Ok(style) => style.progress_chars("=>-"),
        Err(e) => {
            tracing::warn!(template, error = %e, "unusable progress template; using default bar");
            ProgressStyle::default_bar()
        }
    }
}

/// Reporter backed by an indicatif [`ProgressBar`].
///
/// Settled jobs advance the bar; the pending count is shown through `:pendingCount`.
/// The bar finishes on the tick that settles the last job and ignores later ticks.
pub struct TemplateBar {
    template: String,
    bar: ProgressBar,
}

impl TemplateBar {
    pub fn new(template: impl Into<String>, target: ProgressDrawTarget) -> Self {
        let template = template.into();
        let bar = ProgressBar::with_draw_target(Some(0), target);
        bar.set_style(style_for(&template));
        Self { template, bar }
    }

    /// Bar drawing to stderr.
    pub fn stderr(template: impl Into<String>) -> Self {
        Self::new(template, ProgressDrawTarget::stderr())
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn progress_bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressReporter for TemplateBar {
    fn init(&self, total: usize) {
        self.bar.reset();
        self.bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        self.bar.set_message("0");
    }

    fn tick(&self, delta: usize, pending: usize) {
        if self.bar.is_finished() {
            return;
        }
        self.bar.set_message(pending.to_string());
        self.bar.inc(u64::try_from(delta).unwrap_or(u64::MAX));
        let done = self
            .bar
            .length()
            .is_some_and(|len| self.bar.position() >= len);
        if done {
            self.bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PROGRESS_TEMPLATE;

    fn hidden(template: &str) -> TemplateBar {
        TemplateBar::new(template, ProgressDrawTarget::hidden())
    }

    #[test]
    fn default_template_translates_every_token() {
        assert_eq!(
            to_indicatif_template(DEFAULT_PROGRESS_TEMPLATE),
            "checked {pos}/{len} [{bar:30}] {per_sec} per second {percent}% ETA: {eta} Pending: {msg}"
        );
        assert!(ProgressStyle::with_template(&to_indicatif_template(DEFAULT_PROGRESS_TEMPLATE)).is_ok());
    }

    #[test]
    fn eta_variants_and_elapsed() {
        assert_eq!(to_indicatif_template(":etas|:eta|:elapsed"), "{eta}|{eta}|{elapsed}");
    }

    #[test]
    fn literal_braces_are_escaped() {
        assert_eq!(to_indicatif_template("{x} :current"), "{{x}} {pos}");
        assert!(ProgressStyle::with_template(&to_indicatif_template("{x} :current")).is_ok());
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(to_indicatif_template("working"), "working");
    }

    #[test]
    fn ticks_advance_position_and_pending() {
        let bar = hidden(":current/:total");
        bar.init(3);
        assert_eq!(bar.progress_bar().length(), Some(3));

        bar.tick(0, 1);
        bar.tick(0, 2);
        assert_eq!(bar.progress_bar().position(), 0);
        assert_eq!(bar.progress_bar().message(), "2");

        bar.tick(1, 1);
        assert_eq!(bar.progress_bar().position(), 1);
        assert_eq!(bar.progress_bar().message(), "1");
        assert!(!bar.progress_bar().is_finished());
    }

    #[test]
    fn last_settlement_finishes_and_later_ticks_are_ignored() {
        let bar = hidden(":current");
        bar.init(2);
        bar.tick(1, 1);
        bar.tick(1, 0);
        assert!(bar.progress_bar().is_finished());
        assert_eq!(bar.progress_bar().position(), 2);

        bar.tick(1, 0);
        assert_eq!(bar.progress_bar().position(), 2);
    }

    #[test]
    fn init_restarts_the_bar() {
        let bar = hidden(":current");
        bar.init(1);
        bar.tick(0, 1);
        bar.init(4);
        assert_eq!(bar.progress_bar().position(), 0);
        assert_eq!(bar.progress_bar().length(), Some(4));
        assert_eq!(bar.progress_bar().message(), "0");
    }
}
