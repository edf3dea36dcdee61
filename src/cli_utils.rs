use indicatif::{ProgressBar, ProgressStyle};

/// Number of positions of a fraction bar.
pub const FRACTION_STEPS: u64 = 1000;

fn create_progress_bar_template(
    quiet_mode: bool,
    msg: &str,
    length: Option<u64>,
    template_progress: &str,
    template_spinner: &str,
) -> ProgressBar {
    let bar = match quiet_mode {
        true => ProgressBar::hidden(),
        false => {
            match length {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::new_spinner(),
            }
        }
    };

    bar.set_message(msg);
    match length.is_some() {
        true => bar
            .set_style(ProgressStyle::default_bar()
                .template(template_progress)
                .progress_chars("=> ")),
        false => bar
            .set_style(ProgressStyle::default_spinner()
                .template(template_spinner)),
    };

    bar.inc(0);    // Just to avoid the drawing after the log.

    bar
}

pub fn create_progress_bar_bytes(quiet_mode: bool, msg: &str, length: Option<u64>) -> ProgressBar {
    create_progress_bar_template(
        quiet_mode,
        msg,
        length,
        "[{elapsed_precise}] {msg} {spinner:.green} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} eta: {eta}",
        "[{elapsed_precise}] {msg} {spinner:.green} {bytes}"
    )
}

/**
 * Bar driven by a fraction in [0, 1] instead of a count, see `set_fraction`.
 */
pub fn create_progress_bar_fraction(quiet_mode: bool, msg: &str) -> ProgressBar {
    create_progress_bar_template(
        quiet_mode,
        msg,
        Some(FRACTION_STEPS),
        "[{elapsed_precise}] {msg} {spinner:.green} [{wide_bar:.cyan/blue}] eta: {eta}",
        "[{elapsed_precise}] {msg} {spinner:.green}"
    )
}

#[inline]
pub fn set_fraction(bar: &ProgressBar, fraction: f64) {
    let clamped = fraction.max(0.0).min(1.0);
    bar.set_position((clamped * FRACTION_STEPS as f64).round() as u64);
}
