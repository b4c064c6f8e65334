//! Rendering of Thermomix step parameters into instruction text.
//!
//! Upstream stores a step as a single text field. Appliance parameters are
//! embedded in a leading `<nobr>` block, e.g.
//! `<nobr>3 Min./100°C/Stufe 1</nobr> Zwiebeln andünsten`.

use super::CookingStep;

/// Render a step into the upstream instruction text.
///
/// Time, temperature and speed tokens are joined with `/` in that order and
/// wrapped in `<nobr>`. A step without any of the three renders as its raw
/// text.
///
/// # Examples
/// ```
/// use recipe_gateway::domain::{CookingStep, format_step_text};
///
/// let mut step = CookingStep::new(1, "Teig kneten");
/// step.time_seconds = Some(120);
/// step.speed = Some(4);
/// assert_eq!(format_step_text(&step), "<nobr>2 Min./Stufe 4</nobr> Teig kneten");
/// ```
pub fn format_step_text(step: &CookingStep) -> String {
    let tokens: Vec<String> = [
        step.time_seconds.map(format_duration),
        temperature_token(step),
        speed_token(step),
    ]
    .into_iter()
    .flatten()
    .collect();

    if tokens.is_empty() {
        return step.text.clone();
    }
    format!("<nobr>{}</nobr> {}", tokens.join("/"), step.text)
}

fn format_duration(seconds: u32) -> String {
    if seconds < 60 {
        return format!("{seconds} Sek.");
    }
    let minutes = seconds / 60;
    match seconds % 60 {
        0 => format!("{minutes} Min."),
        rest => format!("{minutes} Min. {rest} Sek."),
    }
}

fn temperature_token(step: &CookingStep) -> Option<String> {
    let temperature = step.temperature?;
    if step.use_varoma {
        Some("Varoma".to_owned())
    } else {
        Some(format!("{temperature}°C"))
    }
}

fn speed_token(step: &CookingStep) -> Option<String> {
    let speed = step.speed?;
    if step.use_turbo {
        return Some("Turbo".to_owned());
    }
    if step.use_reverse_rotation {
        Some(format!("Stufe {speed} Linkslauf"))
    } else {
        Some(format!("Stufe {speed}"))
    }
}
