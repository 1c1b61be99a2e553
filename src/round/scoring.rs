// src/round/scoring.rs
use crate::config::ScoringSettings;

/// Итоговые очки раунда: `max(0, base - elapsed_secs - mistake_penalty × mistakes)`
#[must_use]
pub fn compute_score(settings: &ScoringSettings, elapsed_secs: u64, mistakes: u32) -> u32 {
    let penalty = u64::from(settings.mistake_penalty) * u64::from(mistakes);
    u64::from(settings.base)
        .saturating_sub(elapsed_secs)
        .saturating_sub(penalty) as u32
}

/// Время в виде `M:SS`, а при наличии часов — `H:MM:SS`
#[must_use]
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Обратное к `format_duration`. Одиночное число читается как секунды.
#[must_use]
pub fn parse_duration(text: &str) -> Option<u64> {
    let parts = text
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [s] => Some(*s),
        [m, s] if *s < 60 => Some(m * 60 + s),
        [h, m, s] if *m < 60 && *s < 60 => Some(h * 3600 + m * 60 + s),
        _ => None,
    }
}
