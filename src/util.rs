use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_usd(amount: i64) -> String {
    let magnitude = amount.unsigned_abs();
    let sign = if amount < 0 { "-" } else { "" };

    if magnitude >= 1_000_000_000 {
        format!("{sign}${:.2}B", magnitude as f64 / 1e9)
    } else if magnitude >= 1_000_000 {
        format!("{sign}${:.1}M", magnitude as f64 / 1e6)
    } else if magnitude >= 1_000 {
        format!("{sign}${:.1}K", magnitude as f64 / 1e3)
    } else {
        format!("{sign}${magnitude}")
    }
}

pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept = text
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    format!("{}…", kept.trim_end())
}

/// Deterministic pseudo-random pair in [-1, 1] derived from an id, so layout
/// seeding is stable across runs for the same node.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
