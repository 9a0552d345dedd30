use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;

use tiernotes_core::Tier;
use tiernotes_core::classify::heuristic::TierBuckets;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn tier_label(tier: Tier, color: ColorMode) -> String {
    let label = format!("[{}]", tier.as_str().to_uppercase());
    if !color.enabled() {
        return label;
    }
    match tier {
        Tier::Easy => label.green().bold().to_string(),
        Tier::Medium => label.yellow().bold().to_string(),
        Tier::Hard => label.red().bold().to_string(),
    }
}

/// Print the sentences of each tier, easiest first.
pub fn print_buckets(
    w: &mut dyn Write,
    file_name: &str,
    buckets: &TierBuckets,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({} sentences kept)\n",
            "DRY RUN:".bold().cyan(),
            file_name.bold(),
            buckets.len()
        )?;
    } else {
        writeln!(w, "DRY RUN: {} ({} sentences kept)\n", file_name, buckets.len())?;
    }

    for tier in Tier::ALL {
        let sentences = buckets.get(tier);
        writeln!(
            w,
            "{} {} ({})",
            tier_label(tier, color),
            tier.title(),
            sentences.len()
        )?;
        if sentences.is_empty() {
            let note = format!("  (empty, will read \"{}\")", tier.placeholder());
            if color.enabled() {
                writeln!(w, "{}", note.dimmed())?;
            } else {
                writeln!(w, "{}", note)?;
            }
        }
        for sentence in sentences {
            writeln!(w, "  - {}", sentence)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Print where the three notes were written.
pub fn print_written(w: &mut dyn Write, dir: &Path, color: ColorMode) -> std::io::Result<()> {
    for tier in Tier::ALL {
        let path = dir.join(tier.file_name());
        if color.enabled() {
            writeln!(w, "{} {}", tier_label(tier, color), path.display().bold())?;
        } else {
            writeln!(w, "{} {}", tier_label(tier, color), path.display())?;
        }
    }
    Ok(())
}
