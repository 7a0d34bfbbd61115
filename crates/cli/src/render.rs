use std::io::{self, Write};

use anyhow::Result;
use catalog_protocol::{serialize_json, Entry};
use catalog_search::{SpecialGroup, Taxonomy, TierFamily};

/// Writes one line to stdout; a closed pipe is not an error.
pub fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .and_then(|()| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

/// `#<id>  <song> - <artist>  (by <creator>)`, skipping absent fields.
#[must_use]
pub fn entry_line(entry: &Entry) -> String {
    let mut line = format!("#{}", entry.id);
    match (entry.field_str("song"), entry.field_str("artist")) {
        (Some(song), Some(artist)) => line.push_str(&format!("  {song} - {artist}")),
        (Some(song), None) => line.push_str(&format!("  {song}")),
        _ => {}
    }
    if let Some(creator) = entry.field_str("creator") {
        line.push_str(&format!("  (by {creator})"));
    }
    line
}

pub fn entry_json(entry: &Entry) -> Result<String> {
    serialize_json(entry)
}

const fn group_label(group: SpecialGroup) -> &'static str {
    match group {
        SpecialGroup::Quantum => "Quantum",
        SpecialGroup::Extra => "Extra",
        SpecialGroup::Hidden => "Hidden",
    }
}

/// Human-readable listing of every tier family.
#[must_use]
pub fn taxonomy_lines(taxonomy: &Taxonomy) -> Vec<String> {
    let pgu: Vec<&str> = taxonomy
        .family(TierFamily::Pgu)
        .iter()
        .map(|t| t.name.as_str())
        .collect();

    let mut lines = vec![format!("PGU: {}", pgu.join(" "))];
    for (group, tiers) in taxonomy.grouped_specials() {
        let names: Vec<&str> = tiers.iter().map(|t| t.name.as_str()).collect();
        lines.push(format!("{}: {}", group_label(group), names.join(" ")));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_protocol::DifficultyTier;
    use pretty_assertions::assert_eq;

    #[test]
    fn entry_line_skips_missing_fields() {
        let full = Entry::new(7)
            .with_field("song", "Night Sky")
            .with_field("artist", "Someone")
            .with_field("creator", "Mapper");
        assert_eq!(entry_line(&full), "#7  Night Sky - Someone  (by Mapper)");
        assert_eq!(entry_line(&Entry::new(8)), "#8");
    }

    #[test]
    fn taxonomy_is_listed_by_family() {
        let taxonomy = Taxonomy::new(vec![
            DifficultyTier::pgu(1, "P1", 1),
            DifficultyTier::pgu(2, "P2", 2),
            DifficultyTier::special(3, "Q1", 101),
            DifficultyTier::special(4, "MP", 200),
            DifficultyTier::special(5, "Censor", 300),
        ]);
        let lines = taxonomy_lines(&taxonomy);
        assert_eq!(lines[0], "PGU: P1 P2");
        assert_eq!(lines[1], "Quantum: Q1");
        assert!(lines.contains(&"Extra: MP".to_string()));
        assert!(lines.contains(&"Hidden: Censor".to_string()));
    }
}
