use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::models::{TileCoord, Transport};

fn parse_coord(field: &str) -> Result<TileCoord> {
    let parts: Vec<&str> = field.split_whitespace().collect();
    if parts.len() != 3 {
        bail!("expected 'x y plane', got '{}'", field);
    }
    let x = parts[0].parse::<i32>().with_context(|| format!("bad x in '{}'", field))?;
    let y = parts[1].parse::<i32>().with_context(|| format!("bad y in '{}'", field))?;
    let plane = parts[2].parse::<i32>().with_context(|| format!("bad plane in '{}'", field))?;
    Ok(TileCoord::new(x, y, plane))
}

// "31 Agility;22 Ranged;35 Strength": the level is the first token of each item.
fn parse_requirements(field: &str) -> Result<(i32, i32, i32)> {
    let mut levels = [0i32; 3];
    for (slot, item) in field.split(';').take(3).enumerate() {
        match item.split_whitespace().next() {
            Some(tok) => {
                levels[slot] = tok
                    .parse::<i32>()
                    .with_context(|| format!("bad requirement level '{}'", item.trim()))?;
            }
            None => continue,
        }
    }
    Ok((levels[0], levels[1], levels[2]))
}

/// Parses one tab-separated transport record.
pub fn parse_line(line: &str) -> Result<Transport> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < 2 {
        bail!("expected at least origin and destination columns");
    }
    let origin = parse_coord(cols[0]).context("origin")?;
    let destination = parse_coord(cols[1]).context("destination")?;
    let (agility, ranged, strength) = match cols.get(3) {
        Some(req) if !req.starts_with('"') => parse_requirements(req)?,
        _ => (0, 0, 0),
    };
    Ok(Transport::with_requirements(origin, destination, agility, ranged, strength))
}

/// Parses a whole transport file body; comments and blank lines are skipped.
pub fn parse_str(text: &str) -> Result<Vec<Transport>> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let t = parse_line(line).with_context(|| format!("transport line {}: '{}'", idx + 1, line))?;
        out.push(t);
    }
    Ok(out)
}

pub fn from_file(path: &Path) -> Result<Vec<Transport>> {
    let text = fs::read_to_string(path).with_context(|| format!("read transports {}", path.display()))?;
    let transports = parse_str(&text).with_context(|| format!("parse transports {}", path.display()))?;
    log::info!("transports: loaded {} from {}", transports.len(), path.display());
    Ok(transports)
}
