//! Extraction of structured suggestions from generated text.

use super::errors::RecommendationError;
use super::models::{SuggestionItem, Suggestions};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SONGS_SECTION: Regex = Regex::new(r"(?is)SONGS:(.*?)ALBUMS:").unwrap();
    static ref ALBUMS_SECTION: Regex = Regex::new(r"(?is)ALBUMS:(.*)").unwrap();
    // "<ordinal>. <name> - <artist>". The name is matched lazily so that the
    // first spaced dash separates it from the artist.
    static ref SUGGESTION_LINE: Regex =
        Regex::new(r"^\s*\d+\.\s*(.+?)\s+[-–—]\s+(.+?)\s*$").unwrap();
}

/// Splits generated text into song and album suggestions.
///
/// Both the `SONGS:` and `ALBUMS:` headings must be present. Lines inside a
/// section that do not follow the numbered `Name - Artist` format are dropped.
pub fn parse_suggestions(raw: &str) -> Result<Suggestions, RecommendationError> {
    let songs = SONGS_SECTION
        .captures(raw)
        .and_then(|c| c.get(1))
        .ok_or_else(|| {
            RecommendationError::MalformedGenerationOutput("missing SONGS section".to_string())
        })?;
    let albums = ALBUMS_SECTION
        .captures(raw)
        .and_then(|c| c.get(1))
        .ok_or_else(|| {
            RecommendationError::MalformedGenerationOutput("missing ALBUMS section".to_string())
        })?;

    Ok(Suggestions {
        songs: parse_section(songs.as_str()),
        albums: parse_section(albums.as_str()),
    })
}

fn parse_section(section: &str) -> Vec<SuggestionItem> {
    section
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<SuggestionItem> {
    let caps = SUGGESTION_LINE.captures(line)?;
    let name = caps.get(1)?.as_str().trim();
    let artist = caps.get(2)?.as_str().trim();
    if name.is_empty() || artist.is_empty() {
        return None;
    }
    Some(SuggestionItem::new(name, artist))
}
