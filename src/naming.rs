//! Release naming helpers
//!
//! Turns show names into the dotted "scene" spelling used by release
//! groups, expands a show into every name it may be released under, and
//! renders the episode tokens that follow the name in a search string.

use crate::show::Show;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Default season/episode numbering pattern (`S01E02`)
pub const DEFAULT_EPISODE_PATTERN: &str = "S{season:02}E{episode:02}";

/// Widest zero padding a `{name:NN}` placeholder may request
pub const MAX_PADDING_WIDTH: usize = 9;

/// Produces every name a show may be released under
pub trait NameVariants {
    /// Returns the distinct names for `show`
    ///
    /// Iteration order carries no meaning.
    fn all_names(&self, show: &Show) -> BTreeSet<String>;
}

/// Name variants derived from the show name and its aliases
///
/// Besides the names themselves, a name ending in a year or country tag,
/// such as `Shameless (US)` or `Doctor Who (2005)`, also yields the bare name.
#[derive(Debug, Default, Clone, Copy)]
pub struct SceneNames;

impl NameVariants for SceneNames {
    fn all_names(&self, show: &Show) -> BTreeSet<String> {
        let mut names = BTreeSet::new();

        for name in std::iter::once(&show.name).chain(show.aliases.iter()) {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            names.insert(name.to_string());
            if let Some(bare) = strip_release_tag(name) {
                names.insert(bare.to_string());
            }
        }

        names
    }
}

/// Strips a trailing `(YYYY)` or `(CC)` tag from a show name
fn strip_release_tag(name: &str) -> Option<&str> {
    let open = name.rfind(" (")?;
    let tag = name[open + 2..].strip_suffix(')')?;

    let is_year = tag.len() == 4 && tag.chars().all(|c| c.is_ascii_digit());
    let is_country = tag.len() == 2 && tag.chars().all(|c| c.is_ascii_uppercase());

    if is_year || is_country {
        Some(name[..open].trim_end())
    } else {
        None
    }
}

/// Sanitizes a show name into its dotted scene spelling
///
/// - Drops `, : ( ) ' ! ?` and the typographic apostrophe
/// - Turns `"- "`, spaces and `/` into dots, `&` into `and`
/// - Collapses runs of dots and trims a trailing dot
pub fn sanitize_scene_name(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, ',' | ':' | '(' | ')' | '\'' | '!' | '?' | '\u{2019}'))
        .collect();

    let dotted = stripped
        .replace("- ", ".")
        .replace(' ', ".")
        .replace('&', "and")
        .replace('/', ".");

    let mut collapsed = String::with_capacity(dotted.len());
    for c in dotted.chars() {
        if c == '.' && collapsed.ends_with('.') {
            continue;
        }
        collapsed.push(c);
    }

    match collapsed.strip_suffix('.') {
        Some(trimmed) => trimmed.to_string(),
        None => collapsed,
    }
}

/// Renders the season/episode token from a numbering pattern
///
/// Supported placeholders:
/// - `{season}` or `{season:NN}` - Season number with optional zero-padding
/// - `{episode}` or `{episode:NN}` - Episode number with optional zero-padding
///
/// # Examples
///
/// ```
/// use kat_search::format_episode_token;
///
/// assert_eq!(format_episode_token("S{season:02}E{episode:02}", 1, 2), "S01E02");
/// assert_eq!(format_episode_token("{season}x{episode:02}", 3, 9), "3x09");
/// ```
pub fn format_episode_token(pattern: &str, season: u32, episode: u32) -> String {
    let result = replace_with_padding(pattern, "season", season);
    replace_with_padding(&result, "episode", episode)
}

/// Returns true when every placeholder in `pattern` gets substituted
///
/// Malformed or over-wide `{season:NN}`/`{episode:NN}` placeholders are left
/// in the output verbatim, which this detects.
pub fn is_valid_episode_pattern(pattern: &str) -> bool {
    let token = format_episode_token(pattern, 1, 1);
    !token.contains("{season") && !token.contains("{episode")
}

/// Renders an air date as the `YYYY.MM.DD` token used by daily releases
pub fn format_air_date(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

/// Replaces `{name}` and `{name:NN}` placeholders, NN being the padding width
fn replace_with_padding(text: &str, name: &str, value: u32) -> String {
    let mut result = text.to_string();

    let pattern_start = format!("{{{name}:");
    let mut search_from = 0;
    while let Some(offset) = result[search_from..].find(&pattern_start) {
        let start = search_from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let full_pattern = result[start..start + end + 1].to_string();
        let padding_str = &full_pattern[pattern_start.len()..full_pattern.len() - 1];

        match padding_str.parse::<usize>() {
            Ok(width) if width <= MAX_PADDING_WIDTH => {
                let formatted = format!("{:0width$}", value, width = width);
                result.replace_range(start..start + end + 1, &formatted);
                search_from = start + formatted.len();
            }
            // Leave malformed and over-wide widths untouched
            _ => search_from = start + full_pattern.len(),
        }
    }

    result.replace(&format!("{{{name}}}"), &value.to_string())
}
