//! Group-name scripting metadata
//!
//! Named groups can encode display metadata directly in their name: an
//! extraction variable (`VAR_requestId`), a highlight color by name
//! (`green`) or by components (`RGB_12_250_115`), or several of these glued
//! together with the `_and_` delimiter:
//!
//! ```text
//! (?<VAR_level_and_orange>ERROR|WARN)
//! ```
//!
//! [`parse_group_name`] extracts that metadata leniently: unrecognized parts
//! are simply ignored, and for each kind of metadata the first hit wins.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::token::Rgb;

/// Case-insensitive delimiter between scripting parts of a group name.
pub const SCRIPTING_DELIMITER: &str = "_and_";

/// Metadata extracted from one raw group name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMetadata {
    /// Extraction variable name, when a `VAR_` part is present.
    pub var_name: Option<String>,
    /// Highlight color, when a color part is present.
    pub color: Option<Rgb>,
}

static DELIMITER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)_and_").expect("static pattern"));

static RGB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^RGB_([0-9]{1,3})_([0-9]{1,3})_([0-9]{1,3})$").expect("static pattern"));

static VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)VAR_(\w+)").expect("static pattern"));

/// Named colors understood inside group names, keyed lowercase.
static COLOR_TABLE: Lazy<HashMap<&'static str, Rgb>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("ok", Rgb::new(0, 150, 0));
    m.insert("warning", Rgb::new(150, 150, 0));
    m.insert("error", Rgb::new(150, 0, 0));
    m.insert("black", Rgb::new(0, 0, 0));
    m.insert("white", Rgb::new(255, 255, 255));
    m.insert("red", Rgb::new(255, 0, 0));
    m.insert("lime", Rgb::new(0, 255, 0));
    m.insert("blue", Rgb::new(0, 0, 255));
    m.insert("yellow", Rgb::new(255, 255, 0));
    m.insert("cyan", Rgb::new(0, 255, 255));
    m.insert("magenta", Rgb::new(255, 0, 255));
    m.insert("silver", Rgb::new(192, 192, 192));
    m.insert("gray", Rgb::new(128, 128, 128));
    m.insert("maroon", Rgb::new(128, 0, 0));
    m.insert("olive", Rgb::new(128, 128, 0));
    m.insert("green", Rgb::new(0, 128, 0));
    m.insert("purple", Rgb::new(128, 0, 128));
    m.insert("teal", Rgb::new(0, 128, 128));
    m.insert("navy", Rgb::new(0, 0, 128));
    m.insert("dark_red", Rgb::new(139, 0, 0));
    m.insert("brown", Rgb::new(165, 42, 42));
    m.insert("crimson", Rgb::new(220, 20, 60));
    m.insert("tomato", Rgb::new(255, 99, 71));
    m.insert("coral", Rgb::new(255, 127, 80));
    m.insert("salmon", Rgb::new(250, 128, 114));
    m.insert("orange_red", Rgb::new(255, 69, 0));
    m.insert("orange", Rgb::new(255, 165, 0));
    m.insert("gold", Rgb::new(255, 215, 0));
    m.insert("khaki", Rgb::new(240, 230, 140));
    m.insert("dark_green", Rgb::new(0, 100, 0));
    m.insert("forest_green", Rgb::new(34, 139, 34));
    m.insert("light_green", Rgb::new(144, 238, 144));
    m.insert("spring_green", Rgb::new(0, 255, 127));
    m
});

fn clamp_component(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

/// Parses one raw group name into its scripting metadata.
///
/// The name splits on the case-insensitive `_and_` delimiter (empty parts
/// skipped); each part is checked for an `RGB_r_g_b` color, then a named
/// color, then a `VAR_` variable. The first color hit and the first variable
/// hit win; everything else in the name is ignored.
pub fn parse_group_name(raw_name: &str) -> GroupMetadata {
    let mut metadata = GroupMetadata::default();

    for part in DELIMITER_RE.split(raw_name).filter(|p| !p.is_empty()) {
        if metadata.color.is_none() {
            if let Some(caps) = RGB_RE.captures(part) {
                let component = |i: usize| {
                    caps.get(i)
                        .and_then(|m| m.as_str().parse::<i64>().ok())
                        .map(clamp_component)
                };
                if let (Some(r), Some(g), Some(b)) = (component(1), component(2), component(3)) {
                    metadata.color = Some(Rgb::new(r, g, b));
                }
            } else if let Some(color) = COLOR_TABLE.get(part.to_lowercase().as_str()) {
                metadata.color = Some(*color);
            }
        }

        if metadata.var_name.is_none() {
            if let Some(caps) = VAR_RE.captures(part) {
                metadata.var_name = Some(caps[1].to_string());
            }
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_plain_name_has_no_metadata() {
        assert_eq!(parse_group_name("timestamp"), GroupMetadata::default());
    }

    #[test]
    fn test_var_extraction() {
        let meta = parse_group_name("VAR_requestId");
        assert_eq!(meta.var_name.as_deref(), Some("requestId"));
        assert_eq!(meta.color, None);
    }

    #[rstest]
    #[case("green", Rgb::new(0, 128, 0))]
    #[case("GREEN", Rgb::new(0, 128, 0))]
    #[case("RGB_12_250_115", Rgb::new(12, 250, 115))]
    #[case("rgb_0_0_0", Rgb::new(0, 0, 0))]
    #[case("RGB_999_0_0", Rgb::new(255, 0, 0))]
    fn test_color_extraction(#[case] name: &str, #[case] expected: Rgb) {
        assert_eq!(parse_group_name(name).color, Some(expected));
    }

    #[test]
    fn test_combined_parts() {
        let meta = parse_group_name("VAR_level_AND_orange");
        assert_eq!(meta.var_name.as_deref(), Some("level"));
        assert_eq!(meta.color, Some(Rgb::new(255, 165, 0)));
    }

    #[test]
    fn test_first_hit_wins() {
        let meta = parse_group_name("red_and_blue_and_VAR_a_and_VAR_b");
        assert_eq!(meta.color, Some(Rgb::new(255, 0, 0)));
        assert_eq!(meta.var_name.as_deref(), Some("a"));
    }

    #[test]
    fn test_malformed_rgb_is_not_a_color() {
        assert_eq!(parse_group_name("RGB_1_2").color, None);
        assert_eq!(parse_group_name("RGB_1_2_3_4").color, None);
    }
}
