//! Color handling for the drawing lambda. Widget color props are named
//! colors, `#RRGGBB` hex, or the theme-dependent `theme_auto` /
//! `transparent` values that resolve through the per-page
//! `color_on`/`color_off` variables.

/// Translate a color prop into the C expression used in the lambda.
pub fn color_const(c: &str) -> String {
    if c.is_empty() {
        return "COLOR_BLACK".to_string();
    }
    let cl = c.to_ascii_lowercase();
    match cl.as_str() {
        "theme_auto" => return "color_on".to_string(),
        "transparent" => return "color_off".to_string(),
        _ => {}
    }
    if let Some((r, g, b)) = parse_hex(&cl) {
        return format!("Color({r}, {g}, {b})");
    }
    match cl.as_str() {
        "white" => "COLOR_WHITE",
        "black" => "COLOR_BLACK",
        "gray" | "grey" => "Color(160, 160, 160)",
        "red" => "COLOR_RED",
        "green" => "COLOR_GREEN",
        "blue" => "COLOR_BLUE",
        "yellow" => "COLOR_YELLOW",
        "orange" => "COLOR_ORANGE",
        _ => "COLOR_BLACK",
    }
    .to_string()
}

fn parse_hex(c: &str) -> Option<(u8, u8, u8)> {
    let hex = c.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Gray needs checkerboard dithering on 1-bit e-paper panels. Hex
/// values count as gray when the channels are near-equal and mid-range.
pub fn is_gray(c: &str) -> bool {
    let cl = c.to_ascii_lowercase();
    if cl == "gray" || cl == "grey" {
        return true;
    }
    if let Some((r, g, b)) = parse_hex(&cl) {
        let (r, g, b) = (r as i16, g as i16, b as i16);
        return (r - g).abs() < 15 && (g - b).abs() < 15 && r > 40 && r < 210;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_colors_resolve_to_page_variables() {
        assert_eq!(color_const("theme_auto"), "color_on");
        assert_eq!(color_const("transparent"), "color_off");
    }

    #[test]
    fn hex_colors_become_color_calls() {
        assert_eq!(color_const("#FF8000"), "Color(255, 128, 0)");
    }

    #[test]
    fn named_and_unknown_colors() {
        assert_eq!(color_const("red"), "COLOR_RED");
        assert_eq!(color_const("mauve"), "COLOR_BLACK");
        assert_eq!(color_const("gray"), "Color(160, 160, 160)");
    }

    #[test]
    fn gray_detection() {
        assert!(is_gray("grey"));
        assert!(is_gray("#808080"));
        assert!(!is_gray("#FF0000"));
        assert!(!is_gray("#101010"));
    }
}
