//! Character-count word wrapping used when laying out static text in
//! the drawing lambda. Widths are estimated from the font size since
//! real glyph metrics only exist on the device.

/// Split `text` into lines that fit `max_width` pixels. Explicit
/// newlines always break; words longer than a line stand alone.
pub fn word_wrap(text: &str, max_width: i32, font_size: i32, font_family: &str) -> Vec<String> {
    let family = font_family.to_ascii_lowercase();
    let monospace = family.contains("mono") || family.contains("courier") || family.contains("consolas");
    let avg_char_width = font_size as f64 * if monospace { 0.6 } else { 0.52 };
    let max_chars = (max_width as f64 / avg_char_width).floor() as usize;

    if max_chars == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate_len = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if candidate_len > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            } else if current.is_empty() {
                current = word.to_string();
            } else {
                current.push(' ');
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines
}
