/// Separator placed between surviving fragments.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Two or more spaces inside a line are a layout gap, not a sentence space.
/// Splitting on a double space and dropping the empty pieces covers any
/// longer run as well.
const WIDE_GAP: &str = "  ";

/// Line breaks, including a bare carriage return.
const LINE_BREAKS: [char; 2] = ['\n', '\r'];

/// Collapse raw extracted text into clean paragraphs.
///
/// Every line is trimmed and split on wide gaps, each fragment is trimmed,
/// blank fragments are dropped and the rest are joined with a blank line.
/// Paragraphs are therefore separated by exactly one blank line, and
/// normalizing the output again returns it unchanged.
pub fn normalize_text(text: &str) -> String {
    let fragments: Vec<&str> = text
        .split(LINE_BREAKS)
        .map(str::trim)
        .flat_map(|line| line.split(WIDE_GAP))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect();

    fragments.join(PARAGRAPH_SEPARATOR)
}
