//! Substring-scan extraction over raw forecast JSON.
//!
//! None of these functions parse JSON. They scan for known markers and field
//! names and pull values out of the text in between, falling back to `0.0`
//! or `""` whenever something is missing. A value that cannot be found never
//! stops the caller from extracting the next one.

const VALUE_TERMINATORS: [char; 3] = [',', '}', ']'];

/// One lookup against a forecast document: where to look, what to look for,
/// and how many array items to take at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRequest<'a> {
    pub section: &'a str,
    pub field: &'a str,
    pub max_items: Option<usize>,
}

impl<'a> ExtractionRequest<'a> {
    pub const fn new(section: &'a str, field: &'a str) -> Self {
        Self { section, field, max_items: None }
    }

    pub const fn limit(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Scalar lookup of `field` after the `section` marker in the whole document.
    pub fn scalar(&self, json: &str) -> f64 {
        extract_scalar(json, self.section, self.field)
    }

    /// Numeric array lookup inside an already isolated section body.
    pub fn numbers_into(&self, section_body: &str, out: &mut [f64]) -> usize {
        fill_numbers(section_body, self.field, out, self.max_items)
    }

    /// String array lookup inside an already isolated section body.
    pub fn strings_into(&self, section_body: &str, out: &mut [String]) -> usize {
        let limit = self.max_items.map_or(out.len(), |max| max.min(out.len()));
        fill_strings(section_body, self.field, &mut out[..limit])
    }
}

/// Reads a single number for `field` somewhere after `section_marker`.
///
/// The scan goes marker, then `{`, then the field name, then `:`, and takes
/// everything up to the next `,`, `}` or `]`. Nested objects are not tracked,
/// so a field name that appears earlier in a sibling object wins.
pub fn extract_scalar(json: &str, section_marker: &str, field: &str) -> f64 {
    scalar_token(json, section_marker, field)
        .and_then(parse_number)
        .unwrap_or(0.0)
}

fn scalar_token<'a>(json: &'a str, section_marker: &str, field: &str) -> Option<&'a str> {
    let section_start = json.find(section_marker)?;
    let brace = section_start + json[section_start..].find('{')?;
    let key = brace + json[brace..].find(field)?;
    let colon = key + json[key..].find(':')?;

    let value_start = colon + 1;
    let value_end = value_start + json[value_start..].find(VALUE_TERMINATORS)?;

    Some(strip_enclosing_quotes(json[value_start..value_end].trim()))
}

/// Finds `marker` and returns the balanced `{...}` body that follows it.
pub fn find_section<'a>(json: &'a str, marker: &str) -> &'a str {
    match json.find(marker) {
        Some(start) => extract_balanced_section(json, start),
        None => "",
    }
}

/// Returns the brace-balanced object starting at the first `{` at or after
/// `start`, braces included. Empty when there is no `{` or the braces never
/// close before the end of the input.
pub fn extract_balanced_section(json: &str, start: usize) -> &str {
    let Some(tail) = json.get(start..) else {
        return "";
    };
    let Some(open) = tail.find('{').map(|offset| start + offset) else {
        return "";
    };

    let mut depth = 0usize;
    for (offset, byte) in json.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return &json[open..=open + offset];
                }
            }
            _ => {}
        }
    }

    ""
}

/// Overwrites a prefix of `out` with the numbers of the `field` array.
///
/// `null` and anything that does not parse as a number become `0.0`. At most
/// `max_items` values are written, never more than `out.len()`. Returns the
/// number of slots written.
pub fn fill_numbers(
    section: &str,
    field: &str,
    out: &mut [f64],
    max_items: Option<usize>,
) -> usize {
    let Some(items) = array_items(section, field) else {
        return 0;
    };

    let limit = max_items.map_or(out.len(), |max| max.min(out.len()));
    let mut written = 0;
    for (slot, item) in out.iter_mut().take(limit).zip(items) {
        *slot = if item.eq_ignore_ascii_case("null") {
            0.0
        } else {
            parse_number(item).unwrap_or(0.0)
        };
        written += 1;
    }
    written
}

/// Overwrites a prefix of `out` with the items of the `field` array, quotes
/// removed. `null` becomes the empty string.
pub fn fill_strings(section: &str, field: &str, out: &mut [String]) -> usize {
    let Some(items) = array_items(section, field) else {
        return 0;
    };

    let mut written = 0;
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = if item.eq_ignore_ascii_case("null") { String::new() } else { item.to_owned() };
        written += 1;
    }
    written
}

/// Reads the `"time"` array of a section.
pub fn fill_times(section: &str, out: &mut [String]) -> usize {
    fill_strings(section, "\"time\"", out)
}

/// Splits the first `[...]` after `field` on commas. Items come back trimmed
/// and without surrounding quotes.
fn array_items<'a>(section: &'a str, field: &str) -> Option<impl Iterator<Item = &'a str>> {
    if section.is_empty() {
        return None;
    }

    let field_start = section.find(field)?;
    let open = field_start + section[field_start..].find('[')?;
    let close = open + section[open..].find(']')?;

    Some(section[open + 1..close].split(',').map(|item| item.trim().trim_matches('"')))
}

fn strip_enclosing_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_number(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}
