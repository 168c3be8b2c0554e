/// Parses raw "To" headers into structured recipient lists.
///
/// Callers must treat an empty result as "nothing to do", not an error.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Splits the header on commas that sit outside `<...>` and outside quoted
/// display names, then parses each segment as `"Name" <email>`,
/// `Name <email>`, or a bare email. Entries without a usable email are
/// dropped; emails are lower-cased.
pub fn parse_recipients(to_header: &str) -> Vec<Recipient> {
    if to_header.trim().is_empty() {
        return Vec::new();
    }

    split_recipients(to_header)
        .into_iter()
        .filter_map(parse_segment)
        .collect()
}

fn split_recipients(header: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_angle = false;
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match c {
            '"' => {
                // Only a quote at the start of a segment opens a quoted
                // display name; anything else (a closing quote, or a stray
                // quote inside an unquoted name) must not latch the state
                // and swallow the remaining recipients.
                if in_quote {
                    in_quote = false;
                } else if header[start..i].trim().is_empty() {
                    in_quote = true;
                }
            }
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            ',' if !in_angle && !in_quote => {
                segments.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&header[start..]);
    segments
}

fn parse_segment(segment: &str) -> Option<Recipient> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    if let Some(lt) = segment.find('<') {
        // "Name" <email> or Name <email>; tolerate a missing closing '>'
        let gt = segment[lt..].find('>').map_or(segment.len(), |i| lt + i);
        let email = segment[lt + 1..gt].trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return None;
        }
        let name = segment[..lt].trim().trim_matches('"').trim().to_string();
        return Some(Recipient { name, email });
    }

    if segment.contains('@') {
        return Some(Recipient {
            name: String::new(),
            email: segment.to_lowercase(),
        });
    }

    None
}
