//! Byte-budget truncation of combined payloads.

/// Suffix appended to every payload that had to be cut down.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Outcome of fitting a payload into a byte budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub text: String,
    pub truncated: bool,
}

/// Fit `combined` into `max_bytes`.
///
/// Payloads within budget are returned untouched. Larger ones keep their
/// newest (trailing) bytes followed by [`TRUNCATION_MARKER`]; the oldest
/// bytes are discarded. The cut always lands on a UTF-8 character boundary,
/// so the result may come in a few bytes under budget but never over it.
pub fn truncate_to_budget(combined: String, max_bytes: usize) -> Truncated {
    if combined.len() <= max_bytes {
        return Truncated {
            text: combined,
            truncated: false,
        };
    }

    let Some(keep) = max_bytes.checked_sub(TRUNCATION_MARKER.len()) else {
        // Budget cannot even hold the marker; the marker is ASCII so any
        // byte prefix of it is valid.
        return Truncated {
            text: TRUNCATION_MARKER[..max_bytes].to_string(),
            truncated: true,
        };
    };

    let mut start = combined.len() - keep;
    while !combined.is_char_boundary(start) {
        start += 1;
    }

    let mut text = String::with_capacity(combined.len() - start + TRUNCATION_MARKER.len());
    text.push_str(&combined[start..]);
    text.push_str(TRUNCATION_MARKER);
    Truncated {
        text,
        truncated: true,
    }
}
