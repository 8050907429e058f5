//! Segment list normalization.

/// Clean a segment list and bound it to `max_segments` entries.
///
/// Blank entries are dropped and the rest trimmed. Entries past the bound are
/// appended to the last allowed segment so no script text is lost. An empty
/// result falls back to the whole `script` as a single segment.
pub fn bound_segments(segments: Vec<String>, max_segments: usize, script: &str) -> Vec<String> {
    let max_segments = max_segments.max(1);
    let mut bounded: Vec<String> = Vec::with_capacity(max_segments);

    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if bounded.len() < max_segments {
            bounded.push(segment.to_string());
        } else if let Some(last) = bounded.last_mut() {
            last.push(' ');
            last.push_str(segment);
        }
    }

    if bounded.is_empty() && !script.trim().is_empty() {
        bounded.push(script.trim().to_string());
    }
    bounded
}
