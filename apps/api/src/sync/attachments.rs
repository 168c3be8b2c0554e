use crate::gmail::MessagePart;

/// Returns true when any part of the MIME tree carries a filename that
/// looks like a resume. The result is informational only for now — it is
/// logged but not persisted, pending a resume/outreach link in the data
/// model.
pub fn has_resume_attachment(payload: Option<&MessagePart>) -> bool {
    payload.is_some_and(scan_parts)
}

fn scan_parts(part: &MessagePart) -> bool {
    for child in part.parts.iter().flatten() {
        if let Some(filename) = child.filename.as_deref() {
            if !filename.is_empty() && looks_like_resume(filename) {
                return true;
            }
        }
        if scan_parts(child) {
            return true;
        }
    }
    false
}

fn looks_like_resume(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.contains("resume")
        || lower.contains("cv")
        || lower.ends_with(".pdf")
        || lower.ends_with(".docx")
}
