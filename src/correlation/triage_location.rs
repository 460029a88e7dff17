use crate::view::filters::KEY_STREAM;
use crate::view::location::Location;

pub const KEY_ISSUE: &str = "issue";

pub fn stream_filter(location: &Location) -> Option<&str> {
    location.get(KEY_STREAM).filter(|v| !v.is_empty())
}

/// Sets the triage stream filter; an empty value removes it.
pub fn with_stream(location: &Location, stream: &str) -> Location {
    let mut next = location.clone();
    if stream.is_empty() {
        next.delete(KEY_STREAM);
    } else {
        next.set(KEY_STREAM, stream);
    }
    next
}

pub fn selected_issue(location: &Location) -> Option<&str> {
    location.get(KEY_ISSUE).filter(|v| !v.is_empty())
}

pub fn with_selected_issue(location: &Location, issue_id: u64) -> Location {
    let mut next = location.clone();
    next.set(KEY_ISSUE, issue_id.to_string());
    next
}
