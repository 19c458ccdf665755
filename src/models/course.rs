//! Course identifiers and the chat room names derived from them.

use serde_json::json;

use crate::errors::{ChatError, ChatResult};

/// Room prefix used when none is configured.
pub const DEFAULT_ROOM_PREFIX: &str = "edx";

/// Derive the chat room name for a course.
///
/// Course keys look like `course-v1:ORG+NUMBER+TERM`. The segment after the
/// first `:` is kept, every `+` in it becomes `-`, and the result is joined
/// to `prefix` with a `-`:
///
/// `course-v1:IT_IS+ICT_01+2022_SUMMER` → `edx-IT_IS-ICT_01-2022_SUMMER`
///
/// All other characters are kept as-is.
///
/// # Errors
///
/// Returns an input validation [`ChatError`] when the key has no second
/// `:`-separated segment or that segment is empty.
pub fn derive_room_name(prefix: &str, course_key: &str) -> ChatResult<String> {
    let segment = course_key
        .split(':')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| {
            ChatError::invalid_input(
                json!({ "ArgError": format!("Course ID \"{course_key}\" is not valid.") }),
                "Error parsing course data.",
            )
        })?;

    Ok(format!("{prefix}-{}", segment.replace('+', "-")))
}
