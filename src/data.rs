use crate::error::{InvalidIdSnafu, RosterResult};
use snafu::ResultExt;

pub mod student;

/// Ids arrive as path segments; anything that isn't an integer is invalid
/// input rather than a missing student.
pub fn parse_id(raw: &str) -> RosterResult<i32> {
    raw.trim()
        .parse()
        .context(InvalidIdSnafu { original: raw })
}
