//! Stable exit codes for teachkit commands.

use crate::error::ErrorKind;

/// Command succeeded.
pub const OK: i32 = 0;
/// Generic failure: I/O, invalid input, unsupported operation.
pub const FAILURE: i32 = 1;
/// The target is not a workspace, or does not exist.
pub const NOT_A_WORKSPACE: i32 = 2;
/// The operation is forbidden in the current situation.
pub const POLICY: i32 = 3;
/// Configuration defect (unregistered key, wrong type).
pub const CONFIG: i32 = 4;

pub fn for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NotAWorkspace | ErrorKind::NotFound => NOT_A_WORKSPACE,
        ErrorKind::Policy => POLICY,
        ErrorKind::Config => CONFIG,
        ErrorKind::Io | ErrorKind::InvalidInput | ErrorKind::Unsupported => FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_distinct_families() {
        assert_eq!(for_kind(ErrorKind::NotFound), NOT_A_WORKSPACE);
        assert_eq!(for_kind(ErrorKind::Policy), POLICY);
        assert_eq!(for_kind(ErrorKind::Config), CONFIG);
        assert_eq!(for_kind(ErrorKind::Unsupported), FAILURE);
    }
}
