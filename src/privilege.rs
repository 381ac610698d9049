//! Administrative privilege check.

/// Tells the service whether it runs with administrative rights.
pub trait PrivilegeCheck: Send + Sync {
    fn is_elevated(&self) -> bool;
}

/// Elevated means an effective user id of 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveUser;

impl PrivilegeCheck for EffectiveUser {
    fn is_elevated(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_process_euid() {
        let expected = unsafe { libc::geteuid() } == 0;
        assert_eq!(EffectiveUser.is_elevated(), expected);
    }
}
