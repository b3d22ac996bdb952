/// Inputs of the effective-login derivation, read fresh on every reaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginInputs {
    pub db_ready: bool,
    /// Static deployment switch.
    pub auth_mode_enabled: bool,
    pub is_signed_in: bool,
    pub is_login: bool,
}

/// `db_ready && (auth_mode_enabled ? is_signed_in : is_login)`.
///
/// `is_login` can be transiently wrong while auth providers resolve; the
/// formula accepts that and only guards against reads before the local store
/// is ready.
pub fn effective_login(inputs: LoginInputs) -> bool {
    inputs.db_ready
        && if inputs.auth_mode_enabled {
            inputs.is_signed_in
        } else {
            inputs.is_login
        }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_inputs() -> impl Iterator<Item = LoginInputs> {
        (0u8..16).map(|bits| LoginInputs {
            db_ready: bits & 1 != 0,
            auth_mode_enabled: bits & 2 != 0,
            is_signed_in: bits & 4 != 0,
            is_login: bits & 8 != 0,
        })
    }

    #[test]
    fn never_logged_in_before_db_ready() {
        for inputs in all_inputs().filter(|i| !i.db_ready) {
            assert!(!effective_login(inputs), "{inputs:?}");
        }
    }

    #[test]
    fn auth_mode_selects_the_signal() {
        for inputs in all_inputs().filter(|i| i.db_ready) {
            let expected = if inputs.auth_mode_enabled {
                inputs.is_signed_in
            } else {
                inputs.is_login
            };
            assert_eq!(effective_login(inputs), expected, "{inputs:?}");
        }
    }

    #[test]
    fn login_without_session_counts_when_auth_mode_is_off() {
        let inputs = LoginInputs {
            db_ready: true,
            auth_mode_enabled: false,
            is_signed_in: false,
            is_login: true,
        };
        assert!(effective_login(inputs));
    }
}
