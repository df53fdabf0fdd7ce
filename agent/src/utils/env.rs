use std::env::var_os;

/// Get a specific environment variable value or an empty string
pub(crate) fn get_env_value(value: &str) -> String {
    match var_os(value) {
        Some(env) => env.into_string().unwrap_or_default(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::get_env_value;

    #[test]
    #[cfg(target_family = "unix")]
    fn test_get_env_value() {
        let result = get_env_value("PATH");
        assert!(!result.is_empty())
    }

    #[test]
    fn test_get_env_value_missing() {
        let result = get_env_value("GRIDPULSE_DOES_NOT_EXIST");
        assert!(result.is_empty())
    }
}
