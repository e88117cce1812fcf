//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Strings without `${` are returned unchanged, so bare `$` characters in
/// URLs survive untouched.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_owner_from_env() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MMV_EXPAND_OWNER", "acme");
        }
        let result = expand_env("${MMV_EXPAND_OWNER}", "source.owner").unwrap();
        assert_eq!(result, "acme");
        unsafe {
            std::env::remove_var("MMV_EXPAND_OWNER");
        }
    }

    #[test]
    fn test_expand_default_branch() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MMV_EXPAND_UNSET_BRANCH");
        }
        let result = expand_env("${MMV_EXPAND_UNSET_BRANCH:-main}", "source.branch").unwrap();
        assert_eq!(result, "main");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MMV_EXPAND_MISSING");
        }
        let err = expand_env("${MMV_EXPAND_MISSING}", "source.repo").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MMV_EXPAND_MISSING"));
        assert!(err.to_string().contains("source.repo"));
    }

    #[test]
    fn test_expand_inside_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MMV_EXPAND_HOST", "cdn.example.com");
        }
        let result = expand_env("https://${MMV_EXPAND_HOST}/manuals/", "source.raw_root").unwrap();
        assert_eq!(result, "https://cdn.example.com/manuals/");
        unsafe {
            std::env::remove_var("MMV_EXPAND_HOST");
        }
    }

    #[test]
    fn test_bare_dollar_left_alone() {
        let result = expand_env("https://example.com/$branch", "source.raw_root").unwrap();
        assert_eq!(result, "https://example.com/$branch");
    }
}
