use anyhow::{Context, Result};
use regex::Regex;
use std::env;
use tracing::{debug, warn};

const PLACEHOLDER: &str = r"\$\{(\w+)\}|\$(\w+)";

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(PLACEHOLDER).context("Invalid placeholder pattern")?;
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for caps in re.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
            continue;
        };
        let var_name = name.as_str();

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", var_name);
                result = result.replace(whole.as_str(), &value);
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                // Left in place; validation reports it
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may use defaults or fail validation): {:?}",
            missing_vars
        );
    }

    Ok(result)
}

/// Get environment variable with a default value
pub fn get_env_or_default(var_name: &str, default: &str) -> String {
    match env::var(var_name) {
        Ok(value) => {
            debug!("Using environment variable: {} = \"{}\"", var_name, value);
            value
        }
        Err(_) => {
            debug!(
                "Environment variable '{}' not set, using default: \"{}\"",
                var_name, default
            );
            default.to_string()
        }
    }
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    Regex::new(PLACEHOLDER)
        .map(|re| re.is_match(content))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_placeholder_forms() {
        env::set_var("TR_SUBST_A", "alpha");
        env::set_var("TR_SUBST_B", "beta");
        let out = substitute_env_vars("a: ${TR_SUBST_A}\nb: $TR_SUBST_B\n").unwrap();
        assert_eq!(out, "a: alpha\nb: beta\n");
    }

    #[test]
    fn test_missing_var_left_in_place() {
        env::remove_var("TR_SUBST_MISSING");
        let out = substitute_env_vars("url: ${TR_SUBST_MISSING}").unwrap();
        assert_eq!(out, "url: ${TR_SUBST_MISSING}");
        assert!(has_unresolved_env_vars(&out));
    }

    #[test]
    fn test_get_env_or_default() {
        env::remove_var("TR_SUBST_UNSET");
        assert_eq!(get_env_or_default("TR_SUBST_UNSET", "fallback"), "fallback");
        env::set_var("TR_SUBST_SET", "value");
        assert_eq!(get_env_or_default("TR_SUBST_SET", "fallback"), "value");
    }

    #[test]
    fn test_plain_text_has_no_placeholders() {
        assert!(!has_unresolved_env_vars("https://www.deribit.com/api/v2"));
    }
}
