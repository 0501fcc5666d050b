use std::env;

/// Read a boolean flag. `1`, `true`, `yes` and `on` are truthy; anything else is false.
pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Read a trimmed, non-empty string value.
pub fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn env_string_or(key: &str, default: &str) -> String {
    env_string(key).unwrap_or_else(|| default.to_owned())
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn parse_bool_accepts_common_truthy_values() {
        for raw in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(parse_bool(raw), "{raw} should be truthy");
        }
    }

    #[test]
    fn parse_bool_rejects_everything_else() {
        for raw in ["0", "false", "", "enabled", "nope"] {
            assert!(!parse_bool(raw), "{raw} should be falsy");
        }
    }
}
