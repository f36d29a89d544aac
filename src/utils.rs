use std::path::PathBuf;

/// Expand a leading `~` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Render a duration in minutes the way playbook timings are reported.
pub fn format_minutes(elapsed: std::time::Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64() / 60.0)
}

/// Truncate error message to a reasonable number of lines for display
pub fn truncate_error_message(message: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = message.lines().collect();
    if lines.len() <= max_lines {
        message.to_string()
    } else {
        let truncated_lines = &lines[..max_lines];
        format!(
            "{}\n... (truncated {} more lines)",
            truncated_lines.join("\n"),
            lines.len() - max_lines
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/etc/ansible"), PathBuf::from("/etc/ansible"));
        assert_eq!(expand_home("relative/file"), PathBuf::from("relative/file"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.vault"), home.join(".vault"));
            assert_eq!(expand_home("~"), home);
        }
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(Duration::from_secs(90)), "1.50");
        assert_eq!(format_minutes(Duration::from_secs(0)), "0.00");
    }

    #[test]
    fn test_truncate_error_message() {
        assert_eq!(truncate_error_message("a\nb", 3), "a\nb");
        assert_eq!(
            truncate_error_message("a\nb\nc\nd", 2),
            "a\nb\n... (truncated 2 more lines)"
        );
    }
}
