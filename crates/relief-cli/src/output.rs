// Output formatting and styling

use colored::Colorize;

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl OutputStyle {
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    /// Format success message
    pub fn success(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✓".green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        }
    }

    /// Format error message
    pub fn error(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✗".red().bold(), msg)
        } else {
            format!("✗ {}", msg)
        }
    }

    /// Format warning message
    pub fn warning(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "⚠".yellow(), msg)
        } else {
            format!("⚠ {}", msg)
        }
    }

    /// Format info message
    pub fn info(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "ℹ".blue(), msg)
        } else {
            format!("ℹ {}", msg)
        }
    }

    pub fn code(&self, code: &str) -> String {
        if self.use_colors {
            code.cyan().to_string()
        } else {
            format!("`{}`", code)
        }
    }

    pub fn header(&self, title: &str) -> String {
        if self.use_colors {
            title.bold().underline().to_string()
        } else {
            title.to_string()
        }
    }

    /// One tab line: marker for the active tab, dimmed when disabled
    pub fn tab(&self, name: &str, active: bool, enabled: bool) -> String {
        let marker = if active { "▸" } else { " " };
        let state = if enabled { "" } else { " (disabled)" };
        if !self.use_colors {
            return format!("{marker} {name}{state}");
        }
        match (active, enabled) {
            (true, _) => format!("{} {}", marker.green(), name.bold()),
            (false, true) => format!("{marker} {name}"),
            (false, false) => format!("{marker} {}{state}", name.dimmed()),
        }
    }

    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.use_colors {
            format!("  {} = {}", key.cyan(), value)
        } else {
            format!("  {} = {}", key, value)
        }
    }
}

/// Print success message
pub fn print_success(msg: &str) {
    eprintln!("{}", OutputStyle::default().success(msg));
}

/// Print error message
pub fn print_error(msg: &str) {
    eprintln!("{}", OutputStyle::default().error(msg));
}

/// Print warning message
pub fn print_warning(msg: &str) {
    eprintln!("{}", OutputStyle::default().warning(msg));
}

/// Print info message
pub fn print_info(msg: &str) {
    eprintln!("{}", OutputStyle::default().info(msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output() {
        let style = OutputStyle::plain();
        assert_eq!(style.success("done"), "✓ done");
        assert_eq!(style.code("make"), "`make`");
        assert_eq!(style.tab("Color", false, false), "  Color (disabled)");
        assert_eq!(style.tab("Project", true, true), "▸ Project");
        assert_eq!(style.key_value("MODE", "basic"), "  MODE = basic");
    }
}
