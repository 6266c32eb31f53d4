use std::time::Duration;

use ratatui_image::picker::cap_parser::QueryStdioOptions;
use ratatui_image::picker::{Capability, Picker, ProtocolType};

/// Environment hints about which graphics protocol the terminal speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TerminalHints {
    kitty_window: bool,
    term_kitty: bool,
    iterm: bool,
    tmux: bool,
}

fn env_non_empty(key: &str) -> bool {
    std::env::var(key).is_ok_and(|value| !value.trim().is_empty())
}

fn env_contains(key: &str, needle: &str) -> bool {
    std::env::var(key).is_ok_and(|value| value.contains(needle))
}

impl TerminalHints {
    pub fn from_env() -> Self {
        Self {
            kitty_window: env_non_empty("KITTY_WINDOW_ID"),
            // `KITTY_WINDOW_ID` is not forwarded over SSH, `TERM` is.
            term_kitty: std::env::var("TERM")
                .is_ok_and(|term| term.trim().starts_with("xterm-kitty")),
            iterm: env_non_empty("ITERM_SESSION_ID")
                || env_contains("TERM_PROGRAM", "iTerm")
                || env_contains("LC_TERMINAL", "iTerm"),
            tmux: std::env::var_os("TMUX").is_some(),
        }
    }

    /// Only terminals that hint at graphics support are queried; plain ones get halfblocks.
    pub fn should_query(&self) -> bool {
        self.kitty_window || self.term_kitty || self.iterm || self.tmux
    }

    pub fn query_timeout(&self) -> Duration {
        if self.kitty_window || self.term_kitty || self.iterm {
            Duration::from_millis(1500)
        } else if self.tmux {
            // Passthrough may be off; do not stall startup.
            Duration::from_millis(300)
        } else {
            Duration::ZERO
        }
    }

    fn kitty_supported(&self, picker: &Picker) -> bool {
        if self.iterm {
            return false;
        }
        self.kitty_window
            || picker
                .capabilities()
                .iter()
                .any(|cap| matches!(cap, Capability::Kitty))
    }
}

fn enable_tmux_passthrough() {
    let _ = std::process::Command::new("tmux")
        .args(["set-option", "-g", "allow-passthrough", "on"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
}

/// Picks the best graphics protocol for covers and pages. Must run before raw mode draws.
pub(crate) fn detect_picker(background: image::Rgba<u8>) -> Picker {
    let hints = TerminalHints::from_env();
    if hints.tmux {
        enable_tmux_passthrough();
    }
    let mut picker = if hints.should_query() {
        let mut options = QueryStdioOptions::default();
        options.timeout = hints.query_timeout();
        options.text_sizing_protocol = false;
        Picker::from_query_stdio_with_options(options).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "terminal graphics query failed");
            Picker::halfblocks()
        })
    } else {
        Picker::halfblocks()
    };
    picker.set_background_color(background);
    if hints.kitty_supported(&picker) {
        picker.set_protocol_type(ProtocolType::Kitty);
    }
    tracing::info!(
        protocol = protocol_label(&picker),
        font = ?picker.font_size(),
        "image protocol selected"
    );
    picker
}

pub(crate) fn protocol_label(picker: &Picker) -> &'static str {
    match picker.protocol_type() {
        ProtocolType::Halfblocks => "halfblocks",
        ProtocolType::Sixel => "sixel",
        ProtocolType::Kitty => "kitty",
        ProtocolType::Iterm2 => "iterm2",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_terminal_is_not_queried() {
        let hints = TerminalHints::default();
        assert!(!hints.should_query());
        assert_eq!(hints.query_timeout(), Duration::ZERO);
    }

    #[test]
    fn kitty_over_ssh_is_queried_patiently() {
        let hints = TerminalHints {
            term_kitty: true,
            ..TerminalHints::default()
        };
        assert!(hints.should_query());
        assert_eq!(hints.query_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn tmux_alone_gets_a_short_query() {
        let hints = TerminalHints {
            tmux: true,
            ..TerminalHints::default()
        };
        assert!(hints.should_query());
        assert_eq!(hints.query_timeout(), Duration::from_millis(300));
    }

    #[test]
    fn kitty_window_enables_kitty_unless_iterm() {
        let picker = Picker::halfblocks();
        let kitty = TerminalHints {
            kitty_window: true,
            ..TerminalHints::default()
        };
        assert!(kitty.kitty_supported(&picker));

        let iterm = TerminalHints {
            kitty_window: true,
            iterm: true,
            ..TerminalHints::default()
        };
        assert!(!iterm.kitty_supported(&picker));
        assert!(!TerminalHints::default().kitty_supported(&picker));
        assert_eq!(protocol_label(&picker), "halfblocks");
    }
}
