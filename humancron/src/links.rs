//! Resolve step links and hand them to the OS

use tracing::{debug, warn};

use humancron_sdk::{LinkOpener, WorkflowResult};

/// App shortcut tokens and the URL scheme each one opens
pub const APP_SHORTCUTS: [(&str, &str); 27] = [
    ("calendar", "x-fantastical3://"),
    ("notion-calendar", "notion-calendar://"),
    ("slack", "slack://"),
    ("notion", "notion://"),
    ("things", "things3://"),
    ("obsidian", "obsidian://"),
    ("discord", "discord://"),
    ("zoom", "zoommtg://"),
    ("mail", "mailto:"),
    ("messages", "imessage://"),
    ("facetime", "facetime://"),
    ("music", "music://"),
    ("spotify", "spotify://"),
    ("vscode", "vscode://"),
    ("xcode", "xcode://"),
    ("terminal", "x-terminal://"),
    ("finder", "x-finder://"),
    ("safari", "x-safari://"),
    ("chrome", "googlechrome://"),
    ("firefox", "firefox://"),
    ("arc", "arc://"),
    ("linear", "linear://"),
    ("github", "x-github-client://"),
    ("figma", "figma://"),
    ("twitter", "twitter://"),
    ("x", "twitter://"),
    ("whatsapp", "whatsapp://"),
];

/// Turn a step link into something the OS can open
///
/// Bare app tokens (`slack`, `slack://`) map to their scheme, bare domains
/// get `https://`, and anything else with a scheme or an absolute path is
/// passed through.
pub fn resolve_link(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    let lower = link.to_lowercase();
    let token = lower.strip_suffix("://").unwrap_or(&lower);
    if let Some((_, scheme)) = APP_SHORTCUTS.iter().find(|(app, _)| *app == token) {
        return Some(scheme.to_string());
    }

    if link.contains("://") || link.starts_with('/') || lower.starts_with("mailto:") {
        return Some(link.to_string());
    }

    if link.contains('.') && !link.contains(char::is_whitespace) {
        return Some(format!("https://{}", link));
    }

    None
}

/// Opens links with the platform handler via the `open` crate
#[derive(Debug, Default, Clone)]
pub struct SystemLinkOpener;

impl LinkOpener for SystemLinkOpener {
    fn open_link(&self, link: &str) -> WorkflowResult<()> {
        let target = resolve_link(link).ok_or_else(|| format!("Unrecognized link '{}'", link))?;
        debug!("Opening link {}", target);
        open::that(&target).map_err(|e| {
            warn!("Failed to open {}: {}", target, e);
            format!("Failed to open {}: {}", target, e)
        })?;
        Ok(())
    }
}
