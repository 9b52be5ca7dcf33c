use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const AGENT_LABEL: &str = "com.shydock.agent";

/// Per-user LaunchAgent that runs `<program> start` at login.
#[derive(Debug, Clone)]
pub struct LaunchAgent {
    plist_path: PathBuf,
    program: PathBuf,
}

impl LaunchAgent {
    pub fn new(plist_path: impl Into<PathBuf>, program: impl Into<PathBuf>) -> Self {
        Self {
            plist_path: plist_path.into(),
            program: program.into(),
        }
    }

    /// `~/Library/LaunchAgents/com.shydock.agent.plist` pointing at the running binary.
    pub fn for_current_user() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        let program = std::env::current_exe().context("Could not determine executable path")?;
        Ok(Self::new(
            home.join("Library")
                .join("LaunchAgents")
                .join(format!("{}.plist", AGENT_LABEL)),
            program,
        ))
    }

    pub fn plist_path(&self) -> &Path {
        &self.plist_path
    }

    pub fn is_installed(&self) -> bool {
        self.plist_path.exists()
    }

    pub fn install(&self) -> Result<()> {
        if let Some(dir) = self.plist_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {:?}", dir))?;
        }
        std::fs::write(&self.plist_path, self.plist_contents())
            .with_context(|| format!("Failed to write {:?}", self.plist_path))?;
        tracing::info!("Installed launch agent at {:?}", self.plist_path);
        Ok(())
    }

    pub fn uninstall(&self) -> Result<()> {
        match std::fs::remove_file(&self.plist_path) {
            Ok(()) => {
                tracing::info!("Removed launch agent {:?}", self.plist_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove {:?}", self.plist_path))
            }
        }
    }

    fn plist_contents(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{program}</string>
        <string>start</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>ProcessType</key>
    <string>Interactive</string>
</dict>
</plist>
"#,
            label = AGENT_LABEL,
            program = escape_xml(&self.program.to_string_lossy()),
        )
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_and_uninstall() {
        let dir = tempfile::tempdir().unwrap();
        let agent = LaunchAgent::new(
            dir.path().join("LaunchAgents").join("agent.plist"),
            "/Applications/Shy Dock/shydock",
        );
        assert!(!agent.is_installed());

        agent.install().unwrap();
        assert!(agent.is_installed());
        let contents = std::fs::read_to_string(agent.plist_path()).unwrap();
        assert!(contents.contains("<string>com.shydock.agent</string>"));
        assert!(contents.contains("<string>/Applications/Shy Dock/shydock</string>"));
        assert!(contents.contains("<string>start</string>"));
        assert!(contents.contains("<key>RunAtLoad</key>"));

        agent.uninstall().unwrap();
        assert!(!agent.is_installed());
        // Removing twice is fine
        agent.uninstall().unwrap();
    }

    #[test]
    fn test_program_path_is_escaped() {
        let agent = LaunchAgent::new("/tmp/unused.plist", "/opt/a&b/<shydock>");
        let contents = agent.plist_contents();
        assert!(contents.contains("/opt/a&amp;b/&lt;shydock&gt;"));
    }
}
