use std::io;
use std::path::{Path, PathBuf};

/// A dotenv-style key/value file that can be edited and rewritten
///
/// Lines are kept verbatim so comments, blank lines, and unknown keys survive
/// a round trip. `set` replaces an existing assignment in place or appends a
/// new one; `remove` drops every assignment for the key.
#[derive(Debug)]
pub struct EnvFile {
    path: PathBuf,
    lines: Vec<String>,
}

impl EnvFile {
    /// Load an env file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read
    pub fn load(path: &Path) -> io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_owned(),
            lines: raw.lines().map(str::to_owned).collect(),
        })
    }

    /// Create an empty env file that will be written to `path`
    pub fn new(path: PathBuf) -> Self {
        Self { path, lines: Vec::new() }
    }

    /// Path this file was loaded from and will be saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the last assignment for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .find_map(|line| parse_assignment(line).filter(|(k, _)| *k == key))
            .map(|(_, v)| v)
    }

    /// Set `key` to `value`, replacing an existing assignment or appending
    pub fn set(&mut self, key: &str, value: &str) {
        let assignment = format!("{key}={value}");

        for line in &mut self.lines {
            if parse_assignment(line).is_some_and(|(k, _)| k == key) {
                *line = assignment;
                return;
            }
        }

        self.lines.push(assignment);
    }

    /// Remove every assignment for `key`, keeping all other lines
    pub fn remove(&mut self, key: &str) {
        self.lines
            .retain(|line| !parse_assignment(line).is_some_and(|(k, _)| k == key));
    }

    /// Write the file back to disk with a trailing newline
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save(&self) -> io::Result<()> {
        let mut content = self.lines.join("\n");
        content.push('\n');
        std::fs::write(&self.path, content)
    }
}

/// Parse a `KEY=value` line, ignoring comments and blanks
fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some((key, value.trim()))
}
