//! Leaderboard persistence.

use std::path::PathBuf;

use crate::error::StoreError;

/// Longest name the scoreboard accepts.
pub const NAME_LEN: usize = 8;

/// Stored in place of a name left blank.
pub const ANONYMOUS: &str = "???";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreEntry {
    pub name: String,
    pub points: u32,
}

impl ScoreEntry {
    /// Whitespace is dropped, the name is cut to [`NAME_LEN`], and a blank
    /// name becomes [`ANONYMOUS`].
    pub fn new(name: &str, points: u32) -> Self {
        let name: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .take(NAME_LEN)
            .collect();
        ScoreEntry {
            name: if name.is_empty() { ANONYMOUS.to_string() } else { name },
            points,
        }
    }
}

pub trait ScoreStore {
    /// Best `n` entries, highest first.
    fn top(&self, n: usize) -> Result<Vec<ScoreEntry>, StoreError>;
    fn append(&mut self, entry: ScoreEntry) -> Result<(), StoreError>;
}

fn best(mut entries: Vec<ScoreEntry>, n: usize) -> Vec<ScoreEntry> {
    // Stable, so equal scores keep insertion order.
    entries.sort_by(|a, b| b.points.cmp(&a.points));
    entries.truncate(n);
    entries
}

#[derive(Clone, Debug, Default)]
pub struct MemoryScores {
    entries: Vec<ScoreEntry>,
}

impl MemoryScores {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScores {
    fn top(&self, n: usize) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(best(self.entries.clone(), n))
    }

    fn append(&mut self, entry: ScoreEntry) -> Result<(), StoreError> {
        self.entries.push(entry);
        Ok(())
    }
}

// ── File store ───────────────────────────────────────────────────────────────

/// One `NAME POINTS` pair per line.
#[derive(Clone, Debug)]
pub struct FileScores {
    path: PathBuf,
}

impl FileScores {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileScores { path: path.into() }
    }

    /// `~/.irq_shooter_scores`, or the working directory without `HOME`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".irq_shooter_scores")
    }

    fn read_all(&self) -> Result<Vec<ScoreEntry>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        text.lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| {
                let bad = || StoreError::Parse {
                    line: i + 1,
                    content: l.to_string(),
                };
                let (name, points) = l.trim().rsplit_once(' ').ok_or_else(bad)?;
                Ok(ScoreEntry {
                    name: name.trim().to_string(),
                    points: points.parse().map_err(|_| bad())?,
                })
            })
            .collect()
    }
}

impl ScoreStore for FileScores {
    fn top(&self, n: usize) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(best(self.read_all()?, n))
    }

    fn append(&mut self, entry: ScoreEntry) -> Result<(), StoreError> {
        use std::io::Write;

        if entry.name.is_empty() || entry.name.contains(char::is_whitespace) {
            return Err(StoreError::BadName(entry.name));
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} {}", entry.name, entry.points)?;
        Ok(())
    }
}
