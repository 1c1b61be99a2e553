// src/score.rs
//! Рекорды по регионам и режимам
//!
//! Файловое хранилище держит по файлу на регион (`<region> Scores.txt`),
//! в котором по строке на режим:
//!
//! ```text
//! name 9512 1:28 4
//! capital 8700 3:20 10
//! ```
//!
//! Отсутствие файла или строки означает, что рекорда ещё нет и любой результат его побьёт.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::info;
use serde::{Deserialize, Serialize};

use crate::challenge::GameMode;
use crate::error::{QuizError, Result};
use crate::round::scoring::{format_duration, parse_duration};

/// Лучший результат: очки, время и число ошибок
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u32,
    pub duration_secs: u64,
    pub mistakes: u32,
}

impl ScoreRecord {
    #[must_use]
    pub fn duration_text(&self) -> String {
        format_duration(self.duration_secs)
    }
}

pub trait ScoreStore: fmt::Debug + Send {
    fn read_best(&self, region: &str, mode: GameMode) -> Result<Option<ScoreRecord>>;

    fn write_best(&mut self, region: &str, mode: GameMode, record: ScoreRecord) -> Result<()>;

    /// Записывает результат, если он строго лучше сохранённого (или сохранённого нет).
    /// Возвращает `true`, если рекорд обновлён.
    fn record_if_best(&mut self, region: &str, mode: GameMode, record: ScoreRecord) -> Result<bool> {
        let beaten = match self.read_best(region, mode)? {
            Some(best) => record.score > best.score,
            None => true,
        };
        if beaten {
            self.write_best(region, mode, record)?;
            info!(
                "Новый рекорд {region} ({mode}): {} очков за {}",
                record.score,
                record.duration_text()
            );
        }
        Ok(beaten)
    }
}

/// Хранилище рекордов, общее для сессии и раунда
pub type SharedScores = Arc<Mutex<Box<dyn ScoreStore>>>;

#[derive(Debug, Clone)]
pub struct FileScoreStore {
    dir: PathBuf,
    suffix: String,
}

impl FileScoreStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn file_for(&self, region: &str) -> PathBuf {
        self.dir.join(format!("{region}{}", self.suffix))
    }

    fn read_all(&self, region: &str) -> Result<HashMap<GameMode, ScoreRecord>> {
        let path = self.file_for(region);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(QuizError::io(path, e)),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_line)
            .collect()
    }
}

fn parse_line(line: &str) -> Result<(GameMode, ScoreRecord)> {
    let invalid = || QuizError::InvalidScore(line.to_string());
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [mode, score, time, mistakes] = fields.as_slice() else {
        return Err(invalid());
    };
    let mode: GameMode = mode.parse().map_err(|_| invalid())?;
    let record = ScoreRecord {
        score: score.parse().map_err(|_| invalid())?,
        duration_secs: parse_duration(time).ok_or_else(invalid)?,
        mistakes: mistakes.parse().map_err(|_| invalid())?,
    };
    Ok((mode, record))
}

impl ScoreStore for FileScoreStore {
    fn read_best(&self, region: &str, mode: GameMode) -> Result<Option<ScoreRecord>> {
        Ok(self.read_all(region)?.get(&mode).copied())
    }

    fn write_best(&mut self, region: &str, mode: GameMode, record: ScoreRecord) -> Result<()> {
        let mut records = self.read_all(region)?;
        records.insert(mode, record);

        let contents: String = GameMode::ALL
            .into_iter()
            .filter_map(|m| records.get(&m).map(|r| (m, r)))
            .map(|(m, r)| {
                format!(
                    "{m} {} {} {}\n",
                    r.score,
                    format_duration(r.duration_secs),
                    r.mistakes
                )
            })
            .collect();

        fs::create_dir_all(&self.dir).map_err(|e| QuizError::io(&self.dir, e))?;
        let path = self.file_for(region);
        fs::write(&path, contents).map_err(|e| QuizError::io(path, e))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    records: HashMap<(String, GameMode), ScoreRecord>,
}

impl MemoryScoreStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn read_best(&self, region: &str, mode: GameMode) -> Result<Option<ScoreRecord>> {
        Ok(self.records.get(&(region.to_string(), mode)).copied())
    }

    fn write_best(&mut self, region: &str, mode: GameMode, record: ScoreRecord) -> Result<()> {
        self.records.insert((region.to_string(), mode), record);
        Ok(())
    }
}
