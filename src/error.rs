// src/error.rs
//! Ошибки движка викторины
//!
//! Ошибками считаются только сбои загрузки (файлы, изображения, конфигурация,
//! каталог) и нарушения протокола сессии. Нераспознанный клик, регион без
//! столицы или отсутствие файла рекордов ошибками не являются.

use std::path::PathBuf;

use thiserror::Error;

use crate::challenge::GameMode;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid color `{0}`, expected #rrggbb")]
    InvalidColor(String),

    #[error("unknown region `{0}`")]
    UnknownRegion(String),

    #[error("region `{0}` is defined twice")]
    DuplicateRegion(String),

    #[error("catalogue has no root region")]
    EmptyCatalogue,

    #[error("mode `{mode}` has no challenges for `{region}`")]
    ModeUnavailable { region: String, mode: GameMode },

    #[error("unknown game mode `{0}`")]
    UnknownMode(String),

    #[error("a round is already in progress")]
    RoundInProgress,

    #[error("no round in progress")]
    NoRound,

    #[error("malformed score record `{0}`")]
    InvalidScore(String),

    #[error("no map loaded for `{0}`")]
    MissingMap(String),
}

impl QuizError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QuizError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        QuizError::Image {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
