// src/config.rs
//! Конфигурация игры
//!
//! Этот модуль определяет параметры, управляющие движком викторины:
//! - Расположение данных (дерево регионов на диске, каталог рекордов)
//! - Служебные цвета карты (граница, угаданный, ошибочный, неиграбельный регион)
//! - Формула очков
//! - Геометрия анимации стопки заданий
//! - Соглашения об именах файлов ресурсов
//!
//! Все структуры поддерживают сериализацию в TOML/JSON, у каждого поля есть значение по умолчанию.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::Color;
use crate::error::{QuizError, Result};

/// Служебные цвета карты
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorSettings {
    /// Цвет границ на исходной карте. При загрузке перекрашивается в чёрный
    /// и никогда не считается цветом региона.
    #[serde(default = "default_border")]
    pub border: Color,

    /// Цвет правильно найденного региона
    #[serde(default = "default_solved")]
    pub solved: Color,

    /// Временный цвет региона, выбранного по ошибке
    #[serde(default = "default_incorrect")]
    pub incorrect: Color,

    /// Цвет дочернего региона, для которого нет собственной карты (режим навигации)
    #[serde(default = "default_unplayable")]
    pub unplayable: Color,
}

fn default_border() -> Color {
    Color::new(220, 110, 0)
}
fn default_solved() -> Color {
    Color::new(0, 128, 0)
}
fn default_incorrect() -> Color {
    Color::new(255, 0, 0)
}
fn default_unplayable() -> Color {
    Color::new(255, 192, 203)
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            border: default_border(),
            solved: default_solved(),
            incorrect: default_incorrect(),
            unplayable: default_unplayable(),
        }
    }
}

/// Параметры подсчёта очков
///
/// `score = max(0, base - elapsed_seconds - mistake_penalty × mistakes)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoringSettings {
    /// Стартовое количество очков
    #[serde(default = "default_base_score")]
    pub base: u32,

    /// Штраф за каждую ошибку
    #[serde(default = "default_mistake_penalty")]
    pub mistake_penalty: u32,
}

fn default_base_score() -> u32 {
    10_000
}
fn default_mistake_penalty() -> u32 {
    100
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            base: 10_000,
            mistake_penalty: 100,
        }
    }
}

/// Геометрия стопки заданий (в пикселях экрана)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StackSettings {
    /// Вертикальная позиция, от которой раскладываются слоты
    #[serde(default = "default_initial_y")]
    pub initial_y: f64,

    /// Высота текстового слота
    #[serde(default = "default_slot_height")]
    pub slot_height: f64,

    /// Высота слота с флагом
    #[serde(default = "default_flag_slot_height")]
    pub flag_slot_height: f64,

    /// Нижняя граница, на которой стопка останавливается
    #[serde(default = "default_floor_y")]
    pub floor_y: f64,

    /// Скорость опускания стопки за один полный кадр
    #[serde(default = "default_velocity")]
    pub velocity: f64,
}

fn default_initial_y() -> f64 {
    550.0
}
fn default_slot_height() -> f64 {
    50.0
}
fn default_flag_slot_height() -> f64 {
    140.0
}
fn default_floor_y() -> f64 {
    1250.0
}
fn default_velocity() -> f64 {
    2.0
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            initial_y: 550.0,
            slot_height: 50.0,
            flag_slot_height: 140.0,
            floor_y: 1250.0,
            velocity: 2.0,
        }
    }
}

/// Соглашения об именах файлов в дереве данных
///
/// Файл региона `Afghanistan` с суффиксом `" Map.png"` называется `Afghanistan Map.png`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetLayout {
    #[serde(default = "default_map_suffix")]
    pub map_suffix: String,

    #[serde(default = "default_flag_suffix")]
    pub flag_suffix: String,

    #[serde(default = "default_scores_suffix")]
    pub scores_suffix: String,
}

fn default_map_suffix() -> String {
    " Map.png".to_string()
}
fn default_flag_suffix() -> String {
    " Flag.png".to_string()
}
fn default_scores_suffix() -> String {
    " Scores.txt".to_string()
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            map_suffix: default_map_suffix(),
            flag_suffix: default_flag_suffix(),
            scores_suffix: default_scores_suffix(),
        }
    }
}

/// Основные параметры игры
///
/// Полная конфигурация сессии. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Корень дерева данных (`<data_dir>/The World/Asia/...`)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Каталог с файлами рекордов
    #[serde(default = "default_scores_dir")]
    pub scores_dir: PathBuf,

    /// Сид перемешивания стопки. Без него каждый раунд перемешивается заново.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub colors: ColorSettings,

    #[serde(default)]
    pub scoring: ScoringSettings,

    #[serde(default)]
    pub stack: StackSettings,

    #[serde(default)]
    pub assets: AssetLayout,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_scores_dir() -> PathBuf {
    PathBuf::from("./data/scores")
}

impl GameConfig {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # quiz.toml
    /// data_dir = "./data"
    /// seed = 7
    ///
    /// [colors]
    /// solved = "#00ff00"
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| QuizError::io(path, e))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scores_dir: default_scores_dir(),
            seed: None,
            colors: ColorSettings::default(),
            scoring: ScoringSettings::default(),
            stack: StackSettings::default(),
            assets: AssetLayout::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.colors, ColorSettings::default());
        assert_eq!(config.scoring.base, 10_000);
        assert_eq!(config.assets.map_suffix, " Map.png");
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = GameConfig::from_toml_str(
            r##"
            seed = 42

            [colors]
            solved = "#00ff00"

            [scoring]
            mistake_penalty = 250
            "##,
        )
        .unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.colors.solved, Color::new(0, 255, 0));
        assert_eq!(config.colors.border, Color::new(220, 110, 0));
        assert_eq!(config.scoring.mistake_penalty, 250);
        assert_eq!(config.scoring.base, 10_000);
    }

    #[test]
    fn bad_color_is_rejected() {
        let err = GameConfig::from_toml_str("[colors]\nsolved = \"green\"").unwrap_err();
        assert!(matches!(err, QuizError::Toml(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.toml");
        fs::write(&path, "scores_dir = \"/tmp/scores\"\n").unwrap();

        let config = GameConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.scores_dir, PathBuf::from("/tmp/scores"));
    }
}
