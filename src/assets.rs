// src/assets.rs
//! Ресурсы регионов: карты и флаги
//!
//! Ресурсы ищутся по пути региона от корня мира:
//! `<data_dir>/The World/Asia/Afghanistan/Afghanistan Map.png`,
//! флаг потомка лежит в его собственном каталоге:
//! `<data_dir>/The World/Asia/Afghanistan/Afghanistan Flag.png`.

use std::collections::HashMap;
use std::path::PathBuf;

use image::RgbImage;
use log::debug;

use crate::config::AssetLayout;
use crate::error::{QuizError, Result};
use crate::region::RegionPath;

/// Найденный флаг региона
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRef {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Источник изображений для ядра игры
pub trait AssetSource: Send + Sync {
    /// Растровая карта региона (цвета потомков на ней)
    fn load_map(&self, path: &RegionPath) -> Result<RgbImage>;

    /// Есть ли у региона своя карта, то есть можно ли в него спуститься
    fn has_map(&self, path: &RegionPath) -> bool;

    /// Флаг региона или `None`, если его нет
    fn load_flag(&self, path: &RegionPath) -> Option<FlagRef>;
}

/// Дерево данных на диске
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
    layout: AssetLayout,
}

impl DataDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, layout: AssetLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    #[must_use]
    pub fn region_dir(&self, path: &RegionPath) -> PathBuf {
        path.segments()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    fn file_in_region_dir(&self, path: &RegionPath, suffix: &str) -> PathBuf {
        let name = path.name().unwrap_or_default();
        self.region_dir(path).join(format!("{name}{suffix}"))
    }

    #[must_use]
    pub fn map_path(&self, path: &RegionPath) -> PathBuf {
        self.file_in_region_dir(path, &self.layout.map_suffix)
    }

    #[must_use]
    pub fn flag_path(&self, path: &RegionPath) -> PathBuf {
        self.file_in_region_dir(path, &self.layout.flag_suffix)
    }
}

impl AssetSource for DataDir {
    fn load_map(&self, path: &RegionPath) -> Result<RgbImage> {
        let file = self.map_path(path);
        debug!("Загрузка карты {}", file.display());
        let image = image::open(&file).map_err(|e| QuizError::image(&file, e))?;
        Ok(image.to_rgb8())
    }

    fn has_map(&self, path: &RegionPath) -> bool {
        self.map_path(path).is_file()
    }

    fn load_flag(&self, path: &RegionPath) -> Option<FlagRef> {
        let file = self.flag_path(path);
        // Заголовка достаточно, чтобы убедиться, что файл — изображение
        match image::image_dimensions(&file) {
            Ok((width, height)) => Some(FlagRef {
                path: file,
                width,
                height,
            }),
            Err(e) => {
                debug!("Флаг {} недоступен: {e}", file.display());
                None
            }
        }
    }
}

/// Ресурсы, загруженные заранее. Ключ — имя региона.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    maps: HashMap<String, RgbImage>,
    flags: HashMap<String, (u32, u32)>,
}

impl MemoryAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_map(mut self, region: impl Into<String>, map: RgbImage) -> Self {
        self.maps.insert(region.into(), map);
        self
    }

    #[must_use]
    pub fn with_flag(mut self, region: impl Into<String>, width: u32, height: u32) -> Self {
        self.flags.insert(region.into(), (width, height));
        self
    }
}

impl AssetSource for MemoryAssets {
    fn load_map(&self, path: &RegionPath) -> Result<RgbImage> {
        let name = path.name().unwrap_or_default();
        self.maps
            .get(name)
            .cloned()
            .ok_or_else(|| QuizError::MissingMap(name.to_string()))
    }

    fn has_map(&self, path: &RegionPath) -> bool {
        path.name().is_some_and(|name| self.maps.contains_key(name))
    }

    fn load_flag(&self, path: &RegionPath) -> Option<FlagRef> {
        let name = path.name()?;
        self.flags.get(name).map(|&(width, height)| FlagRef {
            path: PathBuf::from(name),
            width,
            height,
        })
    }
}
