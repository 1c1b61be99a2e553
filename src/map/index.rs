// src/map/index.rs
//! Индексы распознавания территорий
//!
//! Строятся один раз при загрузке карты региона из его прямых потомков:
//!
//! 1. **`ColorIndex`** — биекция цвет ↔ имя региона
//! 2. **`PixelIndex`** — имя региона → координаты всех его пикселей
//!
//! `PixelIndex` строится одним полным проходом по изображению: O(ширина × высота)
//! по времени, общий размер списков не превышает площади карты. Проход идёт
//! по строкам параллельно (`rayon`, фича `parallel`), но порядок пикселей в
//! каждом списке всегда построчный, как при последовательном проходе.
//!
//! Коллизии цветов между соседями и регионы, чей цвет не встречается на карте,
//! считаются ошибками разметки данных: они не исправляются, только логируются.

use std::collections::HashMap;

use log::warn;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::color::Color;
use crate::map::MapSurface;
use crate::region::Region;

/// Биекция цвет ↔ имя региона для текущей карты
#[derive(Debug, Clone, Default)]
pub struct ColorIndex {
    by_color: HashMap<Color, String>,
    by_name: HashMap<String, Color>,
}

impl ColorIndex {
    /// Регистрирует цвета прямых потомков. Цвет границ никогда не регистрируется.
    ///
    /// При коллизии цветов побеждает регион, зарегистрированный последним.
    #[must_use]
    pub fn build(children: &[&Region], border: Color) -> Self {
        let mut index = Self::default();
        for child in children {
            if child.color == border {
                warn!(
                    "Регион {} окрашен в цвет границ {}, он не будет распознаваться",
                    child.name, border
                );
                continue;
            }
            index.insert(child.color, &child.name);
        }
        index
    }

    pub fn insert(&mut self, color: Color, name: &str) {
        if let Some(previous) = self.by_color.insert(color, name.to_string()) {
            if previous != name {
                warn!("Коллизия цвета {color}: {previous} и {name}");
            }
        }
        self.by_name.insert(name.to_string(), color);
    }

    /// Имя региона по цвету; неизвестный цвет — не ошибка
    #[must_use]
    pub fn lookup(&self, color: Color) -> Option<&str> {
        self.by_color.get(&color).map(String::as_str)
    }

    #[must_use]
    pub fn color_of(&self, name: &str) -> Option<Color> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn contains_color(&self, color: Color) -> bool {
        self.by_color.contains_key(&color)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Пиксели каждого региона в построчном порядке
#[derive(Debug, Clone, Default)]
pub struct PixelIndex {
    pixels: HashMap<String, Vec<(u32, u32)>>,
}

impl PixelIndex {
    /// Один полный проход по карте. Каждый зарегистрированный регион получает
    /// список, даже если его цвет на карте не встречается.
    #[must_use]
    pub fn scan(surface: &MapSurface, colors: &ColorIndex) -> Self {
        let mut pixels: HashMap<String, Vec<(u32, u32)>> = colors
            .names()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();

        for row in scan_rows(surface, colors) {
            for (name, x, y) in row {
                if let Some(list) = pixels.get_mut(name) {
                    list.push((x, y));
                }
            }
        }

        Self { pixels }
    }

    /// Пиксели региона; пустой срез для незарегистрированного имени
    #[must_use]
    pub fn pixels_of(&self, name: &str) -> &[(u32, u32)] {
        self.pixels.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pixels.contains_key(name)
    }

    /// Регионы, для которых на карте не нашлось ни одного пикселя
    pub fn empty_regions(&self) -> impl Iterator<Item = &str> {
        self.pixels
            .iter()
            .filter(|(_, list)| list.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Общее число проиндексированных пикселей
    #[must_use]
    pub fn total_pixels(&self) -> usize {
        self.pixels.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

type RowHits<'a> = Vec<(&'a str, u32, u32)>;

fn row_hits<'a>(colors: &'a ColorIndex, y: usize, row: &[u8]) -> RowHits<'a> {
    row.chunks_exact(3)
        .enumerate()
        .filter_map(|(x, px)| {
            colors
                .lookup(Color::new(px[0], px[1], px[2]))
                .map(|name| (name, x as u32, y as u32))
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn scan_rows<'a>(surface: &MapSurface, colors: &'a ColorIndex) -> Vec<RowHits<'a>> {
    let stride = surface.width() as usize * 3;
    if stride == 0 {
        return Vec::new();
    }
    surface
        .image()
        .as_raw()
        .par_chunks(stride)
        .enumerate()
        .map(|(y, row)| row_hits(colors, y, row))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn scan_rows<'a>(surface: &MapSurface, colors: &'a ColorIndex) -> Vec<RowHits<'a>> {
    let stride = surface.width() as usize * 3;
    if stride == 0 {
        return Vec::new();
    }
    surface
        .image()
        .as_raw()
        .chunks(stride)
        .enumerate()
        .map(|(y, row)| row_hits(colors, y, row))
        .collect()
}

/// Оба индекса карты, построенные вместе
#[derive(Debug, Clone, Default)]
pub struct MapIndex {
    pub colors: ColorIndex,
    pub pixels: PixelIndex,
}

impl MapIndex {
    #[must_use]
    pub fn build(surface: &MapSurface, children: &[&Region], border: Color) -> Self {
        let colors = ColorIndex::build(children, border);
        let pixels = PixelIndex::scan(surface, &colors);
        for name in pixels.empty_regions() {
            warn!("Цвет региона {name} не встречается на карте, его нельзя угадать кликом");
        }
        Self { colors, pixels }
    }
}
