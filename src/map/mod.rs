// src/map/mod.rs
//! Растровая карта текущего региона
//!
//! `MapSurface` — изменяемый RGB-буфер, который видит игрок:
//! - при загрузке цвет границ перекрашивается в чёрный
//! - по ходу раунда регионы перекрашиваются целиком по спискам пикселей из `PixelIndex`
//! - рендерер читает буфер через `image()` или `to_rgba_image()`

pub mod index;

use std::path::Path;

use image::{Rgb, RgbImage};
use log::debug;

use crate::color::Color;
use crate::error::{QuizError, Result};

pub use index::{ColorIndex, MapIndex, PixelIndex};

#[derive(Debug, Clone)]
pub struct MapSurface {
    image: RgbImage,
}

impl MapSurface {
    /// Оборачивает готовое изображение, перекрашивая цвет границ в чёрный
    #[must_use]
    pub fn from_image(mut image: RgbImage, border: Color) -> Self {
        let border: Rgb<u8> = border.into();
        let black: Rgb<u8> = Color::BLACK.into();
        let mut remapped = 0usize;
        for pixel in image.pixels_mut() {
            if *pixel == border {
                *pixel = black;
                remapped += 1;
            }
        }
        if remapped > 0 {
            debug!("Перекрашено {remapped} пикселей границ");
        }
        Self { image }
    }

    /// Загружает карту из файла изображения (PNG, JPEG, BMP — всё, что понимает `image`)
    pub fn open(path: impl AsRef<Path>, border: Color) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| QuizError::image(path, e))?
            .to_rgb8();
        Ok(Self::from_image(image, border))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.image.width() && y < self.image.height()
    }

    /// Цвет пикселя или `None` за пределами карты
    #[must_use]
    pub fn read_pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.contains(x, y)
            .then(|| Color::from(*self.image.get_pixel(x, y)))
    }

    /// Записывает пиксель; точки за пределами карты игнорируются
    pub fn write_pixel(&mut self, x: u32, y: u32, color: Color) {
        if self.contains(x, y) {
            self.image.put_pixel(x, y, color.into());
        }
    }

    /// Перекрашивает все перечисленные пиксели в один цвет
    pub fn recolor(&mut self, pixels: &[(u32, u32)], color: Color) {
        for &(x, y) in pixels {
            self.write_pixel(x, y, color);
        }
    }

    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Плоский вектор `[R, G, B, A, ...]` для загрузки в текстуру
    #[must_use]
    pub fn to_rgba_image(&self) -> Vec<u8> {
        self.image
            .pixels()
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect()
    }

    /// Сохраняет текущее состояние карты в PNG
    pub fn save_as_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image.save(path).map_err(|e| QuizError::image(path, e))
    }
}
