pub mod catalogue;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;

pub use catalogue::{RegionNode, WorldCatalogue};

/// Уровень региона в иерархии World > Continent > Nation > Province
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionType {
    World,
    Continent,
    Nation,
    Province,
}

/// Регион каталога.
///
/// Связи родитель/потомок хранит каталог, а не сам регион.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    #[serde(rename = "type")]
    pub region_type: RegionType,
    /// Цвет региона на карте родителя
    pub color: Color,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub leader: Option<String>,
}

impl Region {
    #[must_use]
    pub fn new(name: impl Into<String>, region_type: RegionType, color: Color) -> Self {
        Self {
            name: name.into(),
            region_type,
            color,
            capital: None,
            leader: None,
        }
    }

    #[must_use]
    pub fn with_capital(mut self, capital: impl Into<String>) -> Self {
        self.capital = Some(capital.into());
        self
    }

    #[must_use]
    pub fn with_leader(mut self, leader: impl Into<String>) -> Self {
        self.leader = Some(leader.into());
        self
    }

    /// Столица, если она указана и не пустая
    #[must_use]
    pub fn capital(&self) -> Option<&str> {
        self.capital.as_deref().filter(|c| !c.is_empty())
    }

    /// Лидер, если он указан и не пустой
    #[must_use]
    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref().filter(|l| !l.is_empty())
    }
}

/// Иерархический каталог регионов, уже загруженный из внешнего источника.
///
/// Ядро игры читает из каталога только атрибуты (цвет, столица, лидер, тип)
/// и обходит иерархию. Дочерние регионы возвращаются в порядке каталога.
pub trait RegionCatalogue: Send + Sync {
    fn region(&self, name: &str) -> Option<&Region>;

    fn children_of(&self, name: &str) -> Vec<&Region>;

    fn parent_of(&self, name: &str) -> Option<&Region>;

    fn capital_of(&self, name: &str) -> Option<&str> {
        self.region(name).and_then(Region::capital)
    }

    fn leader_of(&self, name: &str) -> Option<&str> {
        self.region(name).and_then(Region::leader)
    }

    fn type_of(&self, name: &str) -> Option<RegionType> {
        self.region(name).map(|r| r.region_type)
    }

    /// Цепочка от корня мира до региона включительно
    fn path_from_root(&self, name: &str) -> Vec<&Region> {
        let mut path = self.path_to_root(name);
        path.reverse();
        path
    }

    /// Цепочка от региона до корня мира включительно
    fn path_to_root(&self, name: &str) -> Vec<&Region> {
        let mut path = Vec::new();
        let mut cursor = self.region(name);
        while let Some(region) = cursor {
            path.push(region);
            cursor = self.parent_of(&region.name);
        }
        path
    }

    fn region_path(&self, name: &str) -> RegionPath {
        RegionPath(
            self.path_from_root(name)
                .into_iter()
                .map(|r| r.name.clone())
                .collect(),
        )
    }
}

/// Имена регионов от корня мира до региона включительно.
///
/// По этому пути ресурсы региона ищутся на диске.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RegionPath(pub Vec<String>);

impl RegionPath {
    /// Имя последнего региона пути
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    #[must_use]
    pub fn child(&self, name: &str) -> RegionPath {
        let mut names = self.0.clone();
        names.push(name.to_string());
        RegionPath(names)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RegionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" > "))
    }
}
