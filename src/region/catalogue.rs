// src/region/catalogue.rs
//! Каталог регионов в памяти
//!
//! Регионы хранятся в арене — ориентированном графе `petgraph`:
//! - узел — `Region`
//! - ребро родитель → потомок, вес ребра — порядковый номер потомка
//!
//! Родитель и потомки адресуются индексами узлов, циклического владения нет.
//! Загружается из вложенного дерева `RegionNode` в JSON или TOML
//! (разбор исходного XML-формата остаётся внешним импортёром).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{QuizError, Result};
use crate::region::{Region, RegionCatalogue, RegionType};

/// Узел дерева регионов в файле каталога
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionNode {
    pub name: String,
    #[serde(rename = "type")]
    pub region_type: RegionType,
    /// Корню мира цвет не нужен
    #[serde(default = "default_node_color")]
    pub color: Color,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub leader: Option<String>,
    #[serde(default)]
    pub children: Vec<RegionNode>,
}

fn default_node_color() -> Color {
    Color::new(254, 254, 254)
}

#[derive(Debug, Clone, Default)]
pub struct WorldCatalogue {
    graph: DiGraph<Region, u32>,
    by_name: HashMap<String, NodeIndex>,
    root: Option<NodeIndex>,
}

impl WorldCatalogue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет регион и делает его корнем мира
    pub fn set_root(&mut self, region: Region) -> Result<()> {
        let idx = self.insert(region)?;
        self.root = Some(idx);
        Ok(())
    }

    /// Добавляет регион потомком `parent`, сохраняя порядок добавления
    pub fn add_child(&mut self, parent: &str, region: Region) -> Result<()> {
        let parent_idx = *self
            .by_name
            .get(parent)
            .ok_or_else(|| QuizError::UnknownRegion(parent.to_string()))?;
        let ordinal = self
            .graph
            .edges_directed(parent_idx, Direction::Outgoing)
            .count() as u32;
        let child_idx = self.insert(region)?;
        self.graph.add_edge(parent_idx, child_idx, ordinal);
        Ok(())
    }

    fn insert(&mut self, region: Region) -> Result<NodeIndex> {
        if self.by_name.contains_key(&region.name) {
            return Err(QuizError::DuplicateRegion(region.name));
        }
        let name = region.name.clone();
        let idx = self.graph.add_node(region);
        self.by_name.insert(name, idx);
        Ok(idx)
    }

    #[must_use]
    pub fn root(&self) -> Option<&Region> {
        self.root.map(|idx| &self.graph[idx])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Регион без потомков — самый глубокий уровень навигации
    #[must_use]
    pub fn is_leaf(&self, name: &str) -> bool {
        self.by_name.get(name).is_none_or(|&idx| {
            self.graph
                .edges_directed(idx, Direction::Outgoing)
                .next()
                .is_none()
        })
    }

    /// Строит каталог из дерева: корень дерева становится корнем мира
    pub fn from_tree(root: RegionNode) -> Result<Self> {
        let mut catalogue = Self::new();
        let RegionNode {
            name,
            region_type,
            color,
            capital,
            leader,
            children,
        } = root;
        catalogue.set_root(Region {
            name: name.clone(),
            region_type,
            color,
            capital,
            leader,
        })?;

        // Обход в ширину, чтобы порядок потомков совпадал с порядком в файле
        let mut pending: std::collections::VecDeque<(String, Vec<RegionNode>)> =
            std::collections::VecDeque::from([(name, children)]);
        while let Some((parent, nodes)) = pending.pop_front() {
            for node in nodes {
                let child_name = node.name.clone();
                catalogue.add_child(
                    &parent,
                    Region {
                        name: node.name,
                        region_type: node.region_type,
                        color: node.color,
                        capital: node.capital,
                        leader: node.leader,
                    },
                )?;
                if !node.children.is_empty() {
                    pending.push_back((child_name, node.children));
                }
            }
        }

        debug!("Каталог загружен: {} регионов", catalogue.len());
        Ok(catalogue)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Self::from_tree(serde_json::from_str(contents)?)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Self::from_tree(toml::from_str(contents)?)
    }

    /// Загружает каталог из файла; формат определяется по расширению (`.toml`, иначе JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| QuizError::io(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            _ => Self::from_json_str(&contents),
        }
    }
}

impl RegionCatalogue for WorldCatalogue {
    fn region(&self, name: &str) -> Option<&Region> {
        self.by_name.get(name).map(|&idx| &self.graph[idx])
    }

    fn children_of(&self, name: &str) -> Vec<&Region> {
        let Some(&idx) = self.by_name.get(name) else {
            return Vec::new();
        };
        let mut edges: Vec<(u32, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        edges.sort_unstable_by_key(|&(ordinal, _)| ordinal);
        edges.into_iter().map(|(_, child)| &self.graph[child]).collect()
    }

    fn parent_of(&self, name: &str) -> Option<&Region> {
        let idx = *self.by_name.get(name)?;
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .map(|parent| &self.graph[parent])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = r##"{
        "name": "The World",
        "type": "World",
        "children": [
            {
                "name": "Asia",
                "type": "Continent",
                "color": "#c8c8c8",
                "children": [
                    { "name": "Afghanistan", "type": "Nation", "color": "#646464",
                      "capital": "Kabul", "leader": "Someone" },
                    { "name": "Nepal", "type": "Nation", "color": "#656565", "capital": "" }
                ]
            },
            { "name": "Europe", "type": "Continent", "color": "#c6c6c6" }
        ]
    }"##;

    #[test]
    fn children_keep_file_order() {
        let catalogue = WorldCatalogue::from_json_str(WORLD).unwrap();
        let names: Vec<&str> = catalogue
            .children_of("The World")
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["Asia", "Europe"]);

        let asia: Vec<&str> = catalogue
            .children_of("Asia")
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(asia, ["Afghanistan", "Nepal"]);
    }

    #[test]
    fn attributes_and_parents() {
        let catalogue = WorldCatalogue::from_json_str(WORLD).unwrap();
        assert_eq!(catalogue.capital_of("Afghanistan"), Some("Kabul"));
        assert_eq!(catalogue.capital_of("Nepal"), None);
        assert_eq!(catalogue.leader_of("Nepal"), None);
        assert_eq!(catalogue.type_of("Asia"), Some(RegionType::Continent));
        assert_eq!(catalogue.parent_of("Nepal").unwrap().name, "Asia");
        assert!(catalogue.parent_of("The World").is_none());
        assert_eq!(catalogue.root().unwrap().name, "The World");
    }

    #[test]
    fn paths_between_root_and_region() {
        let catalogue = WorldCatalogue::from_json_str(WORLD).unwrap();
        let down: Vec<&str> = catalogue
            .path_from_root("Afghanistan")
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(down, ["The World", "Asia", "Afghanistan"]);

        let up: Vec<&str> = catalogue
            .path_to_root("Afghanistan")
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(up, ["Afghanistan", "Asia", "The World"]);

        assert_eq!(
            catalogue.region_path("Nepal").to_string(),
            "The World > Asia > Nepal"
        );
        assert!(catalogue.path_from_root("Atlantis").is_empty());
    }

    #[test]
    fn leaves() {
        let catalogue = WorldCatalogue::from_json_str(WORLD).unwrap();
        assert!(catalogue.is_leaf("Nepal"));
        assert!(catalogue.is_leaf("Europe"));
        assert!(!catalogue.is_leaf("Asia"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut catalogue = WorldCatalogue::new();
        catalogue
            .set_root(Region::new("The World", RegionType::World, Color::BLACK))
            .unwrap();
        catalogue
            .add_child(
                "The World",
                Region::new("Asia", RegionType::Continent, Color::new(1, 1, 1)),
            )
            .unwrap();
        let err = catalogue
            .add_child(
                "The World",
                Region::new("Asia", RegionType::Continent, Color::new(2, 2, 2)),
            )
            .unwrap_err();
        assert!(matches!(err, QuizError::DuplicateRegion(name) if name == "Asia"));
    }

    #[test]
    fn unknown_parent_is_an_error() {
        let mut catalogue = WorldCatalogue::new();
        let err = catalogue
            .add_child("Nowhere", Region::new("X", RegionType::Nation, Color::BLACK))
            .unwrap_err();
        assert!(matches!(err, QuizError::UnknownRegion(_)));
    }

    #[test]
    fn loads_toml_tree() {
        let catalogue = WorldCatalogue::from_toml_str(
            r##"
            name = "Afghanistan"
            type = "Nation"

            [[children]]
            name = "Kabul"
            type = "Province"
            color = "#b4b4b4"
            capital = "Kabul"

            [[children]]
            name = "Herat"
            type = "Province"
            color = "#8e8e8e"
            "##,
        )
        .unwrap();
        assert_eq!(catalogue.children_of("Afghanistan").len(), 2);
        assert_eq!(
            catalogue.region("Herat").unwrap().color,
            Color::new(142, 142, 142)
        );
    }
}
