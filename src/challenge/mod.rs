// src/challenge/mod.rs
//! Задания раунда и их стопка
//!
//! Каждое задание привязано ровно к одному региону и одному показываемому факту:
//! имени, столице, лидеру или флагу. Стопка перемешивается один раз при
//! построении и дальше только укорачивается с головы.

pub mod builder;

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assets::FlagRef;
use crate::error::QuizError;
use crate::region::Region;

pub use builder::{build_challenges, build_queue, is_mode_available};

/// Режим игры: что показывается игроку в стопке
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Name,
    Capital,
    Leader,
    Flag,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Name,
        GameMode::Capital,
        GameMode::Leader,
        GameMode::Flag,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Name => "name",
            GameMode::Capital => "capital",
            GameMode::Leader => "leader",
            GameMode::Flag => "flag",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| QuizError::UnknownMode(s.to_string()))
    }
}

/// Одно задание стопки
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Name { region: String },
    Capital { region: String, capital: String },
    Leader { region: String, leader: String },
    /// Игроку показывается флаг, угадывается регион с этим именем
    Flag { region: String, flag: FlagRef },
}

impl Challenge {
    #[must_use]
    pub fn mode(&self) -> GameMode {
        match self {
            Challenge::Name { .. } => GameMode::Name,
            Challenge::Capital { .. } => GameMode::Capital,
            Challenge::Leader { .. } => GameMode::Leader,
            Challenge::Flag { .. } => GameMode::Flag,
        }
    }

    /// Регион, которому принадлежит задание
    #[must_use]
    pub fn region(&self) -> &str {
        match self {
            Challenge::Name { region }
            | Challenge::Capital { region, .. }
            | Challenge::Leader { region, .. }
            | Challenge::Flag { region, .. } => region,
        }
    }

    /// Текст, с которым сравнивается ответ игрока
    #[must_use]
    pub fn target_text(&self) -> &str {
        match self {
            Challenge::Name { region } | Challenge::Flag { region, .. } => region,
            Challenge::Capital { capital, .. } => capital,
            Challenge::Leader { leader, .. } => leader,
        }
    }

    #[must_use]
    pub fn flag(&self) -> Option<&FlagRef> {
        match self {
            Challenge::Flag { flag, .. } => Some(flag),
            _ => None,
        }
    }

    /// Правильный ли клик по региону `clicked`.
    ///
    /// Имя и флаг сравниваются с именем региона, столица и лидер — с
    /// соответствующим атрибутом кликнутого региона.
    #[must_use]
    pub fn is_answered_by(&self, clicked: &Region) -> bool {
        match self {
            Challenge::Name { region } | Challenge::Flag { region, .. } => clicked.name == *region,
            Challenge::Capital { capital, .. } => clicked.capital() == Some(capital.as_str()),
            Challenge::Leader { leader, .. } => clicked.leader() == Some(leader.as_str()),
        }
    }
}

/// Упорядоченная стопка заданий раунда
#[derive(Debug, Clone, Default)]
pub struct ChallengeQueue {
    entries: VecDeque<Challenge>,
}

impl ChallengeQueue {
    /// Стопка в уже заданном порядке (перемешивание делает `build_queue`)
    #[must_use]
    pub fn from_ordered(entries: Vec<Challenge>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    #[must_use]
    pub fn head(&self) -> Option<&Challenge> {
        self.entries.front()
    }

    pub fn pop_head(&mut self) -> Option<Challenge> {
        self.entries.pop_front()
    }

    /// Снимает задания с головы, пока не останется одно. Возвращает снятые.
    pub fn drain_to_one(&mut self) -> Vec<Challenge> {
        let excess = self.entries.len().saturating_sub(1);
        self.entries.drain(..excess).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Challenge> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::region::RegionType;

    fn names(queue: &ChallengeQueue) -> Vec<&str> {
        queue.iter().map(Challenge::region).collect()
    }

    fn name_queue(regions: &[&str]) -> ChallengeQueue {
        ChallengeQueue::from_ordered(
            regions
                .iter()
                .map(|r| Challenge::Name {
                    region: (*r).to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!("capital".parse::<GameMode>().unwrap(), GameMode::Capital);
        assert_eq!("FLAG".parse::<GameMode>().unwrap(), GameMode::Flag);
        assert!("anthem".parse::<GameMode>().is_err());
        assert_eq!(GameMode::Leader.to_string(), "leader");
    }

    #[test]
    fn popping_keeps_remaining_order() {
        let mut queue = name_queue(&["A", "B", "C", "D"]);
        assert_eq!(queue.pop_head().unwrap().region(), "A");
        assert_eq!(queue.pop_head().unwrap().region(), "B");
        assert_eq!(names(&queue), ["C", "D"]);
    }

    #[test]
    fn drain_to_one_leaves_the_tail() {
        let mut queue = name_queue(&["A", "B", "C"]);
        let drained: Vec<String> = queue
            .drain_to_one()
            .iter()
            .map(|c| c.region().to_string())
            .collect();
        assert_eq!(drained, ["A", "B"]);
        assert_eq!(names(&queue), ["C"]);

        assert!(queue.drain_to_one().is_empty());
        assert!(ChallengeQueue::default().drain_to_one().is_empty());
    }

    #[test]
    fn matching_rules_per_mode() {
        let kabul = Region::new("Kabul", RegionType::Province, Color::new(1, 1, 1))
            .with_capital("Kabul City")
            .with_leader("Governor K");
        let herat = Region::new("Herat", RegionType::Province, Color::new(2, 2, 2));

        let by_name = Challenge::Name {
            region: "Kabul".into(),
        };
        assert!(by_name.is_answered_by(&kabul));
        assert!(!by_name.is_answered_by(&herat));

        let by_capital = Challenge::Capital {
            region: "Kabul".into(),
            capital: "Kabul City".into(),
        };
        assert!(by_capital.is_answered_by(&kabul));
        assert!(!by_capital.is_answered_by(&herat));

        let by_leader = Challenge::Leader {
            region: "Kabul".into(),
            leader: "Governor K".into(),
        };
        assert!(by_leader.is_answered_by(&kabul));
        assert_eq!(by_leader.target_text(), "Governor K");

        let by_flag = Challenge::Flag {
            region: "Herat".into(),
            flag: FlagRef {
                path: "Herat Flag.png".into(),
                width: 10,
                height: 6,
            },
        };
        assert!(by_flag.is_answered_by(&herat));
        assert!(!by_flag.is_answered_by(&kabul));
        assert_eq!(by_flag.target_text(), "Herat");
        assert_eq!(by_flag.mode(), GameMode::Flag);
    }
}
