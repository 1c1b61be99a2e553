// src/challenge/builder.rs
//! Построение стопки заданий
//!
//! Правило отбора зависит от режима:
//! - `name` — все потомки
//! - `capital` — только потомки с непустой столицей
//! - `leader` — только потомки с непустым лидером
//! - `flag` — только потомки, чей флаг нашёлся в ресурсах
//!
//! Отобранные задания перемешиваются один раз (равномерная перестановка).

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::assets::AssetSource;
use crate::challenge::{Challenge, ChallengeQueue, GameMode};
use crate::region::{Region, RegionPath};

/// Задания режима в порядке каталога, без перемешивания.
///
/// `parent` — путь региона, чьи потомки разыгрываются; по нему ищутся флаги.
#[must_use]
pub fn build_challenges(
    mode: GameMode,
    children: &[&Region],
    parent: &RegionPath,
    assets: &dyn AssetSource,
) -> Vec<Challenge> {
    children
        .iter()
        .filter_map(|child| challenge_for(mode, child, parent, assets))
        .collect()
}

fn challenge_for(
    mode: GameMode,
    child: &Region,
    parent: &RegionPath,
    assets: &dyn AssetSource,
) -> Option<Challenge> {
    let region = child.name.clone();
    match mode {
        GameMode::Name => Some(Challenge::Name { region }),
        GameMode::Capital => child.capital().map(|capital| Challenge::Capital {
            region,
            capital: capital.to_string(),
        }),
        GameMode::Leader => child.leader().map(|leader| Challenge::Leader {
            region,
            leader: leader.to_string(),
        }),
        GameMode::Flag => assets
            .load_flag(&parent.child(&child.name))
            .map(|flag| Challenge::Flag { region, flag }),
    }
}

/// Перемешанная стопка заданий раунда
pub fn build_queue<R: Rng + ?Sized>(
    mode: GameMode,
    children: &[&Region],
    parent: &RegionPath,
    assets: &dyn AssetSource,
    rng: &mut R,
) -> ChallengeQueue {
    let mut challenges = build_challenges(mode, children, parent, assets);
    challenges.shuffle(rng);
    debug!(
        "Стопка {mode} для {parent}: {} из {} регионов",
        challenges.len(),
        children.len()
    );
    ChallengeQueue::from_ordered(challenges)
}

/// Доступен ли режим: есть ли в нём хотя бы одно задание
#[must_use]
pub fn is_mode_available(
    mode: GameMode,
    children: &[&Region],
    parent: &RegionPath,
    assets: &dyn AssetSource,
) -> bool {
    children
        .iter()
        .any(|child| challenge_for(mode, child, parent, assets).is_some())
}
