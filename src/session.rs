// src/session.rs
//! Игровая сессия: навигация по миру, запуск раундов и учёт рекордов
//!
//! Сессия владеет каталогом, источником ресурсов и хранилищем рекордов
//! и держит текущий регион. Вне раунда показывается карта навигации:
//! потомки без собственной карты закрашены цветом «недоступен», клик по
//! доступному потомку спускает в него. Раунд получает свежую копию карты,
//! так что карта навигации во время игры не меняется.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::assets::{AssetSource, DataDir};
use crate::challenge::{GameMode, build_queue, is_mode_available};
use crate::config::GameConfig;
use crate::error::{QuizError, Result};
use crate::map::{MapIndex, MapSurface};
use crate::region::{Region, RegionCatalogue, RegionPath};
use crate::round::{
    ClickOutcome, Clock, RoundEngine, RoundSetup, RoundSnapshot, RoundState, SharedRound,
    SystemClock,
};
use crate::score::{FileScoreStore, ScoreRecord, ScoreStore, SharedScores};

/// Что находится под курсором
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverInfo {
    pub region: String,
    /// Рекорды региона по режимам, в порядке `GameMode::ALL`
    pub best: Vec<(GameMode, ScoreRecord)>,
}

/// Карта текущего региона вне раунда
#[derive(Debug)]
struct NavigationView {
    surface: MapSurface,
    index: MapIndex,
    playable: HashSet<String>,
}

pub struct Session {
    config: GameConfig,
    catalogue: Box<dyn RegionCatalogue>,
    assets: Box<dyn AssetSource>,
    scores: SharedScores,
    rng: ChaCha8Rng,
    clock: Arc<dyn Clock>,
    current: String,
    view: NavigationView,
    round: Option<SharedRound>,
}

impl Session {
    /// Открывает сессию на регионе `start`
    pub fn open(
        config: GameConfig,
        catalogue: Box<dyn RegionCatalogue>,
        assets: Box<dyn AssetSource>,
        scores: Box<dyn ScoreStore>,
        start: &str,
    ) -> Result<Self> {
        let view = load_view(&config, catalogue.as_ref(), assets.as_ref(), start)?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed.unwrap_or_else(rand::random));
        info!("Сессия открыта на {start}");
        Ok(Self {
            config,
            catalogue,
            assets,
            scores: Arc::new(Mutex::new(scores)),
            rng,
            clock: Arc::new(SystemClock),
            current: start.to_string(),
            view,
            round: None,
        })
    }

    /// Сессия поверх дерева данных и каталога рекордов из конфигурации
    pub fn from_config(
        config: GameConfig,
        catalogue: Box<dyn RegionCatalogue>,
        start: &str,
    ) -> Result<Self> {
        let assets = DataDir::new(&config.data_dir, config.assets.clone());
        let scores = FileScoreStore::new(&config.scores_dir, config.assets.scores_suffix.clone());
        Self::open(config, catalogue, Box::new(assets), Box::new(scores), start)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn current_region(&self) -> &str {
        &self.current
    }

    /// Путь от корня мира до текущего региона
    #[must_use]
    pub fn breadcrumb(&self) -> RegionPath {
        self.catalogue.region_path(&self.current)
    }

    /// Карта навигации
    #[must_use]
    pub fn view(&self) -> &MapSurface {
        &self.view.surface
    }

    /// Можно ли спуститься в потомка текущего региона
    #[must_use]
    pub fn is_playable(&self, child: &str) -> bool {
        self.view.playable.contains(child)
    }

    #[must_use]
    pub fn round(&self) -> Option<&SharedRound> {
        self.round.as_ref()
    }

    fn round_in_progress(&self) -> bool {
        self.round
            .as_ref()
            .is_some_and(|round| !round.state().is_terminal())
    }

    /// Переходит в регион. При ошибке загрузки прежнее состояние сохраняется.
    pub fn open_region(&mut self, name: &str) -> Result<()> {
        if self.round_in_progress() {
            return Err(QuizError::RoundInProgress);
        }
        self.view = load_view(
            &self.config,
            self.catalogue.as_ref(),
            self.assets.as_ref(),
            name,
        )?;
        self.current = name.to_string();
        self.round = None;
        info!("Открыт регион {}", self.breadcrumb());
        Ok(())
    }

    /// Клик по карте навигации. Возвращает имя региона, если в него удалось спуститься.
    pub fn navigate_click(&mut self, x: u32, y: u32) -> Result<Option<String>> {
        if self.round_in_progress() {
            return Ok(None);
        }
        let target = self
            .view
            .surface
            .read_pixel(x, y)
            .and_then(|color| self.view.index.colors.lookup(color))
            .filter(|name| self.view.playable.contains(*name))
            .map(str::to_string);
        match target {
            Some(name) => {
                self.open_region(&name)?;
                Ok(Some(name))
            }
            None => Ok(None),
        }
    }

    /// Поднимается к родителю. `false`, если текущий регион — корень мира.
    pub fn go_up(&mut self) -> Result<bool> {
        let Some(parent) = self
            .catalogue
            .parent_of(&self.current)
            .map(|r| r.name.clone())
        else {
            return Ok(false);
        };
        self.open_region(&parent)?;
        Ok(true)
    }

    #[must_use]
    pub fn is_mode_available(&self, mode: GameMode) -> bool {
        let children = self.catalogue.children_of(&self.current);
        is_mode_available(
            mode,
            &children,
            &self.breadcrumb(),
            self.assets.as_ref(),
        )
    }

    #[must_use]
    pub fn available_modes(&self) -> Vec<GameMode> {
        GameMode::ALL
            .into_iter()
            .filter(|mode| self.is_mode_available(*mode))
            .collect()
    }

    /// Регион под курсором (на карте раунда, если он идёт) и его рекорды
    pub fn hover(&self, x: u32, y: u32) -> Result<Option<HoverInfo>> {
        let region = match &self.round {
            Some(round) => round.with(|engine| {
                engine
                    .surface()
                    .read_pixel(x, y)
                    .and_then(|color| engine.index().colors.lookup(color))
                    .map(str::to_string)
            }),
            None => self
                .view
                .surface
                .read_pixel(x, y)
                .and_then(|color| self.view.index.colors.lookup(color))
                .map(str::to_string),
        };
        let Some(region) = region else {
            return Ok(None);
        };

        let mut best = Vec::new();
        for mode in GameMode::ALL {
            if let Some(record) = self.best_score(&region, mode)? {
                best.push((mode, record));
            }
        }
        Ok(Some(HoverInfo { region, best }))
    }

    /// Сохранённый рекорд региона в режиме
    pub fn best_score(&self, region: &str, mode: GameMode) -> Result<Option<ScoreRecord>> {
        self.scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_best(region, mode)
    }

    /// Начинает раунд по потомкам текущего региона.
    ///
    /// Возвращённый раунд подключён к хранилищу рекордов: победа через него
    /// записывается так же, как через `Session::click`.
    pub fn start_round(&mut self, mode: GameMode) -> Result<SharedRound> {
        if self.round_in_progress() {
            return Err(QuizError::RoundInProgress);
        }
        let path = self.catalogue.region_path(&self.current);
        let children = self.catalogue.children_of(&self.current);
        let queue = build_queue(
            mode,
            &children,
            &path,
            self.assets.as_ref(),
            &mut self.rng,
        );
        if queue.is_empty() {
            return Err(QuizError::ModeUnavailable {
                region: self.current.clone(),
                mode,
            });
        }

        let border = self.config.colors.border;
        let surface = MapSurface::from_image(self.assets.load_map(&path)?, border);
        let index = MapIndex::build(&surface, &children, border);
        let setup = RoundSetup {
            region: self.current.clone(),
            mode,
            children: children.into_iter().cloned().collect(),
            surface,
            index,
            queue,
        };

        let mut engine = RoundEngine::new(setup, &self.config, Arc::clone(&self.clock));
        engine.start();
        let round = SharedRound::with_scores(engine, Arc::clone(&self.scores));
        self.round = Some(round.clone());
        Ok(round)
    }

    /// Клик в раунде. После победы рекорд записывается сразу.
    pub fn click(&self, x: u32, y: u32) -> Result<ClickOutcome> {
        self.round
            .as_ref()
            .map(|round| round.click(x, y))
            .ok_or(QuizError::NoRound)
    }

    pub fn tick(&self, percentage: f64) {
        if let Some(round) = &self.round {
            round.tick(percentage);
        }
    }

    /// Снимает все задания, кроме последнего
    pub fn reveal(&self) -> Result<usize> {
        self.round
            .as_ref()
            .map(SharedRound::force_resolve_except_one)
            .ok_or(QuizError::NoRound)
    }

    pub fn snapshot(&self) -> Option<RoundSnapshot> {
        self.round.as_ref().map(SharedRound::snapshot)
    }

    /// Останавливает раунд и возвращается к навигации. Незавершённый раунд
    /// засчитывается как поражение; возвращается итоговое состояние.
    pub fn stop_round(&mut self) -> Result<RoundState> {
        let round = self.round.take().ok_or(QuizError::NoRound)?;
        round.abort();
        Ok(round.state())
    }
}

/// Загружает карту региона и закрашивает потомков без своей карты
fn load_view(
    config: &GameConfig,
    catalogue: &dyn RegionCatalogue,
    assets: &dyn AssetSource,
    name: &str,
) -> Result<NavigationView> {
    if catalogue.region(name).is_none() {
        return Err(QuizError::UnknownRegion(name.to_string()));
    }
    let path = catalogue.region_path(name);
    let border = config.colors.border;
    let mut surface = MapSurface::from_image(assets.load_map(&path)?, border);
    let children: Vec<&Region> = catalogue.children_of(name);
    let index = MapIndex::build(&surface, &children, border);

    let mut playable = HashSet::new();
    for child in &children {
        if assets.has_map(&path.child(&child.name)) {
            playable.insert(child.name.clone());
        } else {
            surface.recolor(index.pixels.pixels_of(&child.name), config.colors.unplayable);
        }
    }
    info!(
        "Карта {path}: {}×{}, доступно {} из {} регионов",
        surface.width(),
        surface.height(),
        playable.len(),
        children.len()
    );
    Ok(NavigationView {
        surface,
        index,
        playable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::color::Color;
    use crate::region::{RegionType, WorldCatalogue};
    use crate::round::tests::ManualClock;
    use crate::score::MemoryScoreStore;
    use image::{Rgb, RgbImage};

    const A: Color = Color::new(200, 200, 200);
    const B: Color = Color::new(100, 100, 100);
    const A1: Color = Color::new(10, 20, 30);

    fn strip(colors: &[Color]) -> RgbImage {
        let mut img = RgbImage::new(colors.len() as u32, 1);
        for (x, color) in colors.iter().enumerate() {
            img.put_pixel(x as u32, 0, Rgb::from(*color));
        }
        img
    }

    /// World → {A (со своей картой, столица), B (без карты)}, A → {A1}
    fn session(clock: Arc<ManualClock>) -> Session {
        let mut catalogue = WorldCatalogue::new();
        catalogue
            .set_root(Region::new("World", RegionType::World, Color::BLACK))
            .unwrap();
        catalogue
            .add_child("World", Region::new("A", RegionType::Continent, A).with_capital("Acity"))
            .unwrap();
        catalogue
            .add_child("World", Region::new("B", RegionType::Continent, B))
            .unwrap();
        catalogue
            .add_child("A", Region::new("A1", RegionType::Nation, A1))
            .unwrap();

        let assets = MemoryAssets::new()
            .with_map("World", strip(&[A, B]))
            .with_map("A", strip(&[A1]))
            .with_flag("A", 30, 20);
        let config = GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        };
        Session::open(
            config,
            Box::new(catalogue),
            Box::new(assets),
            Box::new(MemoryScoreStore::new()),
            "World",
        )
        .unwrap()
        .with_clock(clock)
    }

    fn head_pixel(session: &Session) -> (u32, u32) {
        session.round().unwrap().with(|engine| {
            let head = engine.head().unwrap().region().to_string();
            engine.index().pixels.pixels_of(&head)[0]
        })
    }

    #[test]
    fn children_without_map_are_unplayable() {
        let session = session(ManualClock::new());
        assert!(session.is_playable("A"));
        assert!(!session.is_playable("B"));
        assert_eq!(session.view().read_pixel(0, 0), Some(A));
        assert_eq!(
            session.view().read_pixel(1, 0),
            Some(session.config().colors.unplayable)
        );
    }

    #[test]
    fn navigation_descends_and_climbs() {
        let mut session = session(ManualClock::new());
        assert_eq!(session.navigate_click(1, 0).unwrap(), None);
        assert_eq!(session.current_region(), "World");

        assert_eq!(session.navigate_click(0, 0).unwrap(), Some("A".into()));
        assert_eq!(session.breadcrumb().to_string(), "World > A");
        assert_eq!(session.view().read_pixel(0, 0), Some(session.config().colors.unplayable));

        assert!(session.go_up().unwrap());
        assert_eq!(session.current_region(), "World");
        assert!(!session.go_up().unwrap());
    }

    #[test]
    fn failed_region_load_keeps_previous_state() {
        let mut session = session(ManualClock::new());
        assert!(matches!(
            session.open_region("B"),
            Err(QuizError::MissingMap(_))
        ));
        assert!(matches!(
            session.open_region("Atlantis"),
            Err(QuizError::UnknownRegion(_))
        ));
        assert_eq!(session.current_region(), "World");
        assert_eq!(session.view().read_pixel(0, 0), Some(A));
    }

    #[test]
    fn mode_availability_follows_children() {
        let session = session(ManualClock::new());
        assert_eq!(
            session.available_modes(),
            [GameMode::Name, GameMode::Capital, GameMode::Flag]
        );
    }

    #[test]
    fn winning_round_records_best_score() {
        let clock = ManualClock::new();
        let mut session = session(clock.clone());
        session.start_round(GameMode::Name).unwrap();
        // Вся карта раунда кликабельна, включая B
        assert_eq!(session.round().unwrap().with(|e| e.surface().read_pixel(1, 0)), Some(B));

        clock.advance(30);
        let (x, y) = head_pixel(&session);
        assert!(matches!(session.click(x, y).unwrap(), ClickOutcome::Correct { .. }));
        let (x, y) = head_pixel(&session);
        let ClickOutcome::Won(summary) = session.click(x, y).unwrap() else {
            panic!("round should be won");
        };
        assert_eq!(summary.score, 10_000 - 30);

        // Рекорд ведётся по разыгранному региону
        let best = session.best_score("World", GameMode::Name).unwrap();
        assert_eq!(best.map(|r| r.score), Some(10_000 - 30));
        assert_eq!(session.stop_round().unwrap(), RoundState::Win);
    }

    #[test]
    fn hover_shows_best_scores() {
        let mut session = session(ManualClock::new());
        session.navigate_click(0, 0).unwrap();
        session.start_round(GameMode::Name).unwrap();
        assert!(matches!(session.click(0, 0).unwrap(), ClickOutcome::Won(_)));
        session.stop_round().unwrap();
        session.go_up().unwrap();

        let hover = session.hover(0, 0).unwrap().unwrap();
        assert_eq!(hover.region, "A");
        assert_eq!(hover.best.len(), 1);
        assert_eq!(hover.best[0].0, GameMode::Name);
        assert_eq!(hover.best[0].1.score, 10_000);

        // Недоступный регион закрашен и не распознаётся
        assert_eq!(session.hover(1, 0).unwrap(), None);
    }

    #[test]
    fn only_one_round_at_a_time() {
        let mut session = session(ManualClock::new());
        session.start_round(GameMode::Name).unwrap();
        assert!(matches!(
            session.start_round(GameMode::Capital),
            Err(QuizError::RoundInProgress)
        ));
        assert!(matches!(
            session.open_region("A"),
            Err(QuizError::RoundInProgress)
        ));
        assert_eq!(session.navigate_click(0, 0).unwrap(), None);
    }

    #[test]
    fn unavailable_mode_is_rejected() {
        let mut session = session(ManualClock::new());
        assert!(matches!(
            session.start_round(GameMode::Leader),
            Err(QuizError::ModeUnavailable { .. })
        ));
        assert!(session.round().is_none());
    }

    #[test]
    fn stopping_a_round_is_a_loss() {
        let mut session = session(ManualClock::new());
        let round = session.start_round(GameMode::Name).unwrap();
        assert_eq!(session.stop_round().unwrap(), RoundState::Loss);
        assert_eq!(round.click(0, 0), ClickOutcome::Ignored);
        assert!(matches!(session.click(0, 0), Err(QuizError::NoRound)));
        assert!(matches!(session.reveal(), Err(QuizError::NoRound)));
    }

    #[test]
    fn win_through_round_handle_records_best() {
        let mut session = session(ManualClock::new());
        session.navigate_click(0, 0).unwrap();
        let round = session.start_round(GameMode::Name).unwrap();

        assert!(matches!(round.click(0, 0), ClickOutcome::Won(_)));
        let best = session.best_score("A", GameMode::Name).unwrap();
        assert_eq!(best.map(|r| r.score), Some(10_000));
    }

    #[test]
    fn flag_round_is_won_by_clicking_the_flagged_region() {
        let clock = ManualClock::new();
        let mut session = session(clock.clone());
        let round = session.start_round(GameMode::Flag).unwrap();

        // Флаг есть только у A, поэтому в стопке одно задание
        let head = round.with(|engine| engine.head().cloned()).unwrap();
        assert_eq!(head.mode(), GameMode::Flag);
        assert_eq!(head.region(), "A");
        assert_eq!(head.flag().map(|f| (f.width, f.height)), Some((30, 20)));

        clock.advance(7);
        assert!(matches!(
            session.click(1, 0).unwrap(),
            ClickOutcome::Incorrect { .. }
        ));
        let ClickOutcome::Won(summary) = session.click(0, 0).unwrap() else {
            panic!("flag round should be won by clicking A");
        };
        assert_eq!(summary.mode, GameMode::Flag);
        assert_eq!(summary.score, 10_000 - 7 - 100);
        assert_eq!(
            session.best_score("World", GameMode::Flag).unwrap(),
            Some(summary.record())
        );
        assert_eq!(session.best_score("World", GameMode::Name).unwrap(), None);
    }

    #[test]
    fn reveal_leaves_the_last_challenge() {
        let mut session = session(ManualClock::new());
        session.start_round(GameMode::Name).unwrap();
        assert_eq!(session.reveal().unwrap(), 1);
        assert_eq!(session.snapshot().unwrap().remaining, 1);
        assert_eq!(session.snapshot().unwrap().found, 1);
    }
}
