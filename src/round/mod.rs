// src/round/mod.rs
//! Конечный автомат раунда
//!
//! Состояния: `NotStarted → InProgress → {Win, Loss}`.
//!
//! ## Обработка клика
//!
//! 1. Цвет пикселя под курсором → регион через `ColorIndex` (неизвестный цвет — клик игнорируется)
//! 2. Регион сравнивается с головой стопки по правилу режима
//! 3. **Верно**: регион перекрашивается в цвет «угадан», голова снимается, все
//!    помеченные ошибочными регионы возвращают свой цвет; пустая стопка — победа
//! 4. **Неверно**: регион перекрашивается в цвет ошибки и попадает в множество
//!    ошибочных; повторный клик по нему штраф не добавляет
//!
//! Движок не знает о рендеринге: он владеет картой, индексами, стопкой и счётчиками.
//! Сериализацию доступа из нескольких потоков обеспечивает `SharedRound`.

pub mod scoring;
pub mod shared;
pub mod stack;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::challenge::{Challenge, ChallengeQueue, GameMode};
use crate::config::{ColorSettings, GameConfig, ScoringSettings};
use crate::map::{MapIndex, MapSurface};
use crate::region::Region;
use crate::score::ScoreRecord;

pub use shared::SharedRound;
pub use stack::StackAnimation;

/// Источник времени раунда
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Интерфейс раунда для игрового цикла
pub trait GameRound {
    fn on_click(&mut self, x: u32, y: u32) -> ClickOutcome;

    /// `percentage` — доля кадра, прошедшая с прошлого вызова
    fn on_tick(&mut self, percentage: f64);

    fn is_terminal(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundState {
    NotStarted,
    InProgress,
    Win,
    Loss,
}

impl RoundState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundState::Win | RoundState::Loss)
    }
}

/// Итог раунда, завершённого победой
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub region: String,
    pub mode: GameMode,
    pub found: usize,
    pub mistakes: u32,
    pub elapsed_secs: u64,
    pub score: u32,
}

impl RoundSummary {
    #[must_use]
    pub fn elapsed_text(&self) -> String {
        scoring::format_duration(self.elapsed_secs)
    }

    #[must_use]
    pub fn record(&self) -> ScoreRecord {
        ScoreRecord {
            score: self.score,
            duration_secs: self.elapsed_secs,
            mistakes: self.mistakes,
        }
    }
}

/// Результат одного клика
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Фон, граница, уже угаданный регион, пустая стопка или раунд не идёт
    Ignored,
    Correct { region: String, remaining: usize },
    /// Правильный ответ, опустошивший стопку
    Won(RoundSummary),
    Incorrect { region: String, mistakes: u32 },
    /// Повторный клик по региону, уже помеченному ошибочным
    AlreadyFlagged { region: String },
}

/// Счётчики раунда для отображения
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSnapshot {
    pub state: RoundState,
    pub found: usize,
    pub remaining: usize,
    pub mistakes: u32,
    pub elapsed_text: String,
    pub head: Option<String>,
}

/// Всё, что нужно раунду: карта, индексы, стопка и снимок атрибутов потомков
#[derive(Debug, Clone)]
pub struct RoundSetup {
    pub region: String,
    pub mode: GameMode,
    pub children: Vec<Region>,
    pub surface: MapSurface,
    pub index: MapIndex,
    pub queue: ChallengeQueue,
}

#[derive(Debug)]
pub struct RoundEngine {
    region: String,
    mode: GameMode,
    regions: HashMap<String, Region>,
    surface: MapSurface,
    index: MapIndex,
    queue: ChallengeQueue,
    stack: StackAnimation,
    wrong: Vec<String>,
    state: RoundState,
    mistakes: u32,
    found: usize,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    summary: Option<RoundSummary>,
    colors: ColorSettings,
    scoring: ScoringSettings,
    clock: Arc<dyn Clock>,
}

impl RoundEngine {
    #[must_use]
    pub fn new(setup: RoundSetup, config: &GameConfig, clock: Arc<dyn Clock>) -> Self {
        let RoundSetup {
            region,
            mode,
            children,
            surface,
            index,
            queue,
        } = setup;
        let stack = StackAnimation::for_queue(&queue, &config.stack, mode);
        Self {
            region,
            mode,
            regions: children.into_iter().map(|r| (r.name.clone(), r)).collect(),
            surface,
            index,
            queue,
            stack,
            wrong: Vec::new(),
            state: RoundState::NotStarted,
            mistakes: 0,
            found: 0,
            started_at: None,
            finished_at: None,
            summary: None,
            colors: config.colors.clone(),
            scoring: config.scoring,
            clock,
        }
    }

    /// `NotStarted → InProgress`: засекает время и запускает стопку
    pub fn start(&mut self) -> bool {
        if self.state != RoundState::NotStarted {
            return false;
        }
        self.state = RoundState::InProgress;
        self.started_at = Some(self.clock.now());
        self.stack.start_moving_down();
        info!(
            "Раунд {} ({}) начат: {} заданий",
            self.region,
            self.mode,
            self.queue.len()
        );
        true
    }

    pub fn click(&mut self, x: u32, y: u32) -> ClickOutcome {
        if self.state != RoundState::InProgress {
            return ClickOutcome::Ignored;
        }
        let Some(color) = self.surface.read_pixel(x, y) else {
            return ClickOutcome::Ignored;
        };
        let Some(name) = self.index.colors.lookup(color) else {
            return ClickOutcome::Ignored;
        };
        let (Some(head), Some(clicked)) = (self.queue.head(), self.regions.get(name)) else {
            return ClickOutcome::Ignored;
        };

        let correct = head.is_answered_by(clicked);
        let name = name.to_string();
        debug!("Клик ({x}, {y}) → {name}: {}", if correct { "верно" } else { "неверно" });

        if correct {
            self.resolve_correct(name)
        } else {
            self.resolve_incorrect(name)
        }
    }

    fn resolve_correct(&mut self, name: String) -> ClickOutcome {
        self.surface
            .recolor(self.index.pixels.pixels_of(&name), self.colors.solved);
        self.queue.pop_head();
        self.stack.pop_front();
        self.restore_wrong();
        self.found += 1;
        self.stack.start_moving_down();

        if self.queue.is_empty() {
            return ClickOutcome::Won(self.finish_win());
        }
        ClickOutcome::Correct {
            region: name,
            remaining: self.queue.len(),
        }
    }

    fn resolve_incorrect(&mut self, name: String) -> ClickOutcome {
        if self.wrong.contains(&name) {
            return ClickOutcome::AlreadyFlagged { region: name };
        }
        self.surface
            .recolor(self.index.pixels.pixels_of(&name), self.colors.incorrect);
        self.wrong.push(name.clone());
        self.mistakes += 1;
        ClickOutcome::Incorrect {
            region: name,
            mistakes: self.mistakes,
        }
    }

    /// Возвращает ошибочно выбранным регионам их собственный цвет
    fn restore_wrong(&mut self) {
        for name in std::mem::take(&mut self.wrong) {
            if let Some(color) = self.index.colors.color_of(&name) {
                self.surface
                    .recolor(self.index.pixels.pixels_of(&name), color);
            }
        }
    }

    fn finish_win(&mut self) -> RoundSummary {
        self.finished_at = Some(self.clock.now());
        self.state = RoundState::Win;
        let elapsed_secs = self.elapsed_secs();
        let summary = RoundSummary {
            region: self.region.clone(),
            mode: self.mode,
            found: self.found,
            mistakes: self.mistakes,
            elapsed_secs,
            score: scoring::compute_score(&self.scoring, elapsed_secs, self.mistakes),
        };
        info!(
            "Победа: {} ({}) за {}, ошибок {}, очков {}",
            summary.region,
            summary.mode,
            summary.elapsed_text(),
            summary.mistakes,
            summary.score
        );
        self.summary = Some(summary.clone());
        summary
    }

    /// Снимает с головы все задания, кроме последнего, засчитывая их как угаданные.
    ///
    /// Ничего не делает, если раунд не идёт или в стопке не больше одного задания.
    /// Возвращает число снятых заданий.
    pub fn force_resolve_except_one(&mut self) -> usize {
        if self.state != RoundState::InProgress || self.queue.len() <= 1 {
            return 0;
        }
        let drained = self.queue.drain_to_one();
        for challenge in &drained {
            self.surface.recolor(
                self.index.pixels.pixels_of(challenge.region()),
                self.colors.solved,
            );
            self.stack.pop_front();
        }
        self.found += drained.len();
        self.restore_wrong();

        if let Some(head) = self.queue.head() {
            let name = head.region();
            if let Some(color) = self.index.colors.color_of(name) {
                self.surface
                    .recolor(self.index.pixels.pixels_of(name), color);
            }
        }
        self.stack.start_moving_down();
        debug!("Снято {} заданий, осталось одно", drained.len());
        drained.len()
    }

    /// Прерывает раунд поражением. Завершённый раунд не меняется.
    pub fn abort(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = RoundState::Loss;
        self.finished_at = Some(self.clock.now());
        info!("Раунд {} ({}) прерван", self.region, self.mode);
        true
    }

    pub fn tick(&mut self, percentage: f64) {
        if self.state == RoundState::InProgress {
            self.stack.tick(percentage);
        }
    }

    /// Целые секунды от старта до конца раунда (или до текущего момента)
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        let Some(start) = self.started_at else {
            return 0;
        };
        let end = self.finished_at.unwrap_or_else(|| self.clock.now());
        end.saturating_duration_since(start).as_secs()
    }

    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            state: self.state,
            found: self.found,
            remaining: self.queue.len(),
            mistakes: self.mistakes,
            elapsed_text: scoring::format_duration(self.elapsed_secs()),
            head: self.queue.head().map(|c| c.target_text().to_string()),
        }
    }

    #[must_use]
    pub fn state(&self) -> RoundState {
        self.state
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn head(&self) -> Option<&Challenge> {
        self.queue.head()
    }

    #[must_use]
    pub fn queue(&self) -> &ChallengeQueue {
        &self.queue
    }

    #[must_use]
    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    #[must_use]
    pub fn found(&self) -> usize {
        self.found
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Регионы, помеченные ошибочными с последнего правильного ответа
    #[must_use]
    pub fn wrong_regions(&self) -> &[String] {
        &self.wrong
    }

    #[must_use]
    pub fn surface(&self) -> &MapSurface {
        &self.surface
    }

    #[must_use]
    pub fn index(&self) -> &MapIndex {
        &self.index
    }

    #[must_use]
    pub fn stack(&self) -> &StackAnimation {
        &self.stack
    }

    #[must_use]
    pub fn summary(&self) -> Option<&RoundSummary> {
        self.summary.as_ref()
    }
}

impl GameRound for RoundEngine {
    fn on_click(&mut self, x: u32, y: u32) -> ClickOutcome {
        self.click(x, y)
    }

    fn on_tick(&mut self, percentage: f64) {
        self.tick(percentage);
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
