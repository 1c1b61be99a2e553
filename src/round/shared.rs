// src/round/shared.rs
//! Раунд, разделяемый между потоком ввода и игровым циклом.
//!
//! Все изменения проходят под одним мьютексом, поэтому клик, тик анимации
//! и прерывание никогда не перемежаются. Если к раунду подключено хранилище
//! рекордов, победный клик записывает результат, не отпуская блокировку раунда.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use super::{ClickOutcome, RoundEngine, RoundSnapshot, RoundState, RoundSummary};
use crate::score::SharedScores;

#[derive(Debug, Clone)]
pub struct SharedRound {
    engine: Arc<Mutex<RoundEngine>>,
    scores: Option<SharedScores>,
}

impl SharedRound {
    #[must_use]
    pub fn new(engine: RoundEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            scores: None,
        }
    }

    /// Раунд, который сам записывает рекорд при победе
    #[must_use]
    pub fn with_scores(engine: RoundEngine, scores: SharedScores) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            scores: Some(scores),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RoundEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn click(&self, x: u32, y: u32) -> ClickOutcome {
        let mut engine = self.lock();
        let outcome = engine.click(x, y);
        if let ClickOutcome::Won(summary) = &outcome {
            self.record_win(summary);
        }
        outcome
    }

    /// Ошибка записи не отменяет победу
    fn record_win(&self, summary: &RoundSummary) {
        let Some(scores) = &self.scores else {
            return;
        };
        let mut store = scores.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = store.record_if_best(&summary.region, summary.mode, summary.record()) {
            warn!("Не удалось сохранить рекорд {}: {e}", summary.region);
        }
    }

    pub fn tick(&self, percentage: f64) {
        self.lock().tick(percentage);
    }

    pub fn abort(&self) -> bool {
        self.lock().abort()
    }

    pub fn force_resolve_except_one(&self) -> usize {
        self.lock().force_resolve_except_one()
    }

    #[must_use]
    pub fn state(&self) -> RoundState {
        self.lock().state()
    }

    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        self.lock().snapshot()
    }

    /// Чтение под блокировкой
    pub fn with<T>(&self, f: impl FnOnce(&RoundEngine) -> T) -> T {
        f(&self.lock())
    }
}
