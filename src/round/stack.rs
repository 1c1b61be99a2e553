// src/round/stack.rs
//! Анимация стопки заданий
//!
//! Каждому заданию соответствует слот с вертикальной позицией на экране.
//! Голова стопки — нижний слот. После правильного ответа стопка начинает
//! опускаться и останавливается, когда нижний край головы касается `floor_y`.
//! Нижний край текстового слота отстоит от позиции на `slot_height`, у флага
//! к нему добавляется высота самого изображения.

use std::collections::VecDeque;

use crate::challenge::{ChallengeQueue, GameMode};
use crate::config::StackSettings;

/// Насколько выше начинается стопка флагов
const FLAG_STACK_RAISE: f64 = 130.0;

#[derive(Debug, Clone)]
pub struct StackAnimation {
    positions: VecDeque<f64>,
    /// Расстояние от позиции слота до его нижнего края
    extents: VecDeque<f64>,
    floor_y: f64,
    speed: f64,
    velocity: f64,
}

impl StackAnimation {
    #[must_use]
    pub fn new(len: usize, settings: &StackSettings, mode: GameMode) -> Self {
        let (slot, origin) = match mode {
            GameMode::Flag => (
                settings.flag_slot_height,
                settings.initial_y - FLAG_STACK_RAISE,
            ),
            _ => (settings.slot_height, settings.initial_y),
        };
        let positions = (0..len)
            .map(|i| origin + settings.slot_height - slot * i as f64)
            .collect();
        Self {
            positions,
            extents: std::iter::repeat_n(slot, len).collect(),
            floor_y: settings.floor_y,
            speed: settings.velocity,
            velocity: 0.0,
        }
    }

    /// Стопка под очередь раунда: слот флага опускается, пока нижний край
    /// картинки не коснётся пола
    #[must_use]
    pub fn for_queue(queue: &ChallengeQueue, settings: &StackSettings, mode: GameMode) -> Self {
        let mut stack = Self::new(queue.len(), settings, mode);
        for (extent, challenge) in stack.extents.iter_mut().zip(queue.iter()) {
            if let Some(flag) = challenge.flag() {
                *extent = settings.slot_height + f64::from(flag.height);
            }
        }
        stack
    }

    pub fn start_moving_down(&mut self) {
        self.velocity = self.speed;
    }

    /// Убирает слот головы
    pub fn pop_front(&mut self) {
        self.positions.pop_front();
        self.extents.pop_front();
    }

    /// Сдвигает стопку на `velocity × percentage` (доля кадра)
    pub fn tick(&mut self, percentage: f64) {
        if self.velocity == 0.0 {
            return;
        }
        let step = self.velocity * percentage;
        for y in &mut self.positions {
            *y += step;
        }
        if let (Some(&head), Some(&extent)) = (self.positions.front(), self.extents.front()) {
            let bottom = head + extent;
            if bottom >= self.floor_y {
                let overshoot = bottom - self.floor_y;
                for y in &mut self.positions {
                    *y -= overshoot;
                }
                self.velocity = 0.0;
            }
        }
    }

    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.velocity != 0.0
    }

    /// Позиции слотов от головы к хвосту
    pub fn positions(&self) -> impl Iterator<Item = f64> + '_ {
        self.positions.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::FlagRef;
    use crate::challenge::Challenge;
    use std::path::PathBuf;

    fn settings() -> StackSettings {
        StackSettings {
            initial_y: 550.0,
            slot_height: 50.0,
            flag_slot_height: 140.0,
            floor_y: 700.0,
            velocity: 20.0,
        }
    }

    #[test]
    fn slots_are_laid_out_upwards_from_the_head() {
        let stack = StackAnimation::new(3, &settings(), GameMode::Name);
        assert_eq!(stack.positions().collect::<Vec<_>>(), [600.0, 550.0, 500.0]);

        let flags = StackAnimation::new(2, &settings(), GameMode::Flag);
        assert_eq!(flags.positions().collect::<Vec<_>>(), [470.0, 330.0]);
    }

    #[test]
    fn still_stack_does_not_move() {
        let mut stack = StackAnimation::new(2, &settings(), GameMode::Name);
        stack.tick(1.0);
        assert_eq!(stack.positions().next(), Some(600.0));
        assert!(!stack.is_moving());
    }

    #[test]
    fn stack_falls_and_lands_on_the_floor() {
        let mut stack = StackAnimation::new(2, &settings(), GameMode::Name);
        stack.start_moving_down();
        stack.tick(1.0);
        assert_eq!(stack.positions().next(), Some(620.0));
        assert!(stack.is_moving());

        for _ in 0..10 {
            stack.tick(1.0);
        }
        // Нижний край головы ровно на полу, интервал между слотами сохранён
        assert_eq!(stack.positions().collect::<Vec<_>>(), [650.0, 600.0]);
        assert!(!stack.is_moving());
    }

    fn flag(region: &str, height: u32) -> Challenge {
        Challenge::Flag {
            region: region.into(),
            flag: FlagRef {
                path: PathBuf::from(format!("{region} Flag.png")),
                width: 120,
                height,
            },
        }
    }

    #[test]
    fn flag_stack_lands_by_the_image_height() {
        let queue = ChallengeQueue::from_ordered(vec![flag("A", 80), flag("B", 30)]);
        let mut stack = StackAnimation::for_queue(&queue, &settings(), GameMode::Flag);
        assert_eq!(stack.positions().collect::<Vec<_>>(), [470.0, 330.0]);

        stack.start_moving_down();
        for _ in 0..20 {
            stack.tick(1.0);
        }
        // Низ флага высотой 80 на полу 700: позиция + 50 + 80 = 700
        assert_eq!(stack.positions().collect::<Vec<_>>(), [570.0, 430.0]);
        assert!(!stack.is_moving());

        stack.pop_front();
        stack.start_moving_down();
        for _ in 0..20 {
            stack.tick(1.0);
        }
        assert_eq!(stack.positions().collect::<Vec<_>>(), [620.0]);
    }

    #[test]
    fn text_queue_keeps_uniform_slots() {
        let queue = ChallengeQueue::from_ordered(vec![Challenge::Name { region: "A".into() }]);
        let stack = StackAnimation::for_queue(&queue, &settings(), GameMode::Name);
        assert_eq!(stack.extents, [50.0]);
    }

    #[test]
    fn popping_the_head_leaves_the_rest() {
        let mut stack = StackAnimation::new(3, &settings(), GameMode::Name);
        stack.pop_front();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.positions().next(), Some(550.0));
    }
}
