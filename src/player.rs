//! Player body and defensive state consumed by the contact resolver.
//!
//! The body is a list of grid positions, head first.  Input and movement
//! cadence are owned by the game layer; the core only validates and commits a
//! step ([`crate::combat::try_step`]) and reads the head/neck capsule every tick.

use bevy::prelude::*;

/// Limited-use invulnerability consumable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseShift {
    pub charges: u32,
    pub cooldown_ms: f32,
}

impl PhaseShift {
    pub fn ready(&self) -> bool {
        self.charges > 0 && self.cooldown_ms <= 0.0
    }

    /// Spend a charge and start the cooldown.  Returns `false` when unavailable.
    pub fn try_consume(&mut self, cooldown_ms: f32) -> bool {
        if !self.ready() {
            return false;
        }
        self.charges -= 1;
        self.cooldown_ms = cooldown_ms;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Grid positions, `body[0]` is the head.
    pub body: Vec<Vec2>,
    pub level: u32,
    pub invulnerable_ms: f32,
    pub shields: u32,
    pub phase_shift: PhaseShift,
    pub tail_integrity: f32,
    /// Set once when integrity first reaches zero.
    pub tail_breached: bool,
    pub warning_cooldown_ms: f32,
}

impl PlayerState {
    pub fn new(body: Vec<Vec2>, shields: u32, phase_shift_charges: u32, tail_integrity: f32) -> Self {
        Self {
            body,
            level: 1,
            invulnerable_ms: 0.0,
            shields,
            phase_shift: PhaseShift {
                charges: phase_shift_charges,
                cooldown_ms: 0.0,
            },
            tail_integrity,
            tail_breached: false,
            warning_cooldown_ms: 0.0,
        }
    }

    /// A straight body of `len` segments with the head at `head`, trailing to the left.
    pub fn straight(head: Vec2, len: usize) -> Vec<Vec2> {
        (0..len.max(1))
            .map(|i| head - Vec2::new(i as f32, 0.0))
            .collect()
    }

    pub fn head(&self) -> Vec2 {
        self.body.first().copied().unwrap_or(Vec2::ZERO)
    }

    /// Second segment; a single-segment body uses the head for both ends.
    pub fn neck(&self) -> Vec2 {
        self.body.get(1).copied().unwrap_or_else(|| self.head())
    }

    pub fn tail(&self) -> Vec2 {
        self.body.last().copied().unwrap_or(Vec2::ZERO)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0
    }

    /// Extend (never shorten) the invulnerability window.
    pub fn grant_invulnerability(&mut self, ms: f32) {
        self.invulnerable_ms = self.invulnerable_ms.max(ms);
    }

    /// Commit a step: push the new head and drop the tail unless growing.
    pub fn step_to(&mut self, head: Vec2, grow: bool) {
        self.body.insert(0, head);
        if !grow && self.body.len() > 1 {
            self.body.pop();
        }
    }

    /// Lose tail integrity.  Returns `true` exactly once, on the breach.
    pub fn wear_tail(&mut self, amount: f32) -> bool {
        self.tail_integrity = (self.tail_integrity - amount).max(0.0);
        if self.tail_integrity <= 0.0 && !self.tail_breached {
            self.tail_breached = true;
            return true;
        }
        false
    }

    pub fn tick(&mut self, dt_ms: f32) {
        self.invulnerable_ms = (self.invulnerable_ms - dt_ms).max(0.0);
        self.warning_cooldown_ms = (self.warning_cooldown_ms - dt_ms).max(0.0);
        self.phase_shift.cooldown_ms = (self.phase_shift.cooldown_ms - dt_ms).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_body_and_keeps_length() {
        let mut p = PlayerState::new(PlayerState::straight(Vec2::new(5.0, 5.0), 3), 0, 0, 100.0);
        p.step_to(Vec2::new(6.0, 5.0), false);
        assert_eq!(p.body.len(), 3);
        assert_eq!(p.head(), Vec2::new(6.0, 5.0));
        assert_eq!(p.neck(), Vec2::new(5.0, 5.0));
        p.step_to(Vec2::new(7.0, 5.0), true);
        assert_eq!(p.body.len(), 4);
    }

    #[test]
    fn breach_reported_once() {
        let mut p = PlayerState::new(PlayerState::straight(Vec2::ZERO, 3), 0, 0, 10.0);
        assert!(!p.wear_tail(6.0));
        assert!(p.wear_tail(6.0));
        assert!(!p.wear_tail(6.0));
        assert_eq!(p.tail_integrity, 0.0);
    }

    #[test]
    fn phase_shift_respects_charges_and_cooldown() {
        let mut p = PlayerState::new(PlayerState::straight(Vec2::ZERO, 1), 0, 2, 10.0);
        assert!(p.phase_shift.try_consume(1000.0));
        assert!(!p.phase_shift.try_consume(1000.0), "cooling down");
        p.tick(1000.0);
        assert!(p.phase_shift.try_consume(1000.0));
        p.tick(1000.0);
        assert!(!p.phase_shift.try_consume(1000.0), "out of charges");
    }

    #[test]
    fn single_segment_neck_is_head() {
        let p = PlayerState::new(vec![Vec2::new(2.0, 3.0)], 0, 0, 10.0);
        assert_eq!(p.neck(), p.head());
    }
}
