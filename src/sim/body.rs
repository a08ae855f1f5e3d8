//! Trash bodies and the fixed-capacity store that owns them
//!
//! Every interruption spawns one body. Bodies stay in the store (in creation
//! order) until their cleaning animation finishes, then they are purged.

use glam::Vec2;
use rand::Rng;

use crate::category_for_duration;
use crate::consts::*;

/// Stable handle to a body; never reused within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A piece of trash
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision radius; inverse mass is 1/radius
    pub radius: f32,
    /// Visual scale only
    pub scale: f32,
    pub active: bool,
    /// Being swept away; frozen for physics
    pub cleaning: bool,
    /// Seconds of cleaning accumulated (0..CLEAN_DURATION_SECS)
    pub clean_progress: f32,
    /// 0..CATEGORY_COUNT, derived from `duration_secs`
    pub category: u8,
    /// Length of the interrupted session, also the length of its cleanup session
    pub duration_secs: u32,
    /// Per-body wall restitution multiplier
    pub bounce: f32,
    /// Per-body floor friction
    pub friction: f32,
}

impl Body {
    /// Participates in integration and collisions
    #[inline]
    pub fn is_simulated(&self) -> bool {
        self.active && !self.cleaning
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.radius
    }

    /// Cleaning progress in 0..=1 (for progress bars)
    pub fn clean_fraction(&self) -> f32 {
        (self.clean_progress / CLEAN_DURATION_SECS).clamp(0.0, 1.0)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.radius
    }
}

/// Uniform sample in [lo, hi], degrading to `lo` when the range is empty
fn sample(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Owns every live body, bounded by `capacity`
#[derive(Debug, Clone, PartialEq)]
pub struct BodyStore {
    bodies: Vec<Body>,
    capacity: usize,
    next_id: u32,
    /// Bit per category that has been cleaned at least once
    cleaned_categories: u8,
}

impl Default for BodyStore {
    fn default() -> Self {
        Self::new(MAX_BODIES)
    }
}

impl BodyStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            bodies: Vec::new(),
            capacity,
            next_id: 1,
            cleaned_categories: 0,
        }
    }

    /// Rebuild a store from snapshot parts, dropping anything past capacity
    pub fn from_parts(
        capacity: usize,
        mut bodies: Vec<Body>,
        next_id: u32,
        cleaned_categories: u8,
    ) -> Self {
        bodies.truncate(capacity);
        let min_next = bodies.iter().map(|b| b.id.0 + 1).max().unwrap_or(1);
        Self {
            bodies,
            capacity,
            next_id: next_id.max(min_next),
            cleaned_categories: cleaned_categories & Self::all_categories_mask(),
        }
    }

    fn all_categories_mask() -> u8 {
        (1u8 << CATEGORY_COUNT) - 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn cleaned_categories(&self) -> u8 {
        self.cleaned_categories
    }

    /// Bodies in storage (including retired ones not yet purged)
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bodies.len() >= self.capacity
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(|b| b.active)
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Spawn a body for an interrupted session of `duration_secs`
    ///
    /// Position, velocity, size, bounce and friction are jittered; the body
    /// starts somewhere in the middle band of the arena. Returns `None` when
    /// the store is full.
    pub fn spawn(&mut self, duration_secs: u32, bounds: Vec2, rng: &mut impl Rng) -> Option<BodyId> {
        if self.is_full() {
            log::debug!("Body store full ({}), spawn skipped", self.capacity);
            return None;
        }

        let scale = sample(rng, 0.5, 1.0);
        let radius = BASE_RADIUS * sample(rng, 0.5, 1.0);

        let margin = radius.max(50.0);
        let x = sample(rng, margin, bounds.x - margin);
        let y = sample(rng, bounds.y * 0.3, bounds.y * 0.7);
        let pos = Vec2::new(
            x.clamp(radius, (bounds.x - radius).max(radius)),
            y.clamp(radius, (bounds.y - radius).max(radius)),
        );
        let vel = Vec2::new(sample(rng, -18.0, 18.0), sample(rng, 30.0, 60.0));

        let id = BodyId(self.next_id);
        self.next_id += 1;

        self.bodies.push(Body {
            id,
            pos,
            vel,
            radius,
            scale,
            active: true,
            cleaning: false,
            clean_progress: 0.0,
            category: category_for_duration(duration_secs),
            duration_secs,
            bounce: BASE_BOUNCE * sample(rng, 0.8, 1.2),
            friction: BASE_FRICTION * sample(rng, 0.9, 1.1),
        });

        log::debug!(
            "Spawned body {} (category {}, radius {:.1})",
            id,
            category_for_duration(duration_secs),
            radius
        );
        Some(id)
    }

    /// Start sweeping a body away; unknown, retired or already-cleaning ids are ignored
    pub fn clean(&mut self, id: BodyId) -> bool {
        let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        if !body.active || body.cleaning {
            return false;
        }
        body.cleaning = true;
        body.clean_progress = 0.0;
        self.cleaned_categories |= 1 << body.category;
        true
    }

    /// True once every category has been produced and cleaned at least once
    pub fn all_categories_cleaned(&self) -> bool {
        self.cleaned_categories == Self::all_categories_mask()
    }

    /// Advance cleaning by real elapsed time, retiring bodies that finish
    pub fn advance_cleaning(&mut self, elapsed: f32) -> Vec<BodyId> {
        let mut retired = Vec::new();
        for body in self.bodies.iter_mut().filter(|b| b.active && b.cleaning) {
            body.clean_progress = (body.clean_progress + elapsed).min(CLEAN_DURATION_SECS);
            if body.clean_progress >= CLEAN_DURATION_SECS {
                body.active = false;
                retired.push(body.id);
            }
        }
        retired
    }

    /// Drop retired bodies, freeing their slots
    pub fn purge_retired(&mut self) {
        self.bodies.retain(|b| b.active);
    }

    /// Topmost (most recently spawned) body under `point` that can still be cleaned
    pub fn hit_test(&self, point: Vec2) -> Option<BodyId> {
        self.bodies
            .iter()
            .rev()
            .find(|b| b.is_simulated() && b.contains_point(point))
            .map(|b| b.id)
    }

    /// Remove every body; cleaned-category history survives
    pub fn reset(&mut self) {
        self.bodies.clear();
    }
}

#[cfg(test)]
pub(crate) fn test_body(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Body {
    Body {
        id: BodyId(id),
        pos,
        vel,
        radius,
        scale: 1.0,
        active: true,
        cleaning: false,
        clean_progress: 0.0,
        category: 0,
        duration_secs: 25 * 60,
        bounce: BASE_BOUNCE,
        friction: BASE_FRICTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arena() -> Vec2 {
        Vec2::new(DEFAULT_ARENA_WIDTH, DEFAULT_ARENA_HEIGHT)
    }

    #[test]
    fn test_spawn_within_bounds_and_jitter_ranges() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut store = BodyStore::new(MAX_BODIES);

        for _ in 0..MAX_BODIES {
            let id = store.spawn(45 * 60, arena(), &mut rng).unwrap();
            let body = store.get(id).unwrap();
            assert!(body.radius >= 15.0 && body.radius <= 30.0);
            assert!(body.pos.x >= body.radius && body.pos.x <= DEFAULT_ARENA_WIDTH - body.radius);
            assert!(body.pos.y >= DEFAULT_ARENA_HEIGHT * 0.3 && body.pos.y <= DEFAULT_ARENA_HEIGHT * 0.7);
            assert!(body.bounce >= BASE_BOUNCE * 0.8 - 1e-6 && body.bounce <= BASE_BOUNCE * 1.2 + 1e-6);
            assert_eq!(body.category, 3);
            assert_eq!(body.duration_secs, 45 * 60);
        }
    }

    #[test]
    fn test_spawn_when_full_is_noop() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut store = BodyStore::new(2);
        assert!(store.spawn(60, arena(), &mut rng).is_some());
        assert!(store.spawn(60, arena(), &mut rng).is_some());
        assert!(store.is_full());
        assert!(store.spawn(60, arena(), &mut rng).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut store = BodyStore::new(1);
        let first = store.spawn(60, arena(), &mut rng).unwrap();
        assert!(store.clean(first));
        store.advance_cleaning(CLEAN_DURATION_SECS);
        store.purge_retired();
        let second = store.spawn(60, arena(), &mut rng).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_cleaning_retires_after_five_seconds() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut store = BodyStore::default();
        let id = store.spawn(25 * 60, arena(), &mut rng).unwrap();
        assert!(store.clean(id));
        assert!(!store.clean(id), "second clean is ignored");

        assert!(store.advance_cleaning(2.5).is_empty());
        assert!((store.get(id).unwrap().clean_fraction() - 0.5).abs() < 1e-6);
        assert!(store.advance_cleaning(2.4).is_empty());
        assert_eq!(store.advance_cleaning(0.2), vec![id]);
        assert!(!store.get(id).unwrap().active);

        store.purge_retired();
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_clean_unknown_id_is_ignored() {
        let mut store = BodyStore::default();
        assert!(!store.clean(BodyId(42)));
        assert_eq!(store.cleaned_categories(), 0);
    }

    #[test]
    fn test_all_categories_cleaned() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut store = BodyStore::default();
        for minutes in [10, 25, 30, 45] {
            let id = store.spawn(minutes * 60, arena(), &mut rng).unwrap();
            assert!(!store.all_categories_cleaned());
            store.clean(id);
        }
        assert!(store.all_categories_cleaned());
    }

    #[test]
    fn test_hit_test_prefers_newest_and_skips_cleaning() {
        let mut store = BodyStore::from_parts(
            MAX_BODIES,
            vec![
                test_body(1, Vec2::new(100.0, 100.0), Vec2::ZERO, 30.0),
                test_body(2, Vec2::new(110.0, 100.0), Vec2::ZERO, 30.0),
            ],
            3,
            0,
        );
        assert_eq!(store.hit_test(Vec2::new(105.0, 100.0)), Some(BodyId(2)));
        store.clean(BodyId(2));
        assert_eq!(store.hit_test(Vec2::new(105.0, 100.0)), Some(BodyId(1)));
        assert_eq!(store.hit_test(Vec2::new(400.0, 400.0)), None);
    }

    #[test]
    fn test_from_parts_repairs_next_id() {
        let store = BodyStore::from_parts(
            MAX_BODIES,
            vec![test_body(9, Vec2::splat(100.0), Vec2::ZERO, 20.0)],
            1,
            0xFF,
        );
        assert_eq!(store.next_id(), 10);
        assert_eq!(store.cleaned_categories(), 0b1111);
    }
}
