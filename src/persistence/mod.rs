//! Save/load of the body store and achievement engine
//!
//! Features:
//! - Versioned binary snapshots, one field at a time
//! - Atomic replace (write tmp, then rename over the save)
//! - Consistency checks on load (list sizes, sentinel ids, value ranges)
//! - Recovery: any failure falls back to fresh state
//!
//! Snapshots are only taken at process boundaries, never mid-tick.

pub mod codec;

use std::fs;
use std::path::{Path, PathBuf};

use crate::achievements::{
    Achievement, AchievementEngine, Counters, Milestone, SessionMix, Setback, Streak,
};
use crate::consts::{CATEGORY_COUNT, MAX_BODIES};
use crate::error::{PersistError, PersistResult};
use crate::sim::{Body, BodyId, BodyStore};
use codec::{Decoder, Encoder};

const BODY_MAGIC: [u8; 4] = *b"TFBS";
const BODY_VERSION: u16 = 1;
const ACHIEVEMENT_MAGIC: [u8; 4] = *b"TFAS";
const ACHIEVEMENT_VERSION: u16 = 1;

/// Where the save files live
#[derive(Debug, Clone)]
pub struct SaveFiles {
    dir: PathBuf,
}

impl SaveFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn bodies(&self) -> PathBuf {
        self.dir.join("trash_state.dat")
    }

    pub fn achievements(&self) -> PathBuf {
        self.dir.join("achievements.dat")
    }

    pub fn settings(&self) -> PathBuf {
        self.dir.join("settings.json")
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `bytes` next to `path` and rename over it
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> PersistResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}

fn read_file(path: &Path) -> PersistResult<Vec<u8>> {
    fs::read(path).map_err(|e| io_error(path, e))
}

// --- Body store ---

pub fn encode_bodies(store: &BodyStore) -> Vec<u8> {
    let mut enc = Encoder::new(BODY_MAGIC, BODY_VERSION);
    enc.u32(store.next_id());
    enc.u8(store.cleaned_categories());
    enc.u32(store.len() as u32);
    for body in store.bodies() {
        enc.u32(body.id.0);
        enc.vec2(body.pos);
        enc.vec2(body.vel);
        enc.f32(body.radius);
        enc.f32(body.scale);
        enc.bool(body.active);
        enc.bool(body.cleaning);
        enc.f32(body.clean_progress);
        enc.u8(body.category);
        enc.u32(body.duration_secs);
        enc.f32(body.bounce);
        enc.f32(body.friction);
    }
    enc.finish()
}

fn decode_body(dec: &mut Decoder<'_>) -> PersistResult<Body> {
    let body = Body {
        id: BodyId(dec.u32()?),
        pos: dec.vec2()?,
        vel: dec.vec2()?,
        radius: dec.f32()?,
        scale: dec.f32()?,
        active: dec.bool()?,
        cleaning: dec.bool()?,
        clean_progress: dec.f32()?,
        category: dec.u8()?,
        duration_secs: dec.u32()?,
        bounce: dec.f32()?,
        friction: dec.f32()?,
    };

    if !(body.radius.is_finite() && body.radius > 0.0) {
        return Err(PersistError::Inconsistent(format!(
            "body {} has radius {}",
            body.id, body.radius
        )));
    }
    if body.category >= CATEGORY_COUNT {
        return Err(PersistError::Inconsistent(format!(
            "body {} has category {}",
            body.id, body.category
        )));
    }
    if !(body.pos.is_finite() && body.vel.is_finite()) {
        return Err(PersistError::Inconsistent(format!(
            "body {} has non-finite kinematics",
            body.id
        )));
    }
    Ok(body)
}

/// Strict decode; bodies beyond `capacity` are dropped
pub fn decode_bodies(bytes: &[u8], capacity: usize) -> PersistResult<BodyStore> {
    let mut dec = Decoder::new(bytes, BODY_MAGIC, BODY_VERSION)?;
    let next_id = dec.u32()?;
    let cleaned_categories = dec.u8()?;
    let count = dec.u32()? as usize;

    let mut bodies = Vec::with_capacity(count.min(capacity).min(MAX_BODIES));
    for _ in 0..count {
        bodies.push(decode_body(&mut dec)?);
    }
    dec.finish()?;

    if bodies.len() > capacity {
        log::warn!(
            "Snapshot holds {} bodies, keeping the first {}",
            bodies.len(),
            capacity
        );
    }
    Ok(BodyStore::from_parts(capacity, bodies, next_id, cleaned_categories))
}

pub fn save_bodies(path: &Path, store: &BodyStore) -> PersistResult<()> {
    write_atomic(path, &encode_bodies(store))?;
    log::info!("Saved {} bodies to {}", store.len(), path.display());
    Ok(())
}

pub fn load_bodies(path: &Path, capacity: usize) -> PersistResult<BodyStore> {
    decode_bodies(&read_file(path)?, capacity)
}

/// Load, or start empty if the file is missing or unusable
pub fn load_bodies_or_default(path: &Path, capacity: usize) -> BodyStore {
    match load_bodies(path, capacity) {
        Ok(store) => {
            log::info!("Loaded {} bodies from {}", store.len(), path.display());
            store
        }
        Err(e) => {
            log::warn!("Body snapshot unavailable ({e}), starting clean");
            BodyStore::new(capacity)
        }
    }
}

// --- Achievement engine ---

fn encode_entries(enc: &mut Encoder, entries: &[Achievement]) {
    enc.u16(entries.len() as u16);
    for entry in entries {
        enc.u16(entry.id);
        enc.bool(entry.unlocked);
        enc.opt_i64(entry.unlocked_at);
    }
}

pub fn encode_achievements(engine: &AchievementEngine) -> Vec<u8> {
    let mut enc = Encoder::new(ACHIEVEMENT_MAGIC, ACHIEVEMENT_VERSION);
    encode_entries(&mut enc, &engine.milestones);
    encode_entries(&mut enc, &engine.setbacks);

    let c = &engine.counters;
    enc.u32(c.total_sessions);
    enc.u32(c.cleaned_bodies);
    enc.u32(c.generated_bodies);
    enc.u32(c.interruptions);
    enc.u32(c.long_sessions);

    let s = &engine.streak;
    enc.u32(s.days);
    enc.opt_date(s.last_completion_day);
    enc.u32(s.consecutive_sessions);
    enc.u32(s.daily_completions);
    enc.opt_date(s.daily_day);

    let m = &engine.mix;
    enc.u32(m.standard);
    enc.u32(m.long);
    enc.u32(m.custom);

    enc.finish()
}

/// Restore unlock state into a freshly built list
fn decode_entries(dec: &mut Decoder<'_>, entries: &mut [Achievement], list: &str) -> PersistResult<()> {
    let count = dec.u16()? as usize;
    if count != entries.len() {
        return Err(PersistError::Inconsistent(format!(
            "{list}: {count} entries stored, {} expected",
            entries.len()
        )));
    }
    for (index, entry) in entries.iter_mut().enumerate() {
        let id = dec.u16()?;
        if id as usize != index {
            return Err(PersistError::Inconsistent(format!(
                "{list}: entry {index} stored with id {id}"
            )));
        }
        entry.unlocked = dec.bool()?;
        entry.unlocked_at = dec.opt_i64()?;
    }
    Ok(())
}

pub fn decode_achievements(bytes: &[u8]) -> PersistResult<AchievementEngine> {
    let mut dec = Decoder::new(bytes, ACHIEVEMENT_MAGIC, ACHIEVEMENT_VERSION)?;
    let mut engine = AchievementEngine::new();
    debug_assert_eq!(engine.milestones.len(), Milestone::ALL.len());
    debug_assert_eq!(engine.setbacks.len(), Setback::ALL.len());

    decode_entries(&mut dec, &mut engine.milestones, "milestones")?;
    decode_entries(&mut dec, &mut engine.setbacks, "setbacks")?;

    engine.counters = Counters {
        total_sessions: dec.u32()?,
        cleaned_bodies: dec.u32()?,
        generated_bodies: dec.u32()?,
        interruptions: dec.u32()?,
        long_sessions: dec.u32()?,
    };
    engine.streak = Streak {
        days: dec.u32()?,
        last_completion_day: dec.opt_date()?,
        consecutive_sessions: dec.u32()?,
        daily_completions: dec.u32()?,
        daily_day: dec.opt_date()?,
    };
    engine.mix = SessionMix {
        standard: dec.u32()?,
        long: dec.u32()?,
        custom: dec.u32()?,
    };
    dec.finish()?;
    Ok(engine)
}

pub fn save_achievements(path: &Path, engine: &AchievementEngine) -> PersistResult<()> {
    write_atomic(path, &encode_achievements(engine))?;
    log::info!("Saved achievements to {}", path.display());
    Ok(())
}

pub fn load_achievements(path: &Path) -> PersistResult<AchievementEngine> {
    decode_achievements(&read_file(path)?)
}

/// Load, or reinitialize if the file is missing, stale or foreign
pub fn load_achievements_or_default(path: &Path) -> AchievementEngine {
    match load_achievements(path) {
        Ok(engine) => {
            log::info!("Loaded achievements from {}", path.display());
            engine
        }
        Err(e) => {
            log::warn!("Achievement snapshot unavailable ({e}), reinitializing");
            AchievementEngine::new()
        }
    }
}
