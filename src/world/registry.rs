//! Resolved, validated game data.
//!
//! [`GameData`] is built once from the RON sources. Every cross-reference is
//! turned into a typed id and every clip, band, and encounter is checked, so
//! nothing downstream has to handle a missing definition.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bevy::prelude::*;

use super::data::*;
use super::error::DataLoadError;
use crate::combat::{AttackDescriptor, PickupKind};
use crate::core::SimConfig;
use crate::spatial::{BoxSpec, DepthBand, Position};
use crate::state::ActionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeroId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttackId(pub usize);

/// Which definition an actor was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Hero(HeroId),
    Enemy(EnemyId),
    Mount(MountId),
}

/// Links an entity to its content definition.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub kind: ActorKind,
}

impl Actor {
    /// Definition whose clip drives `state`. A rider's mounted states come
    /// from the mount.
    pub fn clip_source(&self, state: ActionState, riding: Option<MountId>) -> ActorKind {
        match (state, riding) {
            (ActionState::Mount | ActionState::MountAttack, Some(mount)) => ActorKind::Mount(mount),
            _ => self.kind,
        }
    }
}

const HERO_CLIPS: &[ActionState] = &[
    ActionState::Attack1,
    ActionState::Attack2,
    ActionState::Attack3,
    ActionState::RunAttack,
    ActionState::JumpAttack,
    ActionState::Throw,
    ActionState::Magic,
    ActionState::Hit,
    ActionState::Knockdown,
    ActionState::GetUp,
    ActionState::Death,
];

const ENEMY_CLIPS: &[ActionState] = &[
    ActionState::Attack1,
    ActionState::Hit,
    ActionState::Knockdown,
    ActionState::GetUp,
    ActionState::Death,
];

const MOUNT_CLIPS: &[ActionState] = &[ActionState::MountAttack, ActionState::Hit, ActionState::Death];

#[derive(Debug, Clone)]
pub struct Clip {
    pub frames: u32,
    pub frame_ticks: u32,
    pub hitbox: Option<ClipHitbox>,
}

impl Clip {
    pub fn duration(&self) -> u64 {
        self.frames as u64 * self.frame_ticks as u64
    }

    /// Hitbox live at `elapsed` ticks into the clip.
    pub fn active_hitbox(&self, elapsed: u64) -> Option<&ClipHitbox> {
        let frame = elapsed / self.frame_ticks.max(1) as u64;
        self.hitbox.as_ref().filter(|hitbox| {
            frame >= hitbox.first_frame as u64 && frame <= hitbox.last_frame as u64
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClipHitbox {
    pub first_frame: u32,
    pub last_frame: u32,
    pub area: BoxSpec,
    pub attack: AttackId,
}

#[derive(Debug, Clone, Default)]
pub struct ClipSet(BTreeMap<ActionState, Clip>);

impl ClipSet {
    pub fn get(&self, state: ActionState) -> Option<&Clip> {
        self.0.get(&state)
    }

    pub fn duration(&self, state: ActionState) -> Option<u64> {
        self.get(state).map(Clip::duration)
    }
}

#[derive(Debug, Clone)]
pub struct AttackData {
    pub descriptor: AttackDescriptor,
    pub projectile: Option<ProjectileDef>,
}

#[derive(Debug, Clone)]
pub struct MagicTierData {
    pub area: BoxSpec,
    pub depth_reach: f32,
    pub attack: AttackId,
}

#[derive(Debug, Clone)]
pub struct HeroData {
    pub name: String,
    pub max_health: i32,
    pub hurtbox: BoxSpec,
    pub clips: ClipSet,
    pub magic: [MagicTierData; 3],
    pub throw: ThrowDef,
}

#[derive(Debug, Clone)]
pub struct EnemyData {
    pub name: String,
    pub max_health: f32,
    pub move_speed: f32,
    pub approach_range: f32,
    pub attack_range: f32,
    pub attack_cooldown_ticks: u64,
    pub score: u64,
    pub hurtbox: BoxSpec,
    pub clips: ClipSet,
    pub boss: bool,
    pub passive: bool,
    pub mount: Option<MountId>,
    pub drops: Option<PickupKind>,
}

#[derive(Debug, Clone)]
pub struct MountData {
    pub name: String,
    pub max_health: i32,
    pub speed: f32,
    pub hurtbox: BoxSpec,
    pub clips: ClipSet,
}

/// One queued enemy of an encounter zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnDescriptor {
    pub enemy: EnemyId,
    pub side: SpawnSide,
    pub depth: f32,
}

#[derive(Debug, Clone)]
pub struct EncounterData {
    pub trigger_x: f32,
    pub spawns: Vec<SpawnDescriptor>,
}

#[derive(Debug, Clone)]
pub struct LevelData {
    pub name: String,
    pub width: f32,
    pub depth_band: DepthBand,
    pub player_starts: Vec<Position>,
    pub mounts: Vec<(MountId, Position)>,
    pub pickups: Vec<(PickupKind, Position)>,
    pub encounters: Vec<EncounterData>,
    pub ai_tuning: AiTuning,
}

impl LevelData {
    /// Start position for a slot; extra slots reuse the last entry.
    pub fn player_start(&self, slot: usize) -> Position {
        self.player_starts
            .get(slot)
            .or(self.player_starts.last())
            .copied()
            .unwrap_or_default()
    }
}

/// All content and levels, resolved and validated.
#[derive(Resource, Debug, Clone)]
pub struct GameData {
    attacks: Vec<AttackData>,
    heroes: Vec<HeroData>,
    enemies: Vec<EnemyData>,
    mounts: Vec<MountData>,
    levels: Vec<LevelData>,
    hero_names: BTreeMap<String, HeroId>,
    enemy_names: BTreeMap<String, EnemyId>,
    mount_names: BTreeMap<String, MountId>,
    thrown_body: AttackId,
    camp_pixie: Option<EnemyId>,
}

impl GameData {
    /// Content and levels shipped with the crate.
    pub fn builtin() -> Result<Self, DataLoadError> {
        Self::from_sources(
            include_str!("../../assets/data/content.ron"),
            &[
                (
                    "levels/01_wildwood.ron",
                    include_str!("../../assets/data/levels/01_wildwood.ron"),
                ),
                (
                    "levels/02_turtle_village.ron",
                    include_str!("../../assets/data/levels/02_turtle_village.ron"),
                ),
            ],
        )
    }

    /// Loads `content.ron` and every `levels/*.ron` under `dir`, in file-name order.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, DataLoadError> {
        let dir = dir.as_ref();
        let content = read_source(&dir.join("content.ron"))?;

        let levels_dir = dir.join("levels");
        if !levels_dir.exists() {
            return Err(DataLoadError::FileNotFound(levels_dir.display().to_string()));
        }
        let entries = fs::read_dir(&levels_dir).map_err(|e| DataLoadError::ReadError {
            path: levels_dir.display().to_string(),
            details: e.to_string(),
        })?;
        let mut paths: Vec<_> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in &paths {
            sources.push((path.display().to_string(), read_source(path)?));
        }
        let borrowed: Vec<(&str, &str)> = sources
            .iter()
            .map(|(path, source)| (path.as_str(), source.as_str()))
            .collect();

        let data = Self::from_sources(&content, &borrowed)?;
        info!(
            "Loaded {} heroes, {} enemies, {} mounts, {} levels from {:?}",
            data.heroes.len(),
            data.enemies.len(),
            data.mounts.len(),
            data.levels.len(),
            dir
        );
        Ok(data)
    }

    /// Parses and validates in-memory sources. `levels` pairs a display path
    /// with the file contents.
    pub fn from_sources(content: &str, levels: &[(&str, &str)]) -> Result<Self, DataLoadError> {
        let content: ContentFile = ron::from_str(content).map_err(|e| DataLoadError::ParseError {
            path: "content.ron".to_string(),
            details: e.to_string(),
        })?;
        let levels = levels
            .iter()
            .map(|(path, source)| {
                ron::from_str::<LevelFile>(source).map_err(|e| DataLoadError::ParseError {
                    path: path.to_string(),
                    details: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::resolve(content, levels)
    }

    fn resolve(content: ContentFile, level_files: Vec<LevelFile>) -> Result<Self, DataLoadError> {
        let mut attack_names = BTreeMap::new();
        let mut attacks = Vec::with_capacity(content.attacks.len());
        for (name, def) in &content.attacks {
            if def.damage < 0 {
                return Err(DataLoadError::Invalid {
                    owner: format!("attack '{name}'"),
                    details: "negative damage".to_string(),
                });
            }
            attack_names.insert(name.clone(), AttackId(attacks.len()));
            attacks.push(AttackData {
                descriptor: AttackDescriptor {
                    damage: def.damage,
                    knockback: Vec2::new(def.knockback.0, def.knockback.1),
                    hit_stun_ticks: def.hit_stun_ticks,
                    knockdown: def.knockdown,
                },
                projectile: def.projectile,
            });
        }

        let mut mount_names = BTreeMap::new();
        let mut mounts = Vec::with_capacity(content.mounts.len());
        for def in &content.mounts {
            insert_unique(&mut mount_names, "mount", &def.name, MountId(mounts.len()))?;
            check_box(&def.name, &def.hurtbox)?;
            mounts.push(MountData {
                name: def.name.clone(),
                max_health: positive_health(&def.name, def.max_health)?,
                speed: def.speed,
                hurtbox: def.hurtbox,
                clips: resolve_clips(&def.name, &def.clips, MOUNT_CLIPS, &attack_names)?,
            });
        }

        let mut hero_names = BTreeMap::new();
        let mut heroes = Vec::with_capacity(content.heroes.len());
        for def in &content.heroes {
            insert_unique(&mut hero_names, "hero", &def.name, HeroId(heroes.len()))?;
            check_box(&def.name, &def.hurtbox)?;
            let magic = resolve_magic(&def.name, &def.magic, &attack_names)?;
            heroes.push(HeroData {
                name: def.name.clone(),
                max_health: positive_health(&def.name, def.max_health)?,
                hurtbox: def.hurtbox,
                clips: resolve_clips(&def.name, &def.clips, HERO_CLIPS, &attack_names)?,
                magic,
                throw: def.throw,
            });
        }
        if heroes.is_empty() {
            return Err(DataLoadError::Invalid {
                owner: "content.ron".to_string(),
                details: "no heroes defined".to_string(),
            });
        }

        let mut enemy_names = BTreeMap::new();
        let mut enemies = Vec::with_capacity(content.enemies.len());
        for def in &content.enemies {
            insert_unique(&mut enemy_names, "enemy", &def.name, EnemyId(enemies.len()))?;
            check_box(&def.name, &def.hurtbox)?;
            if def.max_health <= 0.0 {
                return Err(DataLoadError::Invalid {
                    owner: def.name.clone(),
                    details: "max_health must be positive".to_string(),
                });
            }
            let mount = def
                .mount
                .as_deref()
                .map(|name| lookup(&mount_names, &def.name, "mount", name))
                .transpose()?;
            enemies.push(EnemyData {
                name: def.name.clone(),
                max_health: def.max_health,
                move_speed: def.move_speed,
                approach_range: def.approach_range,
                attack_range: def.attack_range,
                attack_cooldown_ticks: def.attack_cooldown_ticks,
                score: def.score,
                hurtbox: def.hurtbox,
                clips: resolve_clips(&def.name, &def.clips, ENEMY_CLIPS, &attack_names)?,
                boss: def.boss,
                passive: def.passive,
                mount,
                drops: def.drops,
            });
        }

        let thrown_body = lookup(&attack_names, "content.ron", "attack", &content.thrown_body_attack)?;
        let camp_pixie = content
            .camp_pixie
            .as_deref()
            .map(|name| lookup(&enemy_names, "content.ron", "enemy", name))
            .transpose()?;

        let levels = level_files
            .iter()
            .map(|level| resolve_level(level, &enemy_names, &mount_names))
            .collect::<Result<Vec<_>, _>>()?;
        if levels.is_empty() {
            return Err(DataLoadError::Invalid {
                owner: "levels".to_string(),
                details: "no levels defined".to_string(),
            });
        }

        Ok(Self {
            attacks,
            heroes,
            enemies,
            mounts,
            levels,
            hero_names,
            enemy_names,
            mount_names,
            thrown_body,
            camp_pixie,
        })
    }

    pub fn attack(&self, id: AttackId) -> &AttackData {
        &self.attacks[id.0]
    }

    pub fn hero(&self, id: HeroId) -> &HeroData {
        &self.heroes[id.0]
    }

    pub fn hero_id(&self, name: &str) -> Option<HeroId> {
        self.hero_names.get(name).copied()
    }

    pub fn hero_count(&self) -> usize {
        self.heroes.len()
    }

    pub fn enemy(&self, id: EnemyId) -> &EnemyData {
        &self.enemies[id.0]
    }

    pub fn enemy_id(&self, name: &str) -> Option<EnemyId> {
        self.enemy_names.get(name).copied()
    }

    pub fn mount(&self, id: MountId) -> &MountData {
        &self.mounts[id.0]
    }

    pub fn mount_id(&self, name: &str) -> Option<MountId> {
        self.mount_names.get(name).copied()
    }

    pub fn level(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn thrown_body_attack(&self) -> AttackId {
        self.thrown_body
    }

    pub fn camp_pixie(&self) -> Option<EnemyId> {
        self.camp_pixie
    }

    pub fn clips(&self, kind: ActorKind) -> &ClipSet {
        match kind {
            ActorKind::Hero(id) => &self.hero(id).clips,
            ActorKind::Enemy(id) => &self.enemy(id).clips,
            ActorKind::Mount(id) => &self.mount(id).clips,
        }
    }

    pub fn clip_duration(&self, kind: ActorKind, state: ActionState) -> Option<u64> {
        self.clips(kind).duration(state)
    }

    pub fn hurtbox(&self, kind: ActorKind) -> BoxSpec {
        match kind {
            ActorKind::Hero(id) => self.hero(id).hurtbox,
            ActorKind::Enemy(id) => self.enemy(id).hurtbox,
            ActorKind::Mount(id) => self.mount(id).hurtbox,
        }
    }
}

/// Reads and parses a config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SimConfig, DataLoadError> {
    let path = path.as_ref();
    let source = read_source(path)?;
    ron::from_str(&source).map_err(|e| DataLoadError::ParseError {
        path: path.display().to_string(),
        details: e.to_string(),
    })
}

/// The config shipped with the crate.
pub fn builtin_config() -> Result<SimConfig, DataLoadError> {
    ron::from_str(include_str!("../../assets/data/config.ron")).map_err(|e| DataLoadError::ParseError {
        path: "config.ron".to_string(),
        details: e.to_string(),
    })
}

fn read_source(path: &Path) -> Result<String, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound(path.display().to_string()));
    }
    fs::read_to_string(path).map_err(|e| DataLoadError::ReadError {
        path: path.display().to_string(),
        details: e.to_string(),
    })
}

fn lookup<T: Copy>(
    names: &BTreeMap<String, T>,
    owner: &str,
    kind: &'static str,
    name: &str,
) -> Result<T, DataLoadError> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| DataLoadError::UnknownReference {
            owner: owner.to_string(),
            kind,
            name: name.to_string(),
        })
}

fn insert_unique<T>(
    names: &mut BTreeMap<String, T>,
    kind: &'static str,
    name: &str,
    id: T,
) -> Result<(), DataLoadError> {
    if names.contains_key(name) {
        return Err(DataLoadError::Duplicate {
            kind,
            name: name.to_string(),
        });
    }
    names.insert(name.to_string(), id);
    Ok(())
}

fn positive_health(owner: &str, max_health: i32) -> Result<i32, DataLoadError> {
    if max_health <= 0 {
        return Err(DataLoadError::Invalid {
            owner: owner.to_string(),
            details: "max_health must be positive".to_string(),
        });
    }
    Ok(max_health)
}

fn check_box(owner: &str, spec: &BoxSpec) -> Result<(), DataLoadError> {
    if !spec.is_valid() {
        return Err(DataLoadError::Invalid {
            owner: owner.to_string(),
            details: format!("box {spec:?} has no area"),
        });
    }
    Ok(())
}

fn resolve_clips(
    owner: &str,
    defs: &BTreeMap<ActionState, ClipDef>,
    required: &[ActionState],
    attacks: &BTreeMap<String, AttackId>,
) -> Result<ClipSet, DataLoadError> {
    for state in required {
        if !defs.contains_key(state) {
            return Err(DataLoadError::MissingClip {
                owner: owner.to_string(),
                state: format!("{state:?}"),
            });
        }
    }

    let mut clips = BTreeMap::new();
    for (state, def) in defs {
        let invalid = |details: String| DataLoadError::InvalidClip {
            owner: owner.to_string(),
            state: format!("{state:?}"),
            details,
        };
        if def.frames == 0 || def.frame_ticks == 0 {
            return Err(invalid("clip has no duration".to_string()));
        }
        let hitbox = match &def.hitbox {
            Some(hitbox) => {
                let (first, last) = hitbox.frames;
                if first > last || last >= def.frames {
                    return Err(invalid(format!(
                        "hitbox frames {first}..={last} outside {} frames",
                        def.frames
                    )));
                }
                if !hitbox.area.is_valid() {
                    return Err(invalid("hitbox has no area".to_string()));
                }
                Some(ClipHitbox {
                    first_frame: first,
                    last_frame: last,
                    area: hitbox.area,
                    attack: lookup(attacks, owner, "attack", &hitbox.attack)?,
                })
            }
            None => None,
        };
        clips.insert(
            *state,
            Clip {
                frames: def.frames,
                frame_ticks: def.frame_ticks,
                hitbox,
            },
        );
    }
    Ok(ClipSet(clips))
}

fn resolve_magic(
    owner: &str,
    defs: &[MagicTierDef],
    attacks: &BTreeMap<String, AttackId>,
) -> Result<[MagicTierData; 3], DataLoadError> {
    let resolve = |def: &MagicTierDef| -> Result<MagicTierData, DataLoadError> {
        check_box(owner, &def.area)?;
        Ok(MagicTierData {
            area: def.area,
            depth_reach: def.depth_reach,
            attack: lookup(attacks, owner, "attack", &def.attack)?,
        })
    };
    match defs {
        [one, two, three] => Ok([resolve(one)?, resolve(two)?, resolve(three)?]),
        _ => Err(DataLoadError::Invalid {
            owner: owner.to_string(),
            details: format!("expected 3 magic tiers, found {}", defs.len()),
        }),
    }
}

fn resolve_level(
    level: &LevelFile,
    enemies: &BTreeMap<String, EnemyId>,
    mounts: &BTreeMap<String, MountId>,
) -> Result<LevelData, DataLoadError> {
    if !level.depth_band.is_valid() {
        return Err(DataLoadError::InvalidDepthBand {
            level: level.name.clone(),
            min: level.depth_band.min,
            max: level.depth_band.max,
        });
    }
    if level.width <= 0.0 || level.player_starts.is_empty() {
        return Err(DataLoadError::Invalid {
            owner: format!("level '{}'", level.name),
            details: "needs a positive width and at least one player start".to_string(),
        });
    }

    let owner = format!("level '{}'", level.name);
    let placed_mounts = level
        .mounts
        .iter()
        .map(|placement| {
            lookup(mounts, &owner, "mount", &placement.mount)
                .map(|id| (id, Position::new(placement.x, placement.depth)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut encounters = Vec::with_capacity(level.encounters.len());
    for (index, encounter) in level.encounters.iter().enumerate() {
        if encounter.spawns.is_empty() {
            return Err(DataLoadError::EmptyEncounter {
                level: level.name.clone(),
                index,
            });
        }
        let spawns = encounter
            .spawns
            .iter()
            .map(|spawn| {
                lookup(enemies, &owner, "enemy", &spawn.enemy).map(|enemy| SpawnDescriptor {
                    enemy,
                    side: spawn.side,
                    depth: level.depth_band.clamp(spawn.depth),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        encounters.push(EncounterData {
            trigger_x: encounter.trigger_x,
            spawns,
        });
    }

    Ok(LevelData {
        name: level.name.clone(),
        width: level.width,
        depth_band: level.depth_band,
        player_starts: level
            .player_starts
            .iter()
            .map(|&(x, depth)| Position::new(x, level.depth_band.clamp(depth)))
            .collect(),
        mounts: placed_mounts,
        pickups: level
            .pickups
            .iter()
            .map(|pickup| (pickup.kind, Position::new(pickup.x, level.depth_band.clamp(pickup.depth))))
            .collect(),
        encounters,
        ai_tuning: level.ai_tuning,
    })
}
