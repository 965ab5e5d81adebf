//! Whole-session scenarios driven through the headless app.

use bevy::prelude::*;

use blades_sim::combat::{
    Allegiance, ComboStep, ComboTracker, Health, Invincible, LastAttacker, MagicBlast, MagicPool,
    MagicTier, Pickup, PickupKind,
};
use blades_sim::core::*;
use blades_sim::encounter::EncounterDirector;
use blades_sim::enemies::{AiController, Enemy, EnemyBundle, ScaledStats, ZoneMember};
use blades_sim::mount::{MountBindings, MountBundle, Mounted, RiderSide};
use blades_sim::player::{InputFrame, Player, PlayerInputs, PlayerRoster, PlayerSlot, SlotStatus};
use blades_sim::snapshot::SimSnapshot;
use blades_sim::spatial::{Facing, Position, Velocity};
use blades_sim::state::{ActionState, TimedState};
use blades_sim::world::{GameData, HeroId};
use blades_sim::{headless_app_with, step, SimulationPlugin};

const CONTENT: &str = include_str!("../assets/data/content.ron");

fn level(starts: &str, width: f32, encounters: &str) -> String {
    format!(
        r#"(
    name: "Proving Ground",
    width: {width:.1},
    depth_band: (min: 160.0, max: 260.0),
    player_starts: [{starts}],
    encounters: [{encounters}],
)"#
    )
}

fn grunts(trigger_x: f32, count: usize) -> String {
    let spawns: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"(enemy: "bogwort_grunt", side: Right, depth: {:.1})"#,
                170.0 + (i % 8) as f32 * 10.0
            )
        })
        .collect();
    format!("(trigger_x: {trigger_x:.1}, spawns: [{}])", spawns.join(", "))
}

fn app_with(levels: &[&str], config: SimConfig, heroes: Vec<HeroId>) -> App {
    let named: Vec<(String, &str)> = levels
        .iter()
        .enumerate()
        .map(|(i, source)| (format!("{i:02}.ron"), *source))
        .collect();
    let sources: Vec<(&str, &str)> = named.iter().map(|(name, src)| (name.as_str(), *src)).collect();
    let data = GameData::from_sources(CONTENT, &sources).unwrap();
    headless_app_with(
        SimulationPlugin::new(data, config)
            .with_heroes(heroes)
            .with_seed(7),
    )
}

fn player(app: &mut App, slot: u8) -> Entity {
    let mut query = app.world_mut().query::<(Entity, &Player)>();
    query
        .iter(app.world())
        .find(|(_, player)| player.slot == PlayerSlot(slot))
        .map(|(entity, _)| entity)
        .unwrap()
}

fn spawn_enemy_at(app: &mut App, name: &str, x: f32, depth: f32, facing: Facing) -> Entity {
    let data = app.world().resource::<GameData>().clone();
    let kind = data.enemy_id(name).unwrap();
    let def = data.enemy(kind);
    let (order, tick) = {
        let mut ctx = app.world_mut().resource_mut::<SimContext>();
        (ctx.next_spawn_order(), ctx.tick)
    };
    app.world_mut()
        .spawn(
            EnemyBundle::new(
                def,
                kind,
                ScaledStats::new(def, 1.0, None),
                order,
                Position::new(x, depth),
                60,
                tick,
            )
            .facing(facing),
        )
        .id()
}

fn press(app: &mut App, slot: u8, frame: InputFrame) {
    app.world_mut()
        .resource_mut::<PlayerInputs>()
        .set(PlayerSlot(slot), frame);
}

fn events<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

fn live_zone_members(app: &mut App) -> Vec<Entity> {
    let mut query = app
        .world_mut()
        .query_filtered::<(Entity, &Health), With<ZoneMember>>();
    query
        .iter(app.world())
        .filter(|(_, health)| !health.is_dead())
        .map(|(entity, _)| entity)
        .collect()
}

/// Takes the enemy's AI away so it stays where it is put.
fn hold_still(app: &mut App, entity: Entity) {
    app.world_mut().entity_mut(entity).remove::<AiController>();
}

fn put(app: &mut App, entity: Entity, x: f32) {
    let world = app.world_mut();
    world.get_mut::<Position>(entity).unwrap().x = x;
    *world.get_mut::<Velocity>(entity).unwrap() = Velocity::default();
}

fn action(app: &App, entity: Entity) -> ActionState {
    app.world()
        .get::<TimedState<ActionState>>(entity)
        .unwrap()
        .current()
}

fn tick(app: &App) -> u64 {
    app.world().resource::<SimContext>().tick
}

/// Puts `target` at `x`, presses attack, and steps until the hero connects.
fn land_strike(app: &mut App, hero: Entity, target: Entity, x: f32) -> HitEvent {
    put(app, target, x);
    press(app, 0, InputFrame::default().with_attack());
    for _ in 0..10 {
        step(app);
        let hit = events::<HitEvent>(app)
            .into_iter()
            .find(|hit| hit.attacker == hero && hit.defender == target);
        if let Some(hit) = hit {
            return hit;
        }
    }
    panic!("attack never connected");
}

fn wait_until_free(app: &mut App, entity: Entity) {
    for _ in 0..40 {
        if action(app, entity).is_free() {
            return;
        }
        step(app);
    }
    panic!("{entity:?} stayed busy");
}

fn kill(app: &mut App, entity: Entity) {
    if let Some(mut health) = app.world_mut().get_mut::<Health>(entity) {
        health.take_damage(1000);
    }
}

#[test]
fn test_first_tick_loads_level_and_publishes_hud() {
    let source = level("(60.0, 200.0)", 2000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);

    let ctx = app.world().resource::<SimContext>();
    assert_eq!(ctx.tick, 1);
    assert_eq!(ctx.level_index, 1);
    assert!(ctx.is_playing());

    let snapshot = app.world().resource::<SimSnapshot>();
    assert_eq!(snapshot.tick, 1);
    let hud = snapshot.hud(PlayerSlot(0)).unwrap();
    assert_eq!(hud.health, 8);
    assert_eq!(hud.lives, 3);
    assert_eq!(hud.status, SlotStatus::Active);
    let mut indices: Vec<usize> = snapshot.entities.iter().map(|e| e.draw_index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..snapshot.entities.len()).collect::<Vec<_>>());
}

#[test]
fn test_grunt_club_hits_and_pushes_player() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    spawn_enemy_at(&mut app, "bogwort_grunt", 80.0, 200.0, Facing::Left);

    let mut struck = false;
    for _ in 0..90 {
        step(&mut app);
        let hits = events::<HitEvent>(&app);
        if hits.iter().any(|hit| hit.defender == hero) {
            let hit = hits.iter().find(|hit| hit.defender == hero).unwrap();
            assert_eq!(hit.damage, 3);
            assert_eq!(hit.kind, HitKind::Strike);
            struck = true;
            break;
        }
    }
    assert!(struck);

    let world = app.world();
    assert_eq!(world.get::<Health>(hero).unwrap().current(), 5);
    assert_eq!(
        world.get::<TimedState<ActionState>>(hero).unwrap().current(),
        ActionState::Hit
    );
    assert!(world.get::<Position>(hero).unwrap().x < 60.0);
}

#[test]
fn test_destroyed_mount_drops_rider_unharmed() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);

    let data = app.world().resource::<GameData>().clone();
    let kind = data.mount_id("snarlfang").unwrap();
    let (order, tick) = {
        let mut ctx = app.world_mut().resource_mut::<SimContext>();
        (ctx.next_spawn_order(), ctx.tick)
    };
    let beast = app
        .world_mut()
        .spawn(MountBundle::new(
            &data,
            kind,
            order,
            Position::new(70.0, 200.0),
            Allegiance::Neutral,
            tick,
        ))
        .id();

    press(&mut app, 0, InputFrame::default().with_mount());
    step(&mut app);
    assert!(app.world().get::<Mounted>(hero).is_some());
    assert_eq!(
        app.world().get::<TimedState<ActionState>>(hero).unwrap().current(),
        ActionState::Mount
    );

    kill(&mut app, beast);
    step(&mut app);

    let now = app.world().resource::<SimContext>().tick;
    assert!(app.world().resource::<MountBindings>().is_empty());
    assert!(app.world().get::<Mounted>(hero).is_none());
    assert!(app.world().get::<Invincible>(hero).unwrap().until > now);
    assert_eq!(app.world().get::<Health>(hero).unwrap().current(), 8);
    assert!(events::<MountEvent>(&app)
        .iter()
        .any(|event| event.rider == hero && event.change == MountChange::Destroyed));
}

#[test]
fn test_zone_never_exceeds_enemy_cap() {
    let source = level("(60.0, 200.0)", 3000.0, &grunts(400.0, 12));
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);

    assert_eq!(live_zone_members(&mut app).len(), 6);
    let zone = app
        .world()
        .resource::<EncounterDirector>()
        .active
        .clone()
        .unwrap();
    assert_eq!(zone.cap(), 6);
    assert_eq!(zone.remaining(), 6);

    let victim = live_zone_members(&mut app)[0];
    kill(&mut app, victim);
    step(&mut app);

    assert_eq!(live_zone_members(&mut app).len(), 6);
    let zone = app
        .world()
        .resource::<EncounterDirector>()
        .active
        .clone()
        .unwrap();
    assert_eq!(zone.remaining(), 5);
    assert_eq!(zone.spawned(), 7);
}

#[test]
fn test_coop_zone_reverts_to_solo_when_partner_is_spent() {
    let encounters = format!("{}, {}", grunts(400.0, 6), grunts(400.0, 4));
    let source = level("(100.0, 200.0), (100.0, 230.0)", 3000.0, &encounters);
    let config = SimConfig {
        max_continues: 0,
        ..SimConfig::default()
    };
    let mut app = app_with(&[&source], config, vec![HeroId(0), HeroId(1)]);
    step(&mut app);

    let zone = app
        .world()
        .resource::<EncounterDirector>()
        .active
        .clone()
        .unwrap();
    assert!(zone.is_coop());
    assert_eq!(zone.cap(), 8);
    assert_eq!(zone.spawned(), 8);
    assert_eq!(zone.remaining(), 1);

    let first = player(&mut app, 0);
    let second = player(&mut app, 1);
    app.world_mut()
        .entity_mut(first)
        .insert(Invincible { until: u64::MAX });
    app.world_mut()
        .resource_mut::<PlayerRoster>()
        .slot_mut(PlayerSlot(1))
        .unwrap()
        .lives = 1;
    kill(&mut app, second);

    let mut reverted = false;
    for _ in 0..120 {
        step(&mut app);
        reverted |= events::<EncounterEvent>(&app)
            .iter()
            .any(|event| event.change == EncounterChange::RevertedToSolo);
        let roster = app.world().resource::<PlayerRoster>();
        if roster.slot(PlayerSlot(1)).unwrap().status == SlotStatus::Spent && reverted {
            break;
        }
    }
    assert!(reverted);

    let zone = app
        .world()
        .resource::<EncounterDirector>()
        .active
        .clone()
        .unwrap();
    assert!(!zone.is_coop());
    assert_eq!(zone.cap(), 6);
    assert_eq!(zone.remaining(), 0);

    for enemy in live_zone_members(&mut app) {
        kill(&mut app, enemy);
    }
    step(&mut app);
    step(&mut app);

    let director = app.world().resource::<EncounterDirector>();
    let next = director.active.clone().unwrap();
    assert_eq!(next.index, 1);
    assert_eq!(next.cap(), 6);
    assert_eq!(next.spawned(), 4);

    // The untouched survivor earned the clean-wave bonus
    let roster = app.world().resource::<PlayerRoster>();
    assert_eq!(roster.slot(PlayerSlot(0)).unwrap().score, 500);
}

#[test]
fn test_enemy_retargets_only_at_reevaluation() {
    let source = level("(100.0, 200.0), (400.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0), HeroId(1)]);
    step(&mut app);
    let first = player(&mut app, 0);
    let second = player(&mut app, 1);
    let grunt = spawn_enemy_at(&mut app, "bogwort_grunt", 150.0, 200.0, Facing::Left);
    step(&mut app);
    assert_eq!(app.world().get::<AiController>(grunt).unwrap().target, Some(first));

    app.world_mut().get_mut::<Position>(first).unwrap().x = 700.0;
    step(&mut app);
    assert_eq!(app.world().get::<AiController>(grunt).unwrap().target, Some(first));

    let mut switched = false;
    for _ in 0..121 {
        step(&mut app);
        if app.world().get::<AiController>(grunt).unwrap().target == Some(second) {
            switched = true;
            break;
        }
    }
    assert!(switched);
}

#[test]
fn test_four_shards_cast_tier_two_and_score_the_kill() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<MagicPool>(hero).unwrap() = MagicPool::new(4);
    let grunt = spawn_enemy_at(&mut app, "bogwort_grunt", 100.0, 200.0, Facing::Left);

    press(&mut app, 0, InputFrame::default().with_magic());
    step(&mut app);

    let casts = events::<MagicCastEvent>(&app);
    assert_eq!(casts.len(), 1);
    assert_eq!(casts[0].tier, MagicTier::Two);
    assert_eq!(casts[0].shards_spent, 4);
    assert_eq!(app.world().get::<MagicPool>(hero).unwrap().charges(), 0);

    for _ in 0..5 {
        if app.world().get::<Health>(grunt).unwrap().is_dead() {
            break;
        }
        step(&mut app);
    }
    assert!(app.world().get::<Health>(grunt).unwrap().is_dead());
    let roster = app.world().resource::<PlayerRoster>();
    assert_eq!(roster.slot(PlayerSlot(0)).unwrap().score, 100);
}

#[test]
fn test_last_life_without_continues_ends_the_game() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let config = SimConfig {
        starting_lives: 1,
        max_continues: 0,
        ..SimConfig::default()
    };
    let mut app = app_with(&[&source], config, vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    kill(&mut app, hero);

    let mut spent = false;
    for _ in 0..120 {
        step(&mut app);
        spent |= events::<LifeEvent>(&app)
            .iter()
            .any(|event| event.change == LifeChange::Spent);
        if app.world().resource::<SimContext>().phase == SessionPhase::GameOver {
            break;
        }
    }
    assert!(spent);
    assert_eq!(app.world().resource::<SimContext>().phase, SessionPhase::GameOver);
    assert!(!app.world().entities().contains(hero));
}

#[test]
fn test_camp_leads_into_the_next_level() {
    let camp = level("(60.0, 200.0)", 480.0, "");
    let next = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&camp, &next], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);

    let until = match app.world().resource::<SimContext>().phase {
        SessionPhase::Camp { until } => until,
        other => panic!("expected camp, got {other:?}"),
    };
    let mut enemies = app.world_mut().query_filtered::<Entity, With<Enemy>>();
    assert_eq!(enemies.iter(app.world()).count(), 2);

    while app.world().resource::<SimContext>().tick <= until + 1 {
        step(&mut app);
    }

    let ctx = app.world().resource::<SimContext>();
    assert_eq!(ctx.current_level, 1);
    assert_eq!(ctx.level_index, 2);
    assert!(ctx.is_playing());
    let mut enemies = app.world_mut().query_filtered::<Entity, With<Enemy>>();
    assert_eq!(enemies.iter(app.world()).count(), 0);
}

#[test]
fn test_events_are_dropped_after_two_ticks() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<MagicPool>(hero).unwrap() = MagicPool::new(1);

    press(&mut app, 0, InputFrame::default().with_magic());
    step(&mut app);
    assert_eq!(events::<MagicCastEvent>(&app).len(), 1);

    step(&mut app);
    assert!(events::<MagicCastEvent>(&app).is_empty());
    assert_eq!(app.world().resource::<Events<MagicCastEvent>>().len(), 1);

    step(&mut app);
    assert!(app.world().resource::<Events<MagicCastEvent>>().is_empty());
}

#[test]
fn test_simultaneous_hits_all_land_on_a_dying_hero() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    app.world_mut().entity_mut(hero).remove::<Invincible>();
    app.world_mut().get_mut::<Health>(hero).unwrap().take_damage(6);

    let first = spawn_enemy_at(&mut app, "bogwort_grunt", 80.0, 200.0, Facing::Left);
    let second = spawn_enemy_at(&mut app, "bogwort_grunt", 80.0, 205.0, Facing::Left);
    let now = tick(&app);
    for grunt in [first, second] {
        hold_still(&mut app, grunt);
        app.world_mut()
            .get_mut::<TimedState<ActionState>>(grunt)
            .unwrap()
            .enter(ActionState::Attack1, now, Some(20));
    }

    let mut hits = Vec::new();
    for _ in 0..15 {
        step(&mut app);
        hits = events::<HitEvent>(&app)
            .into_iter()
            .filter(|hit| hit.defender == hero)
            .collect();
        if !hits.is_empty() {
            break;
        }
    }

    let attackers: Vec<Entity> = hits.iter().map(|hit| hit.attacker).collect();
    assert_eq!(attackers, vec![first, second]);
    assert_eq!(hits[0].damage, 2);
    assert!(app.world().get::<Health>(hero).unwrap().is_dead());
    assert_eq!(app.world().get::<LastAttacker>(hero).unwrap().0, Some(first));
}

#[test]
fn test_snapshot_shows_magic_blast_hitbox() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<MagicPool>(hero).unwrap() = MagicPool::new(4);

    press(&mut app, 0, InputFrame::default().with_magic());
    step(&mut app);

    let mut blasts = app.world_mut().query_filtered::<Entity, With<MagicBlast>>();
    let blast = blasts.single(app.world());
    let snapshot = app.world().resource::<SimSnapshot>();
    let view = snapshot.entities.iter().find(|view| view.entity == blast).unwrap();
    let hitbox = view.hitbox.unwrap();
    assert!((hitbox.width() - 280.0).abs() < 1e-3);
    assert!(view.hurtbox.is_none());
}

#[test]
fn test_throw_damages_by_range_and_the_body_strikes_others() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<Facing>(hero).unwrap() = Facing::Right;
    let grabbed = spawn_enemy_at(&mut app, "bogwort_grunt", 72.0, 200.0, Facing::Left);
    let bystander = spawn_enemy_at(&mut app, "bogwort_grunt", 120.0, 200.0, Facing::Left);
    hold_still(&mut app, grabbed);
    hold_still(&mut app, bystander);

    press(&mut app, 0, InputFrame::default().with_attack());
    step(&mut app);

    let hits = events::<HitEvent>(&app);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].kind, HitKind::Throw);
    assert_eq!(hits[0].defender, grabbed);
    assert_eq!(hits[0].damage, 3);
    assert_eq!(action(&app, hero), ActionState::Throw);
    assert_eq!(action(&app, grabbed), ActionState::Knockdown);
    let snapshot = app.world().resource::<SimSnapshot>();
    let flying = snapshot.entities.iter().find(|view| view.entity == grabbed).unwrap();
    assert!(flying.hitbox.is_some());

    let mut slammed = None;
    for _ in 0..30 {
        step(&mut app);
        slammed = events::<HitEvent>(&app)
            .into_iter()
            .find(|hit| hit.defender == bystander);
        if slammed.is_some() {
            break;
        }
    }
    let slammed = slammed.unwrap();
    assert_eq!(slammed.kind, HitKind::Body);
    assert_eq!(slammed.attacker, hero);
    assert_eq!(slammed.damage, 2);
    assert_eq!(app.world().get::<Health>(bystander).unwrap().current(), 4);

    // Throws are not part of the chain
    let combo = app.world().get::<ComboTracker>(hero).unwrap();
    assert_eq!(combo.step(), ComboStep::First);
}

#[test]
fn test_knocked_down_rider_frees_mount_for_the_hero() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);

    let rider = spawn_enemy_at(&mut app, "snarlfang_rider", 70.0, 200.0, Facing::Left);
    hold_still(&mut app, rider);
    let data = app.world().resource::<GameData>().clone();
    let kind = data.mount_id("snarlfang").unwrap();
    let (order, now) = {
        let mut ctx = app.world_mut().resource_mut::<SimContext>();
        (ctx.next_spawn_order(), ctx.tick)
    };
    let beast = app
        .world_mut()
        .spawn(MountBundle::new(
            &data,
            kind,
            order,
            Position::new(70.0, 200.0),
            Allegiance::Horde,
            now,
        ))
        .id();
    app.world_mut()
        .resource_mut::<MountBindings>()
        .bind(rider, beast, RiderSide::Horde);

    // Ridden hostile mounts cannot be taken
    press(&mut app, 0, InputFrame::default().with_mount());
    step(&mut app);
    assert!(app.world().get::<Mounted>(hero).is_none());

    let now = tick(&app);
    app.world_mut()
        .get_mut::<TimedState<ActionState>>(rider)
        .unwrap()
        .enter(ActionState::Knockdown, now, Some(40));
    step(&mut app);

    assert!(events::<MountEvent>(&app)
        .iter()
        .any(|event| event.rider == rider && event.change == MountChange::Freed));
    assert_eq!(*app.world().get::<Allegiance>(beast).unwrap(), Allegiance::Neutral);
    assert!(!app.world().resource::<MountBindings>().is_ridden(beast));

    press(&mut app, 0, InputFrame::default().with_mount());
    step(&mut app);

    assert!(app.world().get::<Mounted>(hero).is_some());
    let bindings = app.world().resource::<MountBindings>();
    assert_eq!(bindings.mount_of(hero), Some(beast));
    assert!(events::<MountEvent>(&app)
        .iter()
        .any(|event| event.rider == hero && event.change == MountChange::Mounted));
}

#[test]
fn test_three_landed_hits_knock_down() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<Facing>(hero).unwrap() = Facing::Right;
    // Past grab range so every press is a strike
    let brute = spawn_enemy_at(&mut app, "ironhide_brute", 95.0, 200.0, Facing::Left);
    hold_still(&mut app, brute);

    let first = land_strike(&mut app, hero, brute, 95.0);
    assert_eq!((first.damage, first.knockdown), (2, false));
    assert_eq!(action(&app, brute), ActionState::Hit);
    wait_until_free(&mut app, hero);

    let second = land_strike(&mut app, hero, brute, 95.0);
    assert_eq!((second.damage, second.knockdown), (2, false));
    wait_until_free(&mut app, hero);

    let third = land_strike(&mut app, hero, brute, 95.0);
    assert_eq!((third.damage, third.knockdown), (3, true));
    assert_eq!(action(&app, brute), ActionState::Knockdown);
    assert_eq!(app.world().get::<Health>(brute).unwrap().current(), 3);
    let combo = app.world().get::<ComboTracker>(hero).unwrap();
    assert_eq!(combo.step(), ComboStep::First);
}

#[test]
fn test_damage_while_getting_up_staggers() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<Facing>(hero).unwrap() = Facing::Right;
    let brute = spawn_enemy_at(&mut app, "ironhide_brute", 95.0, 200.0, Facing::Left);
    hold_still(&mut app, brute);

    for _ in 0..3 {
        land_strike(&mut app, hero, brute, 95.0);
        wait_until_free(&mut app, hero);
    }
    for _ in 0..60 {
        if action(&app, brute) == ActionState::GetUp {
            break;
        }
        step(&mut app);
    }
    assert_eq!(action(&app, brute), ActionState::GetUp);

    let hit = land_strike(&mut app, hero, brute, 95.0);
    assert_eq!(hit.damage, 2);
    assert_eq!(action(&app, brute), ActionState::Hit);
    assert_eq!(app.world().get::<Health>(brute).unwrap().current(), 1);
}

#[test]
fn test_late_landing_restarts_the_chain() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<Facing>(hero).unwrap() = Facing::Right;
    let brute = spawn_enemy_at(&mut app, "ironhide_brute", 95.0, 200.0, Facing::Left);
    hold_still(&mut app, brute);

    land_strike(&mut app, hero, brute, 95.0);
    let landed = tick(&app);
    wait_until_free(&mut app, hero);

    // Pressed 27 ticks after the hit, connects 4 ticks later: past the window
    while tick(&app) < landed + 26 {
        step(&mut app);
    }
    let late = land_strike(&mut app, hero, brute, 95.0);
    assert_eq!(tick(&app), landed + 31);
    assert_eq!(late.damage, 2);

    let combo = app.world().get::<ComboTracker>(hero).unwrap();
    assert_eq!(combo.step(), ComboStep::Second);
}

#[test]
fn test_shard_pickups_stop_at_capacity() {
    let source = level("(60.0, 200.0)", 3000.0, "");
    let mut app = app_with(&[&source], SimConfig::default(), vec![HeroId(0)]);
    step(&mut app);
    let hero = player(&mut app, 0);
    *app.world_mut().get_mut::<MagicPool>(hero).unwrap() = MagicPool::new(MagicPool::CAPACITY - 1);
    let at = *app.world().get::<Position>(hero).unwrap();
    for kind in [PickupKind::Shard, PickupKind::Shard, PickupKind::Food(3)] {
        app.world_mut().spawn((Pickup { kind }, at));
    }

    step(&mut app);

    assert_eq!(app.world().get::<MagicPool>(hero).unwrap().charges(), MagicPool::CAPACITY);
    let taken = events::<PickupEvent>(&app);
    assert_eq!(taken.len(), 1);
    assert_eq!(taken[0].kind, PickupKind::Shard);
    // A full pool and full health leave the rest on the ground
    let mut left = app.world_mut().query::<&Pickup>();
    assert_eq!(left.iter(app.world()).count(), 2);
    let snapshot = app.world().resource::<SimSnapshot>();
    assert_eq!(snapshot.hud(PlayerSlot(0)).unwrap().shards, 9);
}
