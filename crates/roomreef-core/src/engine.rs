//! Session engine - owns the world and drives all systems.

use hecs::{Entity, World};
use roomreef_logic::transform::Pose;

use crate::components::{Grabbed, Species};
use crate::config::SessionConfig;
use crate::events::{EventBus, ReefEvent};
use crate::persistence::{self, SaveError};
use crate::round::{CaughtFishRecord, Round};
use crate::scan::{PlaneSample, RoomScanResult, ScanAggregator};
use crate::state::BoundaryState;
use crate::systems;
use crate::timers::{TimerKind, TimerQueue};

/// A complete room session: scan aggregation, boundary state, the fish
/// population and round scoring, advanced one tick at a time.
///
/// The host feeds it plane samples and spear poses and drains its
/// events; everything else happens inside `update`.
pub struct RoomSession {
    /// ECS world holding all fish
    pub world: World,
    /// Simulation time in seconds
    pub sim_time: f64,
    config: SessionConfig,
    boundary: BoundaryState,
    aggregator: ScanAggregator,
    timers: TimerQueue,
    events: EventBus,
    round: Round,
    /// Whether the current population has been provisioned
    spawned: bool,
}

impl RoomSession {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let mut round = Round::new();
        round.rotate_target(&mut rand::thread_rng());
        let mut timers = TimerQueue::new();
        // Armed from the start: a host that never scans still gets a
        // playable room, and the target keeps rotating.
        timers.schedule(TimerKind::SpawnFallback, 0.0, config.spawn_fallback);
        timers.schedule(TimerKind::TargetRotate, 0.0, config.target_rotation);
        Self {
            world: World::new(),
            sim_time: 0.0,
            boundary: BoundaryState::new(),
            aggregator: ScanAggregator::new(),
            timers,
            events: EventBus::new(),
            round,
            spawned: false,
            config,
        }
    }

    // --- Scan lifecycle ---

    /// Open a scan window. Plane samples fed through [`Self::observe_plane`]
    /// accumulate until [`Self::complete_scan`] or the window timeout.
    pub fn begin_scan(&mut self) {
        self.aggregator.begin();
        self.timers
            .schedule(TimerKind::ScanTimeout, self.sim_time, self.config.scan_window);
        if !self.spawned {
            self.timers
                .schedule(TimerKind::SpawnFallback, self.sim_time, self.config.spawn_fallback);
        }
    }

    /// Feed one detected plane into the open window. Returns whether it
    /// was accepted; repeats and malformed samples are not.
    pub fn observe_plane(&mut self, sample: &PlaneSample) -> bool {
        self.aggregator.observe(sample)
    }

    /// Close the scan window now and apply its result, falling back to
    /// the synthetic room when no floor was observed.
    pub fn complete_scan(&mut self) {
        if self.aggregator.is_active() {
            self.timers.cancel(TimerKind::ScanTimeout);
            self.finish_scan_window();
        }
    }

    /// Drop the boundary and the population. The host calls this when
    /// the player leaves the play space; a fresh [`Self::begin_scan`]
    /// follows on re-entry.
    pub fn reset_room(&mut self) {
        self.aggregator.reset();
        self.boundary.clear();
        systems::despawn_all(&mut self.world);
        self.spawned = false;
        self.round.reset();
        self.timers.cancel(TimerKind::ScanTimeout);
        self.timers.cancel(TimerKind::SpawnFallback);
        self.events.publish(ReefEvent::RoomReset);
    }

    // --- Frame update ---

    /// Advance the session by `delta_seconds`. Fires due timers, then
    /// runs the swim system.
    pub fn update(&mut self, delta_seconds: f32) {
        let dt = delta_seconds.max(0.0);
        self.sim_time += dt as f64;

        for kind in self.timers.fire_due(self.sim_time) {
            match kind {
                TimerKind::ScanTimeout => self.finish_scan_window(),
                TimerKind::SpawnFallback => self.spawn_fallback(),
                TimerKind::TargetRotate => self.rotate_target(),
            }
        }

        systems::swim_system(&mut self.world, &self.boundary, &self.config, self.sim_time, dt);
    }

    // --- Interaction ---

    /// Test the spear at `pose` against the population and score any
    /// hits. Also emitted as [`ReefEvent::FishCaught`] events.
    pub fn test_spear(&mut self, pose: &Pose) -> Vec<CaughtFishRecord> {
        let records = systems::catch_system(
            &mut self.world,
            &mut self.round,
            &mut self.events,
            &self.config,
            pose,
            self.sim_time,
        );
        if !records.is_empty() && systems::live_fish(&self.world) == 0 {
            self.events.publish(ReefEvent::PopulationEmpty);
        }
        records
    }

    /// Hand a fish to (or back from) the player's grab interaction.
    /// Held fish freeze until released.
    pub fn set_grabbed(&mut self, entity: Entity, grabbed: bool) -> bool {
        if grabbed {
            self.world.insert_one(entity, Grabbed).is_ok()
        } else {
            self.world.remove_one::<Grabbed>(entity).is_ok()
        }
    }

    /// Take every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<ReefEvent> {
        self.events.drain()
    }

    // --- Accessors ---

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scanned(&self) -> bool {
        self.boundary.scanned()
    }

    pub fn boundary(&self) -> &BoundaryState {
        &self.boundary
    }

    pub fn live_fish(&self) -> usize {
        systems::live_fish(&self.world)
    }

    pub fn score(&self) -> i32 {
        self.round.score()
    }

    pub fn target_species(&self) -> Species {
        self.round.target()
    }

    pub fn catch_records(&self) -> &[CaughtFishRecord] {
        self.round.records()
    }

    // --- Persistence ---

    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_session(
            writer,
            &self.world,
            self.sim_time,
            self.spawned,
            &self.boundary,
            &self.round,
            &self.timers,
        )
    }

    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = persistence::load_session(reader)?;
        self.world = loaded.world;
        self.sim_time = loaded.sim_time;
        self.spawned = loaded.spawned;
        self.boundary = loaded.boundary;
        self.round = loaded.round;
        self.timers = loaded.timers;
        Ok(())
    }

    // --- Internals ---

    fn finish_scan_window(&mut self) {
        let result = self
            .aggregator
            .finish()
            .unwrap_or_else(|| RoomScanResult::synthetic(&self.config));
        self.apply_scan(result);
    }

    /// The spawn deadline passed without a completed scan. Force the
    /// synthetic room so the session becomes playable; an open scan
    /// window keeps running, and a late result will replace the room
    /// and reposition the fish.
    fn spawn_fallback(&mut self) {
        if !self.boundary.scanned() {
            self.apply_scan(RoomScanResult::synthetic(&self.config));
        } else if !self.spawned {
            systems::spawn_population(&mut self.world, &self.boundary, &self.config);
            self.spawned = true;
        }
    }

    fn apply_scan(&mut self, result: RoomScanResult) {
        self.boundary.apply(&result);
        self.timers.cancel(TimerKind::SpawnFallback);
        if self.spawned {
            systems::reposition_population(&mut self.world, &self.boundary, &self.config);
        } else {
            systems::spawn_population(&mut self.world, &self.boundary, &self.config);
            self.spawned = true;
        }
        self.events.publish(ReefEvent::RoomScanned(result));
    }

    fn rotate_target(&mut self) {
        let target = self.round.rotate_target(&mut rand::thread_rng());
        self.events.publish(ReefEvent::TargetChanged(target));
        self.timers
            .schedule(TimerKind::TargetRotate, self.sim_time, self.config.target_rotation);
    }
}

impl Default for RoomSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Position;
    use roomreef_logic::classify::PlaneOrientation;
    use roomreef_logic::polygon::PolyPoint;

    fn floor_sample(id: u64) -> PlaneSample {
        PlaneSample {
            id,
            orientation: PlaneOrientation::Horizontal,
            pose: Some(Pose::IDENTITY),
            polygon: vec![
                PolyPoint::new(-2.0, -2.0),
                PolyPoint::new(2.0, -2.0),
                PolyPoint::new(2.0, 2.0),
                PolyPoint::new(-2.0, 2.0),
            ],
        }
    }

    fn first_fish(session: &RoomSession) -> (Entity, crate::components::Vec3) {
        let mut query = session.world.query::<&Position>();
        let (entity, position) = query.iter().next().expect("a fish");
        (entity, position.world)
    }

    #[test]
    fn test_fallback_spawns_without_scan_api() {
        let mut session = RoomSession::new();
        assert_eq!(session.live_fish(), 0);
        // 25 simulated seconds, past the 20 s spawn fallback
        for _ in 0..50 {
            session.update(0.5);
        }
        assert!(session.scanned());
        assert_eq!(session.live_fish(), session.config().fish_count);
        let events = session.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ReefEvent::RoomScanned(r) if r.floor_polygon.is_none())),
            "expected a synthetic RoomScanned event"
        );
    }

    #[test]
    fn test_scan_completion_spawns_population() {
        let mut session = RoomSession::new();
        session.begin_scan();
        assert!(session.observe_plane(&floor_sample(1)));
        assert!(!session.observe_plane(&floor_sample(1)), "replays must not count");
        session.complete_scan();

        assert!(session.scanned());
        assert_eq!(session.live_fish(), session.config().fish_count);
        let events = session.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, ReefEvent::RoomScanned(r) if r.floor_polygon.is_some())));
    }

    #[test]
    fn test_scan_window_times_out() {
        let mut session = RoomSession::new();
        session.begin_scan();
        session.observe_plane(&floor_sample(1));
        // Never call complete_scan; the 15 s window must close itself
        for _ in 0..40 {
            session.update(0.5);
        }
        assert!(session.scanned());
        assert_eq!(session.live_fish(), session.config().fish_count);
    }

    #[test]
    fn test_late_scan_replaces_fallback_room() {
        let mut session = RoomSession::new();
        // Synthetic room arrives first via the fallback deadline
        for _ in 0..50 {
            session.update(0.5);
        }
        session.drain_events();
        let before = session.live_fish();

        session.begin_scan();
        session.observe_plane(&floor_sample(1));
        session.complete_scan();

        assert_eq!(session.live_fish(), before, "re-scan repositions, not respawns");
        let events = session.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, ReefEvent::RoomScanned(r) if r.floor_polygon.is_some())));
        // Everyone now sits inside the new 4x4 footprint
        for (_, position) in session.world.query::<&Position>().iter() {
            let p = position.world;
            assert!(p.x.abs() <= 2.0 && p.z.abs() <= 2.0, "({}, {})", p.x, p.z);
        }
    }

    #[test]
    fn test_reset_clears_room() {
        let mut session = RoomSession::new();
        session.begin_scan();
        session.observe_plane(&floor_sample(1));
        session.complete_scan();
        session.drain_events();

        session.reset_room();
        assert!(!session.scanned());
        assert_eq!(session.live_fish(), 0);
        assert_eq!(session.drain_events(), vec![ReefEvent::RoomReset]);
    }

    #[test]
    fn test_spear_catch_ends_round_when_population_empty() {
        let mut config = SessionConfig::default();
        config.fish_count = 1;
        let mut session = RoomSession::with_config(config);
        session.begin_scan();
        session.observe_plane(&floor_sample(1));
        session.complete_scan();
        session.drain_events();

        let (_, fish_pos) = first_fish(&session);
        let pose = Pose::from_translation(
            fish_pos.x,
            fish_pos.y,
            fish_pos.z - session.config().tip_offset,
        );
        let records = session.test_spear(&pose);
        assert_eq!(records.len(), 1);
        assert_eq!(session.live_fish(), 0);
        assert_ne!(session.score(), 0);

        let events = session.drain_events();
        assert!(events.iter().any(|e| matches!(e, ReefEvent::FishCaught(_))));
        assert!(events.iter().any(|e| matches!(e, ReefEvent::PopulationEmpty)));

        // A second thrust at the same spot is a clean miss
        assert!(session.test_spear(&pose).is_empty());
    }

    #[test]
    fn test_target_rotates_on_schedule() {
        let mut session = RoomSession::new();
        // 12.5 simulated seconds crosses the 10 s rotation deadline
        for _ in 0..25 {
            session.update(0.5);
        }
        let events = session.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, ReefEvent::TargetChanged(s) if s.is_target_candidate())));
    }

    #[test]
    fn test_grabbed_fish_freezes_until_released() {
        let mut session = RoomSession::new();
        session.begin_scan();
        session.observe_plane(&floor_sample(1));
        session.complete_scan();

        let (entity, held_at) = first_fish(&session);
        assert!(session.set_grabbed(entity, true));
        for _ in 0..20 {
            session.update(0.05);
        }
        let still_at = session.world.get::<&Position>(entity).unwrap().world;
        assert_eq!(held_at, still_at, "held fish must not move");

        assert!(session.set_grabbed(entity, false));
        for _ in 0..20 {
            session.update(0.05);
        }
        let pos = session.world.get::<&Position>(entity).unwrap().world;
        assert!(pos.distance(&held_at) > 1e-4, "released fish should swim off");
    }
}
