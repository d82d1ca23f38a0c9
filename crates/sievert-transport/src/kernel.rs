//! The particle track kernel: one optical-path leg at a time.
//!
//! A particle's life alternates between sampling an optical-path budget
//! (how many mean free paths until the next collision) and ray-tracing
//! that budget through the geometry. The budget is spent crossing cell
//! boundaries until either it runs out (a collision) or the particle
//! enters a termination cell. Navigation failures mark the particle
//! lost and end its simulation without aborting siblings; lost/gone is
//! particle state, not control-flow, so the caller inspects the fate
//! after each leg.

use rand::RngCore;

use sievert_core::{
    CellId, CollisionKernel, EventObserver, NavigationError, Navigator, ParticleBank,
    ParticleState, TerminationReason,
};

use crate::config::SimulationProperties;

/// How one ray-traced track leg ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TrackOutcome {
    /// The optical-path budget ran out inside a cell; a collision was
    /// resolved and a fresh leg should be sampled.
    Collided,
    /// The particle is terminal (gone or lost); no further tracking.
    Terminated,
}

/// Borrowed collaborator set for tracking particles within one history.
pub(crate) struct TrackContext<'a> {
    pub navigator: &'a dyn Navigator,
    pub collision: &'a dyn CollisionKernel,
    pub observer: &'a dyn EventObserver,
    pub properties: &'a SimulationProperties,
}

impl TrackContext<'_> {
    /// Simulate one particle until it is gone or lost.
    ///
    /// Particles of a type not active in the configured mode are
    /// terminated immediately rather than transported.
    /// Secondaries produced by collisions are pushed onto `bank` and
    /// simulated later by the history loop.
    pub fn simulate_particle(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        rng: &mut dyn RngCore,
    ) {
        if !self.properties.mode.simulates(particle.particle_type) {
            particle.mark_gone(TerminationReason::InactiveInMode);
            return;
        }

        while particle.is_alive() {
            if particle.energy < self.properties.min_energy(particle.particle_type) {
                particle.mark_gone(TerminationReason::BelowEnergyCutoff);
                break;
            }
            let optical_path = self.collision.sample_optical_path_length(rng);
            match self.follow_track(particle, bank, optical_path, rng) {
                TrackOutcome::Collided => continue,
                TrackOutcome::Terminated => break,
            }
        }
    }

    /// Ray-trace one leg of `remaining_op` mean free paths.
    ///
    /// Tie-break rule: the particle streams to the boundary when the
    /// optical path to the surface is strictly less than the remaining
    /// budget; otherwise it collides inside the cell. A void cell
    /// (zero cross section) always streams to the boundary.
    fn follow_track(
        &self,
        particle: &mut ParticleState,
        bank: &mut ParticleBank,
        mut remaining_op: f64,
        rng: &mut dyn RngCore,
    ) -> TrackOutcome {
        let track_start = particle.position;
        let start_time = particle.time;

        loop {
            let cell = match self.located_cell(particle) {
                Some(cell) => cell,
                None => return TrackOutcome::Terminated,
            };

            let hit = match self.navigator.fire_ray(particle) {
                Ok(hit) => hit,
                Err(err) => {
                    particle.mark_lost(err);
                    return TrackOutcome::Terminated;
                }
            };

            let sigma_t = self.collision.macroscopic_total_cross_section(particle);
            let op_to_surface = hit.distance * sigma_t;

            if sigma_t == 0.0 || op_to_surface < remaining_op {
                // The particle reaches the boundary before colliding.
                let crossing = match self.navigator.advance_to_boundary(particle, &hit) {
                    Ok(crossing) => crossing,
                    Err(err) => {
                        particle.mark_lost(err);
                        return TrackOutcome::Terminated;
                    }
                };

                self.observer
                    .subtrack_ending_in_cell(particle, cell, hit.distance, start_time);
                self.observer.leaving_cell(particle, cell);
                self.observer.crossing_surface(particle, hit.surface);
                if crossing.reflected {
                    // Re-fire after the direction update.
                    self.observer.crossing_surface(particle, hit.surface);
                }
                self.observer.entering_cell(particle, crossing.cell);

                if self.navigator.is_termination_cell(crossing.cell) {
                    self.observer
                        .subtrack_ending_global(particle, track_start, particle.position);
                    particle.mark_gone(TerminationReason::LeftModel);
                    return TrackOutcome::Terminated;
                }

                remaining_op -= op_to_surface;
            } else {
                // A collision occurs in this cell.
                let distance = remaining_op / sigma_t;
                particle.advance(distance);

                self.observer
                    .subtrack_ending_in_cell(particle, cell, distance, start_time);
                self.observer.colliding_in_cell(particle, 1.0 / sigma_t);
                self.observer
                    .subtrack_ending_global(particle, track_start, particle.position);

                self.collision.collide(
                    particle,
                    bank,
                    self.properties.survival_biasing,
                    rng,
                );
                return TrackOutcome::Collided;
            }
        }
    }

    /// The particle's current cell, or mark it lost if it has none.
    fn located_cell(&self, particle: &mut ParticleState) -> Option<CellId> {
        match particle.cell {
            Some(cell) => Some(cell),
            None => {
                particle.mark_lost(NavigationError::PointNotInModel {
                    reason: "particle has no located cell".to_string(),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sievert_core::{Fate, HistoryId, HistoryRng, ParticleMode, ParticleType};
    use sievert_test_utils::{
        CollideBehavior, FailingNavigator, MockCollision, RecordingObserver, SlabNavigator,
    };
    use std::sync::atomic::Ordering;

    fn props(mode: ParticleMode) -> SimulationProperties {
        SimulationProperties::new(mode, 1)
    }

    fn particle_at(x: f64, cell: u64) -> ParticleState {
        let mut p = ParticleState::new(ParticleType::Neutron, HistoryId(0));
        p.position = [x, 0.0, 0.0];
        p.direction = [1.0, 0.0, 0.0];
        p.cell = Some(CellId(cell));
        p
    }

    #[test]
    fn inactive_type_is_ignored_not_simulated() {
        let navigator = FailingNavigator::new();
        let collision = MockCollision::vacuum();
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = ParticleState::new(ParticleType::Photon, HistoryId(0));
        p.cell = Some(CellId(0));
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        assert_eq!(p.fate(), &Fate::Gone(TerminationReason::InactiveInMode));
        // Ignoring a species touches neither geometry nor physics.
        assert_eq!(navigator.fire_ray_calls.load(Ordering::Relaxed), 0);
        assert_eq!(collision.sample_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn below_cutoff_terminates_before_any_tracking() {
        let navigator = FailingNavigator::new();
        let collision = MockCollision::vacuum();
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = particle_at(0.0, 0);
        p.energy = 0.0;
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        assert_eq!(p.fate(), &Fate::Gone(TerminationReason::BelowEnergyCutoff));
        assert_eq!(navigator.fire_ray_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn lost_particle_stops_after_single_navigation_failure() {
        let navigator = FailingNavigator::new();
        let collision = MockCollision::new(CollideBehavior::Absorb).with_fixed_optical_path(1.0);
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = particle_at(0.0, 0);
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        assert!(p.is_lost());
        assert_eq!(navigator.fire_ray_calls.load(Ordering::Relaxed), 1);
        // One optical path was sampled before the ray; no collision ran.
        assert_eq!(collision.sample_calls.load(Ordering::Relaxed), 1);
        assert_eq!(collision.collide_count(), 0);
    }

    #[test]
    fn crossing_into_termination_cell_marks_gone() {
        // One slab cell; the right plane borders the graveyard. Vacuum,
        // so the particle streams straight through.
        let navigator = SlabNavigator::new(vec![0.0, 1.0]);
        let collision = MockCollision::vacuum().with_fixed_optical_path(1.0);
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = particle_at(0.25, 0);
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        assert_eq!(p.fate(), &Fate::Gone(TerminationReason::LeftModel));
        assert_eq!(p.position[0], 1.0);
        assert_eq!(observer.crossing_surface.load(Ordering::Relaxed), 1);
        assert_eq!(observer.subtrack_global.load(Ordering::Relaxed), 1);
        assert_eq!(observer.collisions.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn boundary_branch_position_and_budget_arithmetic() {
        // sigma_t = 2, distance to surface = 0.5 => op_to_surface = 1.0,
        // budget 1.5: the particle crosses, then the remaining 0.5 mfp
        // collides 0.25 into the next cell (same sigma).
        let navigator = SlabNavigator::new(vec![0.0, 0.5, 10.0]);
        let collision = MockCollision::new(CollideBehavior::Absorb)
            .with_cross_section(CellId(0), 2.0)
            .with_cross_section(CellId(1), 2.0)
            .with_fixed_optical_path(1.5);
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = particle_at(0.0, 0);
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        // Collision site: 0.5 (boundary) + 0.5 / 2.0.
        assert!((p.position[0] - 0.75).abs() < 1e-12);
        assert_eq!(collision.collide_count(), 1);
        assert_eq!(p.fate(), &Fate::Gone(TerminationReason::BelowEnergyCutoff));
        assert_eq!(observer.crossing_surface.load(Ordering::Relaxed), 1);
        // Two subtracks ended in cells: one at the boundary, one at the
        // collision site.
        assert_eq!(observer.subtrack_in_cell.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn collision_branch_advances_by_budget_over_sigma() {
        let navigator = SlabNavigator::new(vec![0.0, 10.0]);
        let collision = MockCollision::new(CollideBehavior::Absorb)
            .with_cross_section(CellId(0), 4.0)
            .with_fixed_optical_path(1.0);
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = particle_at(2.0, 0);
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        // 1.0 mfp / sigma 4.0 = 0.25 travelled.
        assert!((p.position[0] - 2.25).abs() < 1e-12);
        assert_eq!(collision.collide_count(), 1);
        assert_eq!(observer.collisions.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn reflection_refires_crossing_event_and_continues() {
        // Reflecting left plane; the particle heads left, bounces, and
        // eventually leaves through the right plane.
        let navigator = SlabNavigator::new(vec![0.0, 1.0]).with_reflecting_left_plane();
        let collision = MockCollision::vacuum().with_fixed_optical_path(5.0);
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = particle_at(0.5, 0);
        p.direction = [-1.0, 0.0, 0.0];
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        assert_eq!(p.fate(), &Fate::Gone(TerminationReason::LeftModel));
        // Reflection: 2 events at the left plane, 1 at the right.
        assert_eq!(observer.crossing_surface.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn split_collision_banks_secondaries() {
        let navigator = SlabNavigator::new(vec![0.0, 100.0]);
        let collision = MockCollision::new(CollideBehavior::Split {
            energy_factor: 1e-13,
            secondaries: 3,
        })
        .with_cross_section(CellId(0), 1.0)
        .with_fixed_optical_path(1.0);
        let observer = RecordingObserver::new();
        let properties = props(ParticleMode::Neutron);
        let ctx = TrackContext {
            navigator: &navigator,
            collision: &collision,
            observer: &observer,
            properties: &properties,
        };

        let mut p = particle_at(0.0, 0);
        let mut bank = ParticleBank::new();
        let mut rng = HistoryRng::for_history(0, HistoryId(0));

        ctx.simulate_particle(&mut p, &mut bank, &mut rng);
        // Survivor drops below cutoff after the split.
        assert_eq!(p.fate(), &Fate::Gone(TerminationReason::BelowEnergyCutoff));
        assert_eq!(bank.len(), 3);
    }
}
