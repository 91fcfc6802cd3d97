//! Sphere-collider ray oracle.
//!
//! Each participant is approximated by two spheres: one around the torso
//! anchor and one around the eyes. Anonymous spheres act as occluders.
//!
//! # Algorithm
//!
//! 1. Skip every sphere that contains the ray origin (a ray never hits the
//!    collider it starts in)
//! 2. Solve the ray/sphere quadratic for the remaining spheres
//! 3. Report the nearest entry point within `max_distance`

use socialcue_scene_model::host::{RayHit, RayOracle};
use socialcue_scene_model::math::{Ray, Vec3};
use socialcue_scene_model::participant::ParticipantId;

/// A collider sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f64,

    /// Owning participant; `None` for scenery.
    pub owner: Option<ParticipantId>,
}

impl SphereCollider {
    /// Distance along `ray` to the sphere surface, if the ray enters it.
    ///
    /// `ray.direction` must be unit length.
    fn entry_distance(&self, ray: &Ray) -> Option<f64> {
        let to_origin = ray.origin.sub(&self.center);
        let c = to_origin.dot(&to_origin) - self.radius * self.radius;
        if c <= 0.0 {
            return None;
        }

        let b = to_origin.dot(&ray.direction);
        if b > 0.0 {
            // Pointing away from the sphere.
            return None;
        }

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        Some(-b - discriminant.sqrt())
    }
}

/// A static set of colliders answering line-of-sight queries.
#[derive(Debug, Clone, Default)]
pub struct SphereWorld {
    colliders: Vec<SphereCollider>,
}

impl SphereWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, collider: SphereCollider) {
        self.colliders.push(collider);
    }

    /// Add torso and head spheres for a participant.
    pub fn add_participant(&mut self, id: ParticipantId, torso: Vec3, eye: Vec3, radius: f64) {
        for center in [torso, eye] {
            self.add(SphereCollider {
                center,
                radius,
                owner: Some(id),
            });
        }
    }

    /// Add an anonymous occluder.
    pub fn add_occluder(&mut self, center: Vec3, radius: f64) {
        self.add(SphereCollider {
            center,
            radius,
            owner: None,
        });
    }

    pub fn colliders(&self) -> &[SphereCollider] {
        &self.colliders
    }

    pub fn clear(&mut self) {
        self.colliders.clear();
    }
}

impl RayOracle for SphereWorld {
    fn raycast(&self, ray: &Ray, max_distance: f64) -> Option<RayHit> {
        let direction = ray.direction.normalized()?;
        let ray = Ray::new(ray.origin, direction);

        self.colliders
            .iter()
            .filter_map(|c| c.entry_distance(&ray).map(|d| (c, d)))
            .filter(|&(_, d)| d <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, distance)| RayHit {
                participant: c.owner,
                distance,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_people() -> SphereWorld {
        let mut world = SphereWorld::new();
        world.add_participant(
            ParticipantId(0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.6, 0.0),
            0.4,
        );
        world.add_participant(
            ParticipantId(1),
            Vec3::new(0.0, 1.0, 3.0),
            Vec3::new(0.0, 1.6, 3.0),
            0.4,
        );
        world
    }

    #[test]
    fn test_gaze_hits_other_head() {
        let world = two_people();
        let ray = Ray::new(Vec3::new(0.0, 1.6, 0.0), Vec3::FORWARD);
        let hit = world.raycast(&ray, 100.0).unwrap();
        assert_eq!(hit.participant, Some(ParticipantId(1)));
        assert!((hit.distance - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_origin_inside_own_collider_is_ignored() {
        let world = two_people();
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(world.raycast(&ray, 100.0).is_none());
    }

    #[test]
    fn test_max_distance_limits_hits() {
        let world = two_people();
        let ray = Ray::new(Vec3::new(0.0, 1.6, 0.0), Vec3::FORWARD);
        assert!(world.raycast(&ray, 2.0).is_none());
    }

    #[test]
    fn test_occluder_blocks_line_of_sight() {
        let mut world = two_people();
        world.add_occluder(Vec3::new(0.0, 1.0, 1.5), 0.5);

        let ray = Ray::between(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 3.0)).unwrap();
        let hit = world.raycast(&ray, 100.0).unwrap();
        assert_eq!(hit.participant, None);
        assert!((hit.distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unnormalized_direction() {
        let world = two_people();
        let ray = Ray::new(Vec3::new(0.0, 1.6, 0.0), Vec3::new(0.0, 0.0, 5.0));
        let hit = world.raycast(&ray, 100.0).unwrap();
        assert!((hit.distance - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_zero_direction_misses() {
        let world = two_people();
        let ray = Ray::new(Vec3::new(0.0, 1.6, 0.0), Vec3::ZERO);
        assert!(world.raycast(&ray, 100.0).is_none());
    }
}
