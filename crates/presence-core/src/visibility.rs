//! Per-tick social visibility graph.
//!
//! # Algorithm
//!
//! For the participants that have a pose this tick:
//!
//! 1. **Torso test:** for every ordered pair `(self, other)` with both torso
//!    anchors, cast from self's anchor towards other's; if the first hit is
//!    `other`, record a "facing" edge.
//! 2. **Gaze test:** cast along self's viewpoint; if the first hit is another
//!    participant, that participant is self's gaze target and self joins its
//!    observer set.
//! 3. **Proximity:** every other participant strictly closer than the
//!    proximity threshold.
//!
//! Edges are kept at most once per (observer, target), first test wins.
//! Observer sets are assembled only after every participant's ray tests ran,
//! into a graph allocated fresh for the tick, so they never carry entries
//! from a previous tick.

use std::collections::{BTreeMap, BTreeSet};

use socialcue_scene_model::host::RayOracle;
use socialcue_scene_model::math::{Ray, Vec3};
use socialcue_scene_model::participant::{ParticipantId, Pose};

/// Which line-of-sight test produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSource {
    /// Torso anchor to torso anchor ("facing toward").
    Torso,
    /// First-person viewpoint forward ray ("actively gazing at").
    Gaze,
}

/// A directed line-of-sight relation found this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEdge {
    pub observer: ParticipantId,
    pub target: ParticipantId,
    pub direction: Vec3,
    pub distance: f64,
    pub source: EdgeSource,
}

/// A participant within the proximity threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearby {
    pub id: ParticipantId,
    pub distance: f64,
}

/// Pose input for one participant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSnapshot {
    pub id: ParticipantId,
    pub pose: Pose,
}

/// Everything the graph knows about one participant this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantVisibility {
    /// Edges where this participant is the observer.
    pub edges: Vec<VisibilityEdge>,

    /// Participant hit by this participant's viewpoint ray.
    pub gaze_target: Option<ParticipantId>,

    /// Participants whose viewpoint ray hit this participant.
    pub observers: BTreeSet<ParticipantId>,

    /// Participants within the proximity threshold.
    pub nearby: Vec<Nearby>,
}

impl ParticipantVisibility {
    fn has_edge_to(&self, target: ParticipantId) -> bool {
        self.edges.iter().any(|e| e.target == target)
    }

    /// Distance to the closest nearby participant.
    pub fn nearest_distance(&self) -> Option<f64> {
        self.nearby.iter().map(|n| n.distance).reduce(f64::min)
    }
}

/// The relationship graph of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityGraph {
    entries: BTreeMap<ParticipantId, ParticipantVisibility>,
}

impl VisibilityGraph {
    pub fn get(&self, id: ParticipantId) -> Option<&ParticipantVisibility> {
        self.entries.get(&id)
    }

    /// Participants gazing at `id` this tick.
    pub fn observers(&self, id: ParticipantId) -> BTreeSet<ParticipantId> {
        self.get(id).map(|v| v.observers.clone()).unwrap_or_default()
    }

    /// Ids of participants near `id` this tick.
    pub fn nearby_ids(&self, id: ParticipantId) -> Vec<ParticipantId> {
        self.get(id)
            .map(|v| v.nearby.iter().map(|n| n.id).collect())
            .unwrap_or_default()
    }

    pub fn gaze_target(&self, id: ParticipantId) -> Option<ParticipantId> {
        self.get(id).and_then(|v| v.gaze_target)
    }

    pub fn edges(&self, id: ParticipantId) -> &[VisibilityEdge] {
        self.get(id).map(|v| v.edges.as_slice()).unwrap_or(&[])
    }

    /// Whether `a` and `b` are gazing at each other.
    pub fn is_mutual_gaze(&self, a: ParticipantId, b: ParticipantId) -> bool {
        a != b && self.gaze_target(a) == Some(b) && self.gaze_target(b) == Some(a)
    }

    /// Unordered mutual-gaze pairs, lower id first.
    pub fn mutual_gaze_pairs(&self) -> Vec<(ParticipantId, ParticipantId)> {
        self.entries
            .iter()
            .filter_map(|(&a, v)| v.gaze_target.map(|b| (a, b)))
            .filter(|&(a, b)| a < b && self.gaze_target(b) == Some(a))
            .collect()
    }

    /// Total number of edges across all observers.
    pub fn edge_count(&self) -> usize {
        self.entries.values().map(|v| v.edges.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds a [`VisibilityGraph`] from a pose snapshot.
#[derive(Debug, Clone)]
pub struct VisibilityGraphBuilder {
    raycast_distance: f64,
    proximity_threshold: f64,
}

impl VisibilityGraphBuilder {
    pub fn new(raycast_distance: f64, proximity_threshold: f64) -> Self {
        Self {
            raycast_distance,
            proximity_threshold,
        }
    }

    /// Recompute the whole graph.
    ///
    /// Without an oracle only proximity is computed; the graph has no edges.
    pub fn build(
        &self,
        snapshots: &[PoseSnapshot],
        oracle: Option<&dyn RayOracle>,
    ) -> VisibilityGraph {
        let registered: BTreeSet<ParticipantId> = snapshots.iter().map(|s| s.id).collect();
        let mut entries: BTreeMap<ParticipantId, ParticipantVisibility> = snapshots
            .iter()
            .map(|s| (s.id, ParticipantVisibility::default()))
            .collect();

        if let Some(oracle) = oracle {
            for observer in snapshots {
                let entry = entries.entry(observer.id).or_default();
                self.torso_pass(observer, snapshots, oracle, entry);
                self.gaze_pass(observer, &registered, oracle, entry);
            }

            // Observer sets only after every participant's ray tests ran.
            let gazes: Vec<(ParticipantId, ParticipantId)> = entries
                .iter()
                .filter_map(|(&id, v)| v.gaze_target.map(|t| (id, t)))
                .collect();
            for (observer, target) in gazes {
                if let Some(target_entry) = entries.get_mut(&target) {
                    target_entry.observers.insert(observer);
                }
            }
        }

        for me in snapshots {
            let nearby = self.nearby(me, snapshots);
            if let Some(entry) = entries.get_mut(&me.id) {
                entry.nearby = nearby;
            }
        }

        let graph = VisibilityGraph { entries };
        tracing::debug!(
            participants = graph.len(),
            edges = graph.edge_count(),
            mutual = graph.mutual_gaze_pairs().len(),
            "Visibility graph rebuilt"
        );
        graph
    }

    fn torso_pass(
        &self,
        me: &PoseSnapshot,
        snapshots: &[PoseSnapshot],
        oracle: &dyn RayOracle,
        entry: &mut ParticipantVisibility,
    ) {
        let Some(from) = me.pose.torso_anchor else {
            return;
        };

        for other in snapshots.iter().filter(|o| o.id != me.id) {
            let Some(to) = other.pose.torso_anchor else {
                continue;
            };
            let Some(ray) = Ray::between(from, to) else {
                continue;
            };
            let Some(hit) = oracle.raycast(&ray, self.raycast_distance) else {
                continue;
            };
            if hit.participant == Some(other.id) && !entry.has_edge_to(other.id) {
                entry.edges.push(VisibilityEdge {
                    observer: me.id,
                    target: other.id,
                    direction: ray.direction,
                    distance: hit.distance,
                    source: EdgeSource::Torso,
                });
            }
        }
    }

    fn gaze_pass(
        &self,
        me: &PoseSnapshot,
        registered: &BTreeSet<ParticipantId>,
        oracle: &dyn RayOracle,
        entry: &mut ParticipantVisibility,
    ) {
        let Some(view) = me.pose.viewpoint else {
            return;
        };
        let Some(direction) = view.direction.normalized() else {
            return;
        };
        let ray = Ray::new(view.origin, direction);
        let Some(hit) = oracle.raycast(&ray, self.raycast_distance) else {
            return;
        };

        // Colliders of deregistered avatars may linger in the host scene.
        let Some(target) = hit
            .participant
            .filter(|&p| p != me.id && registered.contains(&p))
        else {
            return;
        };

        entry.gaze_target = Some(target);
        if !entry.has_edge_to(target) {
            entry.edges.push(VisibilityEdge {
                observer: me.id,
                target,
                direction,
                distance: hit.distance,
                source: EdgeSource::Gaze,
            });
        }
    }

    fn nearby(&self, me: &PoseSnapshot, snapshots: &[PoseSnapshot]) -> Vec<Nearby> {
        snapshots
            .iter()
            .filter(|o| o.id != me.id)
            .map(|o| Nearby {
                id: o.id,
                distance: me.pose.position.distance_to(&o.pose.position),
            })
            .filter(|n| n.distance < self.proximity_threshold)
            .collect()
    }
}
