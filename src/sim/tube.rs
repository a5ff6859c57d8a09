//! Tube streaming: the window of live segments and everything in them
//!
//! The simulation works in a *view frame*: the tracking point on the current
//! curve is pinned to the origin and the current tangent points down -Z. Each
//! frame every segment root and entity is translated by the path motion and
//! rotated about the origin by the heading correction, which is exactly what
//! rotating a parent group would do. The player rides `forward_offset` ahead
//! of the tracking point, so comparing against it only needs that offset.

use std::collections::VecDeque;

use glam::Vec3;
use rand_pcg::Pcg32;

use super::curve::{CurveGenerator, SegmentPath, Turn};
use super::entity::{Entity, EntityClass};
use super::spawner::Spawner;
use crate::rotate_y;
use crate::tuning::Tuning;

/// Live segments kept ahead of (and including) the current one
pub const LOOKAHEAD: usize = 2;

/// View-frame transform of a segment's local frame (its mesh root)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentRoot {
    pub pos: Vec3,
    pub yaw: f32,
}

impl SegmentRoot {
    /// Local point to view frame
    #[inline]
    pub fn to_view(&self, local: Vec3) -> Vec3 {
        self.pos + rotate_y(local, self.yaw)
    }
}

/// One tube piece and the entities spawned along it
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: u32,
    pub path: SegmentPath,
    pub root: SegmentRoot,
    entities: [Vec<Entity>; EntityClass::COUNT],
}

impl Segment {
    pub fn new(id: u32, path: SegmentPath, root: SegmentRoot) -> Self {
        Self {
            id,
            path,
            root,
            entities: Default::default(),
        }
    }

    #[inline]
    pub fn turn(&self) -> Turn {
        self.path.turn
    }

    pub fn push(&mut self, entity: Entity) {
        self.entities[entity.class().index()].push(entity);
    }

    #[inline]
    pub fn entities(&self, class: EntityClass) -> &[Entity] {
        &self.entities[class.index()]
    }

    #[inline]
    pub fn entities_mut(&mut self, class: EntityClass) -> &mut [Entity] {
        &mut self.entities[class.index()]
    }

    /// Live entities of one type
    #[inline]
    pub fn count(&self, class: EntityClass) -> usize {
        self.entities[class.index()].len()
    }

    pub fn total(&self) -> usize {
        self.entities.iter().map(Vec::len).sum()
    }

    /// Remove by index; stale indices are a no-op
    pub fn remove(&mut self, class: EntityClass, index: usize) -> Option<Entity> {
        let list = &mut self.entities[class.index()];
        (index < list.len()).then(|| list.remove(index))
    }

    /// Translate then rotate about the view origin
    fn shift(&mut self, motion: Vec3, dyaw: f32) {
        self.root.pos = rotate_y(self.root.pos + motion, dyaw);
        self.root.yaw += dyaw;
        for list in &mut self.entities {
            for e in list.iter_mut() {
                e.pos = rotate_y(e.pos + motion, dyaw);
            }
        }
    }

    fn rotate(&mut self, dyaw: f32) {
        self.shift(Vec3::ZERO, dyaw);
    }
}

/// Address of an entity inside the collision window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntitySlot {
    /// 0 = current segment, 1 = next
    pub segment: usize,
    pub index: usize,
}

/// What one `advance` call changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Id of a segment whose deferred retirement ran
    pub retired: Option<u32>,
    /// Id of a segment appended because the current one ran out
    pub appended: Option<u32>,
}

/// Owns the segment window and streams it past the player
#[derive(Debug, Clone)]
pub struct TubeManager {
    /// Oldest first. May hold one retiring segment in front of `current`.
    segments: VecDeque<Segment>,
    current: usize,
    /// Distance along the current segment
    traveled: f32,
    /// Heading angle sampled last frame
    prev_angle: f32,
    /// Running heading correction applied to the whole window
    window_yaw: f32,
    /// Segment whose removal waits for the guard distance
    pending_retire: Option<u32>,
    retire_guard: f32,
    forward_offset: f32,
    generator: CurveGenerator,
    spawner: Spawner,
    next_segment_id: u32,
    next_entity_id: u32,
}

impl TubeManager {
    /// Build the opening window (current + next)
    pub fn new(tuning: &Tuning, rng: &mut Pcg32) -> Self {
        let mut tube = Self {
            segments: VecDeque::with_capacity(LOOKAHEAD + 1),
            current: 0,
            traveled: 0.0,
            prev_angle: 0.0,
            window_yaw: 0.0,
            pending_retire: None,
            retire_guard: tuning.retire_guard,
            forward_offset: tuning.forward_offset,
            generator: CurveGenerator::new(tuning),
            spawner: Spawner::new(tuning),
            next_segment_id: 1,
            next_entity_id: 1,
        };
        let clearance = tuning.forward_offset + tuning.start_clearance;
        tube.append_segment(clearance, rng);
        while tube.segments.len() < LOOKAHEAD {
            tube.append_segment(0.0, rng);
        }
        tube
    }

    /// Generate, place and populate the next segment at the far end
    fn append_segment(&mut self, clear_until: f32, rng: &mut Pcg32) -> u32 {
        let (path, root) = match self.segments.back() {
            Some(last) => {
                let path = self.generator.generate(Some(last.path.end()), rng);
                let root = SegmentRoot {
                    pos: last.root.to_view(last.path.curve.point(1.0)),
                    yaw: last.root.yaw + last.path.turn_angle,
                };
                (path, root)
            }
            None => (self.generator.generate(None, rng), SegmentRoot::default()),
        };

        let id = self.next_segment_id;
        self.next_segment_id += 1;
        let mut segment = Segment::new(id, path, root);
        self.spawner
            .populate(&mut segment, clear_until, rng, &mut self.next_entity_id);

        log::debug!(
            "Appended segment {} ({:?}, {:.1} long, turn {:.2})",
            id,
            segment.turn(),
            segment.path.length(),
            segment.path.turn_angle
        );
        self.segments.push_back(segment);
        id
    }

    /// Move the window by `delta` along the current curve
    pub fn advance(&mut self, delta: f32, rng: &mut Pcg32) -> AdvanceReport {
        let mut report = AdvanceReport {
            retired: self.flush_retirement(),
            ..Default::default()
        };

        let delta = delta.max(0.0);
        let (motion, turn, angle) = {
            let seg = self.current_segment();
            let curve = &seg.path.curve;
            let length = curve.length();
            let here = curve.point_at(self.traveled);
            let ahead = curve.point_at((self.traveled + delta).min(length));
            let motion = rotate_y(here - ahead, seg.root.yaw);

            let angle = curve.heading_angle_at((self.traveled + delta * 0.5).min(length));
            (motion, seg.turn(), angle)
        };
        let dyaw = self.heading_delta(turn, angle);

        self.window_yaw += dyaw;
        for seg in &mut self.segments {
            seg.shift(motion, dyaw);
        }
        self.traveled += delta;

        if self.traveled >= self.current_segment().path.length() {
            report.appended = Some(self.on_segment_exhausted(rng));
        }
        report
    }

    /// Signed correction from the last sampled angle to `angle`; updates it
    fn heading_delta(&mut self, turn: Turn, angle: f32) -> f32 {
        let dyaw = match turn {
            Turn::Left => self.prev_angle - angle,
            Turn::Right => angle - self.prev_angle,
        };
        self.prev_angle = angle;
        dyaw
    }

    /// Roll over to the next segment and stream a new one in
    fn on_segment_exhausted(&mut self, rng: &mut Pcg32) -> u32 {
        // Finish the heading correction for the tail we skipped over
        let (turn, end_angle) = {
            let seg = self.current_segment();
            (seg.turn(), seg.path.curve.heading_angle_at(seg.path.length()))
        };
        let residual = self.heading_delta(turn, end_angle);
        self.window_yaw += residual;
        for seg in &mut self.segments {
            seg.rotate(residual);
        }

        self.traveled = 0.0;
        self.prev_angle = 0.0;

        // Never let two retirements stack up
        if self.pending_retire.is_some() {
            self.retire_front();
        }

        let id = self.append_segment(0.0, rng);
        self.current += 1;
        if let Some(oldest) = self.segments.front().map(|s| s.id) {
            self.retire(oldest);
        }
        log::info!(
            "Entered segment {} (window of {})",
            self.current_segment().id,
            self.segments.len()
        );
        id
    }

    /// Request deferred removal of the oldest segment.
    ///
    /// Only the oldest segment may be retired; other ids are ignored.
    pub fn retire(&mut self, id: u32) {
        let is_oldest = self.segments.front().is_some_and(|s| s.id == id);
        // The oldest segment is only retirable once the player has left it
        if is_oldest && self.current > 0 {
            self.pending_retire = Some(id);
        }
    }

    /// Run a pending retirement once the guard distance has been covered
    pub fn flush_retirement(&mut self) -> Option<u32> {
        if self.pending_retire.is_some() && self.traveled >= self.retire_guard {
            self.retire_front()
        } else {
            None
        }
    }

    fn retire_front(&mut self) -> Option<u32> {
        self.pending_retire = None;
        if self.current == 0 {
            return None;
        }
        let seg = self.segments.pop_front()?;
        self.current -= 1;
        log::debug!("Retired segment {} ({} entities left behind)", seg.id, seg.total());
        Some(seg.id)
    }

    // === Entity access ===

    /// Segment at window offset (0 = current, 1 = next)
    #[inline]
    pub fn window_segment(&self, offset: usize) -> Option<&Segment> {
        if offset >= LOOKAHEAD {
            return None;
        }
        self.segments.get(self.current + offset)
    }

    #[inline]
    fn window_segment_mut(&mut self, offset: usize) -> Option<&mut Segment> {
        if offset >= LOOKAHEAD {
            return None;
        }
        self.segments.get_mut(self.current + offset)
    }

    /// Every live entity of `class` in the collision window, in scan order
    pub fn scan(&self, class: EntityClass) -> impl Iterator<Item = (EntitySlot, &Entity)> {
        (0..LOOKAHEAD).flat_map(move |offset| {
            self.window_segment(offset)
                .map(|seg| seg.entities(class))
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(move |(index, e)| (EntitySlot { segment: offset, index }, e))
        })
    }

    pub fn entity(&self, class: EntityClass, slot: EntitySlot) -> Option<&Entity> {
        self.window_segment(slot.segment)?.entities(class).get(slot.index)
    }

    pub fn entity_mut(&mut self, class: EntityClass, slot: EntitySlot) -> Option<&mut Entity> {
        self.window_segment_mut(slot.segment)?
            .entities_mut(class)
            .get_mut(slot.index)
    }

    /// Remove one entity; its segment's count drops with it
    pub fn remove_entity(&mut self, class: EntityClass, slot: EntitySlot) -> Option<Entity> {
        self.window_segment_mut(slot.segment)?.remove(class, slot.index)
    }

    /// Remove an antibody, tolerating an index that is already gone
    pub fn remove_antibody(&mut self, slot: EntitySlot) -> Option<Entity> {
        self.remove_entity(EntityClass::Antibody, slot)
    }

    /// Per-type count for a window segment
    pub fn count(&self, offset: usize, class: EntityClass) -> usize {
        self.window_segment(offset).map_or(0, |s| s.count(class))
    }

    /// Entity position in the player's frame
    #[inline]
    pub fn player_frame(&self, view_pos: Vec3) -> Vec3 {
        view_pos + Vec3::Z * self.forward_offset
    }

    /// Player-frame point back into the view frame
    #[inline]
    pub fn view_frame(&self, player_pos: Vec3) -> Vec3 {
        player_pos - Vec3::Z * self.forward_offset
    }

    /// Drop every `class` entity within `radius` of a player-frame point
    pub fn clear_near(&mut self, class: EntityClass, point: Vec3, radius: f32) -> usize {
        let target = self.view_frame(point);
        let mut removed = 0;
        for offset in 0..LOOKAHEAD {
            if let Some(seg) = self.window_segment_mut(offset) {
                let list = &mut seg.entities[class.index()];
                let before = list.len();
                list.retain(|e| e.pos.distance(target) >= radius + e.radius);
                removed += before - list.len();
            }
        }
        removed
    }

    // === Window state ===

    #[inline]
    pub fn current_segment(&self) -> &Segment {
        &self.segments[self.current]
    }

    #[cfg(test)]
    pub(crate) fn current_segment_mut(&mut self) -> &mut Segment {
        &mut self.segments[self.current]
    }

    /// All live segments, oldest first (includes one awaiting retirement)
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn traveled(&self) -> f32 {
        self.traveled
    }

    #[inline]
    pub fn prev_angle(&self) -> f32 {
        self.prev_angle
    }

    #[inline]
    pub fn window_yaw(&self) -> f32 {
        self.window_yaw
    }

    #[inline]
    pub fn pending_retirement(&self) -> Option<u32> {
        self.pending_retire
    }

    #[inline]
    pub fn forward_offset(&self) -> f32 {
        self.forward_offset
    }

    /// Newest segment id
    pub fn newest_id(&self) -> Option<u32> {
        self.segments.back().map(|s| s.id)
    }
}
