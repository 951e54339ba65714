//! Target selection helpers.

use bevy::prelude::*;

/// Nearest candidate strictly closer than `max_radius`.
///
/// Linear scan; a candidate replaces the current best only when strictly
/// closer, so ties keep the first one encountered.
pub fn find_nearest<T: Copy>(
    origin: Vec2,
    candidates: impl IntoIterator<Item = (T, Vec2)>,
    max_radius: f32,
) -> Option<(T, Vec2)> {
    let mut best: Option<(T, Vec2)> = None;
    let mut best_distance = max_radius;

    for (candidate, position) in candidates {
        let distance = origin.distance(position);
        if distance < best_distance {
            best_distance = distance;
            best = Some((candidate, position));
        }
    }

    best
}

/// Distance from `point` to the segment `start..end`, and how far along the
/// segment (0..1) the closest point lies.
pub fn segment_distance(start: Vec2, end: Vec2, point: Vec2) -> (f32, f32) {
    let travel = end - start;
    let length_sq = travel.length_squared();
    if length_sq <= f32::EPSILON {
        return (start.distance(point), 0.0);
    }
    let t = ((point - start).dot(travel) / length_sq).clamp(0.0, 1.0);
    (point.distance(start + travel * t), t)
}

/// First circle touched by a circle of `radius` swept from `start` to `end`.
pub fn first_swept_hit<T: Copy>(
    start: Vec2,
    end: Vec2,
    radius: f32,
    candidates: impl IntoIterator<Item = (T, Vec2, f32)>,
) -> Option<T> {
    let mut best: Option<(T, f32)> = None;
    for (candidate, position, candidate_radius) in candidates {
        let (distance, along) = segment_distance(start, end, position);
        if distance <= radius + candidate_radius {
            let closer = best.map_or(true, |(_, best_along)| along < best_along);
            if closer {
                best = Some((candidate, along));
            }
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_within_radius() {
        let candidates = [(1, Vec2::new(5.0, 0.0)), (2, Vec2::new(2.0, 0.0)), (3, Vec2::new(0.0, 8.0))];
        let found = find_nearest(Vec2::ZERO, candidates, 10.0);
        assert_eq!(found.map(|(id, _)| id), Some(2));
    }

    #[test]
    fn test_nothing_inside_radius() {
        let candidates = [(1, Vec2::new(5.0, 0.0))];
        assert!(find_nearest(Vec2::ZERO, candidates, 5.0).is_none());
        assert!(find_nearest::<u32>(Vec2::ZERO, [], 100.0).is_none());
    }

    #[test]
    fn test_ties_keep_first_encountered() {
        let candidates = [(7, Vec2::new(3.0, 0.0)), (8, Vec2::new(-3.0, 0.0)), (9, Vec2::new(0.0, 3.0))];
        let found = find_nearest(Vec2::ZERO, candidates, 10.0);
        assert_eq!(found.map(|(id, _)| id), Some(7));
    }

    #[test]
    fn test_swept_hit_prefers_earliest_along_path() {
        let candidates = [
            ("far", Vec2::new(4.0, 0.2), 0.5),
            ("near", Vec2::new(1.0, -0.2), 0.5),
            ("off", Vec2::new(2.0, 5.0), 0.5),
        ];
        let hit = first_swept_hit(Vec2::ZERO, Vec2::new(5.0, 0.0), 0.35, candidates);
        assert_eq!(hit, Some("near"));
    }
}
