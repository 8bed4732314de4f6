use rand::Rng;

/// Control point offset used by `--human-motion`.
pub const HUMAN_JITTER: i32 = 20;

const MIN_STEPS: i32 = 10;
const MAX_STEPS: i32 = 50;

/// Points of a pointer glide from `start` to `end` along a cubic Bézier curve.
///
/// The control points sit on the thirds of the straight segment, each pushed by a
/// random offset in `-jitter..=jitter`, so `jitter == 0` yields a straight glide.
/// The first point is `start` and the last is exactly `end`.
pub fn path<R: Rng>(start: (i32, i32), end: (i32, i32), jitter: i32, rng: &mut R) -> Vec<(i32, i32)> {
    let (start_x, start_y) = start;
    let (end_x, end_y) = end;
    let jitter = jitter.abs();

    let control1_x = start_x + (end_x - start_x) / 3 + rng.gen_range(-jitter..=jitter);
    let control1_y = start_y + (end_y - start_y) / 3 + rng.gen_range(-jitter..=jitter);
    let control2_x = start_x + 2 * (end_x - start_x) / 3 + rng.gen_range(-jitter..=jitter);
    let control2_y = start_y + 2 * (end_y - start_y) / 3 + rng.gen_range(-jitter..=jitter);

    let dx = (end_x - start_x) as f64;
    let dy = (end_y - start_y) as f64;
    let steps = ((dx * dx + dy * dy).sqrt() / 2.0) as i32;
    let steps = steps.clamp(MIN_STEPS, MAX_STEPS);

    let bezier = |t: f64, p0: i32, p1: i32, p2: i32, p3: i32| -> i32 {
        let v = (1.0 - t).powi(3) * p0 as f64
            + 3.0 * (1.0 - t).powi(2) * t * p1 as f64
            + 3.0 * (1.0 - t) * t.powi(2) * p2 as f64
            + t.powi(3) * p3 as f64;
        v.round() as i32
    };

    let mut points: Vec<(i32, i32)> = (0..steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            (
                bezier(t, start_x, control1_x, control2_x, end_x),
                bezier(t, start_y, control1_y, control2_y, end_y),
            )
        })
        .collect();
    points.push(end);
    points
}
