//! Keyframe timelines for squash/stretch and despawn effects
//!
//! Each entity owns at most one deformation timeline and one despawn timeline.
//! Timelines are sampled against the simulated clock every frame, so they keep
//! their place while the engine is paused and never block the step.

use std::f32::consts::PI;

/// Easing strategy: maps linear progress in [0, 1] to eased progress
pub trait Easing {
    fn ease(&self, t: f32) -> f32;
}

/// Built-in easing curves
#[derive(Debug, Clone, Copy)]
pub enum Ease {
    Linear,
    QuadIn,
    QuadOut,
    /// Springy settle, used for the deformation rebound
    ElasticOut,
    Custom(fn(f32) -> f32),
}

impl Easing for Ease {
    fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadIn => t * t,
            Ease::QuadOut => t * (2.0 - t),
            Ease::ElasticOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Ease::Custom(f) => f(t),
        }
    }
}

/// Animated visual properties of an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
}

impl Pose {
    pub const REST: Pose = Pose {
        scale_x: 1.0,
        scale_y: 1.0,
        opacity: 1.0,
    };

    fn lerp(&self, to: &Pose, t: f32) -> Pose {
        Pose {
            scale_x: self.scale_x + (to.scale_x - self.scale_x) * t,
            scale_y: self.scale_y + (to.scale_y - self.scale_y) * t,
            opacity: self.opacity + (to.opacity - self.opacity) * t,
        }
    }
}

/// One segment of a timeline: tween toward `target` over `duration_ms`
#[derive(Debug, Clone, Copy)]
pub struct Keyframe {
    pub target: Pose,
    pub duration_ms: f64,
    pub ease: Ease,
}

impl Keyframe {
    pub fn new(target: Pose, duration_ms: f64, ease: Ease) -> Self {
        Self {
            target,
            duration_ms: duration_ms.max(0.0),
            ease,
        }
    }
}

/// A sequence of keyframes started at a point in simulated time
#[derive(Debug, Clone)]
pub struct Timeline {
    from: Pose,
    keys: Vec<Keyframe>,
    started_at: f64,
}

/// Result of sampling a timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub pose: Pose,
    pub finished: bool,
}

impl Timeline {
    pub fn new(from: Pose, keys: Vec<Keyframe>, now: f64) -> Self {
        Self {
            from,
            keys,
            started_at: now,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.keys.iter().map(|k| k.duration_ms).sum()
    }

    /// Pose at time `now`. Past the end, the last target is held.
    pub fn sample(&self, now: f64) -> Sample {
        let mut elapsed = (now - self.started_at).max(0.0);
        let mut from = self.from;

        for key in &self.keys {
            if elapsed < key.duration_ms {
                let t = (elapsed / key.duration_ms) as f32;
                return Sample {
                    pose: from.lerp(&key.target, key.ease.ease(t)),
                    finished: false,
                };
            }
            elapsed -= key.duration_ms;
            from = key.target;
        }

        Sample {
            pose: from,
            finished: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        let curves = [Ease::Linear, Ease::QuadIn, Ease::QuadOut, Ease::ElasticOut];
        for curve in curves {
            assert!(curve.ease(0.0).abs() < 1e-5, "{:?} at 0", curve);
            assert!((curve.ease(1.0) - 1.0).abs() < 1e-5, "{:?} at 1", curve);
        }
    }

    #[test]
    fn test_custom_easing() {
        fn step(t: f32) -> f32 {
            if t < 0.5 { 0.0 } else { 1.0 }
        }
        let ease = Ease::Custom(step);
        assert_eq!(ease.ease(0.4), 0.0);
        assert_eq!(ease.ease(0.6), 1.0);
    }

    #[test]
    fn test_timeline_phases() {
        let squash = Pose {
            scale_x: 0.5,
            scale_y: 1.5,
            opacity: 1.0,
        };
        let timeline = Timeline::new(
            Pose::REST,
            vec![
                Keyframe::new(squash, 100.0, Ease::Linear),
                Keyframe::new(Pose::REST, 100.0, Ease::Linear),
            ],
            1000.0,
        );
        assert_eq!(timeline.duration_ms(), 200.0);

        let mid = timeline.sample(1050.0);
        assert!(!mid.finished);
        assert!((mid.pose.scale_x - 0.75).abs() < 1e-5);

        let peak = timeline.sample(1100.0);
        assert!((peak.pose.scale_x - 0.5).abs() < 1e-5);

        let done = timeline.sample(1300.0);
        assert!(done.finished);
        assert_eq!(done.pose, Pose::REST);

        // Sampling before the start holds the initial pose
        assert_eq!(timeline.sample(900.0).pose, Pose::REST);
    }
}
