use serde::Deserialize;
use std::time::Duration;

/// Obstacle distance seen by one sensor over time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObstacleProfile {
    Fixed { distance_cm: f32 },
    /// Triangle wave between `near_cm` and `far_cm`, starting far.
    Sweep { near_cm: f32, far_cm: f32, period_ms: u64 },
}

impl ObstacleProfile {
    pub fn distance_cm(&self, elapsed: Duration) -> f32 {
        match *self {
            ObstacleProfile::Fixed { distance_cm } => distance_cm,
            ObstacleProfile::Sweep {
                near_cm,
                far_cm,
                period_ms,
            } => {
                let period = period_ms.max(1);
                let phase = (elapsed.as_millis() % u128::from(period)) as f32 / period as f32;
                let closeness = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
                far_cm + (near_cm - far_cm) * closeness
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChannelWorld {
    pub profile: ObstacleProfile,
    /// Swallow every Nth echo; 0 never does.
    pub dropout_every: u32,
}

impl Default for ChannelWorld {
    fn default() -> Self {
        ChannelWorld {
            profile: ObstacleProfile::Fixed { distance_cm: 150.0 },
            dropout_every: 0,
        }
    }
}

impl ChannelWorld {
    /// Whether ping number `n` (counting from 1) gets no echo.
    pub fn drops(&self, n: u64) -> bool {
        self.dropout_every != 0 && n % u64::from(self.dropout_every) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f32 = 1e-3;

    #[test]
    fn test_fixed_profile() {
        let p = ObstacleProfile::Fixed { distance_cm: 42.0 };
        assert_eq!(p.distance_cm(Duration::ZERO), 42.0);
        assert_eq!(p.distance_cm(Duration::from_secs(100)), 42.0);
    }

    #[test]
    fn test_sweep_profile() {
        let p = ObstacleProfile::Sweep { near_cm: 20.0, far_cm: 120.0, period_ms: 1000 };
        assert!((p.distance_cm(Duration::ZERO) - 120.0).abs() < EPSILON);
        assert!((p.distance_cm(Duration::from_millis(250)) - 70.0).abs() < EPSILON);
        assert!((p.distance_cm(Duration::from_millis(500)) - 20.0).abs() < EPSILON);
        assert!((p.distance_cm(Duration::from_millis(750)) - 70.0).abs() < EPSILON);
        assert!((p.distance_cm(Duration::from_millis(1000)) - 120.0).abs() < EPSILON);
    }

    #[test]
    fn test_dropouts() {
        let never = ChannelWorld::default();
        assert!((1..100).all(|n| !never.drops(n)));

        let every_third = ChannelWorld { dropout_every: 3, ..ChannelWorld::default() };
        let dropped: Vec<u64> = (1..=9).filter(|n| every_third.drops(*n)).collect();
        assert_eq!(dropped, vec![3, 6, 9]);
    }
}
