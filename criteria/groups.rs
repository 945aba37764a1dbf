//! # Shaft-Speed Grouping and Angular-Speed Derivation
//!
//! Reference engines are pooled for regression by shaft-speed class. Four
//! disjoint, half-open rpm ranges are defined; an engine whose shaft speed
//! falls outside all of them cannot be calibrated and callers must treat the
//! missing assignment as a validation failure rather than proceed.
//!
//! The derived angular speed (omega) is a *group-level* scalar: the mean
//! shaft speed of the group's members converted to rad/s. Every engine of a
//! group shares the same omega; it is never stored back onto engine records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four shaft-speed class ranges, in rpm, as `[lower, upper)` pairs.
/// Class ids are the 1-based positions in this table.
const GROUP_RANGES: [(f64, f64); 4] = [
    (0.0, 500.0),
    (500.0, 750.0),
    (750.0, 1500.0),
    (1500.0, 10000.0),
];

/// A validated shaft-speed class id in `1..=4`.
///
/// Construction goes through [`assign_group`] or [`Group::try_from`]; there
/// is no "ungrouped" sentinel value — absence is modelled as `None` at the
/// assignment site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Group(u8);

impl Group {
    /// The 1-based class id.
    pub fn id(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Group {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        if (1..=GROUP_RANGES.len() as u8).contains(&id) {
            Ok(Group(id))
        } else {
            Err(format!(
                "shaft-speed group id must be in 1..={}, got {id}",
                GROUP_RANGES.len()
            ))
        }
    }
}

impl From<Group> for u8 {
    fn from(group: Group) -> u8 {
        group.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps a shaft speed in rpm to its class, or `None` when the speed lies
/// outside every range (negative, non-finite, or >= 10000 rpm).
pub fn assign_group(shaft_speed: f64) -> Option<Group> {
    GROUP_RANGES
        .iter()
        .position(|&(lower, upper)| shaft_speed >= lower && shaft_speed < upper)
        .map(|index| Group(index as u8 + 1))
}

/// Derives the angular speed shared by a group: `mean(shaft_speed) * pi / 30`.
///
/// The slice holds the shaft speeds of every member of one group and must be
/// non-empty; callers form groups before deriving omega.
pub fn derive_omega(shaft_speeds: &[f64]) -> f64 {
    debug_assert!(!shaft_speeds.is_empty());
    let mean = shaft_speeds.iter().sum::<f64>() / shaft_speeds.len() as f64;
    mean * std::f64::consts::PI / 30.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn assignment_matches_documented_ranges() {
        assert_eq!(assign_group(0.0), Some(Group(1)));
        assert_eq!(assign_group(499.999), Some(Group(1)));
        assert_eq!(assign_group(500.0), Some(Group(2)));
        assert_eq!(assign_group(749.0), Some(Group(2)));
        assert_eq!(assign_group(750.0), Some(Group(3)));
        assert_eq!(assign_group(1499.999), Some(Group(3)));
        assert_eq!(assign_group(1500.0), Some(Group(4)));
        assert_eq!(assign_group(9999.999), Some(Group(4)));
    }

    #[test]
    fn out_of_range_speeds_are_unassigned() {
        assert_eq!(assign_group(-1.0), None);
        assert_eq!(assign_group(10000.0), None);
        assert_eq!(assign_group(f64::NAN), None);
        assert_eq!(assign_group(f64::INFINITY), None);
    }

    #[test]
    fn assignment_is_deterministic() {
        for speed in [0.0, 250.0, 500.0, 750.0, 1500.0, 9000.0] {
            assert_eq!(assign_group(speed), assign_group(speed));
        }
    }

    #[test]
    fn omega_is_the_mean_speed_in_rad_per_s() {
        // mean(500, 600) = 550 rpm -> 550 * pi / 30 rad/s
        let omega = derive_omega(&[500.0, 600.0]);
        assert_abs_diff_eq!(omega, 550.0 * std::f64::consts::PI / 30.0, epsilon = 1e-12);
    }

    #[test]
    fn groups_with_different_mean_speeds_get_different_omega() {
        let low = derive_omega(&[500.0, 600.0]);
        let high = derive_omega(&[800.0, 900.0]);
        assert!(high > low);
    }

    #[test]
    fn group_id_round_trips_through_u8() {
        let group = Group::try_from(3).unwrap();
        assert_eq!(group.id(), 3);
        assert_eq!(u8::from(group), 3);
        assert!(Group::try_from(0).is_err());
        assert!(Group::try_from(5).is_err());
    }
}
