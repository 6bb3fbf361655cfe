//! Light feature flags resolved from endpoint clusters

use std::collections::BTreeSet;
use std::ops::{BitOr, BitOrAssign};
use zha_core::zcl::{cluster, color};

/// Bit-set of features a light supports, resolved once at setup.
///
/// A feature bit is only ever set when the backing cluster is present on
/// the endpoint; the color bits additionally require the matching bit in
/// the color capabilities mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightFeatures(u32);

impl LightFeatures {
    pub const NONE: LightFeatures = LightFeatures(0);
    pub const BRIGHTNESS: LightFeatures = LightFeatures(1);
    pub const COLOR_TEMP: LightFeatures = LightFeatures(2);
    pub const RGB_COLOR: LightFeatures = LightFeatures(16);
    pub const TRANSITION: LightFeatures = LightFeatures(32);
    pub const XY_COLOR: LightFeatures = LightFeatures(64);

    /// Derive the feature set from an endpoint's input clusters and the
    /// color capabilities mask, when one could be read.
    pub fn resolve(in_clusters: &BTreeSet<u16>, color_capabilities: Option<u16>) -> Self {
        let mut features = Self::NONE;

        if in_clusters.contains(&cluster::LEVEL_CONTROL) {
            features |= Self::BRIGHTNESS | Self::TRANSITION;
        }

        if in_clusters.contains(&cluster::COLOR_CONTROL) {
            let mask = color_capabilities.unwrap_or(color::CAP_DEFAULT);
            if mask & color::CAP_COLOR_TEMP != 0 {
                features |= Self::COLOR_TEMP;
            }
            if mask & color::CAP_XY != 0 {
                features |= Self::XY_COLOR | Self::RGB_COLOR;
            }
        }

        features
    }

    /// Whether every bit in `other` is set
    pub fn contains(self, other: LightFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    /// The raw bit representation
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for LightFeatures {
    type Output = LightFeatures;

    fn bitor(self, rhs: LightFeatures) -> LightFeatures {
        LightFeatures(self.0 | rhs.0)
    }
}

impl BitOrAssign for LightFeatures {
    fn bitor_assign(&mut self, rhs: LightFeatures) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters(ids: &[u16]) -> BTreeSet<u16> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_level_cluster_gives_brightness_and_transition() {
        let features = LightFeatures::resolve(&clusters(&[cluster::ON_OFF]), None);
        assert_eq!(features, LightFeatures::NONE);

        let features =
            LightFeatures::resolve(&clusters(&[cluster::ON_OFF, cluster::LEVEL_CONTROL]), None);
        assert!(features.contains(LightFeatures::BRIGHTNESS));
        assert!(features.contains(LightFeatures::TRANSITION));
        assert!(!features.contains(LightFeatures::COLOR_TEMP));
    }

    #[test]
    fn test_color_capability_mask_combinations() {
        let color = clusters(&[cluster::ON_OFF, cluster::COLOR_CONTROL]);

        let features = LightFeatures::resolve(&color, Some(0x0000));
        assert!(!features.contains(LightFeatures::COLOR_TEMP));
        assert!(!features.contains(LightFeatures::XY_COLOR));

        let features = LightFeatures::resolve(&color, Some(0x0010));
        assert!(features.contains(LightFeatures::COLOR_TEMP));
        assert!(!features.contains(LightFeatures::XY_COLOR));

        let features = LightFeatures::resolve(&color, Some(0x0008));
        assert!(!features.contains(LightFeatures::COLOR_TEMP));
        assert!(features.contains(LightFeatures::XY_COLOR));
        assert!(features.contains(LightFeatures::RGB_COLOR));

        let features = LightFeatures::resolve(&color, Some(0x0018));
        assert!(features.contains(LightFeatures::COLOR_TEMP));
        assert!(features.contains(LightFeatures::XY_COLOR));
    }

    #[test]
    fn test_missing_mask_defaults_to_color_temp() {
        let color = clusters(&[cluster::ON_OFF, cluster::COLOR_CONTROL]);
        let features = LightFeatures::resolve(&color, None);
        assert!(features.contains(LightFeatures::COLOR_TEMP));
        assert!(!features.contains(LightFeatures::XY_COLOR));
    }

    #[test]
    fn test_mask_without_color_cluster_is_ignored() {
        let features = LightFeatures::resolve(&clusters(&[cluster::ON_OFF]), Some(0x0018));
        assert_eq!(features, LightFeatures::NONE);
    }
}
