//! Zigbee Cluster Library constants
//!
//! Cluster, attribute, and command identifiers used by the entity layer.
//! Only the clusters the bridge actually adapts are listed here.

/// Cluster identifiers from the ZCL specification
pub mod cluster {
    pub const BASIC: u16 = 0x0000;
    pub const POWER_CONFIGURATION: u16 = 0x0001;
    pub const IDENTIFY: u16 = 0x0003;
    pub const ON_OFF: u16 = 0x0006;
    pub const LEVEL_CONTROL: u16 = 0x0008;
    pub const COLOR_CONTROL: u16 = 0x0300;
    pub const ILLUMINANCE_MEASUREMENT: u16 = 0x0400;
    pub const TEMPERATURE_MEASUREMENT: u16 = 0x0402;
    pub const PRESSURE_MEASUREMENT: u16 = 0x0403;
    pub const RELATIVE_HUMIDITY: u16 = 0x0405;
    pub const METERING: u16 = 0x0702;
}

/// OnOff cluster (0x0006) attributes and commands
pub mod on_off {
    pub const ATTR_ON_OFF: u16 = 0x0000;

    pub const CMD_OFF: u8 = 0x00;
    pub const CMD_ON: u8 = 0x01;
    pub const CMD_TOGGLE: u8 = 0x02;
}

/// Level Control cluster (0x0008) attributes and commands
pub mod level {
    pub const ATTR_CURRENT_LEVEL: u16 = 0x0000;

    pub const CMD_MOVE_TO_LEVEL_WITH_ON_OFF: u8 = 0x04;
}

/// Color Control cluster (0x0300) attributes, commands, and capability bits
pub mod color {
    pub const ATTR_CURRENT_X: u16 = 0x0003;
    pub const ATTR_CURRENT_Y: u16 = 0x0004;
    pub const ATTR_COLOR_TEMPERATURE: u16 = 0x0007;
    pub const ATTR_COLOR_CAPABILITIES: u16 = 0x400A;

    pub const CMD_MOVE_TO_COLOR: u8 = 0x07;
    pub const CMD_MOVE_TO_COLOR_TEMP: u8 = 0x0A;

    /// ColorCapabilities bit for CIE 1931 xy support
    pub const CAP_XY: u16 = 0x0008;
    /// ColorCapabilities bit for color temperature support
    pub const CAP_COLOR_TEMP: u16 = 0x0010;

    /// Capabilities assumed when the attribute cannot be read. Most bulbs
    /// that expose a Color Control cluster at least support color
    /// temperature.
    pub const CAP_DEFAULT: u16 = CAP_COLOR_TEMP;
}

/// Shared measurement cluster attributes. Temperature (0x0402), pressure
/// (0x0403), humidity (0x0405), and illuminance (0x0400) all report through
/// MeasuredValue.
pub mod measurement {
    pub const ATTR_MEASURED_VALUE: u16 = 0x0000;
}

/// Smart Energy Metering cluster (0x0702)
pub mod metering {
    pub const ATTR_CURRENT_SUMM_DELIVERED: u16 = 0x0000;

    /// Well-known names from the Reading Information attribute set.
    ///
    /// Meters expose an arbitrary subset of these, so lookups fall back to
    /// a numeric name for anything unlisted.
    pub fn attribute_name(id: u16) -> Option<&'static str> {
        match id {
            0x0000 => Some("current_summ_delivered"),
            0x0001 => Some("current_summ_received"),
            0x0002 => Some("current_max_demand_delivered"),
            0x0003 => Some("current_max_demand_received"),
            0x0004 => Some("dft_summ"),
            0x0005 => Some("daily_freeze_time"),
            0x0006 => Some("power_factor"),
            0x0007 => Some("reading_snapshot_time"),
            0x0008 => Some("current_max_demand_delivered_time"),
            0x0009 => Some("current_max_demand_received_time"),
            0x000A => Some("default_update_period"),
            0x000B => Some("fast_poll_update_period"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_ids() {
        assert_eq!(cluster::ON_OFF, 0x0006);
        assert_eq!(cluster::COLOR_CONTROL, 0x0300);
        assert_eq!(cluster::METERING, 0x0702);
    }

    #[test]
    fn test_color_capability_bits() {
        assert_eq!(color::CAP_XY | color::CAP_COLOR_TEMP, 0x0018);
        assert_eq!(color::CAP_DEFAULT, color::CAP_COLOR_TEMP);
    }

    #[test]
    fn test_metering_attribute_names() {
        assert_eq!(
            metering::attribute_name(0x0000),
            Some("current_summ_delivered")
        );
        assert_eq!(metering::attribute_name(0x0006), Some("power_factor"));
        assert_eq!(metering::attribute_name(0x0100), None);
    }
}
