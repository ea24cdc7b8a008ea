//! Object registry
//!
//! Every value an inverter exposes is addressed by a 32-bit object ID. The
//! registry maps IDs to names, data types and descriptions.

use crate::{
    core::{
        types::{DataType, ObjectGroup},
        value::Value,
    },
    error::{RctError, Result},
};
use serde::Serialize;
use std::{collections::HashMap, sync::LazyLock};

/// Description of a single object ID
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub group: ObjectGroup,
    pub object_id: u32,
    /// Position in the registry
    pub index: usize,
    pub name: &'static str,
    /// Type of the payload sent with write requests
    pub request_data_type: DataType,
    /// Type of the payload in responses
    pub response_data_type: DataType,
    pub description: Option<&'static str>,
    pub unit: Option<&'static str>,
    /// Value the simulator answers with
    pub sim_data: Option<Value>,
}

impl ObjectInfo {
    fn new(group: ObjectGroup, object_id: u32, name: &'static str, data_type: DataType) -> Self {
        Self {
            group,
            object_id,
            index: 0,
            name,
            request_data_type: data_type,
            response_data_type: data_type,
            description: None,
            unit: None,
            sim_data: None,
        }
    }

    fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    fn response(mut self, data_type: DataType) -> Self {
        self.response_data_type = data_type;
        self
    }

    fn sim(mut self, value: Value) -> Self {
        self.sim_data = Some(value);
        self
    }
}

/// Lookup tables over all known objects
#[derive(Debug)]
pub struct Registry {
    objects: Vec<ObjectInfo>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<&'static str, usize>,
    name_max_length: usize,
}

/// The registry of all known objects
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(|| Registry::new(known_objects()));

impl Registry {
    /// Build a registry, assigning indices in table order
    #[must_use]
    pub fn new(objects: Vec<ObjectInfo>) -> Self {
        let objects: Vec<ObjectInfo> = objects
            .into_iter()
            .enumerate()
            .map(|(index, info)| ObjectInfo { index, ..info })
            .collect();

        let by_id = objects
            .iter()
            .map(|info| (info.object_id, info.index))
            .collect();
        let by_name = objects.iter().map(|info| (info.name, info.index)).collect();
        let name_max_length = objects.iter().map(|info| info.name.len()).max().unwrap_or(0);

        Self {
            objects,
            by_id,
            by_name,
            name_max_length,
        }
    }

    /// Look up an object by its ID
    pub fn get_by_id(&self, object_id: u32) -> Result<&ObjectInfo> {
        self.by_id
            .get(&object_id)
            .map(|&index| &self.objects[index])
            .ok_or_else(|| RctError::unknown_object(format!("0x{object_id:08X}")))
    }

    /// Look up an object by its full name, including the group prefix
    pub fn get_by_name(&self, name: &str) -> Result<&ObjectInfo> {
        self.by_name
            .get(name)
            .map(|&index| &self.objects[index])
            .ok_or_else(|| RctError::unknown_object(name))
    }

    /// Names starting with `prefix`, or every name for an empty prefix
    #[must_use]
    pub fn prefix_complete_name(&self, prefix: &str) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .objects
            .iter()
            .map(|info| info.name)
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort_unstable();
        names
    }

    /// Length of the longest object name
    #[must_use]
    pub const fn name_max_length(&self) -> usize {
        self.name_max_length
    }

    pub fn all(&self) -> impl Iterator<Item = &ObjectInfo> {
        self.objects.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[allow(clippy::too_many_lines)]
fn known_objects() -> Vec<ObjectInfo> {
    use DataType as T;
    use ObjectGroup as G;

    vec![
        // device identity
        ObjectInfo::new(G::Other, 0xEBC62737, "android_description", T::String)
            .description("Device name")
            .sim(Value::String("RCT Simulator".into())),
        ObjectInfo::new(G::Other, 0x7924ABD9, "inverter_sn", T::String)
            .description("Inverter serial number")
            .sim(Value::String("0000000000".into())),
        ObjectInfo::new(G::Other, 0xDDD1C2D0, "svnversion", T::String)
            .description("Control software version"),
        ObjectInfo::new(G::PrimSm, 0x5F33284E, "prim_sm.state", T::Uint8)
            .description("Inverter status"),
        // battery
        ObjectInfo::new(G::Battery, 0x959930BF, "battery.soc", T::Float)
            .description("SOC (State of charge)")
            .sim(Value::Float(0.5)),
        ObjectInfo::new(G::Battery, 0x8B9FF008, "battery.soc_target", T::Float)
            .description("Target SOC"),
        ObjectInfo::new(G::Battery, 0xA7FA5C5D, "battery.voltage", T::Float)
            .description("Battery voltage")
            .unit("V"),
        ObjectInfo::new(G::Battery, 0x21961B58, "battery.current", T::Float)
            .description("Battery current")
            .unit("A"),
        ObjectInfo::new(G::Battery, 0x902AFAFB, "battery.temperature", T::Float)
            .description("Battery temperature")
            .unit("°C"),
        ObjectInfo::new(G::Battery, 0x70A2AF4F, "battery.bat_status", T::Int32)
            .description("Battery status"),
        ObjectInfo::new(G::Battery, 0x5570401B, "battery.stored_energy", T::Float)
            .description("Total energy flow into battery")
            .unit("Wh"),
        ObjectInfo::new(G::Battery, 0xA9033880, "battery.used_energy", T::Float)
            .description("Total energy flow from battery")
            .unit("Wh"),
        ObjectInfo::new(G::Battery, 0x682CDDA1, "battery.bms_sn", T::String)
            .description("BMS serial number"),
        // instantaneous power
        ObjectInfo::new(G::GSync, 0xDB2D69AE, "g_sync.p_ac_sum_lp", T::Float)
            .description("AC power")
            .unit("W"),
        ObjectInfo::new(G::GSync, 0x91617C58, "g_sync.p_ac_grid_sum_lp", T::Float)
            .description("Total grid power (positive: consumption, negative: feed-in)")
            .unit("W"),
        ObjectInfo::new(G::GSync, 0x1AC87AA0, "g_sync.p_ac_load_sum_lp", T::Float)
            .description("Load household - external power")
            .unit("W"),
        ObjectInfo::new(G::GSync, 0x400F015B, "g_sync.p_acc_lp", T::Float)
            .description("Battery power (positive: discharge, negative: charge)")
            .unit("W"),
        ObjectInfo::new(G::GSync, 0xCF053085, "g_sync.u_l_rms[0]", T::Float)
            .description("AC voltage phase 1")
            .unit("V"),
        ObjectInfo::new(G::GSync, 0x54B4684E, "g_sync.u_l_rms[1]", T::Float)
            .description("AC voltage phase 2")
            .unit("V"),
        ObjectInfo::new(G::GSync, 0x2545E22D, "g_sync.u_l_rms[2]", T::Float)
            .description("AC voltage phase 3")
            .unit("V"),
        ObjectInfo::new(G::GridPll, 0x1C4A665F, "grid_pll[0].f", T::Float)
            .description("Grid frequency")
            .unit("Hz")
            .sim(Value::Float(50.0)),
        // solar generators
        ObjectInfo::new(G::DcConv, 0xDB11855B, "dc_conv.dc_conv_struct[0].p_dc_lp", T::Float)
            .description("Solar generator A power")
            .unit("W"),
        ObjectInfo::new(G::DcConv, 0x0CB5D21B, "dc_conv.dc_conv_struct[1].p_dc_lp", T::Float)
            .description("Solar generator B power")
            .unit("W"),
        ObjectInfo::new(G::DcConv, 0xB298395D, "dc_conv.dc_conv_struct[0].u_sg_lp", T::Float)
            .description("Solar generator A voltage")
            .unit("V"),
        ObjectInfo::new(G::DcConv, 0x5BB8075A, "dc_conv.dc_conv_struct[1].u_sg_lp", T::Float)
            .description("Solar generator B voltage")
            .unit("V"),
        // energy counters
        ObjectInfo::new(G::Energy, 0xB1EF67CE, "energy.e_ac_total", T::Float)
            .description("Total energy")
            .unit("Wh"),
        ObjectInfo::new(G::Energy, 0xEFF4B537, "energy.e_load_total", T::Float)
            .description("Household total energy")
            .unit("Wh"),
        ObjectInfo::new(G::Energy, 0x44D4C533, "energy.e_grid_feed_total", T::Float)
            .description("Total energy fed into the grid")
            .unit("Wh"),
        ObjectInfo::new(G::Energy, 0x62FBE7DC, "energy.e_grid_load_total", T::Float)
            .description("Total energy drawn from the grid")
            .unit("Wh"),
        // temperatures
        ObjectInfo::new(G::Temperature, 0x90B53336, "temperature.sink_temp_power_reduction", T::Float)
            .description("Heat sink temperature target")
            .unit("°C"),
        ObjectInfo::new(G::Db, 0xC24E85D0, "db.core_temp", T::Float)
            .description("Core temperature")
            .unit("°C"),
        ObjectInfo::new(G::Db, 0xF79D41D9, "db.temp1", T::Float)
            .description("Heat sink temperature")
            .unit("°C"),
        // faults
        ObjectInfo::new(G::Fault, 0x37F9D5CA, "fault[0].flt", T::Uint32)
            .description("Error bit field 1"),
        ObjectInfo::new(G::Fault, 0x234B4736, "fault[1].flt", T::Uint32)
            .description("Error bit field 2"),
        ObjectInfo::new(G::Fault, 0x3B7FCD47, "fault[2].flt", T::Uint32)
            .description("Error bit field 3"),
        ObjectInfo::new(G::Fault, 0x7F813D73, "fault[3].flt", T::Uint32)
            .description("Error bit field 4"),
        // power management
        ObjectInfo::new(G::PowerMng, 0x6388556C, "power_mng.soc_strategy", T::Enum)
            .description("SOC target selection"),
        ObjectInfo::new(G::PowerMng, 0x4BC0F974, "power_mng.is_heiphoss", T::Bool)
            .description("HeiPhoss mode"),
        ObjectInfo::new(G::Wifi, 0x907CD1DF, "wifi.connect_service_max_duration", T::Int32)
            .description("Connection timeout")
            .unit("s"),
        ObjectInfo::new(G::Wifi, 0x27650FE2, "wifi.sockb_port", T::Uint16)
            .description("Server port"),
        // logged data, requested with a start timestamp
        ObjectInfo::new(G::Logger, 0x6F3876BC, "logger.minutes_ubat_log_ts", T::Int32)
            .response(T::TimeSeries)
            .description("Battery voltage log")
            .unit("V"),
        ObjectInfo::new(G::Logger, 0x2F0A6B15, "logger.day_egrid_load_log_ts", T::Int32)
            .response(T::TimeSeries)
            .description("Daily grid consumption log")
            .unit("Wh"),
        ObjectInfo::new(G::Logger, 0x5D34D09D, "logger.error_log_time_stamp", T::Int32)
            .response(T::EventTable)
            .description("Event log"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_and_names_are_unique() {
        let ids: HashSet<_> = REGISTRY.all().map(|info| info.object_id).collect();
        let names: HashSet<_> = REGISTRY.all().map(|info| info.name).collect();
        assert_eq!(ids.len(), REGISTRY.len());
        assert_eq!(names.len(), REGISTRY.len());
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let by_name = REGISTRY.get_by_name("battery.soc").unwrap();
        let by_id = REGISTRY.get_by_id(0x959930BF).unwrap();
        assert_eq!(by_name, by_id);
        assert_eq!(by_name.response_data_type, DataType::Float);
    }

    #[test]
    fn test_unknown_lookup_fails() {
        assert!(matches!(
            REGISTRY.get_by_id(0x00000001),
            Err(RctError::UnknownObject { .. })
        ));
        // names must match exactly, group prefix included
        assert!(REGISTRY.get_by_name("soc").is_err());
    }

    #[test]
    fn test_indices_follow_table_order() {
        for (position, info) in REGISTRY.all().enumerate() {
            assert_eq!(info.index, position);
        }
    }

    #[test]
    fn test_prefix_complete_name() {
        let names = REGISTRY.prefix_complete_name("battery.s");
        assert_eq!(
            names,
            vec!["battery.soc", "battery.soc_target", "battery.stored_energy"]
        );
        assert_eq!(REGISTRY.prefix_complete_name("").len(), REGISTRY.len());
        assert!(REGISTRY.prefix_complete_name("nothing.").is_empty());
    }

    #[test]
    fn test_name_max_length() {
        assert_eq!(
            REGISTRY.name_max_length(),
            "temperature.sink_temp_power_reduction".len()
        );
    }

    #[test]
    fn test_response_type_defaults_to_request_type() {
        let info = REGISTRY.get_by_name("logger.minutes_ubat_log_ts").unwrap();
        assert_eq!(info.request_data_type, DataType::Int32);
        assert_eq!(info.response_data_type, DataType::TimeSeries);

        let info = REGISTRY.get_by_name("wifi.sockb_port").unwrap();
        assert_eq!(info.request_data_type, info.response_data_type);
    }
}
