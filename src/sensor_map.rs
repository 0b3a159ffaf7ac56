// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Caller-supplied sensor name mapping, applied last during emission.

use std::collections::HashMap;

/// Built-in logical-name -> internal-field-name mapping, covering the
/// nine temperature/humidity channel pairs plus the two summary fields.
pub fn default_sensor_map() -> HashMap<String, String> {
    let mut map = HashMap::new();
    for ch in 0..9 {
        map.insert(format!("temp{ch}"), format!("temp{ch}"));
        map.insert(format!("humidity{ch}"), format!("humidity{ch}"));
        map.insert(format!("batteryStatus{ch}"), format!("batteryStatus{ch}"));
    }
    map.insert("rxCheckPercent".to_string(), "rxCheckPercent".to_string());
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_covers_all_channels() {
        let map = default_sensor_map();
        for ch in 0..9 {
            assert!(map.contains_key(&format!("temp{ch}")));
            assert!(map.contains_key(&format!("humidity{ch}")));
        }
        assert!(map.contains_key("rxCheckPercent"));
    }
}
