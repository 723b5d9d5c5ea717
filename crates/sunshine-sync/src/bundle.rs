//! Wire payloads exchanged between phone and wearable.

use serde::{Deserialize, Serialize};
use sunshine_weather::WeatherSummary;

use crate::transport::{DataItem, TransportError, ICON_ASSET_KEY, ICON_PATH};

/// The two temperature strings sent to each wearable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub low_temp: String,
    pub max_temp: String,
}

impl From<&WeatherSummary> for WeatherBundle {
    fn from(summary: &WeatherSummary) -> Self {
        Self {
            low_temp: summary.low_temperature.clone(),
            max_temp: summary.high_temperature.clone(),
        }
    }
}

impl WeatherBundle {
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(self).map_err(|e| TransportError::Codec(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransportError> {
        serde_json::from_slice(bytes).map_err(|e| TransportError::Codec(e.to_string()))
    }
}

/// Data item carrying a PNG-encoded condition icon
pub fn icon_data_item(png: Vec<u8>) -> DataItem {
    DataItem::new(ICON_PATH).with_asset(ICON_ASSET_KEY, png)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> WeatherSummary {
        WeatherSummary {
            condition_id: 800,
            description: None,
            latitude: None,
            longitude: None,
            high_temperature: "25°".into(),
            low_temperature: "16°".into(),
        }
    }

    #[test]
    fn test_bundle_keys_on_the_wire() {
        let bytes = WeatherBundle::from(&summary()).to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["low_temp"], "16°");
        assert_eq!(value["max_temp"], "25°");
        assert_eq!(value.as_object().map(|o| o.len()), Some(2));
    }

    #[test]
    fn test_bundle_decodes_peer_payload() {
        let payload = r#"{"max_temp":"9°","low_temp":"2°"}"#;
        let bundle = WeatherBundle::from_bytes(payload.as_bytes()).unwrap();
        assert_eq!(bundle.max_temp, "9°");
        assert_eq!(bundle.low_temp, "2°");
    }

    #[test]
    fn test_bundle_rejects_missing_key() {
        assert!(matches!(
            WeatherBundle::from_bytes(br#"{"max_temp":"9"}"#),
            Err(TransportError::Codec(_))
        ));
    }

    #[test]
    fn test_icon_item_path() {
        let item = icon_data_item(vec![0x89, b'P']);
        assert_eq!(item.path, ICON_PATH);
        assert!(item.assets.contains_key(ICON_ASSET_KEY));
    }
}
