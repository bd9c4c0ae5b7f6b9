/// API response models shared across Velo Harvest crates.
use serde::{Deserialize, Serialize};

/// GeoJSON-like collection returned by the device-directory query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// One sensor entry in the device directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub properties: FeatureProperties,
}

/// Properties block of a feature. The API returns more fields; only the
/// device name is used, as an opaque identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub device_name: String,
}

impl FeatureCollection {
    /// Flatten the collection into the list of device names.
    pub fn device_names(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|f| f.properties.device_name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"device_name": "CB02411", "road_nl": "Wetstraat"}},
                {"type": "Feature", "geometry": null, "properties": {"device_name": "CEK049"}}
            ]
        }"#;
        let collection: FeatureCollection = serde_json::from_str(json).unwrap();
        assert_eq!(collection.device_names(), vec!["CB02411", "CEK049"]);
    }

    #[test]
    fn test_empty_collection() {
        let collection: FeatureCollection = serde_json::from_str(r#"{"features": []}"#).unwrap();
        assert!(collection.device_names().is_empty());
    }

    #[test]
    fn test_missing_device_name_is_an_error() {
        let json = r#"{"features": [{"properties": {"road_nl": "Wetstraat"}}]}"#;
        assert!(serde_json::from_str::<FeatureCollection>(json).is_err());
    }
}
