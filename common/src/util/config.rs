use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub bins: BinsConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_design_file")]
    pub design_file: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            design_file: default_design_file(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BinsConfig {
    #[serde(default = "default_bins_width")]
    pub width: u32,
    #[serde(default = "default_bins_height")]
    pub height: u32,
    /// Blocked bins as `[row, col]` pairs.
    #[serde(default)]
    pub blockages: Vec<[u32; 2]>,
}

impl Default for BinsConfig {
    fn default() -> Self {
        Self {
            width: default_bins_width(),
            height: default_bins_height(),
            blockages: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default)]
    pub start_from_center: bool,
    #[serde(default = "default_clockwise")]
    pub clockwise: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            start_from_center: false,
            clockwise: default_clockwise(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlacementConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_tries")]
    pub max_tries: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_tries: default_max_tries(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_heatmap")]
    pub heatmap: String,
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
    #[serde(default = "default_placed_design")]
    pub placed_design: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            heatmap: default_heatmap(),
            snapshot: default_snapshot(),
            placed_design: default_placed_design(),
        }
    }
}

fn default_design_file() -> String {
    "inputs/design.toml".to_string()
}

fn default_bins_width() -> u32 {
    16
}

fn default_bins_height() -> u32 {
    16
}

fn default_clockwise() -> bool {
    true
}

fn default_max_tries() -> usize {
    100_000
}

fn default_heatmap() -> String {
    "output/heatmap.png".to_string()
}

fn default_snapshot() -> String {
    "output/routed.toml".to_string()
}

fn default_placed_design() -> String {
    "output/placed.toml".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[bins]
width = 8
blockages = [[0, 1], [2, 3]]

[routing]
clockwise = false
"#,
        )
        .unwrap();

        assert_eq!(config.bins.width, 8);
        assert_eq!(config.bins.height, 16);
        assert_eq!(config.bins.blockages, vec![[0, 1], [2, 3]]);
        assert!(!config.routing.clockwise);
        assert!(!config.routing.start_from_center);
        assert_eq!(config.placement.max_tries, 100_000);
        assert_eq!(config.input.design_file, "inputs/design.toml");
    }
}
