use serde::{Deserialize, Serialize};

/// Limits for [`ContextExpander`](crate::ContextExpander)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandConfig {
    /// Callers and callees kept per side
    pub neighbor_cap: usize,

    /// Neighbour bodies longer than this are reduced to a stub
    pub stub_threshold_lines: usize,

    /// Lines kept when a stub falls back to the head of the body
    pub stub_head_lines: usize,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            neighbor_cap: 5,
            stub_threshold_lines: 40,
            stub_head_lines: 12,
        }
    }
}

impl ExpandConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(2..=5).contains(&self.neighbor_cap) {
            return Err("neighbor_cap must be between 2 and 5".to_string());
        }
        if self.stub_threshold_lines == 0 {
            return Err("stub_threshold_lines must be > 0".to_string());
        }
        if self.stub_head_lines == 0 {
            return Err("stub_head_lines must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Depth used when a trace request does not name one
    pub max_depth: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Breadth-first rounds around the seed nodes
    pub depth: usize,

    /// Largest node count rendered before the request is rejected
    pub ceiling: usize,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            ceiling: 50,
        }
    }
}

impl DiagramConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ceiling == 0 {
            return Err("ceiling must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ExpandConfig::default().validate().is_ok());
        assert!(FlowConfig::default().validate().is_ok());
        assert!(DiagramConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config: ExpandConfig = serde_json::from_str(r#"{"neighbor_cap": 3}"#).unwrap();
        assert_eq!(config.neighbor_cap, 3);
        assert_eq!(config.stub_threshold_lines, 40);

        for cap in [0, 1, 6, 20] {
            let bad = ExpandConfig {
                neighbor_cap: cap,
                ..ExpandConfig::default()
            };
            assert!(bad.validate().is_err(), "{cap}");
        }
        for cap in [2, 5] {
            let good = ExpandConfig {
                neighbor_cap: cap,
                ..ExpandConfig::default()
            };
            assert!(good.validate().is_ok(), "{cap}");
        }
    }
}
