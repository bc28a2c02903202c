//! Instance Configuration
//!
//! Settings are merged over the defaults the same way a plugin settings
//! object is: every key is optional and unknown keys are ignored.
//!
//! ```rust
//! use fos_lazy::Config;
//!
//! let config = Config::from_json(r#"{ "threshold": 0, "effect": "fadeIn" }"#).unwrap();
//! assert_eq!(config.threshold, 0.0);
//! assert_eq!(config.attribute, "data-src");
//! ```

use std::time::Duration;

use fos_dom::NodeId;
use serde::{Deserialize, Deserializer};

use crate::{LazyError, Result};

/// 1x1 transparent GIF used to seed `<img>` tags without a `src`
pub const DEFAULT_IMAGE: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAP///wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

/// When the instance starts scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bind {
    /// Wait for the window `load` event
    #[default]
    Load,
    /// Start immediately
    Event,
}

/// Axis the loadable area is tested on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Vertical,
    Horizontal,
    #[default]
    Both,
}

/// Where scroll and resize listeners are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollTarget {
    #[default]
    Window,
    Element(NodeId),
}

/// Engine configuration options
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Instance name, used in log output
    pub name: String,
    pub bind: Bind,
    /// Margin in pixels around the viewport
    pub threshold: f64,
    /// Skip elements that have no layout box or a hidden ancestor
    pub visible_only: bool,
    #[serde(skip)]
    pub append_scroll: ScrollTarget,
    pub scroll_direction: ScrollDirection,
    /// Prefix prepended to every resolved image source
    pub image_base: Option<String>,
    /// `src` written to `<img>` tags that have none
    pub default_image: Option<String>,
    /// Background written to other elements that have none
    pub placeholder: Option<String>,
    /// Milliseconds until everything is force-loaded; negative or absent disables it
    #[serde(deserialize_with = "negative_as_none")]
    pub delay: Option<u64>,
    /// Keep scroll/resize triggers alongside `delay`
    pub combined: bool,

    pub attribute: String,
    pub srcset_attribute: String,
    pub sizes_attribute: String,
    pub retina_attribute: String,
    pub loader_attribute: String,
    pub image_base_attribute: String,
    /// Strip the lazy attributes after a successful load
    pub remove_attribute: bool,
    pub handled_name: String,
    pub loaded_name: String,

    /// Named transition played after an image is written back
    pub effect: String,
    /// Transition duration in milliseconds
    pub effect_time: u64,

    pub enable_throttle: bool,
    /// Minimum milliseconds between two scans
    pub throttle: u64,
    pub enable_queueing: bool,
    /// Milliseconds between two queue drains
    pub queue_interval: u64,
    /// Detach listeners once every candidate is handled
    pub auto_destroy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "lazy".to_string(),
            bind: Bind::Load,
            threshold: 500.0,
            visible_only: false,
            append_scroll: ScrollTarget::Window,
            scroll_direction: ScrollDirection::Both,
            image_base: None,
            default_image: Some(DEFAULT_IMAGE.to_string()),
            placeholder: None,
            delay: None,
            combined: false,
            attribute: "data-src".to_string(),
            srcset_attribute: "data-srcset".to_string(),
            sizes_attribute: "data-sizes".to_string(),
            retina_attribute: "data-retina".to_string(),
            loader_attribute: "data-loader".to_string(),
            image_base_attribute: "data-imagebase".to_string(),
            remove_attribute: true,
            handled_name: "handled".to_string(),
            loaded_name: "loaded".to_string(),
            effect: "show".to_string(),
            effect_time: 0,
            enable_throttle: true,
            throttle: 250,
            enable_queueing: true,
            queue_interval: 1,
            auto_destroy: true,
        }
    }
}

impl Config {
    /// Merge a JSON settings object over the defaults
    pub fn from_json(settings: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(settings)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("attribute", &self.attribute),
            ("loaderAttribute", &self.loader_attribute),
            ("handledName", &self.handled_name),
            ("loadedName", &self.loaded_name),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(LazyError::Config(format!("'{key}' must not be empty")));
            }
        }
        if self.enable_throttle && self.throttle == 0 {
            return Err(LazyError::Config("'throttle' must be positive when throttling is enabled".into()));
        }
        if !self.threshold.is_finite() {
            return Err(LazyError::Config("'threshold' must be finite".into()));
        }
        Ok(())
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle)
    }

    pub fn queue_interval(&self) -> Duration {
        Duration::from_millis(self.queue_interval)
    }

    pub fn effect_duration(&self) -> Duration {
        Duration::from_millis(self.effect_time)
    }

    pub fn delay_duration(&self) -> Option<Duration> {
        self.delay.map(Duration::from_millis)
    }

    /// Attributes stripped from an image element after it loaded
    pub fn image_attributes(&self) -> [&str; 5] {
        [
            self.attribute.as_str(),
            self.retina_attribute.as_str(),
            self.srcset_attribute.as_str(),
            self.sizes_attribute.as_str(),
            self.image_base_attribute.as_str(),
        ]
    }
}

fn negative_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(value.and_then(|v| u64::try_from(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.threshold, 500.0);
        assert_eq!(config.bind, Bind::Load);
        assert_eq!(config.scroll_direction, ScrollDirection::Both);
        assert_eq!(config.throttle_interval(), Duration::from_millis(250));
        assert!(config.enable_queueing);
        assert!(config.delay_duration().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_merges_over_defaults() {
        let config = Config::from_json(
            r#"{ "bind": "event", "scrollDirection": "vertical", "visibleOnly": true, "delay": 1500, "unknown": 1 }"#,
        )
        .unwrap();

        assert_eq!(config.bind, Bind::Event);
        assert_eq!(config.scroll_direction, ScrollDirection::Vertical);
        assert!(config.visible_only);
        assert_eq!(config.delay_duration(), Some(Duration::from_millis(1500)));
        assert_eq!(config.loader_attribute, "data-loader");
    }

    #[test]
    fn test_negative_delay_disables_timer() {
        let config = Config::from_json(r#"{ "delay": -1 }"#).unwrap();
        assert_eq!(config.delay, None);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(Config::from_json(r#"{ "attribute": "" }"#), Err(LazyError::Config(_))));
        assert!(matches!(Config::from_json(r#"{ "throttle": 0 }"#), Err(LazyError::Config(_))));
        assert!(Config::from_json(r#"{ "throttle": 0, "enableThrottle": false }"#).is_ok());
        assert!(matches!(Config::from_json("{ nope"), Err(LazyError::Json(_))));
    }
}
