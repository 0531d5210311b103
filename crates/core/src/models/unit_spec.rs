use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host value meaning "run on this machine" unless configured otherwise.
pub const DEFAULT_LOCAL_HOST: &str = "0.0.0.0";

/// 执行单元规格
///
/// Declarative description of one computation unit. Only `host` and
/// `container_image` take part in placement; every other field is carried
/// through untouched in `extra` for the worker that eventually runs it.
/// A unit without a host runs on whatever the local sentinel is configured
/// to be; the policy gate fills it in.
///
/// # 示例
///
/// ```rust
/// use placement_core::models::UnitSpec;
///
/// let spec: UnitSpec = serde_json::from_value(serde_json::json!({
///     "name": "encoder",
///     "host": "10.0.0.2",
///     "replicas": 2
/// })).unwrap();
///
/// assert_eq!(spec.host.as_deref(), Some("10.0.0.2"));
/// assert!(spec.extra.contains_key("replicas"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(
        default,
        alias = "containerImage",
        alias = "image",
        skip_serializing_if = "Option::is_none"
    )]
    pub container_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UnitSpec {
    fn default() -> Self {
        Self::local()
    }
}

impl UnitSpec {
    /// A unit with no host, i.e. bound to the configured local sentinel.
    pub fn local() -> Self {
        Self {
            name: None,
            host: None,
            container_image: None,
            extra: Map::new(),
        }
    }

    pub fn on_host<S: Into<String>>(host: S) -> Self {
        Self {
            name: None,
            host: Some(host.into()),
            container_image: None,
            extra: Map::new(),
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_image<S: Into<String>>(mut self, image: S) -> Self {
        self.container_image = Some(image.into());
        self
    }

    pub fn with_field<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// An unset host counts as local.
    pub fn is_local(&self, local_host: &str) -> bool {
        self.host.as_deref().map_or(true, |host| host == local_host)
    }

    /// The host this unit runs on, with an unset host read as `local_host`.
    pub fn host_or<'a>(&'a self, local_host: &'a str) -> &'a str {
        self.host.as_deref().unwrap_or(local_host)
    }

    /// The container image, if one is set and non-empty.
    pub fn image(&self) -> Option<&str> {
        self.container_image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unit")
    }

    /// Name of this unit as member `index` of `role`: its own name if set,
    /// `<role>-<index>` otherwise.
    pub fn member_name(&self, role: &str, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{role}-{index}"))
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// A string-list pass-through field. Non-string entries are skipped.
    pub fn field_str_list(&self, key: &str) -> Vec<String> {
        self.extra
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A string-map pass-through field. Non-string values are skipped.
    pub fn field_str_map(&self, key: &str) -> Vec<(String, String)> {
        self.extra
            .get(key)
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}
