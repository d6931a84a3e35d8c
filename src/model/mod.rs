use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};


/// Identifier that the input may give as either a number or a string
/// (chat ids, group ids, bot accounts).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ident {
    Int(i64),
    Str(String),
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ident::Int(n) => write!(f, "{}", n),
            Ident::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Ident {
    fn from(n: i64) -> Self {
        Ident::Int(n)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Ident::Str(s.to_string())
    }
}

/// Delivery channel plus the bot account used on it.
///
/// `name` should be unique per channel implementation, e.g. "QQ/StarBot".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub account: Ident,
}

/// Live-start notification options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveOn {
    pub enabled: bool,
    /// Template; placeholders {uname} {title} {url} {cover}
    pub message: String,
}

impl LiveOn {
    /// Enabled preset with the stock template
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            message: "{uname} 正在直播 {title}\n{url}{next}{cover}".to_string(),
        }
    }
}

/// Live-end notification options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveOff {
    pub enabled: bool,
    /// Template; placeholder {uname}
    pub message: String,
}

impl LiveOff {
    /// Enabled preset with the stock template
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            message: "{uname} 直播结束了".to_string(),
        }
    }
}

/// Post-stream report options.
///
/// Ranking fields hold the number of entries to show; 0 hides the ranking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveReport {
    pub enabled: bool,
    pub logo: Option<String>,
    pub logo_base64: Option<String>,
    pub time: bool,
    pub fans_change: bool,
    pub fans_medal_change: bool,
    pub guard_change: bool,
    pub danmu: bool,
    #[serde(rename = "box")]
    pub blind_box: bool,
    pub gift: bool,
    pub sc: bool,
    pub guard: bool,
    pub danmu_ranking: u32,
    pub box_ranking: u32,
    pub box_profit_ranking: u32,
    pub gift_ranking: u32,
    pub sc_ranking: u32,
    pub guard_list: bool,
    pub box_profit_diagram: bool,
    pub danmu_diagram: bool,
    pub box_diagram: bool,
    pub gift_diagram: bool,
    pub sc_diagram: bool,
    pub guard_diagram: bool,
    pub danmu_cloud: bool,
}

impl LiveReport {
    /// Every section on, top-3 rankings, no logo
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            logo: None,
            logo_base64: None,
            time: true,
            fans_change: true,
            fans_medal_change: true,
            guard_change: true,
            danmu: true,
            blind_box: true,
            gift: true,
            sc: true,
            guard: true,
            danmu_ranking: 3,
            box_ranking: 3,
            box_profit_ranking: 3,
            gift_ranking: 3,
            sc_ranking: 3,
            guard_list: true,
            box_profit_diagram: true,
            danmu_diagram: true,
            box_diagram: true,
            gift_diagram: true,
            sc_diagram: true,
            guard_diagram: true,
            danmu_cloud: true,
        }
    }
}

/// Feed-update notification options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicUpdate {
    pub enabled: bool,
    /// Template; placeholders {uname} {action} {url} {picture}
    pub message: String,
}

impl DynamicUpdate {
    /// Enabled preset with the stock template
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            message: "{uname} {action}\n{url}{next}{picture}".to_string(),
        }
    }
}

/// Delivery destination for one streamer.
///
/// Identity is `(id, platform)`; the option blocks are configuration and do
/// not take part in equality or hashing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushTarget {
    /// Account or group number on the platform
    pub id: Ident,
    pub platform: Platform,
    #[serde(default)]
    pub live_on: LiveOn,
    #[serde(default)]
    pub live_off: LiveOff,
    #[serde(default)]
    pub live_report: LiveReport,
    #[serde(default)]
    pub dynamic_update: DynamicUpdate,
}

impl PushTarget {
    /// Target with every notification kind disabled
    pub fn new(id: impl Into<Ident>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            platform,
            live_on: LiveOn::default(),
            live_off: LiveOff::default(),
            live_report: LiveReport::default(),
            dynamic_update: DynamicUpdate::default(),
        }
    }

    /// Full comparison including every option block
    pub fn same_config(&self, other: &PushTarget) -> bool {
        self.id == other.id
            && self.platform == other.platform
            && self.live_on == other.live_on
            && self.live_off == other.live_off
            && self.live_report == other.live_report
            && self.dynamic_update == other.dynamic_update
    }
}

impl PartialEq for PushTarget {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.platform == other.platform
    }
}

impl Eq for PushTarget {}

impl Hash for PushTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.platform.hash(state);
    }
}

/// A tracked streamer and the targets it pushes to.
///
/// Equality and hashing use `uid` only: two values with the same uid are the
/// same streamer, possibly with different configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Streamer {
    #[serde(alias = "id")]
    pub uid: i64,
    pub targets: Vec<PushTarget>,
}

impl Streamer {
    pub fn new(uid: i64, targets: Vec<PushTarget>) -> Self {
        Self { uid, targets }
    }

    /// True when any target wants live-start, live-end or report pushes,
    /// which require a connection to the live room.
    pub fn needs_connection(&self) -> bool {
        self.targets.iter().any(|t| {
            t.live_on.enabled || t.live_off.enabled || t.live_report.enabled
        })
    }

    /// Full comparison of the nested configuration, in target order
    pub fn same_config(&self, other: &Streamer) -> bool {
        self.uid == other.uid
            && self.targets.len() == other.targets.len()
            && self
                .targets
                .iter()
                .zip(&other.targets)
                .all(|(a, b)| a.same_config(b))
    }

    /// Checks the rules serde cannot express
    pub fn validate(&self) -> Result<(), FieldError> {
        for target in &self.targets {
            if target.platform.name.trim().is_empty() {
                return Err(FieldError {
                    field: "name",
                    reason: format!("platform name of target {} is empty", target.id),
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for Streamer {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Streamer {}

impl Hash for Streamer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

/// A field that failed validation after deserialization
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid field '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for FieldError {}
