use crate::core::{PetError, PetKind, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Stat knobs applied to a live instance at spawn time. Knobs that do not
/// apply to a kind are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindStats {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub movement_speed: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jump_strength: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attack_damage: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attack_speed: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub follow_range: Option<f64>,
}

/// Configuration descriptor for one pet kind: shop data, base stats, and the
/// passive effects granted to the owner while the pet is spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindConfig {
    pub enabled: bool,

    /// Shop display name for the kind.
    pub display_name: String,

    pub price: f64,

    /// Minimum owner level to purchase; 0 disables the gate.
    pub required_level: u32,

    pub max_health: f64,

    #[serde(default)]
    pub stats: KindStats,

    /// Speed effect applied to the owner while spawned (cat).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub speed_boost_level: Option<u32>,

    /// Night-vision effect applied to the owner while spawned (parrot).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub night_vision_level: Option<u32>,

    /// Owner turns invisible while sneaking (fox).
    #[serde(default)]
    pub invisibility_on_sneak: bool,

    /// Extra lives granted to the owner while spawned (cat). The counter
    /// itself is tracked by the host.
    #[serde(default)]
    pub extra_lives: u32,
}

impl KindConfig {
    fn new(display_name: &str, price: f64, required_level: u32, max_health: f64) -> Self {
        Self {
            enabled: true,
            display_name: display_name.to_string(),
            price,
            required_level,
            max_health,
            stats: KindStats::default(),
            speed_boost_level: None,
            night_vision_level: None,
            invisibility_on_sneak: false,
            extra_lives: 0,
        }
    }
}

/// Full engine configuration: one descriptor per kind plus the global
/// lifecycle knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetsConfig {
    pub kinds: HashMap<PetKind, KindConfig>,

    /// Flat health gained per tick while spawned.
    pub heal_rate: f64,

    /// Health fraction at or below which a spawned pet flees and despawns.
    pub flee_threshold: f64,

    /// Horizontal distance of the flee teleport.
    pub flee_distance: f64,

    /// Instances farther than this from their owner are brought back.
    pub follow_distance: f64,

    pub revive_cost: f64,

    /// Grace window after death during which revival is permitted, in
    /// milliseconds. Pure elapsed-time math, no calendar semantics.
    pub revival_window_ms: i64,

    /// Pets ignore damage outside the sanctioned PvP/hostile cases.
    pub prevent_damage: bool,

    /// Period of the health tick.
    #[serde(with = "duration_millis")]
    pub tick_interval: Duration,
}

impl Default for PetsConfig {
    fn default() -> Self {
        let mut kinds = HashMap::new();

        let mut horse = KindConfig::new("Swift Horse", 100_000.0, 10, 30.0);
        horse.stats.movement_speed = Some(0.35);
        horse.stats.jump_strength = Some(1.0);
        kinds.insert(PetKind::Horse, horse);

        let mut dog = KindConfig::new("Loyal Dog", 75_000.0, 0, 20.0);
        dog.stats.attack_damage = Some(8.0);
        dog.stats.attack_speed = Some(1.5);
        dog.stats.follow_range = Some(32.0);
        kinds.insert(PetKind::Dog, dog);

        let mut cat = KindConfig::new("Lucky Cat", 50_000.0, 0, 10.0);
        cat.speed_boost_level = Some(1);
        cat.extra_lives = 1;
        kinds.insert(PetKind::Cat, cat);

        let mut wolf = KindConfig::new("Wild Wolf", 75_000.0, 5, 24.0);
        wolf.stats.attack_damage = Some(6.0);
        wolf.stats.attack_speed = Some(1.3);
        kinds.insert(PetKind::Wolf, wolf);

        let mut parrot = KindConfig::new("Night Parrot", 40_000.0, 0, 6.0);
        parrot.night_vision_level = Some(1);
        kinds.insert(PetKind::Parrot, parrot);

        let mut fox = KindConfig::new("Sly Fox", 60_000.0, 15, 10.0);
        fox.invisibility_on_sneak = true;
        kinds.insert(PetKind::Fox, fox);

        Self {
            kinds,
            heal_rate: 0.5,
            flee_threshold: 0.2,
            flee_distance: 10.0,
            follow_distance: 50.0,
            revive_cost: 50_000.0,
            revival_window_ms: 6 * 60 * 60 * 1000,
            prevent_damage: true,
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl PetsConfig {
    pub fn kind(&self, kind: PetKind) -> Option<&KindConfig> {
        self.kinds.get(&kind)
    }

    /// Set the heal rate
    pub fn heal_rate(mut self, rate: f64) -> Self {
        self.heal_rate = rate;
        self
    }

    /// Set the flee threshold
    pub fn flee_threshold(mut self, threshold: f64) -> Self {
        self.flee_threshold = threshold;
        self
    }

    /// Set the revival cost
    pub fn revive_cost(mut self, cost: f64) -> Self {
        self.revive_cost = cost;
        self
    }

    /// Set the revival window
    pub fn revival_window(mut self, window: Duration) -> Self {
        self.revival_window_ms = window.as_millis() as i64;
        self
    }

    /// Set the tick period
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PetError::Persistence(format!("Failed to read config: {}", e)))?;
        serde_json::from_str(&data)
            .map_err(|e| PetError::Persistence(format!("Failed to parse config: {}", e)))
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
