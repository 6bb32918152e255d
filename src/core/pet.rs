use crate::core::types::{InstanceId, PetId, PetKind, PlayerId};

/// A single owned pet: the persisted unit of ownership, health, and lifecycle
/// state. The live-instance binding and health fields are runtime state; only
/// kind, names, and the death stamp survive a restart.
#[derive(Debug, Clone)]
pub struct Pet {
    id: PetId,
    owner: PlayerId,
    kind: PetKind,
    generated_name: String,
    custom_name: Option<String>,
    instance: Option<InstanceId>,
    max_health: f64,
    current_health: f64,
    /// Epoch milliseconds of death. `None` means alive.
    died_at: Option<i64>,
}

impl Pet {
    pub fn new(owner: PlayerId, kind: PetKind, generated_name: impl Into<String>) -> Self {
        Self {
            id: PetId::random(),
            owner,
            kind,
            generated_name: generated_name.into(),
            custom_name: None,
            instance: None,
            max_health: 20.0,
            current_health: 20.0,
            died_at: None,
        }
    }

    pub fn id(&self) -> PetId {
        self.id
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn kind(&self) -> PetKind {
        self.kind
    }

    pub fn generated_name(&self) -> &str {
        &self.generated_name
    }

    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    pub fn set_custom_name(&mut self, name: Option<String>) {
        self.custom_name = name;
    }

    /// Custom name if set, generated name otherwise.
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.generated_name)
    }

    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    pub fn bind_instance(&mut self, instance: InstanceId) {
        self.instance = Some(instance);
    }

    pub fn clear_instance(&mut self) {
        self.instance = None;
    }

    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    /// Re-clamps current health when the maximum shrinks.
    pub fn set_max_health(&mut self, max_health: f64) {
        self.max_health = max_health;
        self.current_health = self.current_health.min(max_health);
    }

    pub fn current_health(&self) -> f64 {
        self.current_health
    }

    pub fn set_current_health(&mut self, health: f64) {
        self.current_health = health.clamp(0.0, self.max_health);
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            self.current_health / self.max_health
        } else {
            0.0
        }
    }

    pub fn died_at(&self) -> Option<i64> {
        self.died_at
    }

    pub fn set_died_at(&mut self, timestamp: Option<i64>) {
        self.died_at = timestamp;
    }

    pub fn is_dead(&self) -> bool {
        self.died_at.is_some()
    }

    /// Clears the death stamp and restores full health.
    pub fn revive(&mut self) {
        self.died_at = None;
        self.current_health = self.max_health;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet() -> Pet {
        Pet::new(PlayerId::random(), PetKind::Dog, "Buddy II")
    }

    #[test]
    fn display_name_prefers_custom_override() {
        let mut p = pet();
        assert_eq!(p.display_name(), "Buddy II");
        p.set_custom_name(Some("Rex".to_string()));
        assert_eq!(p.display_name(), "Rex");
        p.set_custom_name(None);
        assert_eq!(p.display_name(), "Buddy II");
    }

    #[test]
    fn current_health_is_clamped() {
        let mut p = pet();
        p.set_current_health(500.0);
        assert_eq!(p.current_health(), 20.0);
        p.set_current_health(-3.0);
        assert_eq!(p.current_health(), 0.0);
    }

    #[test]
    fn shrinking_max_health_reclamps_current() {
        let mut p = pet();
        p.set_current_health(20.0);
        p.set_max_health(10.0);
        assert_eq!(p.current_health(), 10.0);
    }

    #[test]
    fn revive_clears_stamp_and_restores_health() {
        let mut p = pet();
        p.set_current_health(0.0);
        p.set_died_at(Some(12345));
        assert!(p.is_dead());
        p.revive();
        assert!(!p.is_dead());
        assert_eq!(p.current_health(), p.max_health());
    }
}
