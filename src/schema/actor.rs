use rand::{Rng, RngCore};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::emotion::{Category, Emotion};

/// Resilience above which an actor shrugs off every slight.
pub const THICK_SKIN_RESILIENCE: u32 = 70;

/// An actor's identity. Actors are the same actor exactly when their
/// names match, so scripts can refer to them by name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ActorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ActorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the three numeric traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    Leadership,
    Intelligence,
    Resilience,
}

/// Fixed personality traits, conventionally 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traits {
    #[serde(default = "default_trait")]
    pub leadership: u32,
    #[serde(default = "default_trait")]
    pub intelligence: u32,
    #[serde(default = "default_trait")]
    pub resilience: u32,
}

fn default_trait() -> u32 {
    50
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            leadership: 50,
            intelligence: 50,
            resilience: 50,
        }
    }
}

impl Traits {
    pub fn new(leadership: u32, intelligence: u32, resilience: u32) -> Self {
        Self {
            leadership,
            intelligence,
            resilience,
        }
    }

    pub fn get(&self, which: Trait) -> u32 {
        match which {
            Trait::Leadership => self.leadership,
            Trait::Intelligence => self.intelligence,
            Trait::Resilience => self.resilience,
        }
    }
}

/// A condition an actor places on whom it is willing to address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressRule {
    /// The other actor's trait must be strictly above the threshold.
    OtherAbove {
        #[serde(rename = "trait")]
        which: Trait,
        threshold: u32,
    },
    /// The other actor's trait must be strictly below the threshold.
    OtherBelow {
        #[serde(rename = "trait")]
        which: Trait,
        threshold: u32,
    },
    /// The other actor must not be one of this actor's enemies.
    NotEnemy,
    /// The other actor must be one of this actor's friends.
    FriendsOnly,
}

impl AddressRule {
    pub fn allows(&self, speaker: &Actor, other: &Actor) -> bool {
        match self {
            Self::OtherAbove { which, threshold } => other.traits.get(*which) > *threshold,
            Self::OtherBelow { which, threshold } => other.traits.get(*which) < *threshold,
            Self::NotEnemy => !speaker.enemies.contains(&other.id),
            Self::FriendsOnly => speaker.friends.contains(&other.id),
        }
    }
}

/// A character in the cast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    traits: Traits,
    pub friends: FxHashSet<ActorId>,
    pub enemies: FxHashSet<ActorId>,
    pub current_emotion: Emotion,
    pub address_rules: Vec<AddressRule>,
}

impl Actor {
    pub fn new(name: impl Into<String>, traits: Traits) -> Self {
        Self {
            id: ActorId::new(name),
            traits,
            friends: FxHashSet::default(),
            enemies: FxHashSet::default(),
            current_emotion: Emotion::Neutral,
            address_rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn traits(&self) -> Traits {
        self.traits
    }

    pub fn with_rule(mut self, rule: AddressRule) -> Self {
        self.address_rules.push(rule);
        self
    }

    /// Move `other` into this actor's friends, out of its enemies.
    pub fn befriend(&mut self, other: &ActorId) {
        self.enemies.remove(other);
        self.friends.insert(other.clone());
    }

    /// Move `other` into this actor's enemies, out of its friends.
    pub fn make_enemy(&mut self, other: &ActorId) {
        self.friends.remove(other);
        self.enemies.insert(other.clone());
    }

    pub fn is_friend(&self, other: &ActorId) -> bool {
        self.friends.contains(other)
    }

    pub fn is_enemy(&self, other: &ActorId) -> bool {
        self.enemies.contains(other)
    }

    /// True when every address rule admits `other`. No rules admits everyone.
    pub fn can_address(&self, other: &Actor) -> bool {
        self.address_rules.iter().all(|rule| rule.allows(self, other))
    }

    /// Accepts a label or an `Emotion`; unknown labels become `Neutral`.
    pub fn set_emotion(&mut self, emotion: impl Into<Emotion>) {
        self.current_emotion = emotion.into();
    }

    /// Adjust this actor's view of `other` after seeing it display `emotion`.
    ///
    /// Positive displays turn an enemy into a friend; negative displays turn
    /// a friend into an enemy. Only this actor's sets change.
    pub fn react_to(&mut self, other: &ActorId, emotion: Emotion) {
        match emotion.category() {
            Category::Positive if self.is_enemy(other) => self.befriend(other),
            Category::Negative if self.is_friend(other) => self.make_enemy(other),
            _ => {}
        }
    }

    /// Roll whether `emotion` displayed by `other` offends this actor.
    ///
    /// The first matching rule decides; later rules are never consulted.
    pub fn is_offended_by(&self, other: &ActorId, emotion: Emotion, rng: &mut dyn RngCore) -> bool {
        if self.traits.resilience > THICK_SKIN_RESILIENCE {
            return false;
        }

        let category = emotion.category();
        let chance = if self.is_enemy(other) && matches!(category, Category::Negative | Category::Complex) {
            0.7
        } else if self.is_friend(other) && emotion == Emotion::Angry {
            0.3
        } else if category == Category::Negative {
            0.5
        } else {
            return false;
        };

        rng.gen::<f64>() < chance
    }

    /// Snapshot handed to text generators.
    pub fn profile(&self) -> ActorProfile {
        let mut friends: Vec<String> = self.friends.iter().map(|id| id.0.clone()).collect();
        let mut enemies: Vec<String> = self.enemies.iter().map(|id| id.0.clone()).collect();
        friends.sort();
        enemies.sort();
        ActorProfile {
            name: self.id.0.clone(),
            traits: self.traits,
            emotion: self.current_emotion,
            friends,
            enemies,
        }
    }
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Actor {}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// What a generator needs to know about the character it speaks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub name: String,
    pub traits: Traits,
    pub emotion: Emotion,
    pub friends: Vec<String>,
    pub enemies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn always_low() -> StepRng {
        StepRng::new(0, 0)
    }

    fn always_high() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn pair(resilience: u32) -> (Actor, Actor) {
        let a = Actor::new("Ariadne", Traits::new(65, 85, resilience));
        let b = Actor::new("Theseus", Traits::new(80, 70, 75));
        (a, b)
    }

    #[test]
    fn identity_is_by_name() {
        let a = Actor::new("Sartrik", Traits::new(50, 95, 55));
        let b = Actor::new("Sartrik", Traits::new(1, 1, 1));
        assert_eq!(a, b);

        let mut set = FxHashSet::default();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn can_address_with_no_rules() {
        let (a, b) = pair(50);
        assert!(a.can_address(&b));
    }

    #[test]
    fn can_address_checks_traits() {
        let sartrik = Actor::new("Sartrik", Traits::new(50, 95, 55)).with_rule(AddressRule::OtherAbove {
            which: Trait::Intelligence,
            threshold: 80,
        });
        let smart = Actor::new("Monstradamus", Traits::new(85, 95, 75));
        let dull = Actor::new("UGLI 666", Traits::new(55, 60, 45));
        assert!(sartrik.can_address(&smart));
        assert!(!sartrik.can_address(&dull));
    }

    #[test]
    fn can_address_short_circuits_on_any_failing_rule() {
        let mut a = Actor::new("IsoldA", Traits::default())
            .with_rule(AddressRule::OtherAbove {
                which: Trait::Leadership,
                threshold: 10,
            })
            .with_rule(AddressRule::NotEnemy);
        let b = Actor::new("Romeo-y-Cohiba", Traits::default());
        assert!(a.can_address(&b));
        a.make_enemy(&b.id);
        assert!(!a.can_address(&b));
    }

    #[test]
    fn set_emotion_accepts_labels() {
        let (mut a, _) = pair(50);
        a.set_emotion("Hopeful");
        assert_eq!(a.current_emotion, Emotion::Hopeful);
        a.set_emotion("no such mood");
        assert_eq!(a.current_emotion, Emotion::Neutral);
        a.set_emotion(Emotion::Angry);
        assert_eq!(a.current_emotion, Emotion::Angry);
    }

    #[test]
    fn positive_display_reconciles_enemy() {
        let (mut a, b) = pair(50);
        a.make_enemy(&b.id);
        a.react_to(&b.id, Emotion::Compassionate);
        assert!(a.is_friend(&b.id));
        assert!(!a.is_enemy(&b.id));
    }

    #[test]
    fn negative_display_sours_friend() {
        let (mut a, b) = pair(50);
        a.befriend(&b.id);
        a.react_to(&b.id, Emotion::Irritated);
        assert!(a.is_enemy(&b.id));
        assert!(!a.is_friend(&b.id));
    }

    #[test]
    fn complex_and_neutral_displays_change_nothing() {
        let (mut a, b) = pair(50);
        a.befriend(&b.id);
        a.react_to(&b.id, Emotion::Sarcastic);
        a.react_to(&b.id, Emotion::Curious);
        assert!(a.is_friend(&b.id));
    }

    #[test]
    fn react_to_is_one_directional() {
        let (mut a, mut b) = pair(50);
        a.befriend(&b.id);
        b.befriend(&a.id);
        a.react_to(&b.id, Emotion::Angry);
        assert!(a.is_enemy(&b.id));
        assert!(b.is_friend(&a.id));
    }

    #[test]
    fn thick_skin_never_offended() {
        let (a, b) = pair(71);
        let mut rng = always_low();
        for emotion in Emotion::ALL {
            assert!(!a.is_offended_by(&b.id, emotion, &mut rng));
        }
        let (mut a, b) = pair(90);
        a.make_enemy(&b.id);
        for emotion in Emotion::ALL {
            assert!(!a.is_offended_by(&b.id, emotion, &mut rng));
        }
    }

    #[test]
    fn enemy_complex_display_can_offend() {
        let (mut a, b) = pair(50);
        a.make_enemy(&b.id);
        assert!(a.is_offended_by(&b.id, Emotion::Sarcastic, &mut always_low()));
        assert!(!a.is_offended_by(&b.id, Emotion::Sarcastic, &mut always_high()));
    }

    #[test]
    fn positive_and_neutral_displays_never_offend() {
        let (a, b) = pair(10);
        let mut rng = always_low();
        assert!(!a.is_offended_by(&b.id, Emotion::Flirty, &mut rng));
        assert!(!a.is_offended_by(&b.id, Emotion::Calm, &mut rng));
        // Complex from a stranger falls through every rule.
        assert!(!a.is_offended_by(&b.id, Emotion::Jealous, &mut rng));
    }

    #[test]
    fn friend_angry_uses_single_roll() {
        // 0.4 lands between the friend-angry (0.3) and generic negative (0.5)
        // chances, so only the first matching rule may be applied.
        let (mut a, b) = pair(50);
        a.befriend(&b.id);
        let forty_percent = (0.4 * (1u64 << 53) as f64) as u64;
        let mut rng = StepRng::new(forty_percent << 11, 0);
        assert!(!a.is_offended_by(&b.id, Emotion::Angry, &mut rng));

        let stranger = Actor::new("Nutscracker", Traits::default());
        let mut rng = StepRng::new(forty_percent << 11, 0);
        assert!(stranger.is_offended_by(&b.id, Emotion::Angry, &mut rng));
    }

    #[test]
    fn profile_lists_sorted_relationships() {
        let (mut a, _) = pair(50);
        a.befriend(&ActorId::from("Zed"));
        a.befriend(&ActorId::from("Ann"));
        a.make_enemy(&ActorId::from("Minotaur"));
        let profile = a.profile();
        assert_eq!(profile.name, "Ariadne");
        assert_eq!(profile.friends, vec!["Ann", "Zed"]);
        assert_eq!(profile.enemies, vec!["Minotaur"]);
    }
}
