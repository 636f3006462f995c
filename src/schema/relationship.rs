use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::actor::ActorId;
use super::emotion::Emotion;

/// A directional edge: how `subject` currently feels about `object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attitude {
    pub subject: ActorId,
    pub object: ActorId,
    pub emotion: Emotion,
}

/// Pairwise attitudes between group members: one row per subject, each
/// mapping objects to emotions. Rows are never left empty.
#[derive(Debug, Clone, Default)]
pub struct AttitudeMatrix {
    rows: FxHashMap<ActorId, FxHashMap<ActorId, Emotion>>,
}

impl AttitudeMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: &ActorId, object: &ActorId) -> Option<Emotion> {
        self.rows.get(subject)?.get(object).copied()
    }

    pub fn set(&mut self, subject: &ActorId, object: &ActorId, emotion: Emotion) {
        debug_assert_ne!(subject, object, "an actor holds no attitude toward itself");
        match self.rows.get_mut(subject) {
            Some(row) => {
                row.insert(object.clone(), emotion);
            }
            None => {
                let mut row = FxHashMap::default();
                row.insert(object.clone(), emotion);
                self.rows.insert(subject.clone(), row);
            }
        }
    }

    pub fn contains(&self, subject: &ActorId, object: &ActorId) -> bool {
        self.rows.get(subject).is_some_and(|row| row.contains_key(object))
    }

    /// Drop every entry that mentions `actor` on either side.
    pub fn purge(&mut self, actor: &ActorId) {
        self.rows.remove(actor);
        self.rows.retain(|_, row| {
            row.remove(actor);
            !row.is_empty()
        });
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn emotions(&self) -> impl Iterator<Item = Emotion> + '_ {
        self.rows.values().flat_map(|row| row.values().copied())
    }

    /// How `subject` feels about each other actor, sorted by object name.
    pub fn row(&self, subject: &ActorId) -> Vec<Attitude> {
        let Some(entries) = self.rows.get(subject) else {
            return Vec::new();
        };
        let mut row: Vec<Attitude> = entries
            .iter()
            .map(|(object, emotion)| Attitude {
                subject: subject.clone(),
                object: object.clone(),
                emotion: *emotion,
            })
            .collect();
        row.sort_by(|a, b| a.object.cmp(&b.object));
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_are_directional() {
        let a = ActorId::from("Ariadne");
        let b = ActorId::from("Theseus");
        let mut m = AttitudeMatrix::new();
        m.set(&a, &b, Emotion::Friendly);
        assert_eq!(m.get(&a, &b), Some(Emotion::Friendly));
        assert_eq!(m.get(&b, &a), None);
    }

    #[test]
    fn purge_removes_both_directions() {
        let a = ActorId::from("Ariadne");
        let b = ActorId::from("Theseus");
        let c = ActorId::from("Sartrik");
        let mut m = AttitudeMatrix::new();
        m.set(&a, &b, Emotion::Friendly);
        m.set(&b, &a, Emotion::Hostile);
        m.set(&b, &c, Emotion::Neutral);
        m.set(&c, &b, Emotion::Neutral);
        m.purge(&a);
        assert_eq!(m.len(), 2);
        assert!(!m.contains(&a, &b));
        assert!(!m.contains(&b, &a));
        assert!(m.contains(&b, &c));
    }

    #[test]
    fn purging_everyone_leaves_no_empty_rows() {
        let a = ActorId::from("Ariadne");
        let b = ActorId::from("Theseus");
        let c = ActorId::from("Sartrik");
        let mut m = AttitudeMatrix::new();
        for (s, o) in [(&a, &b), (&a, &c), (&b, &a), (&b, &c), (&c, &a), (&c, &b)] {
            m.set(s, o, Emotion::Neutral);
        }
        assert_eq!(m.len(), 6);
        assert_eq!(m.emotions().count(), 6);

        m.purge(&b);
        assert_eq!(m.len(), 2);
        assert!(m.row(&b).is_empty());
        assert_eq!(m.row(&a).len(), 1);

        m.purge(&a);
        assert!(m.is_empty());
        assert_eq!(m.len(), 0);
        assert!(m.row(&c).is_empty());
        assert_eq!(m.get(&c, &a), None);
    }

    #[test]
    fn set_overwrites_in_place() {
        let a = ActorId::from("Ariadne");
        let b = ActorId::from("Theseus");
        let mut m = AttitudeMatrix::new();
        m.set(&a, &b, Emotion::Friendly);
        m.set(&a, &b, Emotion::Hostile);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&a, &b), Some(Emotion::Hostile));
    }

    #[test]
    fn row_is_sorted_by_object() {
        let a = ActorId::from("Ariadne");
        let mut m = AttitudeMatrix::new();
        m.set(&a, &ActorId::from("Zed"), Emotion::Hostile);
        m.set(&a, &ActorId::from("Bob"), Emotion::Friendly);
        let row = m.row(&a);
        assert_eq!(row[0].object.as_str(), "Bob");
        assert_eq!(row[1].object.as_str(), "Zed");
    }
}
