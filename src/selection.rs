use crate::club::ClubRecord;

pub const MAX_SELECTED_CLUBS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub ticket: u64,
    pub record: ClubRecord,
}

/// Ordered, bounded and name-unique list of chosen clubs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    slots: Vec<Slot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Full,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched,
    // No slot with that name, or the slot was re-issued under a newer ticket.
    Stale,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_SELECTED_CLUBS
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|slot| slot.record.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ClubRecord> {
        self.slots
            .iter()
            .find(|slot| slot.record.name == name)
            .map(|slot| &slot.record)
    }

    pub fn records(&self) -> impl Iterator<Item = &ClubRecord> {
        self.slots.iter().map(|slot| &slot.record)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn names(&self) -> Vec<String> {
        self.records().map(|record| record.name.clone()).collect()
    }

    pub fn add_placeholder(&mut self, name: &str, ticket: u64) -> AddOutcome {
        if self.is_full() {
            return AddOutcome::Full;
        }
        if self.contains(name) {
            return AddOutcome::Duplicate;
        }
        self.slots.push(Slot {
            ticket,
            record: ClubRecord::placeholder(name),
        });
        AddOutcome::Added
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.record.name != name);
        self.slots.len() != before
    }

    /// Replaces the record in the slot that still holds `name` under `ticket`.
    pub fn patch(&mut self, name: &str, ticket: u64, record: ClubRecord) -> PatchOutcome {
        match self
            .slots
            .iter_mut()
            .find(|slot| slot.ticket == ticket && slot.record.name == name)
        {
            Some(slot) => {
                slot.record = record;
                PatchOutcome::Patched
            }
            None => PatchOutcome::Stale,
        }
    }

    /// Overwrites everything. Duplicate names keep their first row and rows past
    /// the cap are dropped; returns how many rows were discarded.
    pub fn replace_all(&mut self, records: Vec<ClubRecord>, ticket: u64) -> usize {
        let total = records.len();
        let mut slots: Vec<Slot> = Vec::with_capacity(MAX_SELECTED_CLUBS);
        for record in records {
            if slots.len() == MAX_SELECTED_CLUBS {
                break;
            }
            if slots.iter().any(|slot| slot.record.name == record.name) {
                continue;
            }
            slots.push(Slot { ticket, record });
        }
        let kept = slots.len();
        self.slots = slots;
        total - kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(name: &str, score: f64) -> ClubRecord {
        let mut record = ClubRecord::placeholder(name);
        record.score = Some(score);
        record
    }

    #[test]
    fn add_rejects_full_and_duplicate() {
        let mut set = SelectionSet::new();
        assert_eq!(set.add_placeholder("A", 1), AddOutcome::Added);
        assert_eq!(set.add_placeholder("A", 2), AddOutcome::Duplicate);
        assert_eq!(set.add_placeholder("B", 3), AddOutcome::Added);
        assert_eq!(set.add_placeholder("C", 4), AddOutcome::Added);
        assert_eq!(set.add_placeholder("D", 5), AddOutcome::Full);
        assert_eq!(set.names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn patch_requires_matching_ticket() {
        let mut set = SelectionSet::new();
        set.add_placeholder("A", 7);
        assert_eq!(set.patch("A", 6, scored("A", 10.0)), PatchOutcome::Stale);
        assert_eq!(set.get("A").and_then(|r| r.score), None);
        assert_eq!(set.patch("A", 7, scored("A", 10.0)), PatchOutcome::Patched);
        assert_eq!(set.get("A").and_then(|r| r.score), Some(10.0));
    }

    #[test]
    fn replace_all_dedups_and_caps() {
        let mut set = SelectionSet::new();
        set.add_placeholder("Old", 1);
        let dropped = set.replace_all(
            vec![
                scored("A", 1.0),
                scored("A", 2.0),
                scored("B", 3.0),
                scored("C", 4.0),
                scored("D", 5.0),
            ],
            9,
        );
        assert_eq!(dropped, 2);
        assert_eq!(set.names(), vec!["A", "B", "C"]);
        assert_eq!(set.get("A").and_then(|r| r.score), Some(1.0));
        assert!(set.slots().iter().all(|slot| slot.ticket == 9));
    }
}
