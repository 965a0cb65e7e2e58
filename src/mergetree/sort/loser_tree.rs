use std::cmp::Ordering;

use crate::data::{KeyComparator, KeyValue};
use crate::error::Result;
use crate::reader::RecordReader;

use super::{compare_records, KeyGroupStream, RunCursor};

const EMPTY: usize = usize::MAX;

/// Key groups from a tournament ("loser") tree over the run heads.
///
/// `tree[0]` holds the overall winner and every other node the loser of the
/// match played there. Leaf `i` sits at node `(n + i) / 2`, so the tree is
/// unbalanced when `n` is not a power of two. An exhausted run loses every
/// match.
pub struct LoserTreeStream {
    cursors: Vec<RunCursor>,
    tree: Vec<usize>,
    comparator: KeyComparator,
}

impl LoserTreeStream {
    /// Reads the first record of every run and plays the initial tournament.
    pub fn new(readers: Vec<RecordReader>, comparator: KeyComparator) -> Result<Self> {
        let cursors = readers
            .into_iter()
            .map(RunCursor::open)
            .collect::<Result<Vec<_>>>()?;
        let mut stream = Self { tree: vec![EMPTY; cursors.len()], cursors, comparator };
        stream.init();
        Ok(stream)
    }

    fn leaf(&self, run: usize) -> usize {
        (self.cursors.len() + run) / 2
    }

    /// True if run `a` must be emitted before run `b`.
    fn beats(&self, a: usize, b: usize) -> bool {
        match (self.cursors[a].head(), self.cursors[b].head()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(x), Some(y)) => {
                compare_records(&self.comparator, x, a, y, b) == Ordering::Less
            }
        }
    }

    fn init(&mut self) {
        for run in 0..self.cursors.len() {
            let mut winner = run;
            let mut node = self.leaf(run);
            while node != 0 && self.tree[node] != EMPTY {
                let challenger = self.tree[node];
                if self.beats(challenger, winner) {
                    self.tree[node] = winner;
                    winner = challenger;
                }
                node /= 2;
            }
            self.tree[node] = winner;
        }
    }

    /// Replays the matches on the path of the run that just advanced.
    fn replay(&mut self, run: usize) {
        let mut winner = run;
        let mut node = self.leaf(run);
        while node != 0 {
            let challenger = self.tree[node];
            if self.beats(challenger, winner) {
                self.tree[node] = winner;
                winner = challenger;
            }
            node /= 2;
        }
        self.tree[0] = winner;
    }

    fn winner_head(&self) -> Option<&KeyValue> {
        self.tree.first().and_then(|&w| self.cursors[w].head())
    }

    fn pop(&mut self) -> Result<Option<KeyValue>> {
        let Some(&winner) = self.tree.first() else {
            return Ok(None);
        };
        let kv = self.cursors[winner].pop()?;
        self.replay(winner);
        Ok(kv)
    }
}

impl KeyGroupStream for LoserTreeStream {
    fn next_group(&mut self, group: &mut Vec<KeyValue>) -> Result<bool> {
        let Some(first) = self.pop()? else {
            return Ok(false);
        };
        group.push(first);
        while let Some(head) = self.winner_head() {
            if self.comparator.compare(head.key(), group[0].key()) != Ordering::Equal {
                break;
            }
            if let Some(kv) = self.pop()? {
                group.push(kv);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::from_records;
    use crate::row;

    #[test]
    fn test_uneven_run_count() {
        // five runs: the tree has a half node
        let readers = (0..5i64)
            .map(|r| {
                from_records((0..4).map(|i| KeyValue::insert(row![i * 5 + r], 1, row![r])).collect())
            })
            .collect();
        let mut stream = LoserTreeStream::new(readers, KeyComparator::natural()).unwrap();
        let mut keys = Vec::new();
        let mut group = Vec::new();
        while stream.next_group(&mut group).unwrap() {
            assert_eq!(group.len(), 1);
            keys.push(group.pop().unwrap().key().get(0).and_then(|d| d.as_int()).unwrap());
        }
        assert_eq!(keys, (0..20).collect::<Vec<i64>>());
    }
}
