//! Merging two change streams into one ordered by timestamp.

use std::iter::Peekable;

use grouper_model::GrouperObject;

/// Iterator produced by [`merge_by_timestamp`].
#[derive(Debug)]
pub struct MergeByTimestamp<A, B>
where
    A: Iterator<Item = GrouperObject>,
    B: Iterator<Item = GrouperObject>,
{
    first: Peekable<A>,
    second: Peekable<B>,
}

impl<A, B> Iterator for MergeByTimestamp<A, B>
where
    A: Iterator<Item = GrouperObject>,
    B: Iterator<Item = GrouperObject>,
{
    type Item = GrouperObject;

    fn next(&mut self) -> Option<GrouperObject> {
        match (self.first.peek(), self.second.peek()) {
            (Some(a), Some(b)) => {
                if a.latest_timestamp() <= b.latest_timestamp() {
                    self.first.next()
                } else {
                    self.second.next()
                }
            }
            (Some(_), None) => self.first.next(),
            (None, _) => self.second.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (a_low, a_high) = self.first.size_hint();
        let (b_low, b_high) = self.second.size_hint();
        let high = match (a_high, b_high) {
            (Some(a), Some(b)) => a.checked_add(b),
            _ => None,
        };
        (a_low.saturating_add(b_low), high)
    }
}

/// Merges two streams already sorted by latest timestamp.
///
/// The result is sorted as well. On equal timestamps the object of `first`
/// comes out before the one of `second`.
pub fn merge_by_timestamp<A, B>(first: A, second: B) -> MergeByTimestamp<A::IntoIter, B::IntoIter>
where
    A: IntoIterator<Item = GrouperObject>,
    B: IntoIterator<Item = GrouperObject>,
{
    MergeByTimestamp {
        first: first.into_iter().peekable(),
        second: second.into_iter().peekable(),
    }
}
