use std::collections::VecDeque;

/// Rolling window of fused per-tick verdicts.
#[derive(Debug, Clone)]
pub struct VoteBuffer {
    votes: VecDeque<bool>,
    capacity: usize,
}

impl VoteBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            votes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a vote, evicting the oldest when full.
    pub fn push(&mut self, vote: bool) {
        if self.votes.len() >= self.capacity {
            self.votes.pop_front();
        }
        self.votes.push_back(vote);
    }

    /// Number of `true` votes held.
    #[must_use]
    pub fn count_true(&self) -> usize {
        self.votes.iter().filter(|&&v| v).count()
    }

    /// Strict majority over the votes currently held.
    ///
    /// An empty buffer has no majority.
    #[must_use]
    pub fn is_majority(&self) -> bool {
        self.count_true() > self.votes.len() / 2
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_majority() {
        assert!(!VoteBuffer::new(5).is_majority());
    }

    #[test]
    fn single_true_is_majority_of_one() {
        let mut b = VoteBuffer::new(5);
        b.push(true);
        assert!(b.is_majority());
    }

    #[test]
    fn tie_is_not_majority() {
        let mut b = VoteBuffer::new(5);
        b.push(true);
        b.push(false);
        assert!(!b.is_majority());
    }

    #[test]
    fn isolated_true_in_full_buffer() {
        let mut b = VoteBuffer::new(5);
        for v in [false, false, true, false, false] {
            b.push(v);
        }
        assert!(!b.is_majority());
    }

    #[test]
    fn three_of_five() {
        let mut b = VoteBuffer::new(5);
        for v in [true, false, true, false, true] {
            b.push(v);
        }
        assert!(b.is_majority());
        b.push(false); // evicts the first true
        assert_eq!(b.count_true(), 2);
        assert!(!b.is_majority());
    }
}
