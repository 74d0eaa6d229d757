use crate::statistic::Statistic;

/// One identifier's aggregate plus its not yet folded samples.
///
/// Ingestion only appends; the buffer is folded into the statistic when it
/// reaches capacity or when a flush is forced.
#[derive(Debug)]
pub(crate) struct Point<S: Statistic> {
    statistic: S,
    pending: Vec<S::Sample>,
    capacity: usize,
}

impl<S: Statistic> Point<S> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self::with_statistic(S::default(), capacity)
    }

    pub(crate) fn with_statistic(statistic: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            statistic,
            pending: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn ingest(&mut self, sample: S::Sample) {
        if self.pending.len() >= self.capacity {
            self.flush();
        }
        self.pending.push(sample);
    }

    /// Folds every pending sample and returns how many there were.
    pub(crate) fn flush(&mut self) -> usize {
        let folded = self.pending.len();
        for sample in self.pending.drain(..) {
            self.statistic.fold(sample);
        }
        folded
    }

    pub(crate) fn statistic(&self) -> &S {
        &self.statistic
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistic::{Change, IndicatorStatistic, MeteringStatistic};
    use std::time::Duration;

    #[test]
    fn test_ingest_buffers_until_capacity() {
        let mut point: Point<MeteringStatistic> = Point::new(3);

        for millis in 1..=3 {
            point.ingest(Duration::from_millis(millis));
        }
        assert_eq!(point.pending(), 3);
        assert_eq!(point.statistic().quantity, 0);

        // The fourth sample folds the full buffer first.
        point.ingest(Duration::from_millis(4));
        assert_eq!(point.pending(), 1);
        assert_eq!(point.statistic().quantity, 3);
        assert_eq!(point.statistic().total, Duration::from_millis(6));
    }

    #[test]
    fn test_flush_folds_everything() {
        let mut point: Point<MeteringStatistic> = Point::new(16);
        point.ingest(Duration::from_millis(5));
        point.ingest(Duration::from_millis(7));

        assert_eq!(point.flush(), 2);
        assert_eq!(point.pending(), 0);
        assert_eq!(point.statistic().quantity, 2);
        assert_eq!(point.statistic().maximum, Duration::from_millis(7));
        assert_eq!(point.flush(), 0);
    }

    #[test]
    fn test_seeded_indicator_point() {
        let mut point = Point::with_statistic(IndicatorStatistic::with_initial(4), 8);
        point.ingest(Change::Increase);
        point.ingest(Change::Decrease);
        point.ingest(Change::Decrease);
        point.flush();

        let statistic = point.statistic();
        assert_eq!(statistic.quantity, 1);
        assert_eq!(statistic.current, 3);
        assert_eq!(statistic.minimum, 3);
        assert_eq!(statistic.maximum, 5);
    }
}
