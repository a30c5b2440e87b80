//! Lock-step zip over any number of iterators.

/// Zips a vector of iterators, yielding one `Vec` per step and stopping at
/// the first iterator that runs out.
///
/// Iterators are polled in order, so those before the exhausted one have
/// already been advanced for the final, discarded step. Once exhausted the
/// adapter stays exhausted.
#[derive(Debug)]
pub struct ZipShortest<I> {
    iters: Vec<I>,
    done: bool,
}

impl<I: Iterator> ZipShortest<I> {
    pub fn new(iters: Vec<I>) -> Self {
        Self { iters, done: false }
    }

    /// Number of zipped iterators.
    pub fn width(&self) -> usize {
        self.iters.len()
    }
}

impl<I: Iterator> Iterator for ZipShortest<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.iters.is_empty() {
            return None;
        }
        let mut step = Vec::with_capacity(self.iters.len());
        for iter in &mut self.iters {
            match iter.next() {
                Some(item) => step.push(item),
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done || self.iters.is_empty() {
            return (0, Some(0));
        }
        self.iters
            .iter()
            .map(Iterator::size_hint)
            .fold((usize::MAX, None::<usize>), |(lo, hi), (l, h)| {
                let hi = match (hi, h) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                (lo.min(l), hi)
            })
    }
}

/// Build a [`ZipShortest`] from anything yielding iterables.
pub fn zip_shortest<I, T>(iters: I) -> ZipShortest<T::IntoIter>
where
    I: IntoIterator<Item = T>,
    T: IntoIterator,
{
    ZipShortest::new(iters.into_iter().map(IntoIterator::into_iter).collect())
}
