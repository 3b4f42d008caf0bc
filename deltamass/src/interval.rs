use std::borrow::Borrow;

use crate::rational::ExactRational;

/** An inclusive interval over a single dimension
*/
pub trait Span1D {
    type DimType: PartialOrd;

    fn start(&self) -> &Self::DimType;
    fn end(&self) -> &Self::DimType;

    fn contains(&self, i: &Self::DimType) -> bool {
        self.start() <= i && i <= self.end()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SimpleInterval<V: PartialOrd> {
    pub start: V,
    pub end: V,
}

impl<V: PartialOrd> SimpleInterval<V> {
    pub fn new(start: V, end: V) -> SimpleInterval<V> {
        SimpleInterval { start, end }
    }
}

impl<V: PartialOrd> Span1D for SimpleInterval<V> {
    type DimType = V;

    fn start(&self) -> &Self::DimType {
        &self.start
    }

    fn end(&self) -> &Self::DimType {
        &self.end
    }
}

/// An inclusive window along the delta mass axis
pub type MassWindow = SimpleInterval<ExactRational>;

impl SimpleInterval<ExactRational> {
    /// The window `[center - width / 2, center + width / 2]`
    pub fn around(center: &ExactRational, width: &ExactRational) -> Self {
        let half = width / ExactRational::from_integer(2);
        Self::new(center - &half, center + &half)
    }
}

pub fn intervals_containing_point<V, Q: Borrow<V>, T: Span1D<DimType = V>, P: Borrow<T>>(
    intervals: &[P],
    value: Q,
) -> Vec<&T> {
    let mut result = Vec::new();
    for i in intervals.iter() {
        if i.borrow().contains(value.borrow()) {
            result.push(i.borrow());
        }
    }
    result
}
