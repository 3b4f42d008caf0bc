//! Delta mass sorted relation sets and the neighborhood of each relation within them
use std::ops::{Index, Range};

use tracing::debug;

use crate::interval::{MassWindow, Span1D};
use crate::params::RelationParams;
use crate::rational::ExactRational;
use crate::relation::ProteoformRelation;

/// The relations within one peak width of a relation, as a span of positions in a
/// [`SortedRelations`]. The count is the length of the span, so the two can never
/// disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighborhood {
    span: Range<usize>,
}

impl Neighborhood {
    pub fn new(span: Range<usize>) -> Self {
        Self { span }
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.span.contains(&index)
    }
}

/// A collection of relations in ascending delta mass order.
///
/// Sorting happens once, in full, on construction. Every pass that depends on delta mass
/// order takes this type rather than a plain slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedRelations<'a> {
    relations: Vec<ProteoformRelation<'a>>,
}

impl<'a> SortedRelations<'a> {
    /// Sort `relations` by delta mass. The sort is stable, so relations with equal
    /// delta masses keep their input order.
    ///
    /// Any neighborhood a relation carries in is dropped, since it indexes the set it was
    /// computed in.
    pub fn new(mut relations: Vec<ProteoformRelation<'a>>) -> Self {
        relations.sort_by(|a, b| a.delta_mass().cmp(b.delta_mass()));
        for relation in relations.iter_mut() {
            relation.clear_neighborhood();
        }
        Self { relations }
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProteoformRelation<'a>> {
        self.relations.iter()
    }

    pub fn as_slice(&self) -> &[ProteoformRelation<'a>] {
        &self.relations
    }

    pub fn get(&self, index: usize) -> Option<&ProteoformRelation<'a>> {
        self.relations.get(index)
    }

    pub(crate) fn relations_mut(&mut self) -> &mut [ProteoformRelation<'a>] {
        &mut self.relations
    }

    pub fn into_inner(self) -> Vec<ProteoformRelation<'a>> {
        self.relations
    }

    /// The positions of all relations whose delta mass lies within the inclusive window
    /// `[center - width / 2, center + width / 2]`, found by binary search
    pub fn window(&self, center: &ExactRational, width: &ExactRational) -> Range<usize> {
        let window = MassWindow::around(center, width);
        self.span_of(&window)
    }

    pub fn span_of<W: Span1D<DimType = ExactRational>>(&self, window: &W) -> Range<usize> {
        let start = self
            .relations
            .partition_point(|r| r.delta_mass() < window.start());
        let end = self
            .relations
            .partition_point(|r| r.delta_mass() <= window.end());
        start..end.max(start)
    }

    /// The relations in the neighborhood of the relation at `index`, or an empty
    /// slice if no neighborhood has been assigned
    pub fn nearby(&self, index: usize) -> &[ProteoformRelation<'a>] {
        match self.relations.get(index).and_then(|r| r.neighborhood()) {
            Some(n) => self.relations.get(n.span()).unwrap_or(&[]),
            None => &[],
        }
    }
}

impl<'a> Index<usize> for SortedRelations<'a> {
    type Output = ProteoformRelation<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.relations[index]
    }
}

impl<'a> IntoIterator for SortedRelations<'a> {
    type Item = ProteoformRelation<'a>;

    type IntoIter = <std::vec::Vec<ProteoformRelation<'a>> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.relations.into_iter()
    }
}

impl<'a> FromIterator<ProteoformRelation<'a>> for SortedRelations<'a> {
    fn from_iter<T: IntoIterator<Item = ProteoformRelation<'a>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Finds, for each relation, every relation within its peak width
#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodGrouper<'p> {
    params: &'p RelationParams,
}

impl<'p> NeighborhoodGrouper<'p> {
    pub fn new(params: &'p RelationParams) -> Self {
        Self { params }
    }

    /// Compute the neighborhood of the relation at `index` without assigning it
    pub fn neighborhood_of(&self, relations: &SortedRelations<'_>, index: usize) -> Neighborhood {
        let relation = &relations[index];
        Neighborhood::new(relations.window(relation.delta_mass(), relation.peak_width(self.params)))
    }

    /// Compute and assign the neighborhood of every relation
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn assign(&self, relations: &mut SortedRelations<'_>) {
        let neighborhoods: Vec<Neighborhood> = (0..relations.len())
            .map(|i| self.neighborhood_of(relations, i))
            .collect();
        let largest = neighborhoods.iter().map(|n| n.len()).max().unwrap_or_default();
        for (relation, neighborhood) in relations.relations_mut().iter_mut().zip(neighborhoods) {
            relation.set_neighborhood(neighborhood);
        }
        debug!(
            "Assigned neighborhoods to {} relations, the largest holding {largest}",
            relations.len()
        );
    }
}
