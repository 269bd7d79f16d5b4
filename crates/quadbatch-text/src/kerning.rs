//! Sources of per-pair horizontal offsets.

use std::collections::HashMap;

/// Horizontal adjustment in pixels between two adjacent characters.
pub trait Kerning {
    fn kern(&self, left: char, right: char) -> f32;
}

/// Always zero. Monospaced bitmap fonts use this.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoKerning;

impl Kerning for NoKerning {
    fn kern(&self, _left: char, _right: char) -> f32 {
        0.0
    }
}

/// Explicit pairs; anything not listed kerns by zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KerningTable {
    pairs: HashMap<(char, char), f32>,
}

impl KerningTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, left: char, right: char, offset: f32) {
        self.pairs.insert((left, right), offset);
    }

    pub fn with_pair(mut self, left: char, right: char, offset: f32) -> Self {
        self.insert(left, right, offset);
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Kerning for KerningTable {
    fn kern(&self, left: char, right: char) -> f32 {
        self.pairs.get(&(left, right)).copied().unwrap_or(0.0)
    }
}

impl<F> Kerning for F
where
    F: Fn(char, char) -> f32,
{
    fn kern(&self, left: char, right: char) -> f32 {
        self(left, right)
    }
}
