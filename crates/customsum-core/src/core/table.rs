use crate::error::SummationError;

/// Ordered per-term parameter vectors, with a flag recording whether any of them
/// changed since the last commit to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermTable {
    width: usize,
    terms: Vec<Vec<f64>>,
    dirty: bool,
}

impl TermTable {
    /// Creates an empty table whose terms each hold `width` parameters.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            terms: Vec::new(),
            dirty: false,
        }
    }

    pub fn add_term(&mut self, params: &[f64]) -> Result<usize, SummationError> {
        self.check_width(params)?;
        self.terms.push(params.to_vec());
        self.dirty = true;
        Ok(self.terms.len() - 1)
    }

    pub fn set_term(&mut self, index: usize, params: &[f64]) -> Result<(), SummationError> {
        let len = self.terms.len();
        let term = self
            .terms
            .get_mut(index)
            .ok_or(SummationError::IndexOutOfRange { index, len })?;
        if params.len() != self.width {
            return Err(SummationError::ArityMismatch {
                expected: self.width,
                found: params.len(),
            });
        }
        term.copy_from_slice(params);
        self.dirty = true;
        Ok(())
    }

    /// The stored parameters of a term, committed or not.
    pub fn term(&self, index: usize) -> Result<&[f64], SummationError> {
        self.terms
            .get(index)
            .map(Vec::as_slice)
            .ok_or(SummationError::IndexOutOfRange {
                index,
                len: self.terms.len(),
            })
    }

    #[inline]
    pub fn terms(&self) -> &[Vec<f64>] {
        &self.terms
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_committed(&mut self) {
        self.dirty = false;
    }

    fn check_width(&self, params: &[f64]) -> Result<(), SummationError> {
        if params.len() == self.width {
            Ok(())
        } else {
            Err(SummationError::ArityMismatch {
                expected: self.width,
                found: params.len(),
            })
        }
    }
}
