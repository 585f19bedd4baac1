//! Sheet pagination
//!
//! Packs an ordered, possibly sparse sequence of slot contents into
//! fixed-capacity sheets. Holes are kept in place so slot indices stay stable.

use crate::types::{ImposeError, Result};

/// One printed sheet: exactly `slots_per_sheet` entries, `None` for empty slots
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet<T> {
    pub slots: Vec<Option<T>>,
}

impl<T> Sheet<T> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of filled slots
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Filled slots with their sheet-local index
    pub fn iter_occupied(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Sheet<U> {
        Sheet {
            slots: self.slots.into_iter().map(|s| s.map(&mut f)).collect(),
        }
    }
}

/// Split `items` into sheets of `slots_per_sheet`.
///
/// Always returns at least one sheet; the last sheet is padded with `None`.
pub fn paginate<T>(
    items: impl IntoIterator<Item = Option<T>>,
    slots_per_sheet: usize,
) -> Result<Vec<Sheet<T>>> {
    if slots_per_sheet == 0 {
        return Err(ImposeError::Validation(
            "no slots fit on the sheet".to_string(),
        ));
    }

    let mut sheets = Vec::new();
    let mut current: Vec<Option<T>> = Vec::with_capacity(slots_per_sheet);

    for item in items {
        current.push(item);
        if current.len() == slots_per_sheet {
            sheets.push(Sheet {
                slots: std::mem::replace(&mut current, Vec::with_capacity(slots_per_sheet)),
            });
        }
    }

    if !current.is_empty() || sheets.is_empty() {
        current.resize_with(slots_per_sheet, || None);
        sheets.push(Sheet { slots: current });
    }

    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_one_blank_sheet() {
        let sheets = paginate(Vec::<Option<u8>>::new(), 4).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].slots, vec![None, None, None, None]);
    }

    #[test]
    fn test_exact_multiple_has_no_extra_sheet() {
        let sheets = paginate((0..8).map(Some), 4).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].occupied(), 4);
    }

    #[test]
    fn test_holes_preserved() {
        let sheets = paginate(vec![Some(1), None, Some(3)], 2).unwrap();
        assert_eq!(sheets[0].slots, vec![Some(1), None]);
        assert_eq!(sheets[1].slots, vec![Some(3), None]);
        let occupied: Vec<_> = sheets[1].iter_occupied().collect();
        assert_eq!(occupied, vec![(0, &3)]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        match paginate(vec![Some(1)], 0) {
            Err(ImposeError::Validation(_)) => {}
            _ => panic!("Expected Validation error"),
        }
    }
}
