//! Token edit distance

/// Levenshtein distance between two token sequences.
pub fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];
    for (i, ta) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, tb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ta != tb);
            row[j + 1] = substitute.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// `1 - lev(a, b) / max(|a|, |b|)`; 1.0 when both are empty.
pub fn normalized_edit_similarity<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_distances() {
        let k: Vec<char> = "kitten".chars().collect();
        let s: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&k, &s), 3);
        assert_eq!(levenshtein::<char>(&[], &s), 7);
        assert_eq!(levenshtein(&k, &k), 0);
    }

    #[test]
    fn normalized_bounds() {
        let empty: [&str; 0] = [];
        assert_eq!(normalized_edit_similarity(&empty, &empty), 1.0);
        assert_eq!(normalized_edit_similarity(&["C"], &empty), 0.0);
        assert_eq!(normalized_edit_similarity(&["C", "O"], &["C", "N"]), 0.5);
    }
}
