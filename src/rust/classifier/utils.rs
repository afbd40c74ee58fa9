use ndarray::Array1;

use super::normalizer::is_message_whitespace;

pub(crate) fn normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn l1_normalize_vector(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|x| x.abs()).sum();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

/// Collapses runs of two or more whitespace characters into one space.
/// A lone whitespace character is kept as it is.
pub(crate) fn collapse_whitespace_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run: Option<char> = None;
    let mut run_len = 0usize;
    for c in text.chars() {
        if is_message_whitespace(c) {
            run.get_or_insert(c);
            run_len += 1;
            continue;
        }
        flush_run(&mut out, run.take(), run_len);
        run_len = 0;
        out.push(c);
    }
    flush_run(&mut out, run, run_len);
    out
}

fn flush_run(out: &mut String, first: Option<char>, len: usize) {
    match (first, len) {
        (Some(c), 1) => out.push(c),
        (Some(_), _) => out.push(' '),
        (None, _) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_vector_unit_length() {
        let v = normalize_vector(&array![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        assert_eq!(normalize_vector(&array![0.0, 0.0]), array![0.0, 0.0]);
        assert_eq!(l1_normalize_vector(&array![0.0, 0.0]), array![0.0, 0.0]);
    }

    #[test]
    fn test_l1_normalize() {
        let v = l1_normalize_vector(&array![1.0, 3.0]);
        assert!((v[0] - 0.25).abs() < 1e-6);
        assert!((v[1] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_collapse_whitespace_runs() {
        assert_eq!(collapse_whitespace_runs("a  b\tc \n\td"), "a b\tc d");
        assert_eq!(collapse_whitespace_runs("   "), " ");
        assert_eq!(collapse_whitespace_runs("\t"), "\t");
        assert_eq!(collapse_whitespace_runs(""), "");
        assert_eq!(collapse_whitespace_runs("a\u{1f}\u{1f}b"), "a b");
    }
}
