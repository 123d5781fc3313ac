// In: src/kernels/scan.rs

//! Sequential inclusive scan on the host.
//!
//! The per-block counts of a compaction are few (one per block), so turning
//! them into offsets is done on the calling thread between the two launches.

/// Writes the inclusive `op`-scan of `input` to `output` and returns the number
/// of elements written.
///
/// # Panics
/// If `output` is shorter than `input`.
pub fn inclusive_scan<T, F>(input: &[T], output: &mut [T], op: F) -> usize
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    assert!(
        output.len() >= input.len(),
        "inclusive_scan output of length {} cannot hold {} elements",
        output.len(),
        input.len()
    );

    let mut acc: Option<T> = None;
    for (slot, &value) in output.iter_mut().zip(input) {
        let next = match acc {
            Some(prev) => op(prev, value),
            None => value,
        };
        *slot = next;
        acc = Some(next);
    }
    input.len()
}

/// The inclusive `op`-scan of `data`, in place.
pub fn inclusive_scan_in_place<T, F>(data: &mut [T], op: F)
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    for i in 1..data.len() {
        data[i] = op(data[i - 1], data[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_scan_sum() {
        let input = [2usize, 0, 3, 1];
        let mut output = [0usize; 5];
        let written = inclusive_scan(&input, &mut output, |a, b| a + b);
        assert_eq!(written, 4);
        assert_eq!(output, [2, 2, 5, 6, 0]);
    }

    #[test]
    fn test_in_place_matches_out_of_place() {
        let input = [1i32, -4, 9, 0, 3];
        let mut output = [0i32; 5];
        inclusive_scan(&input, &mut output, i32::max);

        let mut data = input;
        inclusive_scan_in_place(&mut data, i32::max);
        assert_eq!(data, output);
        assert_eq!(data, [1, 1, 9, 9, 9]);
    }

    #[test]
    fn test_empty_scan() {
        let input: [u8; 0] = [];
        let mut data: [u8; 0] = [];
        inclusive_scan_in_place(&mut data, |a, b| a + b);
        assert_eq!(inclusive_scan(&input, &mut data, |a, b| a + b), 0);
    }
}
