//! TimSort following the run detection, minrun, merge and gallop rules used by
//! V8's `Array.prototype.sort`.
//!
//! Orderings produced for comparators that are not a total order (such as
//! [`crate::recency_cmp`]) match what a browser produces for the same input.
//! The algorithm never indexes outside the slice, whatever the comparator
//! returns.

use std::cmp::Ordering::{self, Less};

/// Starting threshold of consecutive wins before a merge switches to galloping.
const MIN_GALLOP: usize = 7;

#[derive(Debug, Clone, Copy)]
struct Run {
    base: usize,
    len: usize,
}

/// How a merge finishes once one side is (nearly) exhausted.
enum Tail {
    /// Copy whatever is left in the temporary buffer.
    Drain,
    /// One element of the buffered run remains and belongs at the far end.
    Last,
}

/// Stable sort of `items` by `cmp`. O(n log n), O(n) scratch.
pub fn sort_by<T, F>(items: &mut [T], cmp: F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let mut sorter = TimSort {
        items,
        cmp,
        min_gallop: MIN_GALLOP,
        runs: Vec::new(),
    };
    sorter.sort();
}

fn min_run_length(mut n: usize) -> usize {
    let mut r = 0;
    while n >= 64 {
        r |= n & 1;
        n >>= 1;
    }
    n + r
}

/// Leftmost position in `run` where `key` belongs: `run[k - 1] < key <= run[k]`.
fn gallop_left<T, F>(key: &T, run: &[T], hint: usize, cmp: &mut F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = run.len() as isize;
    let hint = hint as isize;
    let mut last = 0isize;
    let mut offset = 1isize;

    if cmp(&run[hint as usize], key) == Less {
        let max = len - hint;
        while offset < max {
            if cmp(&run[(hint + offset) as usize], key) != Less {
                break;
            }
            last = offset;
            offset = (offset << 1) + 1;
        }
        offset = offset.min(max);
        last += hint;
        offset += hint;
    } else {
        let max = hint + 1;
        while offset < max {
            if cmp(&run[(hint - offset) as usize], key) == Less {
                break;
            }
            last = offset;
            offset = (offset << 1) + 1;
        }
        offset = offset.min(max);
        (last, offset) = (hint - offset, hint - last);
    }

    last += 1;
    while last < offset {
        let mid = last + ((offset - last) >> 1);
        if cmp(&run[mid as usize], key) == Less {
            last = mid + 1;
        } else {
            offset = mid;
        }
    }
    offset as usize
}

/// Rightmost position in `run` where `key` belongs: `run[k - 1] <= key < run[k]`.
fn gallop_right<T, F>(key: &T, run: &[T], hint: usize, cmp: &mut F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = run.len() as isize;
    let hint = hint as isize;
    let mut last = 0isize;
    let mut offset = 1isize;

    if cmp(key, &run[hint as usize]) == Less {
        let max = hint + 1;
        while offset < max {
            if cmp(key, &run[(hint - offset) as usize]) != Less {
                break;
            }
            last = offset;
            offset = (offset << 1) + 1;
        }
        offset = offset.min(max);
        (last, offset) = (hint - offset, hint - last);
    } else {
        let max = len - hint;
        while offset < max {
            if cmp(key, &run[(hint + offset) as usize]) == Less {
                break;
            }
            last = offset;
            offset = (offset << 1) + 1;
        }
        offset = offset.min(max);
        last += hint;
        offset += hint;
    }

    last += 1;
    while last < offset {
        let mid = last + ((offset - last) >> 1);
        if cmp(key, &run[mid as usize]) == Less {
            offset = mid;
        } else {
            last = mid + 1;
        }
    }
    offset as usize
}

struct TimSort<'a, T, F> {
    items: &'a mut [T],
    cmp: F,
    min_gallop: usize,
    runs: Vec<Run>,
}

impl<T, F> TimSort<'_, T, F>
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    fn sort(&mut self) {
        let mut low = 0;
        let mut remaining = self.items.len();
        let min_run = min_run_length(remaining);

        while remaining != 0 {
            let mut run_len = self.count_and_make_run(low, low + remaining);
            if run_len < min_run {
                let forced = min_run.min(remaining);
                self.binary_insertion_sort(low, low + run_len, low + forced);
                run_len = forced;
            }
            self.runs.push(Run {
                base: low,
                len: run_len,
            });
            self.merge_collapse();
            low += run_len;
            remaining -= run_len;
        }
        self.merge_force_collapse();
    }

    /// Length of the run starting at `low`. Strictly descending runs are
    /// reversed in place so every run ends up ascending.
    fn count_and_make_run(&mut self, low: usize, high: usize) -> usize {
        let next = low + 1;
        if next == high {
            return 1;
        }
        let mut run_len = 2;
        let descending = (self.cmp)(&self.items[next], &self.items[low]) == Less;

        for idx in next + 1..high {
            let order = (self.cmp)(&self.items[idx], &self.items[idx - 1]);
            let run_ends = if descending {
                order != Less
            } else {
                order == Less
            };
            if run_ends {
                break;
            }
            run_len += 1;
        }

        if descending {
            self.items[low..low + run_len].reverse();
        }
        run_len
    }

    /// Sort `items[low..high]`, given that `items[low..start]` is already sorted.
    fn binary_insertion_sort(&mut self, low: usize, start: usize, high: usize) {
        let mut start = if low == start { start + 1 } else { start };
        while start < high {
            let pivot = self.items[start];
            let (mut left, mut right) = (low, start);
            while left < right {
                let mid = left + ((right - left) >> 1);
                if (self.cmp)(&pivot, &self.items[mid]) == Less {
                    right = mid;
                } else {
                    left = mid + 1;
                }
            }
            self.items.copy_within(left..start, left + 1);
            self.items[left] = pivot;
            start += 1;
        }
    }

    fn run_invariant_holds(&self, n: usize) -> bool {
        if n < 2 {
            return true;
        }
        self.runs[n - 2].len > self.runs[n - 1].len + self.runs[n].len
    }

    fn merge_collapse(&mut self) {
        while self.runs.len() > 1 {
            let mut n = self.runs.len() - 2;
            if !self.run_invariant_holds(n + 1) || !self.run_invariant_holds(n) {
                // Either check failing implies n >= 1.
                if self.runs[n - 1].len < self.runs[n + 1].len {
                    n -= 1;
                }
                self.merge_at(n);
            } else if self.runs[n].len <= self.runs[n + 1].len {
                self.merge_at(n);
            } else {
                break;
            }
        }
    }

    fn merge_force_collapse(&mut self) {
        while self.runs.len() > 1 {
            let mut n = self.runs.len() - 2;
            if n > 0 && self.runs[n - 1].len < self.runs[n + 1].len {
                n -= 1;
            }
            self.merge_at(n);
        }
    }

    fn merge_at(&mut self, i: usize) {
        let Run {
            base: mut base_a,
            len: mut len_a,
        } = self.runs[i];
        let Run {
            base: base_b,
            len: mut len_b,
        } = self.runs[i + 1];
        self.runs[i].len = len_a + len_b;
        self.runs.remove(i + 1);

        // Elements of A already in place ahead of B's first element.
        let key = self.items[base_b];
        let k = gallop_right(&key, &self.items[base_a..base_a + len_a], 0, &mut self.cmp);
        base_a += k;
        len_a -= k;
        if len_a == 0 {
            return;
        }

        // Elements of B already in place after A's last element.
        let key = self.items[base_a + len_a - 1];
        len_b = gallop_left(
            &key,
            &self.items[base_b..base_b + len_b],
            len_b - 1,
            &mut self.cmp,
        );
        if len_b == 0 {
            return;
        }

        if len_a <= len_b {
            self.merge_low(base_a, len_a, base_b, len_b);
        } else {
            self.merge_high(base_a, len_a, base_b, len_b);
        }
    }

    /// Merge adjacent runs left to right, buffering the shorter run A.
    fn merge_low(&mut self, base_a: usize, mut len_a: usize, base_b: usize, mut len_b: usize) {
        let buf: Vec<T> = self.items[base_a..base_a + len_a].to_vec();
        let mut dest = base_a;
        let mut cursor_buf = 0;
        let mut cursor_b = base_b;

        self.items[dest] = self.items[cursor_b];
        dest += 1;
        cursor_b += 1;
        len_b -= 1;

        let tail = 'merge: {
            if len_b == 0 {
                break 'merge Tail::Drain;
            }
            if len_a == 1 {
                break 'merge Tail::Last;
            }
            let mut min_gallop = self.min_gallop;
            loop {
                let mut wins_a = 0;
                let mut wins_b = 0;

                loop {
                    if (self.cmp)(&self.items[cursor_b], &buf[cursor_buf]) == Less {
                        self.items[dest] = self.items[cursor_b];
                        dest += 1;
                        cursor_b += 1;
                        wins_b += 1;
                        len_b -= 1;
                        wins_a = 0;
                        if len_b == 0 {
                            break 'merge Tail::Drain;
                        }
                        if wins_b >= min_gallop {
                            break;
                        }
                    } else {
                        self.items[dest] = buf[cursor_buf];
                        dest += 1;
                        cursor_buf += 1;
                        wins_a += 1;
                        len_a -= 1;
                        wins_b = 0;
                        if len_a == 1 {
                            break 'merge Tail::Last;
                        }
                        if wins_a >= min_gallop {
                            break;
                        }
                    }
                }

                min_gallop += 1;
                let mut first = true;
                while wins_a >= MIN_GALLOP || wins_b >= MIN_GALLOP || first {
                    first = false;
                    min_gallop = min_gallop.saturating_sub(1).max(1);
                    self.min_gallop = min_gallop;

                    let key = self.items[cursor_b];
                    wins_a = gallop_right(
                        &key,
                        &buf[cursor_buf..cursor_buf + len_a],
                        0,
                        &mut self.cmp,
                    );
                    if wins_a > 0 {
                        self.items[dest..dest + wins_a]
                            .copy_from_slice(&buf[cursor_buf..cursor_buf + wins_a]);
                        dest += wins_a;
                        cursor_buf += wins_a;
                        len_a -= wins_a;
                        if len_a == 1 {
                            break 'merge Tail::Last;
                        }
                        // Only reachable with an inconsistent comparator.
                        if len_a == 0 {
                            break 'merge Tail::Drain;
                        }
                    }
                    self.items[dest] = self.items[cursor_b];
                    dest += 1;
                    cursor_b += 1;
                    len_b -= 1;
                    if len_b == 0 {
                        break 'merge Tail::Drain;
                    }

                    let key = buf[cursor_buf];
                    wins_b = gallop_left(
                        &key,
                        &self.items[cursor_b..cursor_b + len_b],
                        0,
                        &mut self.cmp,
                    );
                    if wins_b > 0 {
                        self.items.copy_within(cursor_b..cursor_b + wins_b, dest);
                        dest += wins_b;
                        cursor_b += wins_b;
                        len_b -= wins_b;
                        if len_b == 0 {
                            break 'merge Tail::Drain;
                        }
                    }
                    self.items[dest] = buf[cursor_buf];
                    dest += 1;
                    cursor_buf += 1;
                    len_a -= 1;
                    if len_a == 1 {
                        break 'merge Tail::Last;
                    }
                }
                min_gallop += 1;
                self.min_gallop = min_gallop;
            }
        };

        match tail {
            Tail::Drain => {
                if len_a > 0 {
                    self.items[dest..dest + len_a]
                        .copy_from_slice(&buf[cursor_buf..cursor_buf + len_a]);
                }
            }
            Tail::Last => {
                self.items.copy_within(cursor_b..cursor_b + len_b, dest);
                self.items[dest + len_b] = buf[cursor_buf];
            }
        }
    }

    /// Merge adjacent runs right to left, buffering the shorter run B.
    ///
    /// Cursors are signed because they step one past the start of their run.
    fn merge_high(&mut self, base_a: usize, mut len_a: usize, base_b: usize, mut len_b: usize) {
        let buf: Vec<T> = self.items[base_b..base_b + len_b].to_vec();
        let mut dest = (base_b + len_b - 1) as isize;
        let mut cursor_buf = len_b as isize - 1;
        let mut cursor_a = (base_a + len_a - 1) as isize;

        self.items[dest as usize] = self.items[cursor_a as usize];
        dest -= 1;
        cursor_a -= 1;
        len_a -= 1;

        let tail = 'merge: {
            if len_a == 0 {
                break 'merge Tail::Drain;
            }
            if len_b == 1 {
                break 'merge Tail::Last;
            }
            let mut min_gallop = self.min_gallop;
            loop {
                let mut wins_a = 0;
                let mut wins_b = 0;

                loop {
                    if (self.cmp)(&buf[cursor_buf as usize], &self.items[cursor_a as usize]) == Less
                    {
                        self.items[dest as usize] = self.items[cursor_a as usize];
                        dest -= 1;
                        cursor_a -= 1;
                        wins_a += 1;
                        len_a -= 1;
                        wins_b = 0;
                        if len_a == 0 {
                            break 'merge Tail::Drain;
                        }
                        if wins_a >= min_gallop {
                            break;
                        }
                    } else {
                        self.items[dest as usize] = buf[cursor_buf as usize];
                        dest -= 1;
                        cursor_buf -= 1;
                        wins_b += 1;
                        len_b -= 1;
                        wins_a = 0;
                        if len_b == 1 {
                            break 'merge Tail::Last;
                        }
                        if wins_b >= min_gallop {
                            break;
                        }
                    }
                }

                min_gallop += 1;
                let mut first = true;
                while wins_a >= MIN_GALLOP || wins_b >= MIN_GALLOP || first {
                    first = false;
                    min_gallop = min_gallop.saturating_sub(1).max(1);
                    self.min_gallop = min_gallop;

                    let key = buf[cursor_buf as usize];
                    let k = gallop_right(
                        &key,
                        &self.items[base_a..base_a + len_a],
                        len_a - 1,
                        &mut self.cmp,
                    );
                    wins_a = len_a - k;
                    if wins_a > 0 {
                        dest -= wins_a as isize;
                        cursor_a -= wins_a as isize;
                        let from = (cursor_a + 1) as usize;
                        self.items.copy_within(from..from + wins_a, (dest + 1) as usize);
                        len_a -= wins_a;
                        if len_a == 0 {
                            break 'merge Tail::Drain;
                        }
                    }
                    self.items[dest as usize] = buf[cursor_buf as usize];
                    dest -= 1;
                    cursor_buf -= 1;
                    len_b -= 1;
                    if len_b == 1 {
                        break 'merge Tail::Last;
                    }

                    let key = self.items[cursor_a as usize];
                    let k = gallop_left(&key, &buf[..len_b], len_b - 1, &mut self.cmp);
                    wins_b = len_b - k;
                    if wins_b > 0 {
                        dest -= wins_b as isize;
                        cursor_buf -= wins_b as isize;
                        let from = (cursor_buf + 1) as usize;
                        let to = (dest + 1) as usize;
                        self.items[to..to + wins_b].copy_from_slice(&buf[from..from + wins_b]);
                        len_b -= wins_b;
                        if len_b == 1 {
                            break 'merge Tail::Last;
                        }
                        // Only reachable with an inconsistent comparator.
                        if len_b == 0 {
                            break 'merge Tail::Drain;
                        }
                    }
                    self.items[dest as usize] = self.items[cursor_a as usize];
                    dest -= 1;
                    cursor_a -= 1;
                    len_a -= 1;
                    if len_a == 0 {
                        break 'merge Tail::Drain;
                    }
                }
                min_gallop += 1;
                self.min_gallop = min_gallop;
            }
        };

        match tail {
            Tail::Drain => {
                if len_b > 0 {
                    let to = (dest + 1) as usize - len_b;
                    self.items[to..to + len_b].copy_from_slice(&buf[..len_b]);
                }
            }
            Tail::Last => {
                dest -= len_a as isize;
                cursor_a -= len_a as isize;
                let from = (cursor_a + 1) as usize;
                self.items.copy_within(from..from + len_a, (dest + 1) as usize);
                self.items[dest as usize] = buf[cursor_buf as usize];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random stream so inputs are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }
    }

    #[test]
    fn min_run_matches_reference_values() {
        assert_eq!(min_run_length(10), 10);
        assert_eq!(min_run_length(63), 63);
        assert_eq!(min_run_length(64), 32);
        assert_eq!(min_run_length(65), 33);
        assert_eq!(min_run_length(2_000), 63);
    }

    #[test]
    fn strictly_descending_input_is_reversed() {
        let mut items = [5, 4, 3, 2, 1];
        sort_by(&mut items, |a, b| a.cmp(b));
        assert_eq!(items, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn agrees_with_stable_sort_on_total_orders() {
        let mut rng = Lcg(0x2545_f491_4f6c_dd1d);
        for len in (0..200).chain([500, 1_000, 5_000]) {
            // Few distinct keys, so equal elements exercise stability.
            let spread = (len as u64 / 3).max(2);
            let input: Vec<(u64, usize)> = (0..len).map(|i| (rng.next() % spread, i)).collect();

            let mut expected = input.clone();
            expected.sort_by(|a, b| a.0.cmp(&b.0));
            let mut actual = input;
            sort_by(&mut actual, |a, b| a.0.cmp(&b.0));

            assert_eq!(actual, expected, "length {len}");
        }
    }

    #[test]
    fn presorted_and_reversed_blocks_merge_correctly() {
        // Long ascending and descending stretches make merges gallop.
        let mut input: Vec<u32> = (0..3_000).collect();
        input.extend((0..3_000).rev());
        input.extend(1_000..4_000);
        let mut expected = input.clone();
        expected.sort();

        sort_by(&mut input, |a, b| a.cmp(b));
        assert_eq!(input, expected);
    }

    #[test]
    fn inconsistent_comparator_stays_in_bounds() {
        let mut rng = Lcg(7);
        for len in [2, 3, 17, 64, 65, 300, 2_048] {
            let mut items: Vec<u32> = (0..len).collect();
            sort_by(&mut items, |_, _| match rng.next() % 3 {
                0 => Ordering::Less,
                1 => Ordering::Equal,
                _ => Ordering::Greater,
            });
            let mut seen = items.clone();
            seen.sort();
            assert_eq!(seen, (0..len).collect::<Vec<_>>(), "length {len}");
        }
    }
}
