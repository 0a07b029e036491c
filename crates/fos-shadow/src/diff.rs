//! Sequence Diff
//!
//! Minimal ordered edit script between two sequences under a caller-supplied
//! equality. Changes are modelled as delete + insert, never substitution, so
//! as many elements as possible keep their identity.
//!
//! Splice indices are positions in the *current* sequence: applying the
//! splices in order to the previous sequence yields the current one.

use std::fmt;

/// Contiguous removal-then-insertion at one index
#[derive(Clone, PartialEq, Eq)]
pub struct Splice<T> {
    /// Position in the current sequence
    pub index: usize,
    /// Elements of the previous sequence removed at `index`
    pub removed: Vec<T>,
    /// Number of current elements inserted at `index`
    pub added_count: usize,
}

impl<T> Splice<T> {
    pub fn new(index: usize, removed: Vec<T>, added_count: usize) -> Self {
        Self {
            index,
            removed,
            added_count,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Splice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} -{:?} +{}", self.index, self.removed, self.added_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Leave,
    Update,
    Add,
    Delete,
}

/// (rows × cols) edit-distance table, rows over previous, cols over current
struct Distances {
    cols: usize,
    cells: Vec<usize>,
}

impl Distances {
    #[inline]
    fn at(&self, row: usize, col: usize) -> usize {
        self.cells[row * self.cols + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: usize) {
        self.cells[row * self.cols + col] = value;
    }
}

/// Compute the splices turning `previous` into `current`
pub fn calculate_splices<C, P, F>(current: &[C], previous: &[P], equals: F) -> Vec<Splice<P>>
where
    P: Clone,
    F: Fn(&C, &P) -> bool,
{
    let min_len = current.len().min(previous.len());
    let prefix = shared_prefix(current, previous, min_len, &equals);
    let suffix = shared_suffix(current, previous, min_len - prefix, &equals);

    let current_end = current.len() - suffix;
    let previous_end = previous.len() - suffix;

    if prefix == current_end && prefix == previous_end {
        return Vec::new();
    }
    if prefix == current_end {
        return vec![Splice::new(prefix, previous[prefix..previous_end].to_vec(), 0)];
    }
    if prefix == previous_end {
        return vec![Splice::new(prefix, Vec::new(), current_end - prefix)];
    }

    let distances = edit_distances(
        &current[prefix..current_end],
        &previous[prefix..previous_end],
        &equals,
    );

    let mut splices = Vec::new();
    let mut splice: Option<Splice<P>> = None;
    let mut index = prefix;
    let mut old_index = prefix;

    for edit in edits_from_distances(&distances) {
        match edit {
            Edit::Leave => {
                if let Some(done) = splice.take() {
                    splices.push(done);
                }
                index += 1;
                old_index += 1;
            }
            Edit::Update => {
                let open = splice.get_or_insert_with(|| Splice::new(index, Vec::new(), 0));
                open.added_count += 1;
                open.removed.push(previous[old_index].clone());
                index += 1;
                old_index += 1;
            }
            Edit::Add => {
                let open = splice.get_or_insert_with(|| Splice::new(index, Vec::new(), 0));
                open.added_count += 1;
                index += 1;
            }
            Edit::Delete => {
                let open = splice.get_or_insert_with(|| Splice::new(index, Vec::new(), 0));
                open.removed.push(previous[old_index].clone());
                old_index += 1;
            }
        }
    }
    splices.extend(splice);
    splices
}

fn shared_prefix<C, P>(current: &[C], previous: &[P], search: usize, equals: &impl Fn(&C, &P) -> bool) -> usize {
    (0..search)
        .find(|&i| !equals(&current[i], &previous[i]))
        .unwrap_or(search)
}

fn shared_suffix<C, P>(current: &[C], previous: &[P], search: usize, equals: &impl Fn(&C, &P) -> bool) -> usize {
    let (mut c, mut p) = (current.len(), previous.len());
    let mut count = 0;
    while count < search && equals(&current[c - 1], &previous[p - 1]) {
        c -= 1;
        p -= 1;
        count += 1;
    }
    count
}

/// Unit-cost insert/delete, zero-cost match
fn edit_distances<C, P>(current: &[C], previous: &[P], equals: &impl Fn(&C, &P) -> bool) -> Distances {
    let rows = previous.len() + 1;
    let cols = current.len() + 1;
    let mut distances = Distances {
        cols,
        cells: vec![0; rows * cols],
    };

    for row in 0..rows {
        distances.set(row, 0, row);
    }
    for col in 0..cols {
        distances.set(0, col, col);
    }

    for row in 1..rows {
        for col in 1..cols {
            let value = if equals(&current[col - 1], &previous[row - 1]) {
                distances.at(row - 1, col - 1)
            } else {
                let north = distances.at(row - 1, col) + 1;
                let west = distances.at(row, col - 1) + 1;
                north.min(west)
            };
            distances.set(row, col, value);
        }
    }
    distances
}

/// Backtrack from the last cell. Ties prefer the diagonal; the comparison
/// order below fixes which of several minimal scripts is produced.
fn edits_from_distances(distances: &Distances) -> Vec<Edit> {
    let mut row = distances.cells.len() / distances.cols - 1;
    let mut col = distances.cols - 1;
    let mut current = distances.at(row, col);
    let mut edits = Vec::with_capacity(row + col);

    while row > 0 || col > 0 {
        if row == 0 {
            edits.push(Edit::Add);
            col -= 1;
            continue;
        }
        if col == 0 {
            edits.push(Edit::Delete);
            row -= 1;
            continue;
        }

        let north_west = distances.at(row - 1, col - 1);
        let west = distances.at(row - 1, col);
        let north = distances.at(row, col - 1);

        let min = if west < north {
            west.min(north_west)
        } else {
            north.min(north_west)
        };

        if min == north_west {
            if north_west == current {
                edits.push(Edit::Leave);
            } else {
                edits.push(Edit::Update);
                current = north_west;
            }
            row -= 1;
            col -= 1;
        } else if min == west {
            edits.push(Edit::Delete);
            row -= 1;
            current = west;
        } else {
            edits.push(Edit::Add);
            col -= 1;
            current = north;
        }
    }

    edits.reverse();
    edits
}

/// Length of the overlap of `[start1, end1)` and `[start2, end2)`.
/// Touching ranges overlap by zero; disjoint ranges yield `None`.
fn intersect(start1: usize, end1: usize, start2: usize, end2: usize) -> Option<usize> {
    if end1 < start2 || end2 < start1 {
        return None;
    }
    if end1 == start2 || end2 == start1 {
        return Some(0);
    }
    let end = end1.min(end2);
    Some(if start1 < start2 { end - start2 } else { end - start1 })
}

/// Fold one more splice into `splices`.
///
/// `splices` describes edits from an original sequence to an intermediate
/// one; `splice` is an edit of the intermediate sequence. Afterwards
/// `splices` describes the edits from the original to the result, in the same
/// normal form a direct diff produces (sorted, non-overlapping, no no-ops).
pub fn merge_splice<T: Clone>(splices: &mut Vec<Splice<T>>, splice: Splice<T>) {
    let mut pending = Some(splice);
    let mut insertion_offset: isize = 0;
    let mut i = 0;

    while i < splices.len() {
        let shifted = splices[i].index as isize + insertion_offset;
        splices[i].index = shifted as usize;

        let Some(splice) = pending.as_mut() else {
            i += 1;
            continue;
        };

        let (cur_index, cur_added) = (splices[i].index, splices[i].added_count);
        let overlap = intersect(
            splice.index,
            splice.index + splice.removed.len(),
            cur_index,
            cur_index + cur_added,
        );

        if let Some(overlap) = overlap {
            let current = splices.remove(i);
            insertion_offset -= current.added_count as isize - current.removed.len() as isize;

            splice.added_count += current.added_count - overlap;
            let delete_count = splice.removed.len() + current.removed.len() - overlap;

            if splice.added_count == 0 && delete_count == 0 {
                // Merged to a no-op
                pending = None;
                continue;
            }

            let mut removed = current.removed;
            if splice.index < current.index {
                let mut prepend = splice.removed[..current.index - splice.index].to_vec();
                prepend.append(&mut removed);
                removed = prepend;
            }
            if splice.index + splice.removed.len() > current.index + current.added_count {
                let tail = current.index + current.added_count - splice.index;
                removed.extend_from_slice(&splice.removed[tail..]);
            }
            splice.removed = removed;
            if current.index < splice.index {
                splice.index = current.index;
            }
        } else if splice.index < cur_index {
            let offset = splice.added_count as isize - splice.removed.len() as isize;
            if let Some(splice) = pending.take() {
                splices.insert(i, splice);
            }
            i += 1;
            splices[i].index = (splices[i].index as isize + offset) as usize;
            insertion_offset += offset;
            i += 1;
        } else {
            i += 1;
        }
    }

    splices.extend(pending);
}

/// Apply `splices` to `previous`, taking inserted elements from `current`
pub fn apply_splices<T: Clone>(previous: &mut Vec<T>, current: &[T], splices: &[Splice<T>]) {
    for splice in splices {
        let inserted = current[splice.index..splice.index + splice.added_count].iter().cloned();
        previous.splice(splice.index..splice.index + splice.removed.len(), inserted);
    }
}
