/// Unified-diff construction for the diff command. Line-based longest
/// common subsequence with three lines of context per hunk.
const CONTEXT_LINES: usize = 3;

#[derive(Clone, Copy, PartialEq)]
enum DiffOp {
    Keep,
    Delete,
    Insert,
}

/// Build a unified diff between two text blobs. Returns an empty vector
/// when the inputs are line-identical.
pub fn build_unified_diff(
    before: &str,
    after: &str,
    from_label: &str,
    to_label: &str,
) -> Vec<String> {
    let before_lines: Vec<&str> = before.lines().collect();
    let after_lines: Vec<&str> = after.lines().collect();
    let ops = diff_ops(&before_lines, &after_lines);

    if !ops.iter().any(|(op, _, _)| *op != DiffOp::Keep) {
        return Vec::new();
    }

    let mut output = vec![format!("--- {from_label}"), format!("+++ {to_label}")];

    for group in hunk_groups(&ops) {
        let slice = &ops[group.clone()];
        let (before_start, before_count) = side_range(slice, DiffOp::Insert);
        let (after_start, after_count) = side_range(slice, DiffOp::Delete);
        output.push(format!(
            "@@ -{} +{} @@",
            format_range(before_start, before_count),
            format_range(after_start, after_count)
        ));
        for (op, before_index, after_index) in slice {
            match op {
                DiffOp::Keep => output.push(format!(" {}", before_lines[*before_index])),
                DiffOp::Delete => output.push(format!("-{}", before_lines[*before_index])),
                DiffOp::Insert => output.push(format!("+{}", after_lines[*after_index])),
            }
        }
    }

    output
}

/// Op stream with per-op (before, after) line indices. Unused side indices
/// point at the next line on that side.
fn diff_ops(before: &[&str], after: &[&str]) -> Vec<(DiffOp, usize, usize)> {
    let rows = before.len();
    let cols = after.len();
    let mut lcs = vec![vec![0usize; cols + 1]; rows + 1];
    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            lcs[i][j] = if before[i] == after[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < rows && j < cols {
        if before[i] == after[j] {
            ops.push((DiffOp::Keep, i, j));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push((DiffOp::Delete, i, j));
            i += 1;
        } else {
            ops.push((DiffOp::Insert, i, j));
            j += 1;
        }
    }
    while i < rows {
        ops.push((DiffOp::Delete, i, j));
        i += 1;
    }
    while j < cols {
        ops.push((DiffOp::Insert, i, j));
        j += 1;
    }
    ops
}

/// Group change positions into hunk ranges separated by more than
/// 2 * CONTEXT_LINES of unchanged lines, then widen by the context margin.
fn hunk_groups(ops: &[(DiffOp, usize, usize)]) -> Vec<std::ops::Range<usize>> {
    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, (op, _, _))| *op != DiffOp::Keep)
        .map(|(index, _)| index)
        .collect();

    let mut groups: Vec<std::ops::Range<usize>> = Vec::new();
    for &change in &changes {
        let start = change.saturating_sub(CONTEXT_LINES);
        let end = (change + CONTEXT_LINES + 1).min(ops.len());
        match groups.last_mut() {
            Some(last) if start <= last.end => last.end = end,
            _ => groups.push(start..end),
        }
    }
    groups
}

/// Start line and count for one diff side, skipping the other side's ops.
fn side_range(slice: &[(DiffOp, usize, usize)], skip: DiffOp) -> (usize, usize) {
    let count = slice.iter().filter(|(op, _, _)| *op != skip).count();
    let start = slice
        .first()
        .map(|(_, before_index, after_index)| {
            if skip == DiffOp::Insert {
                *before_index
            } else {
                *after_index
            }
        })
        .unwrap_or(0);
    (start, count)
}

fn format_range(start: usize, count: usize) -> String {
    let begin = if count == 0 { start } else { start + 1 };
    if count == 1 {
        begin.to_string()
    } else {
        format!("{begin},{count}")
    }
}
