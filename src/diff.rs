//! Line-level diff between expected and observed output.
//!
//! The algorithm is the classic Myers greedy edit-distance search. It
//! never looks at line contents directly; equality is delegated to an
//! [`Equal`] capability so expected-side matcher keywords participate
//! in the comparison without the diff knowing about them.

use crate::matcher;

/// Equality between element `i` of the old sequence and element `j` of
/// the new sequence.
pub trait Equal {
    fn equal(&self, i: usize, j: usize) -> bool;
}

/// A single block of differences between two sequences of lines.
///
/// `a`/`del` index the expected lines and `b`/`ins` index the observed
/// lines. A block that represents unchanged diff context has zero `del`
/// and `ins` counts and a non-zero `same` count; such blocks are only
/// produced by the hunk builder, never by [`diff`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub a: usize,
    pub b: usize,
    pub del: usize,
    pub ins: usize,
    pub same: usize,
}

/// Holds the two line vectors being compared, with matcher keywords
/// honored on the expected side only.
pub struct DiffData<'a> {
    pub a: &'a [Vec<u8>],
    pub b: &'a [Vec<u8>],
}

impl Equal for DiffData<'_> {
    fn equal(&self, i: usize, j: usize) -> bool {
        matcher::lines_match(&self.a[i], &self.b[j])
    }
}

/// Computes the changes between expected lines `a` and observed lines
/// `b`. An empty result means the sequences match.
pub fn diff_lines(a: &[Vec<u8>], b: &[Vec<u8>]) -> Vec<Change> {
    diff(a.len(), b.len(), &DiffData { a, b })
}

/// Computes a minimal edit script between two abstract sequences of
/// lengths `n` and `m` under the given equality.
///
/// Adjacent deletions and insertions with no equal lines between them
/// coalesce into a single substitution-shaped change with both `del`
/// and `ins` positive. Successive changes are strictly increasing in
/// both `a` and `b`, and the gaps between them are equal runs.
pub fn diff<E: Equal>(n: usize, m: usize, eq: &E) -> Vec<Change> {
    if n == 0 && m == 0 {
        return Vec::new();
    }
    if n == 0 {
        return vec![Change { a: 0, b: 0, del: 0, ins: m, same: 0 }];
    }
    if m == 0 {
        return vec![Change { a: 0, b: 0, del: n, ins: 0, same: 0 }];
    }

    // Forward pass: extend the furthest-reaching path for every
    // diagonal k at every edit distance d, keeping a snapshot per d for
    // the backtracking pass.
    let max = n + m;
    let offset = max as isize;
    let mut v = vec![0isize; 2 * max + 1];
    let mut trace: Vec<Vec<isize>> = Vec::new();
    let mut depth = 0usize;
    'search: loop {
        let d = depth as isize;
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let i = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[i - 1] < v[i + 1]) {
                v[i + 1]
            } else {
                v[i - 1] + 1
            };
            let mut y = x - k;
            while (x as usize) < n && (y as usize) < m && eq.equal(x as usize, y as usize) {
                x += 1;
                y += 1;
            }
            v[i] = x;
            if x as usize >= n && y as usize >= m {
                break 'search;
            }
            k += 2;
        }
        depth += 1;
    }

    // Walk the path backwards, merging unit edits separated by no equal
    // lines into substitution blocks.
    let mut changes: Vec<Change> = Vec::new();
    let mut cur: Option<Change> = None;
    let (mut x, mut y) = (n as isize, m as isize);
    for d in (1..=depth).rev() {
        let v = &trace[d];
        let d = d as isize;
        let k = x - y;
        let i = (k + offset) as usize;
        let down = k == -d || (k != d && v[i - 1] < v[i + 1]);
        let prev_k = if down { k + 1 } else { k - 1 };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;

        // Equal-run length between this edit and the previous block.
        let snake = if down { x - prev_x } else { x - prev_x - 1 };
        if snake > 0 {
            if let Some(done) = cur.take() {
                changes.push(done);
            }
        }

        let (a, b) = (prev_x as usize, prev_y as usize);
        match cur.as_mut() {
            Some(block) => {
                if down {
                    block.b = b;
                    block.ins += 1;
                } else {
                    block.a = a;
                    block.del += 1;
                }
            }
            None => {
                let (del, ins) = if down { (0, 1) } else { (1, 0) };
                cur = Some(Change { a, b, del, ins, same: 0 });
            }
        }

        x = prev_x;
        y = prev_y;
    }
    if let Some(done) = cur {
        changes.push(done);
    }
    changes.reverse();
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<Vec<u8>> {
        text.split('\n').map(|l| l.as_bytes().to_vec()).collect()
    }

    #[test]
    fn equal_sequences_produce_no_changes() {
        let a = lines("one\ntwo\nthree");
        assert!(diff_lines(&a, &a).is_empty());
    }

    #[test]
    fn insertion_at_the_front() {
        let a = lines("there are many like it\nbut this one is mine.");
        let b = lines("Here is a mine\nthere are many like it\nbut this one is mine.");
        assert_eq!(
            diff_lines(&a, &b),
            vec![Change { a: 0, b: 0, del: 0, ins: 1, same: 0 }]
        );
    }

    #[test]
    fn deletion_at_the_front() {
        let a = lines("Here is a line\nthere are many like it\nbut this one is mine.");
        let b = lines("there are many like it\nbut this one is mine.");
        assert_eq!(
            diff_lines(&a, &b),
            vec![Change { a: 0, b: 0, del: 1, ins: 0, same: 0 }]
        );
    }

    #[test]
    fn replacement_coalesces_into_one_change() {
        let a = lines("Here is a line\nthere are many like it\nbut this one is mine.");
        let b = lines("Here is a mine\nthere are many like it\nbut this one is mine.");
        assert_eq!(
            diff_lines(&a, &b),
            vec![Change { a: 0, b: 0, del: 1, ins: 1, same: 0 }]
        );
    }

    #[test]
    fn uneven_replacement_coalesces() {
        let a = lines(
            "Here is some text\nThe next few lines\nwill change quite a bit\nespecially this one\nbut not this one.",
        );
        let b = lines(
            "Here is some text\nBlah blah blah\nFoo bar baz\nI like pizza\nCheck out our great deals on ink and toner\nbut not this one.",
        );
        assert_eq!(
            diff_lines(&a, &b),
            vec![Change { a: 1, b: 1, del: 3, ins: 4, same: 0 }]
        );
    }

    #[test]
    fn separated_edits_stay_separate() {
        let a = lines(
            "Here is some deleted text\nThe next few lines\nwill not change\nat all\nHere is some old text\nexcept this one.",
        );
        let b = lines(
            "The next few lines\nwill not change\nHere is some added text\nat all\nHere is some new text\nexcept this one.",
        );
        assert_eq!(
            diff_lines(&a, &b),
            vec![
                Change { a: 0, b: 0, del: 1, ins: 0, same: 0 },
                Change { a: 3, b: 2, del: 0, ins: 1, same: 0 },
                Change { a: 4, b: 4, del: 1, ins: 1, same: 0 },
            ]
        );
    }

    #[test]
    fn one_side_empty() {
        let a = lines("a\nb");
        assert_eq!(
            diff_lines(&a, &[]),
            vec![Change { a: 0, b: 0, del: 2, ins: 0, same: 0 }]
        );
        assert_eq!(
            diff_lines(&[], &a),
            vec![Change { a: 0, b: 0, del: 0, ins: 2, same: 0 }]
        );
        assert!(diff_lines(&[], &[]).is_empty());
    }

    #[test]
    fn matcher_keywords_count_as_equal() {
        let a = lines("Here is a line\nThere are \\d+ like it (re)\nBut this one is mine.");
        let b = lines("Here is a line\nThere are 37 like it\nBut this one is mine.");
        assert!(diff_lines(&a, &b).is_empty());

        let a = lines("There are to* like it (glob)");
        let b = lines("There are tons like it");
        assert!(diff_lines(&a, &b).is_empty());
    }

    #[test]
    fn keywords_are_one_directional() {
        // Observed lines are never interpreted as patterns.
        let a = lines("There are 37 like it");
        let b = lines("There are \\d+ like it (re)");
        assert_eq!(
            diff_lines(&a, &b),
            vec![Change { a: 0, b: 0, del: 1, ins: 1, same: 0 }]
        );
    }

    #[test]
    fn changes_are_strictly_increasing() {
        let a = lines("a\nx\nb\nc\nx\nd\ne\nx");
        let b = lines("a\ny\nb\nc\ny\nd\ne\ny");
        let changes = diff_lines(&a, &b);
        for pair in changes.windows(2) {
            assert!(pair[0].a + pair[0].del <= pair[1].a);
            assert!(pair[0].b + pair[0].ins <= pair[1].b);
        }
        assert_eq!(changes.len(), 3);
    }
}
