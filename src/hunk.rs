//! Grouping of diff changes into unified-diff hunks.
//!
//! A hunk is a contiguous run of changes whose surrounding contexts
//! overlap. Context blocks are represented as changes with a non-zero
//! `same` count and are synthesized here, when changes are appended and
//! when a hunk is finalized.

use std::io::{self, Write};

use crate::diff::Change;
use crate::matcher::escape;

/// A continuous sequence of changes sharing unified-diff context.
#[derive(Debug)]
pub struct Hunk {
    changes: Vec<Change>,
    ctx_len: usize,
}

impl Hunk {
    /// Creates a new hunk around a single change, inserting the leading
    /// context block.
    fn new(c: Change, ctx_len: usize) -> Hunk {
        let same = c.a.min(ctx_len);
        // Lines before the first change are equal on both sides, so the
        // two leading contexts always line up.
        debug_assert_eq!(same, c.b.min(ctx_len), "before/after diff offsets don't match");
        let ctx = Change {
            a: c.a - same,
            b: c.b - same,
            del: 0,
            ins: 0,
            same,
        };
        Hunk {
            changes: vec![ctx, c],
            ctx_len,
        }
    }

    /// Appends a change to the end of the hunk, inserting the context
    /// block between the previous change and this one.
    fn append_change(&mut self, c: Change) {
        let prev = self.changes[self.changes.len() - 1];
        debug_assert_eq!(prev.same, 0, "hunk has already been finalized");
        let start_a = prev.a + prev.del;
        let start_b = prev.b + prev.ins;
        let ctx = Change {
            a: start_a,
            b: start_b,
            del: 0,
            ins: 0,
            same: c.a - start_a,
        };
        self.changes.push(ctx);
        self.changes.push(c);
    }

    /// Marks the hunk as complete by appending the trailing context.
    /// No more changes can be added afterwards.
    fn finalize(&mut self, num_lines_a: usize) {
        let prev = self.changes[self.changes.len() - 1];
        let start_a = prev.a + prev.del;
        let start_b = prev.b + prev.ins;
        self.changes.push(Change {
            a: start_a,
            b: start_b,
            del: 0,
            ins: 0,
            same: self.ctx_len.min(num_lines_a - start_a),
        });
    }

    /// Writes the hunk in unified diff format against the full line
    /// vectors it indexes into.
    pub fn write<W: Write>(&self, w: &mut W, lines_a: &[Vec<u8>], lines_b: &[Vec<u8>]) -> io::Result<()> {
        let (mut num_del, mut num_ins) = (0, 0);
        for c in &self.changes {
            num_del += c.del + c.same;
            num_ins += c.ins + c.same;
        }

        // A zero-length range is reported one line earlier, "0 lines at
        // this position".
        let lead = self.changes[0];
        let a = if num_del == 0 { lead.a } else { lead.a + 1 };
        let b = if num_ins == 0 { lead.b } else { lead.b + 1 };
        writeln!(w, "@@ -{},{} +{},{} @@", a, num_del, b, num_ins)?;

        for c in &self.changes {
            if c.same > 0 {
                for line in &lines_a[c.a..c.a + c.same] {
                    w.write_all(b" ")?;
                    w.write_all(line)?;
                    w.write_all(b"\n")?;
                }
            } else {
                for line in &lines_a[c.a..c.a + c.del] {
                    w.write_all(b"-")?;
                    w.write_all(line)?;
                    w.write_all(b"\n")?;
                }
                for line in &lines_b[c.b..c.b + c.ins] {
                    writeln!(w, "+{}", escape(line))?;
                }
            }
        }
        Ok(())
    }
}

/// Groups a sequence of changes into hunks.
///
/// `a_len` is the total number of expected (old) lines and `ctx_len`
/// the number of context lines to keep around each change. Changes
/// whose contexts overlap are merged into the same hunk.
pub fn create_hunks(changes: &[Change], a_len: usize, ctx_len: usize) -> Vec<Hunk> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut prev: Option<Change> = None;

    for &c in changes {
        match (hunks.last_mut(), prev) {
            (Some(hunk), Some(p)) if c.a - (p.a + p.del) <= 2 * ctx_len => {
                hunk.append_change(c);
            }
            _ => hunks.push(Hunk::new(c, ctx_len)),
        }
        prev = Some(c);
    }

    for hunk in &mut hunks {
        hunk.finalize(a_len);
    }
    hunks
}
